// src/lib.rs

pub mod application;
pub mod blockchain;
pub mod cli;
pub mod console;
pub mod core;
pub mod service;
