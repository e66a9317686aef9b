pub mod service;
pub mod store;

pub use service::AppContext;
pub use store::{AppState, AppStore, Completion, DialogField, FormField, PendingOperation};
