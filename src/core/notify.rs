//! Operator notifications.
//!
//! Notifications are fire-and-forget: components push them onto an unbounded
//! channel and never wait for the operator. Every notification is also logged.

use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
}

pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Cloneable sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Notifier, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        let notification = Notification::new(severity, message);
        match notification.severity {
            Severity::Error => error!(message = %notification.message, "operator notified"),
            Severity::Warning => warn!(message = %notification.message, "operator notified"),
            Severity::Info | Severity::Success => {
                info!(severity = %notification.severity, message = %notification.message, "operator notified")
            }
        }
        if self.tx.send(notification).is_err() {
            debug!("notification receiver dropped");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Severity::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Severity::Error, message);
    }
}

/// Drains everything currently queued without waiting.
pub fn drain(rx: &mut NotificationReceiver) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.info("Transaction sent");
        notifier.success("Land registered");
        let got = drain(&mut rx);
        assert_eq!(
            got,
            vec![
                Notification::new(Severity::Info, "Transaction sent"),
                Notification::new(Severity::Success, "Land registered"),
            ]
        );
    }

    #[test]
    fn notify_after_receiver_dropped_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.error("nobody listening");
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Success.to_string(), "success");
    }
}
