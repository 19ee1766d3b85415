// crates/media-engine/src/notify.rs
//! Transient user notifications
//!
//! Fire-and-forget: at most one message is visible, a new one replaces the
//! current one, and each disappears on its own after the dismiss delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Receives short user-facing messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// A notification as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Increases with every notification, so a replacement is detectable
    pub id: u64,
    pub message: String,
}

/// Single-slot, auto-dismissing notification area
#[derive(Debug)]
pub struct ToastCenter {
    dismiss_after: Duration,
    current: Mutex<Option<(Toast, Instant)>>,
    next_id: AtomicU64,
}

impl ToastCenter {
    pub const DEFAULT_DISMISS: Duration = Duration::from_millis(3000);

    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            current: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// The notification currently on screen, if it has not expired
    pub fn visible(&self) -> Option<Toast> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        match current.as_ref() {
            Some((_, shown_at)) if shown_at.elapsed() >= self.dismiss_after => {
                *current = None;
                None
            }
            Some((toast, _)) => Some(toast.clone()),
            None => None,
        }
    }

    /// Hides the current notification early
    pub fn dismiss(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DISMISS)
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, message: &str) {
        log::info!("Notify: {}", message);

        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            message: message.to_string(),
        };
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((toast, Instant::now()));
    }
}
