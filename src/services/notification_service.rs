use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::models::{Notification, NotificationCategory};

const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_HISTORY: usize = 100;

// ==============================================================================
// Notification Center
// ==============================================================================

/// In-process fan-out of user-facing notifications.
///
/// Live subscribers get every notification published after they subscribe; the
/// latest `capacity` are also kept for `GET /api/notifications`.
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
    history: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn publish(&self, notification: Notification) {
        match notification.category {
            NotificationCategory::Error => error!("🔔 {}: {}", notification.title, notification.message),
            NotificationCategory::Alert => warn!("🔔 {}: {}", notification.title, notification.message),
            _ => info!("🔔 {}: {}", notification.title, notification.message),
        }

        {
            let mut history = self.history.lock();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(notification.clone());
        }

        // No receivers is the normal case when nothing is streaming.
        let _ = self.sender.send(notification);
    }

    pub fn notify(
        &self,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
        symbol: Option<String>,
    ) {
        self.publish(Notification::new(title, message, category, symbol));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.history.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}
