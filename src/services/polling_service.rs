use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const PORTFOLIO_INTERVAL: Duration = Duration::from_secs(15);
pub const ALERTS_INTERVAL: Duration = Duration::from_secs(30);
pub const MARKET_INTERVAL: Duration = Duration::from_secs(30);
pub const RECOMMENDATIONS_INTERVAL: Duration = Duration::from_secs(60);
pub const SENTIMENT_INTERVAL: Duration = Duration::from_secs(60);

/// Work run on every tick. Each call becomes its own task.
pub type PollTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A running poller. Cancelling (or dropping) it stops future ticks only; an
/// invocation already in flight runs to completion.
pub struct Subscription {
    name: String,
    interval: Duration,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Stopped poller {}", self.name);
    }
}

/// Run `task` now and then every `interval`, with no backoff or jitter.
pub fn subscribe(name: impl Into<String>, interval: Duration, task: PollTask) -> Subscription {
    let name = name.into();
    let loop_name = name.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!("Poller {} tick", loop_name);
            tokio::spawn(task());
        }
    });

    Subscription { name, interval, handle }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountOutcome {
    Started,
    /// The dependency key changed, so the old poller was replaced.
    Restarted,
    /// Same key as the running poller; left alone.
    Unchanged,
}

struct Mounted {
    key: Option<String>,
    subscription: Subscription,
}

/// One poller per mounted view.
#[derive(Default)]
pub struct PollingScheduler {
    views: DashMap<String, Mounted>,
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&self, view: &str, key: Option<String>, interval: Duration, task: PollTask) -> MountOutcome {
        if let Some(mounted) = self.views.get(view) {
            if mounted.key == key && mounted.subscription.is_active() {
                return MountOutcome::Unchanged;
            }
        }

        let name = match &key {
            Some(key) => format!("{}:{}", view, key),
            None => view.to_string(),
        };
        let subscription = subscribe(name, interval, task);
        let previous = self.views.insert(view.to_string(), Mounted { key: key.clone(), subscription });

        match previous {
            Some(_) => {
                info!("🔁 Remounted {} view (key: {:?})", view, key);
                MountOutcome::Restarted
            }
            None => {
                info!("▶️ Mounted {} view every {:?}", view, interval);
                MountOutcome::Started
            }
        }
    }

    /// Returns false when the view was not mounted.
    pub fn unmount(&self, view: &str) -> bool {
        let removed = self.views.remove(view).is_some();
        if removed {
            info!("⏹️ Unmounted {} view", view);
        }
        removed
    }

    pub fn is_mounted(&self, view: &str) -> bool {
        self.views.contains_key(view)
    }

    pub fn mounted_views(&self) -> Vec<String> {
        let mut views: Vec<String> = self.views.iter().map(|entry| entry.key().clone()).collect();
        views.sort();
        views
    }

    pub fn unmount_all(&self) {
        self.views.clear();
    }
}
