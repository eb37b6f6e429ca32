//! Change-notification bus: "tasks changed for event X / department Y".
//!
//! Any number of subscribers; each one filters by the scope it renders and
//! triggers a full reload on a match. Last writer wins, nothing is merged.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::Scope;

const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksChanged {
    pub scope: Scope,
}

#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<TasksChanged>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, scope: Scope) {
        match self.sender.send(TasksChanged {
            scope: scope.clone(),
        }) {
            Ok(receivers) => debug!(%scope, receivers, "published tasks changed"),
            Err(_) => debug!(%scope, "tasks changed with no subscribers"),
        }
    }

    /// Subscribe to changes for one scope only.
    pub fn subscribe(&self, scope: Scope) -> ScopedSubscription {
        ScopedSubscription {
            scope,
            inner: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ScopedSubscription {
    scope: Scope,
    inner: broadcast::Receiver<TasksChanged>,
}

impl ScopedSubscription {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Wait for the next change in this subscription's scope. `None` once
    /// the bus is gone. A lagged receiver still reports one change, since a
    /// reload covers whatever was missed.
    pub async fn recv(&mut self) -> Option<TasksChanged> {
        loop {
            match self.inner.recv().await {
                Ok(change) if change.scope == self.scope => return Some(change),
                Ok(change) => {
                    debug!(scope = %change.scope, "ignoring change for other scope");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change subscription lagged");
                    return Some(TasksChanged {
                        scope: self.scope.clone(),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
