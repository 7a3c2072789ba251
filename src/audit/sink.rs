/// Fire-and-forget event sink
///
/// Audit entries and usage events are queued on a bounded channel and written by
/// a single background worker. Enqueueing never waits: when the queue is full the
/// new event is dropped with a warning. Store failures in the worker are logged
/// and the event is discarded; nothing is retried.

use crate::audit::types::{AuditEntry, UsageEvent};
use crate::store::{tables, Returning, TableStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum SinkEvent {
    Write { table: &'static str, row: Value },
    Flush(oneshot::Sender<()>),
}

/// Handle used by handlers to record events; cheap to clone
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SinkEvent>,
    usage_enabled: bool,
}

impl std::fmt::Debug for SinkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkEvent::Write { table, .. } => write!(f, "Write({})", table),
            SinkEvent::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl EventSink {
    /// Start the background writer
    ///
    /// The worker stops once every `EventSink` clone has been dropped and the
    /// queue is drained.
    pub fn spawn(
        store: Arc<dyn TableStore>,
        capacity: usize,
        usage_enabled: bool,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(store, rx));
        (Self { tx, usage_enabled }, handle)
    }

    /// Queue an audit entry
    pub fn audit(&self, entry: AuditEntry) {
        match serde_json::to_value(&entry) {
            Ok(row) => self.enqueue(tables::AUDIT_LOGS, row),
            Err(e) => tracing::warn!("⚠️ Could not encode audit entry {}: {}", entry.action, e),
        }
    }

    /// Queue a usage event; no-op when analytics is disabled
    pub fn usage(&self, event: UsageEvent) {
        if !self.usage_enabled {
            return;
        }
        match serde_json::to_value(&event) {
            Ok(row) => self.enqueue(tables::USAGE_EVENTS, row),
            Err(e) => tracing::warn!("⚠️ Could not encode usage event {}: {}", event.event_type, e),
        }
    }

    /// Wait until every event queued before this call has been processed
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(SinkEvent::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    fn enqueue(&self, table: &'static str, row: Value) {
        match self.tx.try_send(SinkEvent::Write { table, row }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!("⚠️ Event queue full, dropping {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::debug!("Event worker stopped, dropping {:?}", event);
            }
        }
    }
}

async fn run_worker(store: Arc<dyn TableStore>, mut rx: mpsc::Receiver<SinkEvent>) {
    tracing::debug!("📨 Event sink worker started");
    while let Some(event) = rx.recv().await {
        match event {
            SinkEvent::Write { table, row } => {
                if let Err(e) = store.insert(table, row, Returning::Minimal).await {
                    tracing::debug!("Dropped {} event: {}", table, e);
                }
            }
            SinkEvent::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("📪 Event sink worker stopped");
}
