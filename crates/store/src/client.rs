use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// The four backend tables this application touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    ServiceJobs,
    Expenses,
    ConfigServices,
    ConfigExpenses,
}

impl Table {
    /// Returns the table name as known to the backend.
    pub fn name(self) -> &'static str {
        match self {
            Self::ServiceJobs => "service_jobs",
            Self::Expenses => "expenses",
            Self::ConfigServices => "config_services",
            Self::ConfigExpenses => "config_expenses",
        }
    }
}

/// Ordering and bound for a `select`.
#[derive(Clone, Copy, Debug)]
pub struct SelectQuery {
    pub order_by: &'static str,
    pub ascending: bool,
    pub limit: Option<u32>,
}

impl SelectQuery {
    /// All rows, ascending by `name`. Used for the config tables.
    pub fn by_name() -> Self {
        Self {
            order_by: "name",
            ascending: true,
            limit: None,
        }
    }

    /// Newest rows first by creation time, capped. Used for the histories.
    pub fn newest_first(limit: u32) -> Self {
        Self {
            order_by: "createdAt",
            ascending: false,
            limit: Some(limit),
        }
    }
}

/// What a table-client implementation can report back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// A unique constraint rejected the write. The backend identifies this
    /// case with a dedicated error code; implementations must map it here so
    /// callers can render it as "already exists" instead of a generic failure.
    #[error("duplicate value: {0}")]
    Conflict(String),
    /// Any other failure the backend reported. The message is surfaced to the
    /// user verbatim.
    #[error("{0}")]
    Backend(String),
    /// The request never completed.
    #[error("backend unreachable: {0}")]
    Transport(String),
    /// The client was never initialized; reads and writes both refuse.
    #[error("backend connection is not initialized")]
    NotConnected,
}

/// Generic capability over the named backend tables.
///
/// The backend owns the data model, so `select` hands back raw JSON rows and
/// decoding happens at the binding layer. Tests inject an in-memory
/// implementation; the production one speaks HTTP.
#[allow(async_fn_in_trait)]
pub trait TableClient {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<Value>, TableError>;

    async fn insert(&self, table: Table, row: Value) -> Result<(), TableError>;

    async fn delete(&self, table: Table, id: i64) -> Result<(), TableError>;

    /// Registers for change notifications on `table`. Any insert, update or
    /// delete makes the returned subscription's channel yield; the payload is
    /// deliberately empty because consumers re-fetch rather than patch.
    fn subscribe(&self, table: Table) -> Subscription;
}

/// A live change-notification registration.
///
/// Dropping the subscription runs its disposer exactly once; a subscription
/// whose setup never completed carries no disposer and drops cleanly.
pub struct Subscription {
    changes: mpsc::UnboundedReceiver<()>,
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        changes: mpsc::UnboundedReceiver<()>,
        disposer: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self { changes, disposer }
    }

    /// Drains every pending notification; `true` if there was at least one.
    /// Collapsing a burst into a single refetch is safe because refetches
    /// replace the collection wholesale.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while self.changes.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn disposer_runs_exactly_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new(rx, Some(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_without_disposer_drops_cleanly() {
        let (_tx, rx) = mpsc::unbounded_channel();
        drop(Subscription::new(rx, None));
    }

    #[test]
    fn drain_collapses_bursts() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = Subscription::new(rx, None);
        assert!(!sub.drain());
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        assert!(sub.drain());
        assert!(!sub.drain());
    }
}
