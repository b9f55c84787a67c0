//! Read-only, bounded, newest-first projections of the record tables.

use serde::de::DeserializeOwned;

use crate::client::{SelectQuery, Table, TableClient};

/// Display cap for the history lists; the change-feed watches the same
/// window, so a mutation only visible beyond the cap never triggers a
/// refetch.
pub const HISTORY_LIMIT: u32 = 50;

/// The rows currently displayed for one table, plus loading/error flags.
/// Render precedence is error, then loading, then empty, then the list.
#[derive(Debug)]
pub struct HistoryState<T> {
    pub rows: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for HistoryState<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl<T: DeserializeOwned> HistoryState<T> {
    /// Fetches the bounded, newest-first snapshot and replaces `rows`
    /// wholesale. No incremental patching: every notification pays a full
    /// round trip in exchange for never reasoning about event ordering.
    pub async fn load<C: TableClient>(&mut self, client: &C, table: Table) {
        match client
            .select(table, SelectQuery::newest_first(HISTORY_LIMIT))
            .await
        {
            Ok(raw) => {
                let decoded: Result<Vec<T>, _> =
                    raw.into_iter().map(serde_json::from_value).collect();
                match decoded {
                    Ok(rows) => {
                        self.rows = rows;
                        self.error = None;
                    }
                    Err(err) => {
                        tracing::error!("failed to decode {} rows: {err}", table.name());
                        self.error = Some(err.to_string());
                    }
                }
            }
            Err(err) => {
                tracing::error!("failed to fetch {}: {err}", table.name());
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
    }
}
