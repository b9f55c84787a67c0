use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use store::{HISTORY_LIMIT, SelectQuery, Subscription, Table, TableClient, TableError};

use crate::error::{AppError, Result};

/// Error code the backend attaches to unique-constraint violations.
const DUPLICATE_KEY_CODE: &str = "23505";

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Table client speaking the backend's REST dialect: one route per table,
/// `order`/`limit` as query parameters, api key in the headers.
#[derive(Debug, Clone)]
pub struct RestTableClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl RestTableClient {
    pub fn new(base_url: &str, api_key: &str, poll_interval: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Connection(format!("invalid base url: {err}")))?;
        if api_key.trim().is_empty() {
            return Err(AppError::Connection("api key is not configured".to_string()));
        }
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            poll_interval,
        })
    }

    fn endpoint(&self, table: Table) -> std::result::Result<Url, TableError> {
        self.base_url
            .join(&format!("rest/v1/{}", table.name()))
            .map_err(|err| TableError::Backend(format!("invalid table url: {err}")))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn error_from_response(res: reqwest::Response) -> TableError {
        let status = res.status();
        let body = res.json::<ErrorResponse>().await.unwrap_or_default();
        let message = body
            .message
            .unwrap_or_else(|| format!("backend returned {status}"));

        if status == StatusCode::CONFLICT || body.code.as_deref() == Some(DUPLICATE_KEY_CODE) {
            return TableError::Conflict(message);
        }
        TableError::Backend(message)
    }
}

impl TableClient for RestTableClient {
    async fn select(&self, table: Table, query: SelectQuery) -> std::result::Result<Vec<Value>, TableError> {
        let endpoint = self.endpoint(table)?;
        let direction = if query.ascending { "asc" } else { "desc" };
        let order = format!("{}.{direction}", query.order_by);

        let mut req = self
            .authorized(self.http.get(endpoint))
            .query(&[("select", "*"), ("order", order.as_str())]);
        if let Some(limit) = query.limit {
            req = req.query(&[("limit", limit.to_string())]);
        }

        let res = req
            .send()
            .await
            .map_err(|err| TableError::Transport(err.to_string()))?;
        if res.status().is_success() {
            return res
                .json::<Vec<Value>>()
                .await
                .map_err(|err| TableError::Transport(err.to_string()));
        }
        Err(Self::error_from_response(res).await)
    }

    async fn insert(&self, table: Table, row: Value) -> std::result::Result<(), TableError> {
        let endpoint = self.endpoint(table)?;
        let res = self
            .authorized(self.http.post(endpoint))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|err| TableError::Transport(err.to_string()))?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(res).await)
    }

    async fn delete(&self, table: Table, id: i64) -> std::result::Result<(), TableError> {
        let endpoint = self.endpoint(table)?;
        let res = self
            .authorized(self.http.delete(endpoint))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(|err| TableError::Transport(err.to_string()))?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(res).await)
    }

    /// Change feed: a background task polls the same bounded window the views
    /// display and notifies whenever the snapshot fingerprint changes. The
    /// first poll only establishes the baseline. Dropping the subscription
    /// aborts the task.
    fn subscribe(&self, table: Table) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        let handle = tokio::spawn(async move {
            let mut last: Option<String> = None;
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let rows = match client.select(table, watch_query(table)).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        tracing::warn!("change poll for {} failed: {err}", table.name());
                        continue;
                    }
                };
                let fingerprint = serde_json::to_string(&rows).unwrap_or_default();
                match &last {
                    Some(previous) if *previous == fingerprint => {}
                    Some(_) => {
                        last = Some(fingerprint);
                        if tx.send(()).is_err() {
                            break;
                        }
                    }
                    None => last = Some(fingerprint),
                }
            }
        });

        Subscription::new(rx, Some(Box::new(move || handle.abort())))
    }
}

/// The window each table is watched through; it matches what the views
/// fetch, so an invisible change never costs a refetch.
fn watch_query(table: Table) -> SelectQuery {
    match table {
        Table::ConfigServices | Table::ConfigExpenses => SelectQuery::by_name(),
        Table::ServiceJobs | Table::Expenses => SelectQuery::newest_first(HISTORY_LIMIT),
    }
}
