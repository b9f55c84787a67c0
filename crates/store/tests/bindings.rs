use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use api_types::service::ServiceRecord;
use store::{
    ConfigKind, ExpenseDraft, HistoryState, MSG_POSITIVE_AMOUNT, OptionsState, SelectQuery,
    ServiceDraft, StoreError, Subscription, Table, TableClient, TableError, reconcile_default,
};

/// In-memory stand-in for the remote table backend: auto-assigned ids and
/// creation timestamps, a unique `name` constraint on the config tables, and
/// synchronous change notifications.
#[derive(Default)]
struct FakeBackend {
    tables: HashMap<Table, Vec<Value>>,
    subscribers: HashMap<Table, Vec<(u64, mpsc::UnboundedSender<()>)>>,
    next_id: i64,
    next_token: u64,
    tick: i64,
    calls: usize,
    fail_reads: bool,
}

impl FakeBackend {
    fn notify(&mut self, table: Table) {
        if let Some(subs) = self.subscribers.get(&table) {
            for (_, tx) in subs {
                let _ = tx.send(());
            }
        }
    }
}

#[derive(Clone, Default)]
struct FakeClient {
    inner: Arc<Mutex<FakeBackend>>,
}

impl FakeClient {
    fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }

    fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    fn subscriber_count(&self, table: Table) -> usize {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .get(&table)
            .map_or(0, Vec::len)
    }
}

fn sort_key(row: &Value, column: &str) -> (String, i64) {
    let key = row
        .get(column)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = row.get("id").and_then(Value::as_i64).unwrap_or_default();
    (key, id)
}

impl TableClient for FakeClient {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<Value>, TableError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if inner.fail_reads {
            return Err(TableError::Transport("connection refused".to_string()));
        }
        let mut rows = inner.tables.get(&table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| sort_key(a, query.order_by).cmp(&sort_key(b, query.order_by)));
        if !query.ascending {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<(), TableError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;

        if matches!(table, Table::ConfigServices | Table::ConfigExpenses) {
            let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
            let taken = inner
                .tables
                .get(&table)
                .is_some_and(|rows| rows.iter().any(|r| r["name"] == name));
            if taken {
                return Err(TableError::Conflict(
                    "duplicate key value violates unique constraint (23505)".to_string(),
                ));
            }
        }

        inner.next_id += 1;
        inner.tick += 1;
        let created_at = (Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
            + Duration::seconds(inner.tick))
        .to_rfc3339();

        let mut stored = row;
        stored["id"] = json!(inner.next_id);
        stored["createdAt"] = json!(created_at);
        inner.tables.entry(table).or_default().push(stored);
        inner.notify(table);
        Ok(())
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), TableError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if let Some(rows) = inner.tables.get_mut(&table) {
            rows.retain(|row| row.get("id").and_then(Value::as_i64) != Some(id));
        }
        inner.notify(table);
        Ok(())
    }

    fn subscribe(&self, table: Table) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        inner.next_token += 1;
        let token = inner.next_token;
        inner.subscribers.entry(table).or_default().push((token, tx));

        let shared = Arc::clone(&self.inner);
        let disposer: Box<dyn FnOnce() + Send> = Box::new(move || {
            if let Some(subs) = shared.lock().unwrap().subscribers.get_mut(&table) {
                subs.retain(|(t, _)| *t != token);
            }
        });
        Subscription::new(rx, Some(disposer))
    }
}

/// Client whose backend never came up: every call refuses.
struct DisconnectedClient;

impl TableClient for DisconnectedClient {
    async fn select(&self, _: Table, _: SelectQuery) -> Result<Vec<Value>, TableError> {
        Err(TableError::NotConnected)
    }

    async fn insert(&self, _: Table, _: Value) -> Result<(), TableError> {
        Err(TableError::NotConnected)
    }

    async fn delete(&self, _: Table, _: i64) -> Result<(), TableError> {
        Err(TableError::NotConnected)
    }

    fn subscribe(&self, _: Table) -> Subscription {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription::new(rx, None)
    }
}

fn filled_service(client_visible_type: &str) -> ServiceDraft {
    let mut draft = ServiceDraft::new();
    draft.registration = "mh-12 de 1433".to_string();
    draft.service_type = client_visible_type.to_string();
    draft.set_amount("999.99");
    draft
}

#[tokio::test]
async fn added_option_appears_exactly_once() {
    let client = FakeClient::new();
    let mut options = OptionsState::default();

    let added = options
        .add(&client, ConfigKind::ServiceTypes, "  Oil Change  ")
        .await
        .unwrap();
    assert_eq!(added, "Oil Change");

    options.load(&client, ConfigKind::ServiceTypes).await;
    let matching = options
        .items
        .iter()
        .filter(|option| option.name == "Oil Change")
        .count();
    assert_eq!(matching, 1);
    assert!(options.error.is_none());
}

#[tokio::test]
async fn duplicate_names_yield_one_success_one_conflict() {
    for pair in [["Brakes", " Brakes "], [" Brakes ", "Brakes"]] {
        let client = FakeClient::new();
        let mut options = OptionsState::default();

        options
            .add(&client, ConfigKind::ExpenseCategories, pair[0])
            .await
            .unwrap();
        assert_eq!(
            options
                .add(&client, ConfigKind::ExpenseCategories, pair[1])
                .await,
            Err(StoreError::Duplicate("Brakes".to_string()))
        );
        assert_eq!(options.items.len(), 1);
    }
}

#[tokio::test]
async fn blank_names_are_rejected_before_any_network_call() {
    let client = FakeClient::new();
    let mut options = OptionsState::default();

    let result = options.add(&client, ConfigKind::ServiceTypes, "   ").await;
    assert_eq!(
        result,
        Err(StoreError::Validation("Name cannot be empty.".to_string()))
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn invalid_amounts_never_reach_the_backend() {
    let client = FakeClient::new();

    for raw in ["", "abc", "0", "-3"] {
        let mut service = filled_service("Oil Change");
        service.set_amount(raw);
        assert_eq!(
            service.submit(&client, "u").await,
            Err(StoreError::Validation(MSG_POSITIVE_AMOUNT.to_string())),
            "service amount {raw:?}"
        );

        let mut expense = ExpenseDraft::new();
        expense.category = "Rent".to_string();
        expense.set_amount(raw);
        assert_eq!(
            expense.submit(&client, "u").await,
            Err(StoreError::Validation(MSG_POSITIVE_AMOUNT.to_string())),
            "expense amount {raw:?}"
        );
    }

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn successful_submit_inserts_once_and_keeps_selection() {
    let client = FakeClient::new();
    let mut draft = filled_service("Oil Change");

    draft.submit(&client, "garage-7-anon-user").await.unwrap();

    assert_eq!(draft.service_type, "Oil Change");
    assert_eq!(draft.registration, "");
    assert_eq!(draft.amount, "");

    let mut history: HistoryState<ServiceRecord> = HistoryState::default();
    history.load(&client, Table::ServiceJobs).await;
    assert!(!history.loading);
    assert_eq!(history.rows.len(), 1);
    assert_eq!(history.rows[0].registration_number, "MH-12 DE 1433");
    assert_eq!(history.rows[0].recorded_by, "garage-7-anon-user");
}

#[tokio::test]
async fn history_lists_newest_first() {
    let client = FakeClient::new();

    filled_service("Oil Change")
        .submit(&client, "u")
        .await
        .unwrap();
    let mut second = filled_service("Brake Check");
    second.registration = "ka-05 z 9".to_string();
    second.submit(&client, "u").await.unwrap();

    let mut history: HistoryState<ServiceRecord> = HistoryState::default();
    history.load(&client, Table::ServiceJobs).await;

    assert_eq!(history.rows.len(), 2);
    assert_eq!(history.rows[0].registration_number, "KA-05 Z 9");
    assert!(history.rows[0].created_at > history.rows[1].created_at);
}

#[tokio::test]
async fn change_notifications_drive_a_fresh_fetch() {
    let client = FakeClient::new();
    let mut options = OptionsState::default();
    options.load(&client, ConfigKind::ServiceTypes).await;
    assert!(options.items.is_empty());

    let mut sub = client.subscribe(Table::ConfigServices);
    assert!(!sub.drain());

    // Another session writes to the same table.
    client
        .insert(Table::ConfigServices, json!({ "name": "Detailing" }))
        .await
        .unwrap();

    assert!(sub.drain());
    options.load(&client, ConfigKind::ServiceTypes).await;
    assert_eq!(options.items.len(), 1);
    assert_eq!(options.items[0].name, "Detailing");
}

#[tokio::test]
async fn dropping_a_subscription_unregisters_it() {
    let client = FakeClient::new();
    let sub = client.subscribe(Table::Expenses);
    assert_eq!(client.subscriber_count(Table::Expenses), 1);
    drop(sub);
    assert_eq!(client.subscriber_count(Table::Expenses), 0);
}

#[tokio::test]
async fn fetch_failure_keeps_the_stale_list() {
    let client = FakeClient::new();
    let mut options = OptionsState::default();
    options
        .add(&client, ConfigKind::ServiceTypes, "Oil Change")
        .await
        .unwrap();
    assert_eq!(options.items.len(), 1);

    client.set_fail_reads(true);
    options.load(&client, ConfigKind::ServiceTypes).await;

    assert_eq!(options.items.len(), 1, "stale list must survive the failure");
    assert!(options.error.is_some());
    assert!(!options.loading);
}

#[tokio::test]
async fn deleting_the_selected_option_leaves_the_rest_usable() {
    let client = FakeClient::new();
    let mut options = OptionsState::default();
    options
        .add(&client, ConfigKind::ServiceTypes, "Brake Check")
        .await
        .unwrap();
    options
        .add(&client, ConfigKind::ServiceTypes, "Oil Change")
        .await
        .unwrap();

    let mut selection = String::new();
    reconcile_default(&mut selection, &options);
    assert_eq!(selection, "Brake Check");

    let id = options.items[0].id;
    options
        .remove(&client, ConfigKind::ServiceTypes, id)
        .await
        .unwrap();

    assert_eq!(options.items.len(), 1);
    assert_eq!(options.items[0].name, "Oil Change");
    // The user's (now stale) selection is not overwritten.
    reconcile_default(&mut selection, &options);
    assert_eq!(selection, "Brake Check");
}

#[tokio::test]
async fn disconnected_backend_refuses_reads_and_writes() {
    let client = DisconnectedClient;

    let mut draft = filled_service("Oil Change");
    assert_eq!(
        draft.submit(&client, "u").await,
        Err(StoreError::NotConnected)
    );
    // The draft is untouched on failure.
    assert_eq!(draft.registration, "mh-12 de 1433");

    let mut options = OptionsState::default();
    assert_eq!(
        options.add(&client, ConfigKind::ServiceTypes, "Towing").await,
        Err(StoreError::NotConnected)
    );

    let mut history: HistoryState<ServiceRecord> = HistoryState::default();
    history.load(&client, Table::ServiceJobs).await;
    assert!(history.rows.is_empty());
    assert!(history.error.is_some());
}
