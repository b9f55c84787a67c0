pub use client::{SelectQuery, Subscription, Table, TableClient, TableError};
pub use config::{ConfigKind, OptionsState, reconcile_default};
pub use error::StoreError;
pub use forms::{
    ExpenseDraft, MSG_BAD_DATE, MSG_POSITIVE_AMOUNT, MSG_REQUIRED_EXPENSE, MSG_REQUIRED_SERVICE,
    ServiceDraft,
};
pub use history::{HISTORY_LIMIT, HistoryState};
pub use identity::{DEFAULT_ANON_USER, anonymous_user_id};

mod client;
mod config;
mod error;
mod forms;
mod history;
mod identity;

type ResultStore<T> = Result<T, StoreError>;
