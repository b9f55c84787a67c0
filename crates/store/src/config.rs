//! Live bindings for the two dropdown option lists.

use api_types::config::ConfigOption;

use crate::{
    ResultStore, StoreError,
    client::{SelectQuery, Table, TableClient, TableError},
};

/// Which of the two config tables a binding is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKind {
    ServiceTypes,
    ExpenseCategories,
}

impl ConfigKind {
    pub fn table(self) -> Table {
        match self {
            Self::ServiceTypes => Table::ConfigServices,
            Self::ExpenseCategories => Table::ConfigExpenses,
        }
    }
}

/// One option list plus its loading/error flags.
///
/// `loading` communicates in-flight state; the emptiness of `items` never
/// does. A failed fetch keeps the previous items so the UI does not regress
/// from "has options" to "empty" on a transient error; the `error` flag sits
/// alongside the (stale) list instead.
#[derive(Debug)]
pub struct OptionsState {
    pub items: Vec<ConfigOption>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for OptionsState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl OptionsState {
    /// Fetches the full list, ascending by name, and replaces `items`
    /// wholesale on success.
    pub async fn load<C: TableClient>(&mut self, client: &C, kind: ConfigKind) {
        let table = kind.table();
        match client.select(table, SelectQuery::by_name()).await {
            Ok(rows) => {
                let decoded: Result<Vec<ConfigOption>, _> =
                    rows.into_iter().map(serde_json::from_value).collect();
                match decoded {
                    Ok(items) => {
                        self.items = items;
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

    /// Validates and inserts a new option, then re-fetches the list once.
    ///
    /// Returns the trimmed name that was stored. A unique-constraint
    /// violation comes back as [`StoreError::Duplicate`]; the later
    /// subscription-driven refetch re-applies the same fresh rows, so the
    /// explicit refetch here cannot flash stale data.
    pub async fn add<C: TableClient>(
        &mut self,
        client: &C,
        kind: ConfigKind,
        name: &str,
    ) -> ResultStore<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Name cannot be empty.".to_string()));
        }

        let row = serde_json::json!({ "name": name });
        match client.insert(kind.table(), row).await {
            Ok(()) => {
                self.load(client, kind).await;
                Ok(name.to_string())
            }
            Err(TableError::Conflict(_)) => Err(StoreError::Duplicate(name.to_string())),
            Err(TableError::NotConnected) => Err(StoreError::NotConnected),
            Err(err) => Err(StoreError::Backend(err.to_string())),
        }
    }

    /// Deletes an option by id and re-fetches the list once. The caller
    /// renders a failure next to the option's display name.
    pub async fn remove<C: TableClient>(
        &mut self,
        client: &C,
        kind: ConfigKind,
        id: i64,
    ) -> ResultStore<()> {
        match client.delete(kind.table(), id).await {
            Ok(()) => {
                self.load(client, kind).await;
                Ok(())
            }
            Err(TableError::NotConnected) => Err(StoreError::NotConnected),
            Err(err) => Err(StoreError::Backend(err.to_string())),
        }
    }
}

/// Fills an unset dropdown selection with the first option, once.
///
/// A non-empty selection is user state and is never overwritten, even when
/// the option it names has since been deleted.
pub fn reconcile_default(selection: &mut String, options: &OptionsState) {
    if !selection.is_empty() || options.loading {
        return;
    }
    if let Some(first) = options.items.first() {
        *selection = first.name.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(names: &[&str]) -> OptionsState {
        OptionsState {
            items: names
                .iter()
                .enumerate()
                .map(|(i, name)| ConfigOption {
                    id: i as i64 + 1,
                    name: (*name).to_string(),
                })
                .collect(),
            loading: false,
            error: None,
        }
    }

    #[test]
    fn reconcile_fills_empty_selection_with_first_option() {
        let mut selection = String::new();
        reconcile_default(&mut selection, &ready(&["Brake Check", "Oil Change"]));
        assert_eq!(selection, "Brake Check");
    }

    #[test]
    fn reconcile_never_overwrites_user_choice() {
        let mut selection = "Oil Change".to_string();
        reconcile_default(&mut selection, &ready(&["Brake Check", "Oil Change"]));
        assert_eq!(selection, "Oil Change");
    }

    #[test]
    fn reconcile_waits_for_loading_to_finish() {
        let mut selection = String::new();
        let mut options = ready(&["Brake Check"]);
        options.loading = true;
        reconcile_default(&mut selection, &options);
        assert_eq!(selection, "");
    }

    #[test]
    fn reconcile_leaves_empty_selection_when_no_options() {
        let mut selection = String::new();
        reconcile_default(&mut selection, &ready(&[]));
        assert_eq!(selection, "");
    }
}
