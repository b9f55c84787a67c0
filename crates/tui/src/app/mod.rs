use std::time::Duration;

use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyEvent};

use api_types::{PaymentMode, expense::ExpenseRecord, service::ServiceRecord};
use store::{
    ConfigKind, ExpenseDraft, HistoryState, OptionsState, ServiceDraft, StoreError, Subscription,
    Table, TableClient, anonymous_user_id, reconcile_default,
};

use crate::{
    client::RestTableClient,
    config::AppConfig,
    error::Result,
    ui::{self, keymap::AppAction},
};

const MSG_NOT_CONNECTED: &str = "Not connected to the backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Service,
    Expenses,
    Config,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Service => "Service Entry",
            Self::Expenses => "Expense Tracking",
            Self::Config => "Configuration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceField {
    Registration,
    ServiceType,
    Notes,
    Amount,
    PaymentMode,
    Date,
}

impl ServiceField {
    fn next(self) -> Self {
        match self {
            Self::Registration => Self::ServiceType,
            Self::ServiceType => Self::Notes,
            Self::Notes => Self::Amount,
            Self::Amount => Self::PaymentMode,
            Self::PaymentMode => Self::Date,
            Self::Date => Self::Registration,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Registration => Self::Date,
            Self::ServiceType => Self::Registration,
            Self::Notes => Self::ServiceType,
            Self::Amount => Self::Notes,
            Self::PaymentMode => Self::Amount,
            Self::Date => Self::PaymentMode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Date,
    Category,
    Description,
    Amount,
}

impl ExpenseField {
    fn next(self) -> Self {
        match self {
            Self::Date => Self::Category,
            Self::Category => Self::Description,
            Self::Description => Self::Amount,
            Self::Amount => Self::Date,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Date => Self::Amount,
            Self::Category => Self::Date,
            Self::Description => Self::Category,
            Self::Amount => Self::Description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPane {
    ServiceTypes,
    ExpenseCategories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Error,
}

/// A message scoped to one form or list manager. The level, not the text,
/// is what tells success and failure apart in the UI.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct ConnectionState {
    pub ok: bool,
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct ServiceTabState {
    pub draft: ServiceDraft,
    pub focus: ServiceField,
    pub message: Option<StatusMessage>,
    pub history: HistoryState<ServiceRecord>,
}

#[derive(Debug)]
pub struct ExpenseTabState {
    pub draft: ExpenseDraft,
    pub focus: ExpenseField,
    pub message: Option<StatusMessage>,
    pub history: HistoryState<ExpenseRecord>,
}

#[derive(Debug, Default)]
pub struct ConfigPaneState {
    pub input: String,
    pub selected: usize,
    pub message: Option<StatusMessage>,
}

#[derive(Debug)]
pub struct ConfigTabState {
    pub focus: ConfigPane,
    pub service_types: ConfigPaneState,
    pub expense_categories: ConfigPaneState,
}

#[derive(Debug)]
pub struct AppState {
    pub section: Section,
    pub connection: ConnectionState,
    pub user_id: String,
    pub base_url: String,
    pub timezone: Tz,
    pub service_types: OptionsState,
    pub expense_categories: OptionsState,
    pub service: ServiceTabState,
    pub expense: ExpenseTabState,
    pub config_tab: ConfigTabState,
}

#[derive(Default)]
struct Subscriptions {
    services: Option<Subscription>,
    expenses: Option<Subscription>,
    config_services: Option<Subscription>,
    config_expenses: Option<Subscription>,
}

pub struct App {
    client: Option<RestTableClient>,
    subs: Subscriptions,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let timezone = match config.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("unknown timezone {:?}, falling back to UTC", config.timezone);
                chrono_tz::UTC
            }
        };

        let (client, connection) = match RestTableClient::new(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(config.poll_secs.max(1)),
        ) {
            Ok(client) => (
                Some(client),
                ConnectionState {
                    ok: true,
                    detail: None,
                },
            ),
            Err(err) => {
                tracing::error!("failed to initialize backend client: {err}");
                (
                    None,
                    ConnectionState {
                        ok: false,
                        detail: Some(err.to_string()),
                    },
                )
            }
        };

        let state = AppState {
            section: Section::Service,
            connection,
            user_id: anonymous_user_id(config.deployment_id.as_deref()),
            base_url: config.base_url.clone(),
            timezone,
            service_types: OptionsState::default(),
            expense_categories: OptionsState::default(),
            service: ServiceTabState {
                draft: ServiceDraft::new(),
                focus: ServiceField::Registration,
                message: None,
                history: HistoryState::default(),
            },
            expense: ExpenseTabState {
                draft: ExpenseDraft::new(),
                focus: ExpenseField::Date,
                message: None,
                history: HistoryState::default(),
            },
            config_tab: ConfigTabState {
                focus: ConfigPane::ServiceTypes,
                service_types: ConfigPaneState::default(),
                expense_categories: ConfigPaneState::default(),
            },
        };

        Self {
            client,
            subs: Subscriptions::default(),
            state,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);
        self.initial_load().await;

        while !self.should_quit {
            self.drain_changes().await;

            terminal.draw(|frame| ui::render(frame, &self.state))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key).await,
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// First fetch plus one change subscription per watched table. With no
    /// client, reads refuse too: every view is put into the connection-error
    /// state instead of pretending to be empty.
    async fn initial_load(&mut self) {
        let Some(client) = self.client.clone() else {
            let detail = self
                .state
                .connection
                .detail
                .clone()
                .unwrap_or_else(|| MSG_NOT_CONNECTED.to_string());
            for options in [
                &mut self.state.service_types,
                &mut self.state.expense_categories,
            ] {
                options.loading = false;
                options.error = Some(detail.clone());
            }
            self.state.service.history.loading = false;
            self.state.service.history.error = Some(detail.clone());
            self.state.expense.history.loading = false;
            self.state.expense.history.error = Some(detail);
            return;
        };

        self.state
            .service_types
            .load(&client, ConfigKind::ServiceTypes)
            .await;
        self.state
            .expense_categories
            .load(&client, ConfigKind::ExpenseCategories)
            .await;
        reconcile_default(
            &mut self.state.service.draft.service_type,
            &self.state.service_types,
        );
        reconcile_default(
            &mut self.state.expense.draft.category,
            &self.state.expense_categories,
        );

        self.state
            .service
            .history
            .load(&client, Table::ServiceJobs)
            .await;
        self.state.expense.history.load(&client, Table::Expenses).await;

        self.subs = Subscriptions {
            services: Some(client.subscribe(Table::ServiceJobs)),
            expenses: Some(client.subscribe(Table::Expenses)),
            config_services: Some(client.subscribe(Table::ConfigServices)),
            config_expenses: Some(client.subscribe(Table::ConfigExpenses)),
        };
    }

    /// One bounded re-fetch per table whose change channel yielded since the
    /// last iteration. Fetches are awaited here, on the UI task, so re-fetch
    /// results always apply in request order.
    async fn drain_changes(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };

        if self
            .subs
            .config_services
            .as_mut()
            .is_some_and(|sub| sub.drain())
        {
            self.state
                .service_types
                .load(&client, ConfigKind::ServiceTypes)
                .await;
            reconcile_default(
                &mut self.state.service.draft.service_type,
                &self.state.service_types,
            );
            self.clamp_config_selections();
        }
        if self
            .subs
            .config_expenses
            .as_mut()
            .is_some_and(|sub| sub.drain())
        {
            self.state
                .expense_categories
                .load(&client, ConfigKind::ExpenseCategories)
                .await;
            reconcile_default(
                &mut self.state.expense.draft.category,
                &self.state.expense_categories,
            );
            self.clamp_config_selections();
        }
        if self.subs.services.as_mut().is_some_and(|sub| sub.drain()) {
            self.state
                .service
                .history
                .load(&client, Table::ServiceJobs)
                .await;
        }
        if self.subs.expenses.as_mut().is_some_and(|sub| sub.drain()) {
            self.state.expense.history.load(&client, Table::Expenses).await;
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        match ui::keymap::map_key(key) {
            AppAction::Quit => self.should_quit = true,
            AppAction::Function(1) => self.state.section = Section::Service,
            AppAction::Function(2) => self.state.section = Section::Expenses,
            AppAction::Function(3) => self.state.section = Section::Config,
            AppAction::Function(_) => {}
            AppAction::Refresh => self.refresh_all().await,
            action => match self.state.section {
                Section::Service => self.handle_service_key(action).await,
                Section::Expenses => self.handle_expense_key(action).await,
                Section::Config => self.handle_config_key(action).await,
            },
        }
    }

    async fn refresh_all(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };
        self.state
            .service_types
            .load(&client, ConfigKind::ServiceTypes)
            .await;
        self.state
            .expense_categories
            .load(&client, ConfigKind::ExpenseCategories)
            .await;
        reconcile_default(
            &mut self.state.service.draft.service_type,
            &self.state.service_types,
        );
        reconcile_default(
            &mut self.state.expense.draft.category,
            &self.state.expense_categories,
        );
        self.state
            .service
            .history
            .load(&client, Table::ServiceJobs)
            .await;
        self.state.expense.history.load(&client, Table::Expenses).await;
        self.clamp_config_selections();
    }

    // --- Service tab ---

    async fn handle_service_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField => {
                self.state.service.focus = self.state.service.focus.next();
            }
            AppAction::PrevField => {
                self.state.service.focus = self.state.service.focus.prev();
            }
            AppAction::Up | AppAction::Left => self.cycle_service_select(-1),
            AppAction::Down | AppAction::Right => self.cycle_service_select(1),
            AppAction::Submit => self.submit_service().await,
            AppAction::Backspace => self.service_backspace(),
            AppAction::Cancel => self.state.service.message = None,
            AppAction::Input(ch) => self.service_input(ch),
            _ => {}
        }
    }

    fn service_input(&mut self, ch: char) {
        let draft = &mut self.state.service.draft;
        match self.state.service.focus {
            ServiceField::Registration => draft.registration.push(ch),
            ServiceField::Notes => draft.notes.push(ch),
            ServiceField::Date => draft.date_of_service.push(ch),
            ServiceField::Amount => {
                let mut raw = draft.amount.clone();
                raw.push(ch);
                draft.set_amount(&raw);
            }
            ServiceField::ServiceType | ServiceField::PaymentMode => {}
        }
    }

    fn service_backspace(&mut self) {
        let draft = &mut self.state.service.draft;
        match self.state.service.focus {
            ServiceField::Registration => {
                draft.registration.pop();
            }
            ServiceField::Notes => {
                draft.notes.pop();
            }
            ServiceField::Date => {
                draft.date_of_service.pop();
            }
            ServiceField::Amount => {
                let mut raw = draft.amount.clone();
                raw.pop();
                draft.set_amount(&raw);
            }
            ServiceField::ServiceType | ServiceField::PaymentMode => {}
        }
    }

    fn cycle_service_select(&mut self, step: isize) {
        match self.state.service.focus {
            ServiceField::ServiceType => Self::cycle_option(
                &self.state.service_types,
                &mut self.state.service.draft.service_type,
                step,
            ),
            ServiceField::PaymentMode => {
                let modes = PaymentMode::ALL;
                let current = modes
                    .iter()
                    .position(|mode| *mode == self.state.service.draft.payment_mode)
                    .unwrap_or(0) as isize;
                let next = (current + step).rem_euclid(modes.len() as isize) as usize;
                self.state.service.draft.payment_mode = modes[next];
            }
            _ => {}
        }
    }

    async fn submit_service(&mut self) {
        self.state.service.message = None;
        // Both disabled states: no connection, or nothing to select from.
        if self.state.service_types.items.is_empty() {
            return;
        }
        let Some(client) = self.client.clone() else {
            self.state.service.message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            return;
        };

        match self
            .state
            .service
            .draft
            .submit(&client, &self.state.user_id)
            .await
        {
            Ok(()) => {
                self.state.service.message =
                    Some(StatusMessage::success("Service entry successfully recorded."));
            }
            Err(err) => self.state.service.message = Some(submit_failure("service", err)),
        }
    }

    // --- Expense tab ---

    async fn handle_expense_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField => {
                self.state.expense.focus = self.state.expense.focus.next();
            }
            AppAction::PrevField => {
                self.state.expense.focus = self.state.expense.focus.prev();
            }
            AppAction::Up | AppAction::Left => self.cycle_expense_select(-1),
            AppAction::Down | AppAction::Right => self.cycle_expense_select(1),
            AppAction::Submit => self.submit_expense().await,
            AppAction::Backspace => self.expense_backspace(),
            AppAction::Cancel => self.state.expense.message = None,
            AppAction::Input(ch) => self.expense_input(ch),
            _ => {}
        }
    }

    fn expense_input(&mut self, ch: char) {
        let draft = &mut self.state.expense.draft;
        match self.state.expense.focus {
            ExpenseField::Date => draft.date_of_expense.push(ch),
            ExpenseField::Description => draft.description.push(ch),
            ExpenseField::Amount => {
                let mut raw = draft.amount.clone();
                raw.push(ch);
                draft.set_amount(&raw);
            }
            ExpenseField::Category => {}
        }
    }

    fn expense_backspace(&mut self) {
        let draft = &mut self.state.expense.draft;
        match self.state.expense.focus {
            ExpenseField::Date => {
                draft.date_of_expense.pop();
            }
            ExpenseField::Description => {
                draft.description.pop();
            }
            ExpenseField::Amount => {
                let mut raw = draft.amount.clone();
                raw.pop();
                draft.set_amount(&raw);
            }
            ExpenseField::Category => {}
        }
    }

    fn cycle_expense_select(&mut self, step: isize) {
        if self.state.expense.focus == ExpenseField::Category {
            Self::cycle_option(
                &self.state.expense_categories,
                &mut self.state.expense.draft.category,
                step,
            );
        }
    }

    async fn submit_expense(&mut self) {
        self.state.expense.message = None;
        if self.state.expense_categories.items.is_empty() {
            return;
        }
        let Some(client) = self.client.clone() else {
            self.state.expense.message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            return;
        };

        match self
            .state
            .expense
            .draft
            .submit(&client, &self.state.user_id)
            .await
        {
            Ok(()) => {
                self.state.expense.message =
                    Some(StatusMessage::success("Expense entry successfully recorded."));
            }
            Err(err) => self.state.expense.message = Some(submit_failure("expense", err)),
        }
    }

    // --- Configuration tab ---

    async fn handle_config_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField | AppAction::PrevField | AppAction::Left | AppAction::Right => {
                self.state.config_tab.focus = match self.state.config_tab.focus {
                    ConfigPane::ServiceTypes => ConfigPane::ExpenseCategories,
                    ConfigPane::ExpenseCategories => ConfigPane::ServiceTypes,
                };
            }
            AppAction::Up => self.move_config_selection(-1),
            AppAction::Down => self.move_config_selection(1),
            AppAction::Submit => self.add_config_option().await,
            AppAction::Delete => self.delete_config_option().await,
            AppAction::Backspace => {
                let pane = self.focused_pane_mut();
                pane.input.pop();
                pane.message = None;
            }
            AppAction::Cancel => {
                self.state.config_tab.service_types.message = None;
                self.state.config_tab.expense_categories.message = None;
            }
            AppAction::Input(ch) => {
                let pane = self.focused_pane_mut();
                pane.input.push(ch);
                pane.message = None;
            }
            _ => {}
        }
    }

    fn focused_pane_mut(&mut self) -> &mut ConfigPaneState {
        match self.state.config_tab.focus {
            ConfigPane::ServiceTypes => &mut self.state.config_tab.service_types,
            ConfigPane::ExpenseCategories => &mut self.state.config_tab.expense_categories,
        }
    }

    fn focused_len(&self) -> usize {
        match self.state.config_tab.focus {
            ConfigPane::ServiceTypes => self.state.service_types.items.len(),
            ConfigPane::ExpenseCategories => self.state.expense_categories.items.len(),
        }
    }

    fn move_config_selection(&mut self, step: isize) {
        let len = self.focused_len();
        if len == 0 {
            return;
        }
        let pane = self.focused_pane_mut();
        let next = pane.selected as isize + step;
        pane.selected = next.clamp(0, len as isize - 1) as usize;
    }

    fn clamp_config_selections(&mut self) {
        let service_len = self.state.service_types.items.len();
        let expense_len = self.state.expense_categories.items.len();
        let service_pane = &mut self.state.config_tab.service_types;
        service_pane.selected = service_pane.selected.min(service_len.saturating_sub(1));
        let expense_pane = &mut self.state.config_tab.expense_categories;
        expense_pane.selected = expense_pane.selected.min(expense_len.saturating_sub(1));
    }

    async fn add_config_option(&mut self) {
        let Some(client) = self.client.clone() else {
            self.focused_pane_mut().message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            return;
        };

        let focus = self.state.config_tab.focus;
        let state = &mut self.state;
        let (kind, options, pane, selection) = match focus {
            ConfigPane::ServiceTypes => (
                ConfigKind::ServiceTypes,
                &mut state.service_types,
                &mut state.config_tab.service_types,
                &mut state.service.draft.service_type,
            ),
            ConfigPane::ExpenseCategories => (
                ConfigKind::ExpenseCategories,
                &mut state.expense_categories,
                &mut state.config_tab.expense_categories,
                &mut state.expense.draft.category,
            ),
        };

        pane.message = None;
        let name = pane.input.clone();
        match options.add(&client, kind, &name).await {
            Ok(added) => {
                pane.input.clear();
                pane.message =
                    Some(StatusMessage::success(format!("Successfully added \"{added}\".")));
                reconcile_default(selection, options);
            }
            Err(StoreError::Validation(msg)) => pane.message = Some(StatusMessage::error(msg)),
            Err(StoreError::Duplicate(taken)) => {
                pane.message = Some(StatusMessage::error(format!("\"{taken}\" already exists.")));
            }
            Err(StoreError::NotConnected) => {
                pane.message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            }
            Err(StoreError::Backend(msg)) => {
                pane.message =
                    Some(StatusMessage::error(format!("Failed to add \"{}\": {msg}", name.trim())));
            }
        }
        self.clamp_config_selections();
    }

    async fn delete_config_option(&mut self) {
        let Some(client) = self.client.clone() else {
            self.focused_pane_mut().message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            return;
        };

        let focus = self.state.config_tab.focus;
        let state = &mut self.state;
        let (kind, options, pane) = match focus {
            ConfigPane::ServiceTypes => (
                ConfigKind::ServiceTypes,
                &mut state.service_types,
                &mut state.config_tab.service_types,
            ),
            ConfigPane::ExpenseCategories => (
                ConfigKind::ExpenseCategories,
                &mut state.expense_categories,
                &mut state.config_tab.expense_categories,
            ),
        };

        let Some(option) = options.items.get(pane.selected) else {
            return;
        };
        let (id, name) = (option.id, option.name.clone());

        pane.message = None;
        match options.remove(&client, kind, id).await {
            Ok(()) => {
                pane.message =
                    Some(StatusMessage::success(format!("Successfully deleted \"{name}\".")));
            }
            Err(StoreError::NotConnected) => {
                pane.message = Some(StatusMessage::error(MSG_NOT_CONNECTED));
            }
            Err(err) => {
                pane.message =
                    Some(StatusMessage::error(format!("Failed to delete \"{name}\": {err}")));
            }
        }
        self.clamp_config_selections();
    }

    fn cycle_option(options: &OptionsState, selection: &mut String, step: isize) {
        if options.items.is_empty() {
            return;
        }
        let len = options.items.len() as isize;
        let next = match options.items.iter().position(|o| o.name == *selection) {
            Some(current) => (current as isize + step).rem_euclid(len) as usize,
            None => 0,
        };
        *selection = options.items[next].name.clone();
    }
}

fn submit_failure(noun: &str, err: StoreError) -> StatusMessage {
    match err {
        StoreError::Validation(msg) => StatusMessage::error(msg),
        StoreError::Duplicate(taken) => {
            StatusMessage::error(format!("\"{taken}\" already exists."))
        }
        StoreError::NotConnected => StatusMessage::error(MSG_NOT_CONNECTED),
        StoreError::Backend(msg) => {
            StatusMessage::error(format!("Failed to record {noun}: {msg}"))
        }
    }
}
