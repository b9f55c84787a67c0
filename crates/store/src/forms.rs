//! Entry-form drafts: field capture, validation, submission, reset.

use api_types::{PaymentMode, expense::NewExpenseRecord, service::NewServiceRecord};
use chrono::{Local, NaiveDate};

use crate::{
    ResultStore, StoreError,
    client::{Table, TableClient, TableError},
};

pub const MSG_REQUIRED_SERVICE: &str = "Please fill in required service fields.";
pub const MSG_REQUIRED_EXPENSE: &str = "Please fill in Date, Category, and Amount.";
pub const MSG_POSITIVE_AMOUNT: &str = "Amount must be a positive number.";
pub const MSG_BAD_DATE: &str = "Date must be in YYYY-MM-DD format.";

fn today() -> String {
    Local::now().date_naive().to_string()
}

/// Amount capture rule shared by both forms: an input that does not parse as
/// a finite float collapses to the empty-string sentinel, so the field stays
/// editable instead of holding a NaN.
fn capture_amount(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => raw.to_string(),
        _ => String::new(),
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_date(raw: &str) -> ResultStore<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| StoreError::Validation(MSG_BAD_DATE.to_string()))
}

fn positive_amount(raw: &str) -> ResultStore<f64> {
    parse_amount(raw)
        .filter(|value| *value > 0.0)
        .ok_or_else(|| StoreError::Validation(MSG_POSITIVE_AMOUNT.to_string()))
}

async fn insert_record<C: TableClient>(
    client: &C,
    table: Table,
    row: serde_json::Value,
) -> ResultStore<()> {
    match client.insert(table, row).await {
        Ok(()) => Ok(()),
        Err(TableError::NotConnected) => Err(StoreError::NotConnected),
        Err(err) => Err(StoreError::Backend(err.to_string())),
    }
}

/// Draft of a service job being composed.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDraft {
    pub registration: String,
    pub service_type: String,
    pub notes: String,
    pub amount: String,
    pub payment_mode: PaymentMode,
    pub date_of_service: String,
}

impl ServiceDraft {
    pub fn new() -> Self {
        Self {
            registration: String::new(),
            service_type: String::new(),
            notes: String::new(),
            amount: String::new(),
            payment_mode: PaymentMode::default(),
            date_of_service: today(),
        }
    }

    pub fn set_amount(&mut self, raw: &str) {
        self.amount = capture_amount(raw);
    }

    pub fn amount_value(&self) -> Option<f64> {
        parse_amount(&self.amount)
    }

    fn validate(&self) -> ResultStore<(f64, NaiveDate)> {
        if self.registration.trim().is_empty()
            || self.service_type.is_empty()
            || self.date_of_service.trim().is_empty()
        {
            return Err(StoreError::Validation(MSG_REQUIRED_SERVICE.to_string()));
        }
        let amount = positive_amount(&self.amount)?;
        let date = parse_date(&self.date_of_service)?;
        Ok((amount, date))
    }

    /// Validates and normalizes the draft into an insert payload.
    pub fn build(&self, recorded_by: &str) -> ResultStore<NewServiceRecord> {
        let (amount, date_of_service) = self.validate()?;
        Ok(NewServiceRecord {
            registration_number: self.registration.trim().to_uppercase(),
            service_type: self.service_type.clone(),
            notes: self.notes.trim().to_string(),
            amount,
            payment_mode: self.payment_mode,
            date_of_service,
            recorded_by: recorded_by.to_string(),
        })
    }

    /// Validates, inserts exactly one row, and on success resets the draft
    /// while keeping the selected service type.
    pub async fn submit<C: TableClient>(
        &mut self,
        client: &C,
        recorded_by: &str,
    ) -> ResultStore<()> {
        let record = self.build(recorded_by)?;
        let row = serde_json::to_value(&record).map_err(|err| StoreError::Backend(err.to_string()))?;
        insert_record(client, Table::ServiceJobs, row).await?;
        self.reset();
        Ok(())
    }

    /// Back to defaults, preserving the dropdown selection so repeated
    /// entries of the same kind need no re-selection.
    pub fn reset(&mut self) {
        let service_type = std::mem::take(&mut self.service_type);
        *self = Self::new();
        self.service_type = service_type;
    }
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Draft of an expense being composed.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub date_of_expense: String,
    pub category: String,
    pub description: String,
    pub amount: String,
}

impl ExpenseDraft {
    pub fn new() -> Self {
        Self {
            date_of_expense: today(),
            category: String::new(),
            description: String::new(),
            amount: String::new(),
        }
    }

    pub fn set_amount(&mut self, raw: &str) {
        self.amount = capture_amount(raw);
    }

    pub fn amount_value(&self) -> Option<f64> {
        parse_amount(&self.amount)
    }

    fn validate(&self) -> ResultStore<(f64, NaiveDate)> {
        if self.date_of_expense.trim().is_empty() || self.category.is_empty() {
            return Err(StoreError::Validation(MSG_REQUIRED_EXPENSE.to_string()));
        }
        let amount = positive_amount(&self.amount)?;
        let date = parse_date(&self.date_of_expense)?;
        Ok((amount, date))
    }

    pub fn build(&self, recorded_by: &str) -> ResultStore<NewExpenseRecord> {
        let (amount, date_of_expense) = self.validate()?;
        Ok(NewExpenseRecord {
            date_of_expense,
            category: self.category.clone(),
            description: self.description.trim().to_string(),
            amount,
            recorded_by: recorded_by.to_string(),
        })
    }

    pub async fn submit<C: TableClient>(
        &mut self,
        client: &C,
        recorded_by: &str,
    ) -> ResultStore<()> {
        let record = self.build(recorded_by)?;
        let row = serde_json::to_value(&record).map_err(|err| StoreError::Backend(err.to_string()))?;
        insert_record(client, Table::Expenses, row).await?;
        self.reset();
        Ok(())
    }

    /// Back to defaults, preserving the selected category.
    pub fn reset(&mut self) {
        let category = std::mem::take(&mut self.category);
        *self = Self::new();
        self.category = category;
    }
}

impl Default for ExpenseDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_service() -> ServiceDraft {
        let mut draft = ServiceDraft::new();
        draft.registration = "ka-01 ab 1234".to_string();
        draft.service_type = "Oil Change".to_string();
        draft.notes = "  replaced filter  ".to_string();
        draft.set_amount("450.50");
        draft
    }

    #[test]
    fn amount_capture_collapses_garbage_to_sentinel() {
        let mut draft = ServiceDraft::new();
        draft.set_amount("450.50");
        assert_eq!(draft.amount, "450.50");
        draft.set_amount("450.50x");
        assert_eq!(draft.amount, "");
        draft.set_amount("abc");
        assert_eq!(draft.amount, "");
        draft.set_amount("");
        assert_eq!(draft.amount, "");
        draft.set_amount("nan");
        assert_eq!(draft.amount, "");
    }

    #[test]
    fn build_normalizes_registration_and_notes() {
        let record = filled_service().build("garage-7-anon-user").unwrap();
        assert_eq!(record.registration_number, "KA-01 AB 1234");
        assert_eq!(record.notes, "replaced filter");
        assert_eq!(record.amount, 450.50);
        assert_eq!(record.recorded_by, "garage-7-anon-user");
    }

    #[test]
    fn missing_required_fields_reported_before_amount() {
        let mut draft = filled_service();
        draft.registration = "   ".to_string();
        draft.amount = String::new();
        assert_eq!(
            draft.build("u"),
            Err(StoreError::Validation(MSG_REQUIRED_SERVICE.to_string()))
        );
    }

    #[test]
    fn non_positive_amounts_rejected() {
        for raw in ["", "0", "-12.5", "not a number"] {
            let mut draft = filled_service();
            draft.set_amount(raw);
            assert_eq!(
                draft.build("u"),
                Err(StoreError::Validation(MSG_POSITIVE_AMOUNT.to_string())),
                "amount {raw:?}"
            );
        }
    }

    #[test]
    fn malformed_date_rejected() {
        let mut draft = filled_service();
        draft.date_of_service = "31-12-2026".to_string();
        assert_eq!(
            draft.build("u"),
            Err(StoreError::Validation(MSG_BAD_DATE.to_string()))
        );
    }

    #[test]
    fn reset_preserves_dropdown_selection_only() {
        let mut draft = filled_service();
        draft.reset();
        let mut expected = ServiceDraft::new();
        expected.service_type = "Oil Change".to_string();
        assert_eq!(draft, expected);
    }

    #[test]
    fn expense_requires_category_and_date() {
        let mut draft = ExpenseDraft::new();
        draft.set_amount("100");
        assert_eq!(
            draft.build("u"),
            Err(StoreError::Validation(MSG_REQUIRED_EXPENSE.to_string()))
        );
    }

    #[test]
    fn expense_reset_preserves_category() {
        let mut draft = ExpenseDraft::new();
        draft.category = "Utilities".to_string();
        draft.description = "power bill".to_string();
        draft.set_amount("1200");
        draft.reset();
        let mut expected = ExpenseDraft::new();
        expected.category = "Utilities".to_string();
        assert_eq!(draft, expected);
    }
}
