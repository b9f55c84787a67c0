use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a service job was paid. The set is fixed; everything the operation
/// wants to configure lives in the config tables instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    #[default]
    Card,
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Mobile Pay")]
    MobilePay,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 4] = [
        PaymentMode::Card,
        PaymentMode::Cash,
        PaymentMode::BankTransfer,
        PaymentMode::MobilePay,
    ];

    /// Returns the label stored in the `paymentMode` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Cash => "Cash",
            Self::BankTransfer => "Bank Transfer",
            Self::MobilePay => "Mobile Pay",
        }
    }
}

pub mod config {
    use super::*;

    /// A named dropdown value owned by one of the two config tables.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ConfigOption {
        pub id: i64,
        pub name: String,
    }
}

pub mod service {
    use super::*;

    /// A logged service job as the backend returns it.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ServiceRecord {
        pub id: i64,
        pub registration_number: String,
        pub service_type: String,
        pub notes: Option<String>,
        pub amount: f64,
        pub payment_mode: PaymentMode,
        pub date_of_service: NaiveDate,
        pub recorded_by: String,
        pub created_at: DateTime<Utc>,
    }

    /// Insert payload; `id` and `createdAt` are assigned by the backend.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewServiceRecord {
        pub registration_number: String,
        pub service_type: String,
        pub notes: String,
        pub amount: f64,
        pub payment_mode: PaymentMode,
        pub date_of_service: NaiveDate,
        pub recorded_by: String,
    }
}

pub mod expense {
    use super::*;

    /// A logged operating expense as the backend returns it.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseRecord {
        pub id: i64,
        pub date_of_expense: NaiveDate,
        pub category: String,
        pub description: Option<String>,
        pub amount: f64,
        pub recorded_by: String,
        pub created_at: DateTime<Utc>,
    }

    /// Insert payload; `id` and `createdAt` are assigned by the backend.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewExpenseRecord {
        pub date_of_expense: NaiveDate,
        pub category: String,
        pub description: String,
        pub amount: f64,
        pub recorded_by: String,
    }
}
