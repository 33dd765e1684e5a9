//! Transaction records and input validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::category;
use crate::error::ErrorKind;

/// Maximum length of a transaction description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Direction of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(TransactionError::UnknownType(other.to_string())),
        }
    }
}

/// Transaction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount too large or too precise to store.
    #[error("Amount {0} is out of range: at most 999999999999999.9999 with 4 decimal places")]
    AmountOutOfRange(Decimal),

    /// Category name unusable.
    #[error("Invalid category '{name}': {reason}")]
    InvalidCategory {
        /// Offending name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Description too long.
    #[error("Description must be at most {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,

    /// Type is neither income nor expense.
    #[error("Unknown transaction type '{0}': expected income or expense")]
    UnknownType(String),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),
}

impl TransactionError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

/// A stored transaction.
///
/// `amount` is always positive; `transaction_type` carries the sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: Uuid,
    /// Date the money moved.
    pub date: NaiveDate,
    /// Positive amount.
    pub amount: Decimal,
    /// Category name.
    pub category: String,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Family member it belongs to.
    pub family_member: Option<String>,
    /// Optional note.
    pub description: Option<String>,
    /// Creating user; `None` for guest entries.
    pub created_by: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a new record from validated input.
    #[must_use]
    pub fn from_input(input: TransactionInput, created_by: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            date: input.date,
            amount: input.amount,
            category: input.category,
            transaction_type: input.transaction_type,
            family_member: input.family_member,
            description: input.description,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields with validated input.
    pub fn apply_edit(&mut self, input: TransactionInput, now: DateTime<Utc>) {
        self.date = input.date;
        self.amount = input.amount;
        self.category = input.category;
        self.transaction_type = input.transaction_type;
        self.family_member = input.family_member;
        self.description = input.description;
        self.updated_at = now;
    }

    /// Amount with the sign of its type.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Create/edit payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionInput {
    /// Date the money moved.
    pub date: NaiveDate,
    /// Positive amount.
    pub amount: Decimal,
    /// Category name.
    pub category: String,
    /// Income or expense.
    #[serde(rename = "type", alias = "transaction_type")]
    pub transaction_type: TransactionType,
    /// Family member.
    #[serde(default)]
    pub family_member: Option<String>,
    /// Optional note.
    #[serde(default)]
    pub description: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TransactionInput {
    /// Checks the input and normalizes whitespace.
    pub fn validate(self) -> Result<Self, TransactionError> {
        if self.amount <= Decimal::ZERO {
            return Err(TransactionError::NonPositiveAmount(self.amount));
        }
        if self.amount > category::MAX_MONTHLY_LIMIT
            || self.amount.normalize().scale() > category::LIMIT_SCALE
        {
            return Err(TransactionError::AmountOutOfRange(self.amount));
        }
        let category = category::normalize_category_name(&self.category).map_err(|e| {
            TransactionError::InvalidCategory {
                name: self.category.clone(),
                reason: e.to_string(),
            }
        })?;
        let description = trimmed(self.description);
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(TransactionError::DescriptionTooLong);
        }

        Ok(Self {
            category,
            family_member: trimmed(self.family_member),
            description,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(amount: Decimal, category: &str) -> TransactionInput {
        TransactionInput {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            amount,
            category: category.into(),
            transaction_type: TransactionType::Expense,
            family_member: Some("  ".into()),
            description: Some(" lunch ".into()),
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let valid = input(dec!(12.50), " Food ").validate().unwrap();
        assert_eq!(valid.category, "Food");
        assert_eq!(valid.family_member, None);
        assert_eq!(valid.description.as_deref(), Some("lunch"));
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert_eq!(
            input(dec!(0), "Food").validate(),
            Err(TransactionError::NonPositiveAmount(dec!(0)))
        );
        assert!(input(dec!(-3), "Food").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_amount_out_of_range() {
        for amount in [Decimal::MAX, dec!(1000000000000000), dec!(0.00001)] {
            assert_eq!(
                input(amount, "Food").validate(),
                Err(TransactionError::AmountOutOfRange(amount))
            );
        }
        assert!(input(category::MAX_MONTHLY_LIMIT, "Food").validate().is_ok());
        assert!(input(dec!(0.0001), "Food").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_category() {
        let err = input(dec!(1), " ").validate().unwrap_err();
        assert!(matches!(err, TransactionError::InvalidCategory { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("Income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_signed_amount() {
        let tx = Transaction::from_input(input(dec!(10), "Food").validate().unwrap(), None, Utc::now());
        assert_eq!(tx.signed_amount(), dec!(-10));
    }

    #[test]
    fn test_input_json_uses_type_key() {
        let parsed: TransactionInput = serde_json::from_str(
            r#"{"date":"2026-01-05","amount":"9.99","category":"Food","type":"income"}"#,
        )
        .unwrap();
        assert_eq!(parsed.transaction_type, TransactionType::Income);
        assert_eq!(parsed.amount, dec!(9.99));
    }
}
