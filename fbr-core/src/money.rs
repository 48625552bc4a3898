//! The coercion boundary between loosely typed form fields and money.
//!
//! Every amount the engine adds up passes through [`parse_money`] (or its
//! defaulting wrapper [`to_money`]). Text is parsed to a [`Decimal`] before
//! any arithmetic happens, so two stored strings can never be joined as text.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FieldValue, FormCategory};

/// Largest amount a single field may hold: 10^15 rupees.
///
/// Any sum or rate product of such amounts stays well inside [`Decimal`].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Why a field value could not be used as a non-negative amount.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoneyError {
    #[error("'{0}' is not a number")]
    Invalid(String),

    #[error("amount {0} is negative")]
    Negative(Decimal),

    #[error("amount {0} is larger than {max}", max = MAX_AMOUNT)]
    TooLarge(Decimal),

    #[error("total is out of range")]
    Overflow,
}

/// Trims whitespace and drops thousands separators and a leading `Rs`.
fn normalize_money_input(s: &str) -> String {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_prefix("Rs.")
        .or_else(|| trimmed.strip_prefix("Rs"))
        .or_else(|| trimmed.strip_prefix("PKR"))
        .unwrap_or(trimmed);
    trimmed.trim().replace(',', "")
}

/// Parses a field value as a non-negative amount.
///
/// `null`, absent and blank values are 0. Anything else must parse as a
/// decimal between 0 and [`MAX_AMOUNT`].
pub fn parse_money(value: Option<&FieldValue>) -> Result<Decimal, MoneyError> {
    let amount = match value {
        None | Some(FieldValue::Null) => return Ok(Decimal::ZERO),
        Some(FieldValue::Amount(amount)) => *amount,
        Some(FieldValue::Text(text)) => {
            let normalized = normalize_money_input(text);
            if normalized.is_empty() {
                return Ok(Decimal::ZERO);
            }
            normalized
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&normalized))
                .map_err(|_| MoneyError::Invalid(text.clone()))?
        }
    };

    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if amount.is_sign_negative() {
        return Err(MoneyError::Negative(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(MoneyError::TooLarge(amount));
    }
    Ok(amount)
}

/// Parses a field value as money, defaulting to 0 when it is unusable.
///
/// Failures are logged so bad upstream data stays visible.
pub fn to_money(value: Option<&FieldValue>) -> Decimal {
    parse_money(value).unwrap_or_else(|error| {
        tracing::warn!(%error, "unusable amount treated as 0");
        Decimal::ZERO
    })
}

/// A field that had to be coerced to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIssue {
    pub category: FormCategory,
    pub field: String,
    pub error: MoneyError,
}
