//! Raw form input as it comes out of storage or a request body.
//!
//! Every form category is a flat map of field name to [`FieldValue`]. Values
//! are deliberately loose: the store hands back numeric columns as strings,
//! older rows carry numbers, and untouched fields are `null` or absent. The
//! only way to turn a value into money is [`crate::money::to_money`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single form field as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Amount(Decimal),
    Text(String),
    Null,
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Amount(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Amount(Decimal::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Amount(Decimal::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Flat field map for one form category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, FieldValue>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and fixtures.
    pub fn with(
        mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        self.0.insert(field.into(), value.into());
    }

    /// The raw value, treating an explicit `null` the same as an absent key.
    pub fn get(
        &self,
        field: &str,
    ) -> Option<&FieldValue> {
        match self.0.get(field) {
            Some(FieldValue::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Every form of one tax return.
///
/// A missing category deserializes to an empty map, so all downstream code
/// sees a fully shaped input and treats the category as all-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxFormData {
    pub income: FormFields,
    pub adjustable_tax: FormFields,
    pub reductions: FormFields,
    pub credits: FormFields,
    pub deductions: FormFields,
    pub final_tax: FormFields,
    pub capital_gain: FormFields,
}

/// Identifies a form category in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormCategory {
    Income,
    AdjustableTax,
    Reductions,
    Credits,
    Deductions,
    FinalTax,
    CapitalGain,
}

impl FormCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::AdjustableTax => "adjustable_tax",
            Self::Reductions => "reductions",
            Self::Credits => "credits",
            Self::Deductions => "deductions",
            Self::FinalTax => "final_tax",
            Self::CapitalGain => "capital_gain",
        }
    }
}

impl TaxFormData {
    pub fn form(
        &self,
        category: FormCategory,
    ) -> &FormFields {
        match category {
            FormCategory::Income => &self.income,
            FormCategory::AdjustableTax => &self.adjustable_tax,
            FormCategory::Reductions => &self.reductions,
            FormCategory::Credits => &self.credits,
            FormCategory::Deductions => &self.deductions,
            FormCategory::FinalTax => &self.final_tax,
            FormCategory::CapitalGain => &self.capital_gain,
        }
    }
}
