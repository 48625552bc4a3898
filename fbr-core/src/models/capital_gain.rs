use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Holding-period / asset-class bucket of the capital gains form.
///
/// Each bucket is taxed at its own flat rate, never through the progressive
/// salary slabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapitalGainBucket {
    /// Immovable property held for up to one year.
    PropertyUpToOneYear,
    /// Immovable property held for two to three years.
    PropertyTwoToThreeYears,
    /// Immovable property held for four years or more.
    PropertyFourYearsPlus,
    /// Listed securities.
    Securities,
    Other,
}

impl CapitalGainBucket {
    /// Form field holding the gain for this bucket. The tax deducted at
    /// source and the loss carried forward use the `_tax_deducted` and
    /// `_carry_forward` suffixes on the same key.
    pub fn field_key(&self) -> &'static str {
        match self {
            Self::PropertyUpToOneYear => "property_1_year",
            Self::PropertyTwoToThreeYears => "property_2_3_years",
            Self::PropertyFourYearsPlus => "property_4_plus_years",
            Self::Securities => "securities",
            Self::Other => "other_capital_gains",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PropertyUpToOneYear => "property_up_to_one_year",
            Self::PropertyTwoToThreeYears => "property_two_to_three_years",
            Self::PropertyFourYearsPlus => "property_four_years_plus",
            Self::Securities => "securities",
            Self::Other => "other",
        }
    }

    /// Accepts both the bucket code and the form field key.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|b| b.as_str() == s || b.field_key() == s)
    }

    pub fn all() -> &'static [CapitalGainBucket] {
        &[
            Self::PropertyUpToOneYear,
            Self::PropertyTwoToThreeYears,
            Self::PropertyFourYearsPlus,
            Self::Securities,
            Self::Other,
        ]
    }
}

impl fmt::Display for CapitalGainBucket {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat statutory rate for one bucket in one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainRate {
    pub tax_year: String,
    pub bucket: CapitalGainBucket,
    pub rate: Decimal,
}
