//! Flat-rate tax on capital gains.
//!
//! Gains never go through the salary slabs. Each bucket's taxable amount
//! (gain less carried-forward loss) is charged at the bucket's statutory rate
//! for the tax year.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::TaxEngineError;
use crate::calculations::aggregator::CapitalGainAggregate;
use crate::calculations::common::round_half_up;
use crate::models::CapitalGainBucket;
use crate::rates::TaxRateProvider;

/// Tax charged on one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainTax {
    pub bucket: CapitalGainBucket,
    pub taxable_amount: Decimal,
    /// Fractional rate applied; 0 for a bucket with nothing to tax.
    pub rate: Decimal,
    pub tax: Decimal,
    /// Withheld at source. Reported only, not netted against `tax`.
    pub tax_deducted: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainSummary {
    pub buckets: Vec<CapitalGainTax>,
    pub total_taxable_amount: Decimal,
    pub total_tax: Decimal,
    pub total_tax_deducted: Decimal,
}

/// Applies each bucket's configured rate.
///
/// Buckets with a zero taxable amount are reported without looking up a
/// rate, so a year that never configured a bucket still computes as long as
/// nothing was declared in it.
///
/// # Errors
///
/// [`TaxEngineError::ConfigurationNotFound`] when a bucket has a taxable
/// amount but no rate for `tax_year`.
pub fn compute_capital_gains<P: TaxRateProvider + ?Sized>(
    gains: &[CapitalGainAggregate],
    tax_year: &str,
    rates: &P,
) -> Result<CapitalGainSummary, TaxEngineError> {
    let mut summary = CapitalGainSummary::default();

    for gain in gains {
        let rate = if gain.taxable_amount > Decimal::ZERO {
            rates.capital_gain_rate(tax_year, gain.bucket)?
        } else {
            Decimal::ZERO
        };
        let tax = round_half_up(gain.taxable_amount * rate);

        summary.total_taxable_amount += gain.taxable_amount;
        summary.total_tax += tax;
        summary.total_tax_deducted += gain.tax_deducted;
        summary.buckets.push(CapitalGainTax {
            bucket: gain.bucket,
            taxable_amount: gain.taxable_amount,
            rate,
            tax,
            tax_deducted: gain.tax_deducted,
        });
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::fixtures::{TAX_YEAR, rate_book};
    use crate::rates::RateBook;

    fn gain(
        bucket: CapitalGainBucket,
        taxable_amount: Decimal,
        tax_deducted: Decimal,
    ) -> CapitalGainAggregate {
        CapitalGainAggregate {
            bucket,
            gain: taxable_amount,
            carry_forward: Decimal::ZERO,
            taxable_amount,
            tax_deducted,
        }
    }

    #[test]
    fn applies_bucket_rates() {
        let gains = vec![
            gain(CapitalGainBucket::PropertyUpToOneYear, dec!(2000000), dec!(0)),
            gain(CapitalGainBucket::PropertyTwoToThreeYears, dec!(1000000), dec!(0)),
            gain(CapitalGainBucket::PropertyFourYearsPlus, dec!(5000000), dec!(0)),
            gain(CapitalGainBucket::Securities, dec!(400000), dec!(50000)),
        ];

        let summary = compute_capital_gains(&gains, TAX_YEAR, &rate_book()).unwrap();

        // 300000 + 100000 + 0 + 50000
        assert_eq!(summary.total_tax, dec!(450000));
        assert_eq!(summary.total_taxable_amount, dec!(8400000));
        assert_eq!(summary.total_tax_deducted, dec!(50000));
        assert_eq!(summary.buckets[3].rate, dec!(0.125));
    }

    #[test]
    fn empty_buckets_need_no_rate() {
        let gains = vec![gain(CapitalGainBucket::Other, dec!(0), dec!(0))];

        let summary = compute_capital_gains(&gains, "2030-31", &RateBook::new()).unwrap();

        assert_eq!(summary.total_tax, dec!(0));
        assert_eq!(summary.buckets[0].rate, dec!(0));
    }

    #[test]
    fn missing_rate_for_declared_gain_is_configuration_error() {
        let gains = vec![gain(CapitalGainBucket::Securities, dec!(100000), dec!(0))];

        let result = compute_capital_gains(&gains, "2030-31", &rate_book());

        assert!(matches!(result, Err(TaxEngineError::ConfigurationNotFound(_))));
    }

    #[test]
    fn tax_deducted_is_not_netted() {
        let gains = vec![gain(CapitalGainBucket::PropertyUpToOneYear, dec!(100000), dec!(15000))];

        let summary = compute_capital_gains(&gains, TAX_YEAR, &rate_book()).unwrap();

        assert_eq!(summary.buckets[0].tax, dec!(15000));
        assert_eq!(summary.buckets[0].tax_deducted, dec!(15000));
    }
}
