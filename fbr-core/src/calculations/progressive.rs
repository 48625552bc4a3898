//! Progressive (slab) income tax.
//!
//! Each bracket carries the tax owed on everything below it as
//! `fixed_amount`, so the tax on an income is a single bracket evaluation:
//!
//! ```text
//! tax = fixed_amount + (taxable_income - min_income) × rate
//! ```
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fbr_core::calculations::compute_tax;
//! use fbr_core::{FilerStatus, SlabTable, TaxSlab};
//!
//! let slab = |min, max, rate, fixed| TaxSlab {
//!     tax_year: "2025-26".to_string(),
//!     filer_status: FilerStatus::Filer,
//!     min_income: min,
//!     max_income: max,
//!     rate,
//!     fixed_amount: fixed,
//! };
//! let table = SlabTable::new(
//!     "2025-26",
//!     FilerStatus::Filer,
//!     vec![
//!         slab(dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
//!         slab(dec!(600000), Some(dec!(1200000)), dec!(0.05), dec!(0)),
//!         slab(dec!(1200000), None, dec!(0.125), dec!(30000)),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(compute_tax(dec!(1500000), &table), dec!(67500.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::models::SlabTable;

/// Tax on `taxable_income` under `table`, rounded to two places.
///
/// Zero or negative income owes nothing and skips the lookup.
pub fn compute_tax(
    taxable_income: Decimal,
    table: &SlabTable,
) -> Decimal {
    if taxable_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match table.bracket_for(taxable_income) {
        Some((_, bracket)) => round_half_up(bracket.tax_at(taxable_income)),
        // A validated table starts at zero, so every positive income has a bracket.
        None => Decimal::ZERO,
    }
}

/// Rate (as a fraction) of the bracket that contains `taxable_income`.
pub fn marginal_rate(
    taxable_income: Decimal,
    table: &SlabTable,
) -> Decimal {
    if taxable_income < Decimal::ZERO {
        return Decimal::ZERO;
    }
    table
        .bracket_for(taxable_income)
        .map(|(_, bracket)| bracket.rate)
        .unwrap_or(Decimal::ZERO)
}

/// Portion of the income taxed inside one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabBreakdown {
    /// Zero-based position of the bracket in its table.
    pub slab_index: usize,
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub income_in_slab: Decimal,
    pub tax_in_slab: Decimal,
}

/// Walks every bracket the income reaches and reports the slice taxed in
/// each. For a continuous table the `tax_in_slab` values add up to
/// [`compute_tax`] (before rounding).
pub fn slab_breakdown(
    taxable_income: Decimal,
    table: &SlabTable,
) -> Vec<SlabBreakdown> {
    if taxable_income <= Decimal::ZERO {
        return Vec::new();
    }

    table
        .slabs()
        .iter()
        .enumerate()
        .take_while(|(_, slab)| taxable_income > slab.min_income)
        .map(|(slab_index, slab)| {
            let upper = match slab.max_income {
                Some(max_income) if max_income < taxable_income => max_income,
                _ => taxable_income,
            };
            let income_in_slab = upper - slab.min_income;
            SlabBreakdown {
                slab_index,
                min_income: slab.min_income,
                max_income: slab.max_income,
                rate: slab.rate,
                income_in_slab,
                tax_in_slab: round_half_up(income_in_slab * slab.rate),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FilerStatus, TaxSlab};

    fn slab(
        status: FilerStatus,
        min: Decimal,
        max: Option<Decimal>,
        rate: Decimal,
        fixed: Decimal,
    ) -> TaxSlab {
        TaxSlab {
            tax_year: "2025-26".to_string(),
            filer_status: status,
            min_income: min,
            max_income: max,
            rate,
            fixed_amount: fixed,
        }
    }

    fn filer_table() -> SlabTable {
        let f = FilerStatus::Filer;
        SlabTable::new(
            "2025-26",
            f,
            vec![
                slab(f, dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
                slab(f, dec!(600000), Some(dec!(1200000)), dec!(0.05), dec!(0)),
                slab(f, dec!(1200000), Some(dec!(2200000)), dec!(0.125), dec!(30000)),
                slab(f, dec!(2200000), Some(dec!(3200000)), dec!(0.20), dec!(155000)),
                slab(f, dec!(3200000), Some(dec!(4100000)), dec!(0.25), dec!(355000)),
                slab(f, dec!(4100000), None, dec!(0.35), dec!(580000)),
            ],
        )
        .unwrap()
    }

    fn non_filer_table() -> SlabTable {
        let n = FilerStatus::NonFiler;
        SlabTable::new(
            "2025-26",
            n,
            vec![
                slab(n, dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
                slab(n, dec!(600000), Some(dec!(1200000)), dec!(0.10), dec!(0)),
                slab(n, dec!(1200000), Some(dec!(2200000)), dec!(0.25), dec!(60000)),
                slab(n, dec!(2200000), Some(dec!(3200000)), dec!(0.40), dec!(310000)),
                slab(n, dec!(3200000), Some(dec!(4100000)), dec!(0.50), dec!(710000)),
                slab(n, dec!(4100000), None, dec!(0.70), dec!(1160000)),
            ],
        )
        .unwrap()
    }

    // =========================================================================
    // compute_tax tests
    // =========================================================================

    #[test]
    fn compute_tax_zero_income_is_zero() {
        assert_eq!(compute_tax(dec!(0), &filer_table()), dec!(0));
    }

    #[test]
    fn compute_tax_negative_income_is_zero() {
        assert_eq!(compute_tax(dec!(-250000), &filer_table()), dec!(0));
    }

    #[test]
    fn compute_tax_inside_exempt_bracket() {
        assert_eq!(compute_tax(dec!(599999), &filer_table()), dec!(0));
    }

    #[test]
    fn compute_tax_second_bracket() {
        // 0 + (900000 - 600000) * 0.05
        assert_eq!(compute_tax(dec!(900000), &filer_table()), dec!(15000.00));
    }

    #[test]
    fn compute_tax_exactly_on_boundary_uses_fixed_amount() {
        assert_eq!(compute_tax(dec!(1200000), &filer_table()), dec!(30000.00));
    }

    #[test]
    fn compute_tax_top_bracket() {
        // 580000 + (8740000 - 4100000) * 0.35 = 580000 + 1624000
        assert_eq!(compute_tax(dec!(8740000), &filer_table()), dec!(2204000.00));
    }

    #[test]
    fn compute_tax_rounds_to_paisa() {
        // 30000 + 0.01 * 0.125 = 30000.00125
        assert_eq!(compute_tax(dec!(1200000.01), &filer_table()), dec!(30000.00));
    }

    #[test]
    fn compute_tax_non_filer_is_higher_than_filer() {
        let income = dec!(2500000);

        let filer = compute_tax(income, &filer_table());
        let non_filer = compute_tax(income, &non_filer_table());

        assert_eq!(filer, dec!(215000.00));
        assert_eq!(non_filer, dec!(430000.00));
    }

    #[test]
    fn compute_tax_is_monotonic() {
        let table = filer_table();
        let mut previous = Decimal::ZERO;
        let mut income = Decimal::ZERO;

        while income <= dec!(12000000) {
            let tax = compute_tax(income, &table);
            assert!(tax >= previous, "tax fell at {income}: {tax} < {previous}");
            previous = tax;
            income += dec!(25000);
        }
    }

    #[test]
    fn compute_tax_is_continuous_at_every_boundary() {
        for table in [filer_table(), non_filer_table()] {
            for pair in table.slabs().windows(2) {
                let (lower, upper) = (&pair[0], &pair[1]);
                let boundary = upper.min_income;

                let evaluated_below = round_half_up(lower.tax_at(boundary));

                assert_eq!(compute_tax(boundary, &table), evaluated_below);
                assert_eq!(upper.fixed_amount, evaluated_below);
            }
        }
    }

    // =========================================================================
    // marginal_rate tests
    // =========================================================================

    #[test]
    fn marginal_rate_on_boundary_is_upper_bracket_rate() {
        assert_eq!(marginal_rate(dec!(1200000), &filer_table()), dec!(0.125));
    }

    #[test]
    fn marginal_rate_zero_income_is_first_bracket_rate() {
        assert_eq!(marginal_rate(dec!(0), &filer_table()), dec!(0));
    }

    #[test]
    fn marginal_rate_top_bracket() {
        assert_eq!(marginal_rate(dec!(50000000), &non_filer_table()), dec!(0.70));
    }

    // =========================================================================
    // slab_breakdown tests
    // =========================================================================

    #[test]
    fn slab_breakdown_zero_income_is_empty() {
        assert!(slab_breakdown(dec!(0), &filer_table()).is_empty());
    }

    #[test]
    fn slab_breakdown_stops_at_containing_bracket() {
        let breakdown = slab_breakdown(dec!(1500000), &filer_table());

        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].income_in_slab, dec!(600000));
        assert_eq!(breakdown[1].income_in_slab, dec!(600000));
        assert_eq!(breakdown[1].tax_in_slab, dec!(30000.00));
        assert_eq!(breakdown[2].income_in_slab, dec!(300000));
        assert_eq!(breakdown[2].tax_in_slab, dec!(37500.00));
    }

    #[test]
    fn slab_breakdown_on_boundary_excludes_upper_bracket() {
        let breakdown = slab_breakdown(dec!(1200000), &filer_table());

        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn slab_breakdown_sums_to_compute_tax() {
        let table = filer_table();
        for income in [dec!(650000), dec!(2200000), dec!(3999999.99), dec!(8740000)] {
            let total: Decimal = slab_breakdown(income, &table)
                .iter()
                .map(|s| s.tax_in_slab)
                .sum();

            assert_eq!(round_half_up(total), compute_tax(income, &table));
        }
    }
}
