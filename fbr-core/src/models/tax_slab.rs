use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;
use crate::models::FilerStatus;

/// One marginal bracket of a progressive schedule.
///
/// `fixed_amount` is the cumulative tax owed on all income below
/// `min_income`, so a bracket never has to re-evaluate the ones beneath it.
/// `rate` is a fraction (`0.125` for 12.5%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub tax_year: String,
    pub filer_status: FilerStatus,
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
}

impl TaxSlab {
    /// Tax on `income` evaluated with this bracket's formula. Callers are
    /// responsible for picking the bracket that contains `income`.
    pub fn tax_at(
        &self,
        income: Decimal,
    ) -> Decimal {
        self.fixed_amount + (income - self.min_income) * self.rate
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_income.is_none()
    }
}

/// Reasons a set of brackets cannot form a [`SlabTable`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlabTableError {
    #[error("slab table has no brackets")]
    Empty,

    #[error("bracket {index} belongs to {found_year} ({found_status}), not the table's year/status")]
    MixedTable {
        index: usize,
        found_year: String,
        found_status: FilerStatus,
    },

    #[error("first bracket starts at {0}, expected 0")]
    DoesNotStartAtZero(Decimal),

    #[error("bracket {index} has invalid rate {rate}")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} has negative fixed amount {fixed_amount}")]
    NegativeFixedAmount { index: usize, fixed_amount: Decimal },

    #[error("bracket {index} is unbounded but is not the top bracket")]
    UnboundedNotLast { index: usize },

    #[error("top bracket must be unbounded")]
    MissingUnboundedTop,

    #[error("bracket {index} has max_income {max_income} not above min_income {min_income}")]
    EmptyRange {
        index: usize,
        min_income: Decimal,
        max_income: Decimal,
    },

    #[error("bracket {index} starts at {min_income} but the previous bracket ends at {previous_max}")]
    NotContiguous {
        index: usize,
        min_income: Decimal,
        previous_max: Decimal,
    },

    #[error("bracket {index} fixed amount {fixed_amount} does not equal tax {expected} at its lower bound")]
    Discontinuous {
        index: usize,
        fixed_amount: Decimal,
        expected: Decimal,
    },
}

/// Validated, ascending progressive schedule for one `(tax_year, filer_status)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabTable {
    tax_year: String,
    filer_status: FilerStatus,
    slabs: Vec<TaxSlab>,
}

impl SlabTable {
    /// Sorts `slabs` by `min_income` and checks that they are contiguous,
    /// start at zero, end with a single unbounded bracket, and that each
    /// `fixed_amount` equals the tax of the bracket below at its upper bound.
    pub fn new(
        tax_year: impl Into<String>,
        filer_status: FilerStatus,
        mut slabs: Vec<TaxSlab>,
    ) -> Result<Self, SlabTableError> {
        let tax_year = tax_year.into();
        if slabs.is_empty() {
            return Err(SlabTableError::Empty);
        }

        slabs.sort_by(|a, b| a.min_income.cmp(&b.min_income));

        if let Some((index, slab)) = slabs
            .iter()
            .enumerate()
            .find(|(_, s)| s.tax_year != tax_year || s.filer_status != filer_status)
        {
            return Err(SlabTableError::MixedTable {
                index,
                found_year: slab.tax_year.clone(),
                found_status: slab.filer_status,
            });
        }

        if slabs[0].min_income != Decimal::ZERO {
            return Err(SlabTableError::DoesNotStartAtZero(slabs[0].min_income));
        }

        let last = slabs.len() - 1;
        for (index, slab) in slabs.iter().enumerate() {
            if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
                return Err(SlabTableError::InvalidRate {
                    index,
                    rate: slab.rate,
                });
            }
            if slab.fixed_amount < Decimal::ZERO {
                return Err(SlabTableError::NegativeFixedAmount {
                    index,
                    fixed_amount: slab.fixed_amount,
                });
            }

            match slab.max_income {
                None if index != last => return Err(SlabTableError::UnboundedNotLast { index }),
                None => {}
                Some(_) if index == last => return Err(SlabTableError::MissingUnboundedTop),
                Some(max_income) if max_income <= slab.min_income => {
                    return Err(SlabTableError::EmptyRange {
                        index,
                        min_income: slab.min_income,
                        max_income,
                    });
                }
                Some(_) => {}
            }

            if index > 0 {
                let previous = &slabs[index - 1];
                // Checked above: every bracket but the last is bounded.
                let previous_max = previous.max_income.unwrap_or(previous.min_income);
                if slab.min_income != previous_max {
                    return Err(SlabTableError::NotContiguous {
                        index,
                        min_income: slab.min_income,
                        previous_max,
                    });
                }

                let expected = round_half_up(previous.tax_at(previous_max));
                if round_half_up(slab.fixed_amount) != expected {
                    return Err(SlabTableError::Discontinuous {
                        index,
                        fixed_amount: slab.fixed_amount,
                        expected,
                    });
                }
            }
        }

        Ok(Self {
            tax_year,
            filer_status,
            slabs,
        })
    }

    pub fn tax_year(&self) -> &str {
        &self.tax_year
    }

    pub fn filer_status(&self) -> FilerStatus {
        self.filer_status
    }

    pub fn slabs(&self) -> &[TaxSlab] {
        &self.slabs
    }

    /// Index and bracket containing `income`, lower bound inclusive: a value
    /// exactly on a boundary resolves to the bracket that starts there.
    /// Returns `None` for negative income.
    pub fn bracket_for(
        &self,
        income: Decimal,
    ) -> Option<(usize, &TaxSlab)> {
        let above = self.slabs.partition_point(|s| s.min_income <= income);
        above.checked_sub(1).map(|index| (index, &self.slabs[index]))
    }

    pub fn top_rate(&self) -> Decimal {
        self.slabs.last().map(|s| s.rate).unwrap_or(Decimal::ZERO)
    }
}
