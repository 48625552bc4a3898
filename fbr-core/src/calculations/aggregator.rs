//! Reduces the raw form maps of a return to the canonical totals the
//! calculator works with.
//!
//! Every field is read through [`parse_money`], so stored strings are summed
//! as numbers and an unusable value counts as 0. Each coerced value is logged
//! and kept as an [`InputIssue`] on the aggregate.
//!
//! Field lists are grouped: a group holds alternative names for the same
//! amount (older rows use the short names) and contributes its first
//! non-zero member once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{CapitalGainBucket, FormCategory, FormFields, TaxFormData};
use crate::money::{InputIssue, MoneyError, parse_money};

type FieldGroup = &'static [&'static str];

const SALARY_FIELDS: &[FieldGroup] = &[
    &["annual_basic_salary", "monthly_salary"],
    &["allowances_excluding_bonus_medical", "allowances"],
    &["bonus"],
    &["medical_allowance"],
    &["pension_from_ex_employer"],
    &["employment_termination_payment"],
    &["retirement_from_approved_funds"],
    &["directorship_fee"],
    &["other_cash_benefits"],
    &["car_allowance"],
    &["other_taxable"],
];

const NON_CASH_BENEFIT_FIELDS: &[FieldGroup] = &[
    &["employer_contribution_provident"],
    &["taxable_car_value"],
    &["other_taxable_subsidies"],
];

const MINIMUM_TAX_INCOME_FIELDS: &[FieldGroup] = &[&["profit_on_debt_15"], &["profit_on_debt_12_5"]];

const OTHER_INCOME_FIELDS: &[FieldGroup] = &[
    &["rent_income"],
    &["other_taxable_income_others"],
    &["other_sources"],
];

const EXEMPT_INCOME_FIELDS: &[FieldGroup] = &[
    &["income_exempt_from_tax"],
    &["non_cash_benefit_exempt"],
    &["medical_allowance_exempt"],
    &["employer_contribution_exempt", "employer_contribution"],
    &["other_exempt"],
];

const DEDUCTION_TOTAL: FieldGroup = &["total_deduction_from_income"];
const DEDUCTION_FIELDS: &[FieldGroup] = &[
    &["professional_expenses_amount"],
    &["zakat_paid_amount", "zakat"],
    &["other_deductions"],
];

const REDUCTION_TOTAL: FieldGroup = &["total_reductions", "total_tax_reduction"];
const REDUCTION_FIELDS: &[FieldGroup] = &[
    &["teacher_researcher_tax_reduction", "teacher_researcher_reduction"],
    &["behbood_certificates_tax_reduction", "behbood_certificates_reduction"],
    &["capital_gain_immovable_tax_reduction", "capital_gain_immovable_reduction"],
    &["industrial_undertaking_reduction"],
    &["export_income_reduction"],
    &["other_reductions"],
];

const CREDIT_TOTAL: FieldGroup = &["total_credits"];
const CREDIT_FIELDS: &[FieldGroup] = &[
    &["charitable_donations_tax_credit", "charitable_donations_credit"],
    &["charitable_donations_associate_tax_credit"],
    &["pension_fund_tax_credit", "pension_fund_contribution_credit"],
    &["investment_tax_credit"],
    &["other_credits"],
];

const ADJUSTABLE_TAX_TOTAL: FieldGroup = &["total_tax_collected"];
const ADJUSTABLE_TAX_FIELDS: &[FieldGroup] = &[
    &["profit_on_debt_tax"],
    &["electricity_tax", "electricity_domestic_tax_collected"],
    &["phone_tax", "cellphone_bill_tax_collected"],
    &["vehicle_tax", "motor_vehicle_transfer_tax_collected"],
    &["other_tax"],
];

/// Tax withheld from salary, reported on the income form.
const SALARY_WITHHOLDING_FIELDS: &[FieldGroup] = &[&["salary_tax_deducted"], &["additional_tax_deducted"]];
const ADVANCE_TAX_FIELDS: &[FieldGroup] = &[&["advance_tax"]];

const FINAL_TAX_TOTAL: FieldGroup = &["total_final_tax"];
/// `(gross amount, rate in percent)` pairs taxed at source.
const FINAL_TAX_RATED_PAIRS: &[(&str, &str)] = &[
    ("sukuk_bonds_gross_amount", "sukuk_bonds_tax_rate"),
    ("debt_securities_gross_amount", "debt_securities_tax_rate"),
];
const FINAL_TAX_FIELDS: &[FieldGroup] = &[&["prize_bonds_tax_amount"], &["other_final_tax_tax_amount"]];

/// One capital gains bucket as declared on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainAggregate {
    pub bucket: CapitalGainBucket,
    pub gain: Decimal,
    pub carry_forward: Decimal,
    /// `gain - carry_forward`, never below 0.
    pub taxable_amount: Decimal,
    pub tax_deducted: Decimal,
}

/// Canonical totals for one return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAggregate {
    pub gross_income: Decimal,
    pub exempt_income: Decimal,
    pub allowable_deductions: Decimal,

    pub salary_income: Decimal,
    pub non_cash_benefits: Decimal,
    /// Profit on debt, which the minimum tax regime applies to.
    pub income_subject_to_minimum_tax: Decimal,
    pub income_not_subject_to_minimum_tax: Decimal,

    pub tax_reductions: Decimal,
    pub tax_credits: Decimal,
    pub adjustable_tax: Decimal,
    pub final_tax: Decimal,

    pub capital_gains: Vec<CapitalGainAggregate>,

    /// Fields that were coerced to 0.
    pub issues: Vec<InputIssue>,
}

/// Reads one form map, collecting coercion failures as it goes.
struct FieldReader<'a> {
    form: &'a FormFields,
    category: FormCategory,
    issues: &'a mut Vec<InputIssue>,
}

impl<'a> FieldReader<'a> {
    fn new(
        data: &'a TaxFormData,
        category: FormCategory,
        issues: &'a mut Vec<InputIssue>,
    ) -> Self {
        Self {
            form: data.form(category),
            category,
            issues,
        }
    }

    fn amount(
        &mut self,
        field: &str,
    ) -> Decimal {
        match parse_money(self.form.get(field)) {
            Ok(amount) => amount,
            Err(error) => {
                self.record(field, error);
                Decimal::ZERO
            }
        }
    }

    fn record(
        &mut self,
        field: &str,
        error: MoneyError,
    ) {
        tracing::warn!(
            category = self.category.as_str(),
            field,
            %error,
            "unusable form value treated as 0"
        );
        self.issues.push(InputIssue {
            category: self.category,
            field: field.to_string(),
            error,
        });
    }

    /// `total + amount`, or `total` with an issue against `field` when the
    /// sum is out of range.
    fn add(
        &mut self,
        total: Decimal,
        amount: Decimal,
        field: &str,
    ) -> Decimal {
        total.checked_add(amount).unwrap_or_else(|| {
            self.record(field, MoneyError::Overflow);
            total
        })
    }

    /// First non-zero member of an alias group.
    fn first_of(
        &mut self,
        group: FieldGroup,
    ) -> Decimal {
        for &field in group {
            let amount = self.amount(field);
            if !amount.is_zero() {
                return amount;
            }
        }
        Decimal::ZERO
    }

    fn sum(
        &mut self,
        groups: &[FieldGroup],
    ) -> Decimal {
        let mut total = Decimal::ZERO;
        for &group in groups {
            let amount = self.first_of(group);
            total = self.add(total, amount, group.first().copied().unwrap_or_default());
        }
        total
    }

    /// The form's generated total when it is positive, otherwise the sum of
    /// its line items.
    fn total_or_sum(
        &mut self,
        total: FieldGroup,
        items: &[FieldGroup],
    ) -> Decimal {
        let total = self.first_of(total);
        if total > Decimal::ZERO {
            total
        } else {
            self.sum(items)
        }
    }
}

/// Aggregates every category of `data`. Missing categories and fields are 0.
pub fn aggregate(data: &TaxFormData) -> FormAggregate {
    let mut issues = Vec::new();

    let (salary_income, non_cash_benefits, minimum_tax_income, other_income, exempt_income, salary_withholding) = {
        let mut income = FieldReader::new(data, FormCategory::Income, &mut issues);
        (
            income.sum(SALARY_FIELDS),
            income.sum(NON_CASH_BENEFIT_FIELDS),
            income.sum(MINIMUM_TAX_INCOME_FIELDS),
            income.sum(OTHER_INCOME_FIELDS),
            income.sum(EXEMPT_INCOME_FIELDS),
            income.sum(SALARY_WITHHOLDING_FIELDS),
        )
    };

    let (allowable_deductions, advance_tax) = {
        let mut deductions = FieldReader::new(data, FormCategory::Deductions, &mut issues);
        (
            deductions.total_or_sum(DEDUCTION_TOTAL, DEDUCTION_FIELDS),
            deductions.sum(ADVANCE_TAX_FIELDS),
        )
    };

    let tax_reductions =
        FieldReader::new(data, FormCategory::Reductions, &mut issues).total_or_sum(REDUCTION_TOTAL, REDUCTION_FIELDS);
    let tax_credits =
        FieldReader::new(data, FormCategory::Credits, &mut issues).total_or_sum(CREDIT_TOTAL, CREDIT_FIELDS);
    let tax_collected = FieldReader::new(data, FormCategory::AdjustableTax, &mut issues)
        .total_or_sum(ADJUSTABLE_TAX_TOTAL, ADJUSTABLE_TAX_FIELDS);
    let final_tax = final_tax(&mut FieldReader::new(data, FormCategory::FinalTax, &mut issues));
    let capital_gains = capital_gains(&mut FieldReader::new(data, FormCategory::CapitalGain, &mut issues));

    let aggregate = FormAggregate {
        gross_income: round_half_up(salary_income + non_cash_benefits + minimum_tax_income + other_income),
        exempt_income: round_half_up(exempt_income),
        allowable_deductions: round_half_up(allowable_deductions),
        salary_income: round_half_up(salary_income),
        non_cash_benefits: round_half_up(non_cash_benefits),
        income_subject_to_minimum_tax: round_half_up(minimum_tax_income),
        income_not_subject_to_minimum_tax: round_half_up(other_income),
        tax_reductions: round_half_up(tax_reductions),
        tax_credits: round_half_up(tax_credits),
        adjustable_tax: round_half_up(tax_collected + salary_withholding + advance_tax),
        final_tax,
        capital_gains,
        issues,
    };

    tracing::debug!(
        gross_income = %aggregate.gross_income,
        exempt_income = %aggregate.exempt_income,
        allowable_deductions = %aggregate.allowable_deductions,
        issues = aggregate.issues.len(),
        "aggregated form data"
    );

    aggregate
}

fn final_tax(reader: &mut FieldReader<'_>) -> Decimal {
    let total = reader.first_of(FINAL_TAX_TOTAL);
    if total > Decimal::ZERO {
        return round_half_up(total);
    }

    let mut rated = Decimal::ZERO;
    for &(gross, rate) in FINAL_TAX_RATED_PAIRS {
        let amount = reader.amount(gross);
        let percent = reader.amount(rate);
        let tax = match amount.checked_mul(percent) {
            Some(product) => product / Decimal::ONE_HUNDRED,
            None => {
                reader.record(rate, MoneyError::Overflow);
                Decimal::ZERO
            }
        };
        rated = reader.add(rated, tax, gross);
    }

    let listed = reader.sum(FINAL_TAX_FIELDS);
    round_half_up(reader.add(rated, listed, FINAL_TAX_FIELDS[0][0]))
}

fn capital_gains(reader: &mut FieldReader<'_>) -> Vec<CapitalGainAggregate> {
    CapitalGainBucket::all()
        .iter()
        .map(|&bucket| {
            let key = bucket.field_key();
            let gain = round_half_up(reader.amount(key));
            let carry_forward = round_half_up(reader.amount(&format!("{key}_carry_forward")));
            let tax_deducted = round_half_up(reader.amount(&format!("{key}_tax_deducted")));
            CapitalGainAggregate {
                bucket,
                gain,
                carry_forward,
                taxable_amount: non_negative(gain - carry_forward),
                tax_deducted,
            }
        })
        .collect()
}
