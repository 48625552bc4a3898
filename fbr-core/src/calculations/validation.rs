//! Plausibility checks on a return before it is submitted as final.
//!
//! The calculator accepts any input; these checks exist so a caller can
//! refuse to finalize a return that is clearly wrong.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FormCategory, FormFields, TaxFormData};
use crate::money::{MoneyError, parse_money};

/// Annual salary above which a warning is raised.
const SALARY_WARNING_THRESHOLD: Decimal = Decimal::from_parts(120_000_000, 0, 0, false, 0);

/// Share of salary above which the tax deducted looks wrong.
const TAX_DEDUCTED_WARNING_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

const SALARY_FIELDS: &[&str] = &["annual_basic_salary", "monthly_salary"];
const SALARY_TAX_FIELD: &str = "salary_tax_deducted";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a return for errors (which block a final submission) and
/// warnings (which only flag it).
pub fn validate_tax_data(data: &TaxFormData) -> ValidationReport {
    let mut report = ValidationReport::default();

    if data.income.is_empty() {
        report.errors.push("Income data is required".to_string());
    }

    let salary = salary(&data.income, &mut report);
    let tax_deducted = match parse_money(data.income.get(SALARY_TAX_FIELD)) {
        Ok(amount) => amount,
        Err(MoneyError::Negative(_)) => {
            report.errors.push("Salary tax deducted cannot be negative".to_string());
            Decimal::ZERO
        }
        Err(_) => Decimal::ZERO,
    };

    if salary > SALARY_WARNING_THRESHOLD {
        report.warnings.push("Annual salary seems unusually high".to_string());
    }
    if salary > Decimal::ZERO && tax_deducted > salary * TAX_DEDUCTED_WARNING_RATIO {
        report
            .warnings
            .push("Salary tax deducted is more than 50% of annual salary".to_string());
    }

    for category in [
        FormCategory::Income,
        FormCategory::AdjustableTax,
        FormCategory::Reductions,
        FormCategory::Credits,
        FormCategory::Deductions,
        FormCategory::FinalTax,
        FormCategory::CapitalGain,
    ] {
        unusable_fields(category, data.form(category), &mut report);
    }

    report
}

/// First non-zero salary field. Negative salary is an error.
fn salary(
    income: &FormFields,
    report: &mut ValidationReport,
) -> Decimal {
    for field in SALARY_FIELDS {
        match parse_money(income.get(field)) {
            Ok(amount) if !amount.is_zero() => return amount,
            Err(MoneyError::Negative(_)) => {
                report.errors.push("Annual salary cannot be negative".to_string());
                return Decimal::ZERO;
            }
            Ok(_) | Err(_) => {}
        }
    }
    Decimal::ZERO
}

/// Warns about every value the calculator would count as 0, skipping the
/// salary fields already reported as errors.
fn unusable_fields(
    category: FormCategory,
    form: &FormFields,
    report: &mut ValidationReport,
) {
    for (field, value) in form.iter() {
        let error = match parse_money(Some(value)) {
            Ok(_) => continue,
            Err(error) => error,
        };
        let already_an_error = category == FormCategory::Income
            && matches!(error, MoneyError::Negative(_))
            && (field == SALARY_TAX_FIELD || SALARY_FIELDS.iter().any(|f| *f == field));
        if !already_an_error {
            report.warnings.push(format!(
                "{}.{field}: {error}; treated as 0",
                category.as_str()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn income(fields: FormFields) -> TaxFormData {
        TaxFormData {
            income: fields,
            ..Default::default()
        }
    }

    #[test]
    fn plausible_return_is_clean() {
        let data = income(
            FormFields::new()
                .with("annual_basic_salary", "2400000")
                .with("salary_tax_deducted", "180000"),
        );

        let report = validate_tax_data(&data);

        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_income_is_an_error() {
        let report = validate_tax_data(&TaxFormData::default());

        assert_eq!(report.errors, vec!["Income data is required".to_string()]);
    }

    #[test]
    fn negative_salary_is_an_error() {
        let report = validate_tax_data(&income(FormFields::new().with("monthly_salary", "-100")));

        assert!(!report.is_valid());
        assert_eq!(report.errors, vec!["Annual salary cannot be negative".to_string()]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn negative_salary_tax_deducted_is_an_error() {
        let report = validate_tax_data(&income(
            FormFields::new()
                .with("annual_basic_salary", 1000000)
                .with("salary_tax_deducted", -5),
        ));

        assert_eq!(
            report.errors,
            vec!["Salary tax deducted cannot be negative".to_string()]
        );
    }

    #[test]
    fn very_high_salary_is_a_warning() {
        let report = validate_tax_data(&income(FormFields::new().with("annual_basic_salary", 150000000)));

        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["Annual salary seems unusually high".to_string()]);
    }

    #[test]
    fn tax_deducted_above_half_of_salary_is_a_warning() {
        let report = validate_tax_data(&income(
            FormFields::new()
                .with("annual_basic_salary", 1000000)
                .with("salary_tax_deducted", 600000),
        ));

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("50%"));
    }

    #[test]
    fn unparseable_fields_are_warnings() {
        let data = TaxFormData {
            income: FormFields::new().with("annual_basic_salary", 1000000),
            credits: FormFields::new().with("investment_tax_credit", "abc"),
            ..Default::default()
        };

        let report = validate_tax_data(&data);

        assert!(report.is_valid());
        assert_eq!(
            report.warnings,
            vec!["credits.investment_tax_credit: 'abc' is not a number; treated as 0".to_string()]
        );
    }

    #[test]
    fn implausibly_large_salary_is_reported_as_unusable() {
        let report = validate_tax_data(&income(FormFields::new().with("annual_basic_salary", "1e20")));

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("income.annual_basic_salary: amount"));
        assert!(report.warnings[0].ends_with("is larger than 1000000000000000; treated as 0"));
    }
}
