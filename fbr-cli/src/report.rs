//! Plain-text rendering of results for the terminal.

use std::fmt::Write;

use fbr_core::calculations::common::{rate_as_percentage, round_half_up};
use fbr_core::{ComprehensiveTaxResult, SlabTable, TaxComputation, ValidationReport};
use rust_decimal::Decimal;

const LABEL_WIDTH: usize = 34;
const AMOUNT_WIDTH: usize = 18;

/// Rupee amount rounded to 2 dp with thousands separators, e.g. `2,204,000.00`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = format!("{:.2}", round_half_up(amount).abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !round_half_up(amount).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

fn line(
    out: &mut String,
    label: &str,
    amount: Decimal,
) {
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}",
        label,
        format_amount(amount)
    );
}

fn percent_line(
    out: &mut String,
    label: &str,
    percent: Decimal,
) {
    let _ = writeln!(out, "  {:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}", label, format!("{percent:.2}%"));
}

pub fn render_result(result: &ComprehensiveTaxResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tax computation for {} ({})",
        result.tax_year, result.filer_status
    );

    out.push_str("\nIncome\n");
    line(&mut out, "Gross income", result.gross_income);
    line(&mut out, "Exempt income", result.exempt_income);
    line(&mut out, "Deductible allowances", result.allowable_deductions);
    line(&mut out, "Taxable income", result.taxable_income);

    out.push_str("\nTax\n");
    line(&mut out, "Normal income tax", result.normal_tax);
    if !result.surcharge.is_zero() {
        line(&mut out, "Surcharge", result.surcharge);
    }
    if !result.capital_gains.buckets.is_empty() {
        line(&mut out, "Capital gains tax", result.capital_gain_tax);
    }
    line(&mut out, "Tax chargeable", result.tax_chargeable);
    line(&mut out, "Tax reductions", result.tax_reductions);
    line(&mut out, "Tax credits", result.tax_credits);
    line(&mut out, "Total tax liability", result.total_tax_liability);

    out.push_str("\nPaid\n");
    line(&mut out, "Withholding (adjustable)", result.adjustable_tax);
    line(&mut out, "Final/fixed tax", result.final_tax);
    line(&mut out, "Total tax paid", result.total_tax_paid);

    out.push('\n');
    if result.has_refund() {
        line(&mut out, "Refund due", result.refund_due);
    } else {
        line(&mut out, "Additional tax due", result.additional_tax_due);
    }
    percent_line(&mut out, "Effective tax rate", result.effective_tax_rate);
    percent_line(&mut out, "Marginal tax rate", result.marginal_tax_rate);

    if !result.slab_breakdown.is_empty() {
        out.push_str("\nSlab breakdown\n");
        for slab in &result.slab_breakdown {
            let upper = slab
                .max_income
                .map(format_amount)
                .unwrap_or_else(|| "and above".to_string());
            let _ = writeln!(
                out,
                "  {:>14} - {:<14} {:>6.2}% {:>AMOUNT_WIDTH$}",
                format_amount(slab.min_income),
                upper,
                rate_as_percentage(slab.rate),
                format_amount(slab.tax_in_slab)
            );
        }
    }

    if !result.capital_gains.buckets.is_empty() {
        out.push_str("\nCapital gains\n");
        for bucket in &result.capital_gains.buckets {
            let _ = writeln!(
                out,
                "  {:<30} {:>16} @ {:>6.2}% {:>AMOUNT_WIDTH$}",
                bucket.bucket.as_str(),
                format_amount(bucket.taxable_amount),
                rate_as_percentage(bucket.rate),
                format_amount(bucket.tax)
            );
        }
    }

    if !result.input_issues.is_empty() {
        out.push_str("\nInput treated as 0\n");
        for issue in &result.input_issues {
            let _ = writeln!(
                out,
                "  {}.{}: {}",
                issue.category.as_str(),
                issue.field,
                issue.error
            );
        }
    }

    out
}

pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    if report.errors.is_empty() && report.warnings.is_empty() {
        out.push_str("No problems found.\n");
        return out;
    }
    for error in &report.errors {
        let _ = writeln!(out, "error: {error}");
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

pub fn render_slabs(table: &SlabTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tax slabs for {} ({})",
        table.tax_year(),
        table.filer_status()
    );
    let _ = writeln!(
        out,
        "  {:>16} {:>16} {:>8} {:>16}",
        "From", "To", "Rate", "Fixed tax"
    );
    for slab in table.slabs() {
        let upper = slab
            .max_income
            .map(format_amount)
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:>16} {:>16} {:>7.2}% {:>16}",
            format_amount(slab.min_income),
            upper,
            rate_as_percentage(slab.rate),
            format_amount(slab.fixed_amount)
        );
    }
    out
}

pub fn render_history(computations: &[TaxComputation]) -> String {
    if computations.is_empty() {
        return "No saved computations.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<8} {:<10} {:<20} {:>16} {:>16} {:>16}  {}",
        "ID", "Year", "Status", "Label", "Taxable", "Liability", "Balance", "Saved"
    );
    for c in computations {
        let balance = if c.refund_due > Decimal::ZERO {
            format!("-{}", format_amount(c.refund_due))
        } else {
            format_amount(c.additional_tax_due)
        };
        let _ = writeln!(
            out,
            "{:>5}  {:<8} {:<10} {:<20} {:>16} {:>16} {:>16}  {}",
            c.id,
            c.tax_year,
            c.filer_status.as_str(),
            c.label,
            format_amount(c.taxable_income),
            format_amount(c.total_tax_liability),
            balance,
            c.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}
