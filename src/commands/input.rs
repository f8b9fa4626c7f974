//! User input parsing
//!
//! Amounts are read the way the app prints them (`1.234,56`, `2.000`, `12,5`)
//! and also with a decimal point (`1234.56`, `1,234.56`). The separator that
//! comes last is the decimal mark. A lone dot followed by exactly three digits
//! groups thousands, so `2.000` is two thousand while `0.125` stays a fraction.
//! A leading `₺` or a trailing `₺`/`TL` is ignored.

use crate::error::{AppError, Result};
use chrono::{Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// Parse a monetary amount or quantity
pub fn parse_amount(label: &str, text: &str) -> Result<f64> {
    let cleaned = text
        .trim()
        .trim_start_matches('₺')
        .trim_end_matches('₺')
        .trim_end_matches("TL")
        .trim()
        .replace(' ', "");

    if cleaned.is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }

    let invalid =
        || AppError::Validation(format!("{} is not a valid number: '{}'", label, text.trim()));

    let normalized = normalize_separators(&cleaned).ok_or_else(invalid)?;
    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;

    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{} must be a finite number", label)))
}

/// Rewrite a localized number into `1234.56` form, or `None` when the
/// separators cannot be read one way.
fn normalize_separators(text: &str) -> Option<String> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };

    let (grouping, decimal) = match (digits.rfind(','), digits.rfind('.')) {
        (None, None) => return Some(text.to_string()),
        (Some(comma), Some(dot)) if comma > dot => ('.', Some(',')),
        (Some(_), Some(_)) => (',', Some('.')),
        (Some(_), None) if digits.matches(',').count() > 1 => (',', None),
        (Some(_), None) => ('.', Some(',')),
        (None, Some(_)) if digits.matches('.').count() > 1 || is_thousands_group(digits) => {
            ('.', None)
        }
        (None, Some(_)) => (',', Some('.')),
    };

    let (integer, fraction) = match decimal.and_then(|mark| digits.rsplit_once(mark)) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    if !is_grouped(integer, grouping) {
        return None;
    }

    let mut normalized = format!("{}{}", sign, integer.replace(grouping, ""));
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        normalized.push('.');
        normalized.push_str(fraction);
    }
    Some(normalized)
}

/// `2.000`, `12.500`: one dot, a non-zero lead of up to three digits, then three digits
fn is_thousands_group(digits: &str) -> bool {
    match digits.split_once('.') {
        Some((lead, group)) => {
            (1..=3).contains(&lead.len())
                && !lead.starts_with('0')
                && lead.bytes().all(|b| b.is_ascii_digit())
                && group.len() == 3
                && group.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Grouped integer part: a lead of one to three digits, then groups of exactly three
fn is_grouped(integer: &str, separator: char) -> bool {
    if !integer.contains(separator) {
        return true;
    }

    let mut groups = integer.split(separator);
    let lead_ok = groups
        .next()
        .is_some_and(|lead| (1..=3).contains(&lead.len()) && lead.bytes().all(|b| b.is_ascii_digit()));

    lead_ok && groups.all(|group| group.len() == 3 && group.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse an optional amount; blank input means "not given"
pub fn parse_optional_amount(label: &str, text: Option<&str>) -> Result<Option<f64>> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_amount(label, text).map(Some),
    }
}

/// Parse a purchase date; blank input means today
pub fn parse_date(text: Option<&str>) -> Result<NaiveDate> {
    let text = match text.map(str::trim) {
        None | Some("") => return Ok(Local::now().date_naive()),
        Some(text) => text,
    };

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Purchase date '{}' must look like 31.12.2024 or 2024-12-31",
                text
            ))
        })
}
