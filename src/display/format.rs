//! Number formatting for terminal output
//!
//! Money uses `.` to group thousands and `,` for decimals, with trailing
//! decimal zeros dropped: `1.234,56`, `20.000`, `12,5`.

use crate::catalog::Unit;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a monetary amount with up to two decimals
pub fn format_money(value: f64) -> String {
    format_decimal(value, 2)
}

/// Format a quantity; pieces are whole numbers, mass units keep up to three decimals
pub fn format_quantity(quantity: f64, unit: Unit) -> String {
    if unit.is_mass() {
        format_decimal(quantity, 3)
    } else {
        format_decimal(quantity.round(), 0)
    }
}

/// Format a percentage with two decimals and an explicit sign: `+10,00%`
pub fn format_pct(pct: f64) -> String {
    let Some(mut rounded) = round(pct, 2) else {
        return "-".to_string();
    };
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded.rescale(2);
    let text = rounded.abs().to_string().replace('.', ",");
    format!("{}{}%", if negative { "-" } else { "+" }, text)
}

/// Format a current price that may not be known yet
pub fn format_optional_money(value: Option<f64>) -> String {
    value.map(format_money).unwrap_or_else(|| "-".to_string())
}

fn round(value: f64, decimals: u32) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
}

fn format_decimal(value: f64, decimals: u32) -> String {
    let Some(rounded) = round(value, decimals) else {
        return "-".to_string();
    };

    let text = rounded.abs().normalize().to_string();
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let grouped = group_thousands(integer);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{},{}", sign, grouped, fraction)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.56), "1.234,56");
        assert_eq!(format_money(20000.0), "20.000");
        assert_eq!(format_money(12.5), "12,5");
        assert_eq!(format_money(1_250_000.0), "1.250.000");
        assert_eq!(format_money(999.999), "1.000");
        assert_eq!(format_money(-2000.0), "-2.000");
        assert_eq!(format_money(-0.001), "0");
        assert_eq!(format_money(0.0), "0");
        assert_eq!(format_money(0.125), "0,13");
        assert_eq!(format_money(f64::NAN), "-");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(3.0, Unit::Piece), "3");
        assert_eq!(format_quantity(1500.0, Unit::Piece), "1.500");
        assert_eq!(format_quantity(10.25, Unit::Gram), "10,25");
        assert_eq!(format_quantity(0.1234, Unit::Ounce), "0,123");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(10.0), "+10,00%");
        assert_eq!(format_pct(0.0), "+0,00%");
        assert_eq!(format_pct(-12.345678), "-12,35%");
        assert_eq!(format_pct(-0.001), "+0,00%");
    }

    #[test]
    fn test_format_optional_money() {
        assert_eq!(format_optional_money(None), "-");
        assert_eq!(format_optional_money(Some(2450.1)), "2.450,1");
    }
}
