//! Instrument catalog
//!
//! The fixed set of instruments a holding can be recorded against, keyed by
//! the code the price feed publishes them under.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Instrument category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Metal,
    Currency,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Metal => "metal",
            Category::Currency => "currency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metal" => Ok(Category::Metal),
            "currency" => Ok(Category::Currency),
            other => Err(AppError::Validation(format!("Unknown category: {}", other))),
        }
    }
}

/// Unit of measure for a holding's quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Gram,
    Kilogram,
    Ounce,
    Piece,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "gram",
            Unit::Kilogram => "kilogram",
            Unit::Ounce => "ounce",
            Unit::Piece => "piece",
        }
    }

    /// Mass units take fractional quantities; pieces are counted.
    pub fn is_mass(&self) -> bool {
        !matches!(self, Unit::Piece)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gram" | "g" => Ok(Unit::Gram),
            "kilogram" | "kg" => Ok(Unit::Kilogram),
            "ounce" | "oz" => Ok(Unit::Ounce),
            "piece" | "pcs" => Ok(Unit::Piece),
            other => Err(AppError::Validation(format!("Unknown unit: {}", other))),
        }
    }
}

/// One supported instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub code: &'static str,
    pub category: Category,
    pub variant: &'static str,
    pub default_unit: Unit,
}

const fn instrument(
    code: &'static str,
    category: Category,
    variant: &'static str,
    default_unit: Unit,
) -> Instrument {
    Instrument {
        code,
        category,
        variant,
        default_unit,
    }
}

/// Supported instruments, metals first.
pub static CATALOG: &[Instrument] = &[
    instrument("CH_T", Category::Metal, "24K Cast Gold", Unit::Gram),
    instrument("GA", Category::Metal, "24K Gram Gold", Unit::Gram),
    instrument("GAT", Category::Metal, "Gold Bullion", Unit::Gram),
    instrument("B", Category::Metal, "22K Bracelet Gold", Unit::Gram),
    instrument("B_T", Category::Metal, "22K Gram Gold", Unit::Gram),
    instrument("C", Category::Metal, "Quarter Coin", Unit::Piece),
    instrument("Y", Category::Metal, "Half Coin", Unit::Piece),
    instrument("T", Category::Metal, "Full Coin", Unit::Piece),
    instrument("USD", Category::Currency, "US Dollar", Unit::Piece),
    instrument("EUR", Category::Currency, "Euro", Unit::Piece),
    instrument("GBP", Category::Currency, "British Pound", Unit::Piece),
];

/// Normalize a user- or feed-supplied code for comparison
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Look up an instrument by code (case-insensitive)
pub fn lookup(code: &str) -> Option<&'static Instrument> {
    let code = normalize_code(code);
    CATALOG.iter().find(|i| i.code == code)
}

/// Look up an instrument by code, failing with a validation error
pub fn require(code: &str) -> Result<&'static Instrument> {
    lookup(code).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown instrument code '{}' (see `catalog` for supported codes)",
            code.trim()
        ))
    })
}

/// Check the catalog table for empty, non-normalized or duplicate codes
pub fn validate() -> Result<()> {
    validate_entries(CATALOG)
}

fn validate_entries(entries: &[Instrument]) -> Result<()> {
    if entries.is_empty() {
        return Err(AppError::Config("Instrument catalog is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if entry.code.is_empty() || entry.code != normalize_code(entry.code) {
            return Err(AppError::Config(format!(
                "Instrument code '{}' must be non-empty upper-case text",
                entry.code
            )));
        }
        if !seen.insert(entry.code) {
            return Err(AppError::Config(format!(
                "Instrument code '{}' appears more than once",
                entry.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        assert!(validate().is_ok());
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let entries = [
            instrument("GA", Category::Metal, "a", Unit::Gram),
            instrument("GA", Category::Metal, "b", Unit::Gram),
        ];
        assert!(matches!(validate_entries(&entries), Err(AppError::Config(_))));
    }

    #[test]
    fn test_lowercase_code_rejected() {
        let entries = [instrument("usd", Category::Currency, "x", Unit::Piece)];
        assert!(validate_entries(&entries).is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let usd = lookup("  usd ").unwrap();
        assert_eq!(usd.category, Category::Currency);
        assert!(lookup("XAU").is_none());
        assert!(matches!(require("XAU"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("Gram".parse::<Unit>().unwrap(), Unit::Gram);
        assert_eq!("pcs".parse::<Unit>().unwrap(), Unit::Piece);
        assert!(!Unit::Piece.is_mass());
        assert!("litre".parse::<Unit>().is_err());
    }
}
