// src/services/symbols.rs
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::ListingCode;

const BUNDLED_SYMBOL_MAP: &str = include_str!("../../config/symbol_map.json");

#[derive(Debug, Deserialize)]
struct SymbolMapFile {
    default_suffix: String,
    #[serde(default)]
    passthrough_suffixes: Vec<String>,
    #[serde(default)]
    symbols: HashMap<String, String>,
}

/// Maps spreadsheet listing codes to provider tickers.
#[derive(Debug, Clone)]
pub struct SymbolMapper {
    table: HashMap<String, String>,
    default_suffix: String,
    passthrough_suffixes: Vec<String>,
}

impl SymbolMapper {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_SYMBOL_MAP).context("bundled symbol map is invalid")
    }

    /// Loads the table from `path`, or the bundled table when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read symbol map {}", path.display()))?;
                let mapper = Self::from_json(&raw)
                    .with_context(|| format!("failed to parse symbol map {}", path.display()))?;
                info!("Loaded {} symbol overrides from {}", mapper.table.len(), path.display());
                Ok(mapper)
            }
            None => Self::bundled(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: SymbolMapFile = serde_json::from_str(raw)?;
        Ok(SymbolMapper {
            table: file.symbols,
            default_suffix: file.default_suffix,
            passthrough_suffixes: file.passthrough_suffixes,
        })
    }

    pub fn map_str(&self, code: &str) -> String {
        let code = code.trim();
        if let Some(ticker) = self.table.get(code) {
            return ticker.clone();
        }
        if self
            .passthrough_suffixes
            .iter()
            .any(|suffix| code.ends_with(suffix.as_str()))
        {
            return code.to_string();
        }
        format!("{}{}", code, self.default_suffix)
    }

    pub fn map(&self, code: &ListingCode) -> String {
        self.map_str(&code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_covers_provider_quirks() {
        let mapper = SymbolMapper::bundled().unwrap();
        assert_eq!(mapper.map_str("SBLIFE"), "SBILIFE.NS");
        assert_eq!(mapper.map_str("HDFCBANK"), "HDFCBANK.NS");
    }

    #[test]
    fn float_scrip_codes_map_without_decimal() {
        let mapper = SymbolMapper::bundled().unwrap();
        let code: ListingCode = serde_json::from_value(json!(544028.0)).unwrap();
        assert_eq!(mapper.map(&code), "544028.NS");
    }

    #[test]
    fn unknown_codes_get_the_default_suffix() {
        let mapper = SymbolMapper::bundled().unwrap();
        assert_eq!(mapper.map_str(" RELIANCE "), "RELIANCE.NS");

        let numeric: ListingCode = serde_json::from_value(json!(543272)).unwrap();
        assert_eq!(mapper.map(&numeric), "543272.NS");
    }

    #[test]
    fn already_suffixed_tickers_pass_through() {
        let mapper = SymbolMapper::bundled().unwrap();
        assert_eq!(mapper.map_str("TCS.NS"), "TCS.NS");
        assert_eq!(mapper.map_str("500325.BO"), "500325.BO");
    }

    #[test]
    fn custom_table_and_suffix() {
        let mapper = SymbolMapper::from_json(
            r#"{ "default_suffix": ".BO", "symbols": { "M&M": "M&M.NS" } }"#,
        )
        .unwrap();
        assert_eq!(mapper.map_str("M&M"), "M&M.NS");
        assert_eq!(mapper.map_str("TCS.NS"), "TCS.NS.BO");
        assert_eq!(mapper.map_str("ITC"), "ITC.BO");
    }

    #[test]
    fn load_reads_a_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/symbol_map.json");
        let mapper = SymbolMapper::load(Some(&path)).unwrap();
        assert_eq!(mapper.map_str("SBLIFE"), "SBILIFE.NS");
        assert!(SymbolMapper::load(Some(Path::new("does/not/exist.json"))).is_err());
    }
}
