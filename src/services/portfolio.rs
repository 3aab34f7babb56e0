// src/services/portfolio.rs
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::models::{HoldingRecord, PortfolioSnapshot, SnapshotMetadata};

/// The spreadsheet snapshot, loaded once at startup.
pub struct PortfolioStore {
    snapshot: PortfolioSnapshot,
}

/// Spreadsheet exports interleave repeated header rows and sector subtotals
/// with the actual positions.
fn is_individual_holding(row: &HoldingRecord) -> bool {
    match (&row.row_number, row.name.as_deref().map(str::trim)) {
        (Some(_), Some(name)) => {
            !name.is_empty() && name != "Particulars" && !name.contains("Sector")
        }
        _ => false,
    }
}

impl PortfolioStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read portfolio snapshot {}", path.display()))?;
        let store = Self::from_json(&raw)
            .with_context(|| format!("failed to parse portfolio snapshot {}", path.display()))?;
        info!(
            "Loaded {} rows ({} holdings) from {}",
            store.snapshot.data.len(),
            store.individual_holdings().len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: PortfolioSnapshot = serde_json::from_str(raw)?;
        Ok(PortfolioStore { snapshot })
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.snapshot.metadata
    }

    pub fn individual_holdings(&self) -> Vec<HoldingRecord> {
        self.snapshot
            .data
            .iter()
            .filter(|row| is_individual_holding(row))
            .cloned()
            .collect()
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Option<HoldingRecord> {
        let symbol = symbol.trim();
        self.individual_holdings()
            .into_iter()
            .find(|h| h.listing_code().map_or(false, |c| c.eq_ignore_ascii_case(symbol)))
    }

    pub fn find_by_name(&self, fragment: &str) -> Option<HoldingRecord> {
        let fragment = fragment.trim().to_lowercase();
        self.individual_holdings().into_iter().find(|h| {
            h.name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&fragment))
                .unwrap_or(false)
        })
    }
}
