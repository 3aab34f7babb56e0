// src/services/filters.rs
use serde::Deserialize;

use crate::models::HybridView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    #[default]
    All,
    Gain,
    Loss,
}

/// Price bands on the display price. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PriceRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "under_1000")]
    Under1000,
    #[serde(rename = "1000_5000")]
    From1000To5000,
    #[serde(rename = "5000_10000")]
    From5000To10000,
    #[serde(rename = "above_10000")]
    Above10000,
}

impl PriceRange {
    fn contains(self, price: f64) -> bool {
        match self {
            PriceRange::All => true,
            PriceRange::Under1000 => price < 1000.0,
            PriceRange::From1000To5000 => (1000.0..5000.0).contains(&price),
            PriceRange::From5000To10000 => (5000.0..10000.0).contains(&price),
            PriceRange::Above10000 => price >= 10000.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub performance: Performance,
    #[serde(default)]
    pub stage2: Option<String>,
    #[serde(default, rename = "call")]
    pub advisory_call: Option<String>,
    #[serde(default)]
    pub price_range: PriceRange,
}

// "All" / "All Calls" from the dashboard dropdowns mean no filter
fn active_tag(tag: &Option<String>) -> Option<&str> {
    tag.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.to_lowercase().starts_with("all"))
}

fn matches_query(view: &HybridView, query: &str) -> bool {
    let name_hit = view
        .base_data
        .name
        .as_deref()
        .map(|n| n.to_lowercase().contains(query))
        .unwrap_or(false);
    let code_hit = view
        .base_data
        .listing_code()
        .map(|c| c.to_lowercase().contains(query))
        .unwrap_or(false);
    name_hit || code_hit
}

impl SearchFilters {
    /// A text query wins outright; otherwise every other filter applies.
    pub fn apply(&self, views: &[HybridView]) -> Vec<HybridView> {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty() {
            return views
                .iter()
                .filter(|v| matches_query(v, &query))
                .cloned()
                .collect();
        }

        let stage2 = active_tag(&self.stage2);
        let call = active_tag(&self.advisory_call);

        views
            .iter()
            .filter(|v| match self.performance {
                Performance::All => true,
                Performance::Gain => v.calculated.gain_loss > 0.0,
                Performance::Loss => v.calculated.gain_loss < 0.0,
            })
            .filter(|v| stage2.map_or(true, |s| v.base_data.stage2.as_deref() == Some(s)))
            .filter(|v| call.map_or(true, |c| v.base_data.advisory_call.as_deref() == Some(c)))
            .filter(|v| self.price_range.contains(v.calculated.current_price))
            .cloned()
            .collect()
    }
}
