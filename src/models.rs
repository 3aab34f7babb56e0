// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Exchange listing code as it appears in the `NSE/BSE` column: NSE tickers
/// are text, BSE scrip codes are plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingCode {
    Numeric(serde_json::Number),
    Text(String),
}

impl ListingCode {
    /// Trimmed code, or `None` when the cell is blank.
    pub fn normalized(&self) -> Option<String> {
        let code = self.to_string().trim().to_string();
        if code.is_empty() {
            None
        } else {
            Some(code)
        }
    }
}

impl fmt::Display for ListingCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            // Scrip codes exported as 544028.0 still read as 544028
            ListingCode::Numeric(n) => match n.as_f64() {
                Some(v) if n.is_f64() && v.is_finite() && v.fract() == 0.0 => {
                    write!(f, "{:.0}", v)
                }
                _ => write!(f, "{}", n),
            },
            ListingCode::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ListingCode {
    fn from(code: &str) -> Self {
        ListingCode::Text(code.to_string())
    }
}

// Spreadsheet cells arrive as numbers, numeric strings or placeholders like "-".
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_row_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u32))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// One row of the spreadsheet snapshot. Column names are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    #[serde(rename = "No", default, deserialize_with = "lenient_row_number")]
    pub row_number: Option<u32>,
    #[serde(rename = "Particulars", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "Purchase Price", default, deserialize_with = "lenient_f64")]
    pub purchase_price: Option<f64>,
    #[serde(rename = "Qty", default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
    #[serde(rename = "Investment", default, deserialize_with = "lenient_f64")]
    pub investment: Option<f64>,
    #[serde(rename = "Portfolio (%)", default, deserialize_with = "lenient_f64")]
    pub portfolio_weight: Option<f64>,
    #[serde(rename = "NSE/BSE", default)]
    pub listing_code: Option<ListingCode>,
    #[serde(rename = "CMP", default, deserialize_with = "lenient_f64")]
    pub last_price: Option<f64>,
    #[serde(rename = "Present value", default, deserialize_with = "lenient_f64")]
    pub static_present_value: Option<f64>,
    #[serde(rename = "Gain/Loss", default, deserialize_with = "lenient_f64")]
    pub static_gain_loss: Option<f64>,
    #[serde(rename = "Gain/Loss\n(%)", default, deserialize_with = "lenient_f64")]
    pub static_gain_loss_percent: Option<f64>,

    // Fundamentals and valuation
    #[serde(rename = "Market Cap", default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(rename = "P/E (TTM)", default, deserialize_with = "lenient_f64")]
    pub pe_ttm: Option<f64>,
    #[serde(rename = "Latest Earnings", default, deserialize_with = "lenient_f64")]
    pub latest_earnings: Option<f64>,
    #[serde(rename = "Core Fundamentals", default, deserialize_with = "lenient_f64")]
    pub core_fundamentals: Option<f64>,
    #[serde(rename = "EBITDA\n(TTM)", default, deserialize_with = "lenient_f64")]
    pub ebitda_ttm: Option<f64>,
    #[serde(rename = "EBITDA (%)", default, deserialize_with = "lenient_f64")]
    pub ebitda_percent: Option<f64>,
    #[serde(rename = "PAT", default, deserialize_with = "lenient_f64")]
    pub pat: Option<f64>,
    #[serde(rename = "PAT (%)", default, deserialize_with = "lenient_f64")]
    pub pat_percent: Option<f64>,
    #[serde(rename = "CFO (March 24)", default, deserialize_with = "lenient_f64")]
    pub cfo_march_24: Option<f64>,
    #[serde(rename = "CFO \n(5 years)", default, deserialize_with = "lenient_f64")]
    pub cfo_5y: Option<f64>,
    #[serde(rename = "Free Cash Flow\n(5 years)", default, deserialize_with = "lenient_f64")]
    pub free_cash_flow_5y: Option<f64>,
    #[serde(rename = "Debt to Equity", default, deserialize_with = "lenient_f64")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "Book Value", default, deserialize_with = "lenient_f64")]
    pub book_value: Option<f64>,
    #[serde(rename = "Growth (3 years", default, deserialize_with = "lenient_f64")]
    pub growth_3y: Option<f64>,
    #[serde(rename = "EBITDA", default, deserialize_with = "lenient_f64")]
    pub ebitda: Option<f64>,
    #[serde(rename = "Profit", default, deserialize_with = "lenient_f64")]
    pub profit: Option<f64>,
    #[serde(rename = "Market\nCap", default, deserialize_with = "lenient_f64")]
    pub market_cap_secondary: Option<f64>,
    #[serde(rename = "Price to Sales", default, deserialize_with = "lenient_f64")]
    pub price_to_sales: Option<f64>,
    #[serde(rename = "CFO to EBITDA", default, deserialize_with = "lenient_f64")]
    pub cfo_to_ebitda: Option<f64>,
    #[serde(rename = "CFO to PAT", default, deserialize_with = "lenient_f64")]
    pub cfo_to_pat: Option<f64>,
    #[serde(rename = "Price to book", default, deserialize_with = "lenient_f64")]
    pub price_to_book: Option<f64>,

    // Advisory tags
    #[serde(rename = "Stage-2", default, deserialize_with = "lenient_string")]
    pub stage2: Option<String>,
    #[serde(rename = "Sale price", default, deserialize_with = "lenient_f64")]
    pub sale_price: Option<f64>,
    #[serde(rename = "Abhishek", default, deserialize_with = "lenient_string")]
    pub advisory_call: Option<String>,
}

impl HoldingRecord {
    /// Listing code with blanks treated as absent.
    pub fn listing_code(&self) -> Option<String> {
        self.listing_code.as_ref().and_then(ListingCode::normalized)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default)]
    pub total_columns: usize,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    pub data: Vec<HoldingRecord>,
}

/// Point-in-time quote normalized from any provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub earnings_per_share: f64,
    pub dividend_yield: f64,
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedMetrics {
    pub current_price: f64,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub portfolio_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridView {
    pub base_data: HoldingRecord,
    pub live_data: Option<LiveQuote>,
    pub calculated: CalculatedMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_stocks: usize,
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub symbol: String,
    pub pe_ratio: f64,
    pub earnings: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}
