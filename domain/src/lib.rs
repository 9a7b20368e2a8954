use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One owned position as reported by the upstream portfolio source.
///
/// Every derived field (`investment`, `present_value`, `gain_loss`, ...) is computed upstream and
/// carried through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub exchange: String,
    pub sector: String,
    pub purchase_price: f64,
    pub quantity: f64,
    pub investment: f64,
    pub cmp: f64,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: String,
    pub pe_ratio: PeRatio,
    pub eps: f64,
    pub latest_net_income: String,
    pub portfolio_percent: String,
}

impl Holding {
    pub fn is_gain(&self) -> bool {
        self.gain_loss > 0.0
    }
}

/// P/E is numeric when earnings are positive; upstream sends a marker string otherwise.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PeRatio {
    Value(f64),
    Unavailable(String),
}

impl std::fmt::Display for PeRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeRatio::Value(value) => write!(f, "{value}"),
            PeRatio::Unavailable(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PortfolioPayload {
    pub portfolio: Vec<Holding>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("upstream body is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("invalid upstream shape: {0}")]
    InvalidShape(#[source] serde_json::Error),
}

impl PortfolioPayload {
    /// Parses a raw upstream body, telling apart bytes that are not JSON at all from JSON that
    /// does not match the holding schema.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(PayloadError::Malformed)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, PayloadError> {
        serde_json::from_value(value).map_err(PayloadError::InvalidShape)
    }
}

/// Per-sector rollup derived from a snapshot on every render.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub investment: f64,
    pub present_value: f64,
    pub gain_loss_percent: String,
}

impl SectorSummary {
    pub fn is_gain(&self) -> bool {
        self.gain_loss_percent
            .parse::<f64>()
            .map(|pct| pct >= 0.0)
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectorAllocation {
    pub sector: String,
    pub present_value: f64,
    /// Percent of the total present value, 0.0 when the portfolio is worth nothing.
    pub share: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SectorBreakdown {
    pub sectors: Vec<SectorSummary>,
    pub allocation: Vec<SectorAllocation>,
}
