use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 14/50 EMA relationship on the latest bars
///
/// `Cross` wins over `Trend`; the two never hold together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmaSignal {
    #[default]
    None,
    Trend,
    Cross,
}

/// Per-ticker technical read-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: bool,
    pub ema_signal: EmaSignal,
    pub golden: bool,
    pub adx: f64,
    pub vol_expand: bool,
    pub vol_contract: bool,
    pub consolidating: bool,
    #[serde(rename = "near52High")]
    pub near_52_high: bool,
}

impl TechnicalIndicators {
    /// Values shown when history was too short to analyze
    pub fn neutral() -> Self {
        Self {
            rsi: 50.0,
            macd: false,
            ema_signal: EmaSignal::None,
            golden: false,
            adx: 15.0,
            vol_expand: false,
            vol_contract: false,
            consolidating: false,
            near_52_high: false,
        }
    }
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Composite score split by component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(rename = "score")]
    pub total: u32,
    #[serde(rename = "fScore")]
    pub fundamental: u32,
    #[serde(rename = "cScore")]
    pub catalyst: u32,
    #[serde(rename = "tScore")]
    pub technical: u32,
    #[serde(rename = "lScore")]
    pub liquidity: u32,
}

/// Qualitative return-on-equity label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoeRisk {
    High,
    Medium,
    Low,
    #[default]
    Na,
}

/// Latest computed record for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub price: f64,
    pub change: f64,
    pub pe: f64,
    /// Market cap in crore
    pub mcap: i64,
    pub debt_eq: f64,
    pub roe: f64,
    pub roe_warn: RoeRisk,
    #[serde(rename = "wk52High")]
    pub wk52_high: f64,
    #[serde(rename = "wk52Low")]
    pub wk52_low: f64,
    #[serde(rename = "pctFrom52High")]
    pub pct_from_52_high: f64,
    #[serde(rename = "pctFrom52Low")]
    pub pct_from_52_low: f64,
    #[serde(flatten)]
    pub indicators: TechnicalIndicators,
    /// Average daily traded value in crore
    pub daily_vol: f64,
    #[serde(flatten)]
    pub score: ScoreBreakdown,
    pub chart_prices: Vec<f64>,
    pub chart_dates: Vec<String>,
}

/// Quote and fundamentals as reported by the provider
///
/// Every field is optional; defaulting happens once, in the scanner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFundamentals {
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub average_volume: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub sector: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
}

/// One daily OHLCV bar; providers report gaps as missing values
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// Lightweight price lookup used by the fast refresh
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LivePrice {
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Gap-free daily series handed to the analyzer
///
/// All columns have the same length and contain finite values only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl PriceSeries {
    /// Normalize raw bars: forward-fill prices, drop the leading gap, zero-fill volume
    pub fn from_bars(bars: &[HistoryBar]) -> Self {
        let mut series = PriceSeries::default();
        let mut last_close: Option<f64> = None;
        let mut last_high: Option<f64> = None;
        let mut last_low: Option<f64> = None;

        for bar in bars {
            let close = finite(bar.close).or(last_close);
            let Some(close) = close else {
                continue;
            };
            last_close = Some(close);

            let high = finite(bar.high).or(last_high).unwrap_or(close);
            let low = finite(bar.low).or(last_low).unwrap_or(close);
            last_high = Some(high);
            last_low = Some(low);

            series.dates.push(bar.date);
            series.closes.push(close);
            series.highs.push(high);
            series.lows.push(low);
            series.volumes.push(finite(bar.volume).unwrap_or(0.0));
        }

        series
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
