use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trading-day window for historical close queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    FiveDay,
    ThirtyDay,
}

impl Window {
    /// Number of trading days covered by this window.
    pub fn days(self) -> usize {
        match self {
            Window::FiveDay => 5,
            Window::ThirtyDay => 30,
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.days())
    }
}

/// Direction of a price-threshold alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOp {
    /// Fires when the current price is strictly above the target.
    Above,
    /// Fires when the current price is strictly below the target.
    Below,
}

impl AlertOp {
    /// Whether the threshold condition holds for `current` against `target`.
    pub fn holds(self, current: f64, target: f64) -> bool {
        match self {
            AlertOp::Above => current > target,
            AlertOp::Below => current < target,
        }
    }

    /// Natural-language direction used in notification text.
    pub fn in_words(self) -> &'static str {
        match self {
            AlertOp::Above => "高於",
            AlertOp::Below => "低於",
        }
    }
}

impl std::fmt::Display for AlertOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertOp::Above => write!(f, ">"),
            AlertOp::Below => write!(f, "<"),
        }
    }
}

/// A pending one-shot price-threshold watch.
///
/// Owned by the alert registry under its subscriber; removed the moment its
/// condition is observed true during a sweep. Structural equality is what
/// `remove` matches on — identical alerts may coexist and fire independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub stock_id: String,
    pub op: AlertOp,
    pub target: f64,
}

/// A parsed user utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Price + trend for one stock.
    SingleQuery { stock_id: String, window: Window },
    /// Price + trend for several stocks. Always the 5-day window — the
    /// multi-query command does not accept a window argument.
    MultiQuery { stock_ids: Vec<String> },
    /// Register a one-shot threshold alert.
    SetAlert(Alert),
    /// Input that matched no command shape (e.g. empty text).
    Unrecognized { raw: String },
}

/// Latest traded price for a listed stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub stock_id: String,
    /// Display name, e.g. "台積電".
    pub name: String,
    pub price: f64,
}

/// One daily close, as returned by the market data gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Extrema of a close series, used to annotate the trend chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSummary {
    pub max_price: f64,
    pub max_date: NaiveDate,
    pub min_price: f64,
    pub min_date: NaiveDate,
}

/// Opaque reference to a rendered chart, usable by the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartHandle {
    /// Publicly reachable image URL.
    pub url: String,
}

/// Outbound message content produced by the reply builder.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Text(String),
    TextWithChart { text: String, chart: ChartHandle },
}
