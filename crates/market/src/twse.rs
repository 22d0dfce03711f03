use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, MarketData, PricePoint, Quote, Result, Window};

const QUOTE_URL: &str = "https://mis.twse.com.tw/stock/api/getStockInfo.jsp";
const DAILY_URL: &str = "https://www.twse.com.tw/exchangeReport/STOCK_DAY";

/// How many months of STOCK_DAY data to walk backwards at most. A 30
/// trading-day window spans roughly six calendar weeks.
const MAX_MONTHS_BACK: u32 = 4;

/// Market data gateway against the Taiwan Stock Exchange public endpoints.
///
/// The realtime quote endpoint serves all listed ids; an id it does not know
/// comes back with an empty `msgArray`, which maps to `Error::UnknownSymbol`.
pub struct TwseClient {
    http: Client,
}

impl TwseClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Market(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

impl Default for TwseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for TwseClient {
    async fn current_quote(&self, stock_id: &str) -> Result<Quote> {
        let url = format!("{QUOTE_URL}?ex_ch=tse_{stock_id}.tw");
        debug!(stock_id, "Fetching realtime quote");
        let body = self.get_text(&url).await?;
        parse_quote_body(stock_id, &body)
    }

    async fn daily_closes(&self, stock_id: &str, window: Window) -> Result<Vec<PricePoint>> {
        let today = Utc::now().date_naive();
        let mut year = today.year();
        let mut month = today.month();
        let mut points: Vec<PricePoint> = Vec::new();

        // STOCK_DAY returns one calendar month per call; walk backwards
        // until the window is filled.
        for _ in 0..MAX_MONTHS_BACK {
            let url = format!(
                "{DAILY_URL}?response=json&date={year}{month:02}01&stockNo={stock_id}"
            );
            debug!(stock_id, year, month, "Fetching daily closes");
            let body = self.get_text(&url).await?;
            let resp: DailyResponse = serde_json::from_str(&body)?;

            if resp.stat == "OK" {
                let mut earlier = parse_daily_rows(&resp.data);
                earlier.extend(points);
                points = earlier;
            }

            if points.len() >= window.days() {
                break;
            }
            (year, month) = previous_month(year, month);
        }

        if points.is_empty() {
            return Err(Error::Market(format!("no daily close data for {stock_id}")));
        }

        let start = points.len().saturating_sub(window.days());
        Ok(points.split_off(start))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    /// Stock code.
    #[serde(rename = "c")]
    code: String,
    /// Display name.
    #[serde(rename = "n")]
    name: String,
    /// Latest trade price; `"-"` before the first trade of the day.
    #[serde(rename = "z", default)]
    latest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    stat: String,
    #[serde(default)]
    data: Vec<Vec<String>>,
}

fn parse_quote_body(stock_id: &str, body: &str) -> Result<Quote> {
    let resp: QuoteResponse = serde_json::from_str(body)?;
    let entry = resp
        .msg_array
        .into_iter()
        .find(|e| e.code == stock_id)
        .ok_or_else(|| Error::UnknownSymbol(stock_id.to_string()))?;

    let latest = entry.latest.as_deref().unwrap_or("-");
    let price: f64 = latest
        .parse()
        .map_err(|_| Error::Market(format!("no trade price yet for {stock_id}")))?;

    Ok(Quote {
        stock_id: stock_id.to_string(),
        name: entry.name,
        price,
    })
}

/// STOCK_DAY dates are ROC-calendar (`114/05/02` = 2025-05-02).
fn parse_roc_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year + 1911, month, day)
}

/// Closes come grouped with commas (`"1,005.00"`); `"--"` marks a day with
/// no trades and is skipped.
fn parse_close(s: &str) -> Option<f64> {
    s.replace(',', "").parse().ok()
}

/// Column layout: date, volume, value, open, high, low, close, ...
fn parse_daily_rows(rows: &[Vec<String>]) -> Vec<PricePoint> {
    rows.iter()
        .filter_map(|row| {
            let date = parse_roc_date(row.first()?)?;
            let close = parse_close(row.get(6)?)?;
            Some(PricePoint { date, close })
        })
        .collect()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
