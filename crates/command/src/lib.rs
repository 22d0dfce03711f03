//! Turns raw user text into a typed [`Intent`].
//!
//! Parsing is a pure function of the input: no I/O, no state, and no panics
//! for any input string. Malformed text maps to `Intent::Unrecognized` on
//! the query path, or to [`ParseError`] when an alert command (`設定 ...`)
//! does not match the expected shape — the caller turns that into a
//! format-hint message.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use common::{Alert, AlertOp, Intent, Window};

/// First token that switches to multi-stock query mode.
pub const MULTI_QUERY_MARKER: &str = "查";

/// First token that switches to alert registration.
pub const ALERT_MARKER: &str = "設定";

/// Second tokens that select the 30-day window on a single query.
/// Any other second token is silently ignored.
const THIRTY_DAY_SYNONYMS: &[&str] = &["30", "30天", "30日", "月線"];

/// An alert command that did not match `設定 <代碼> <符號> <價格>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed alert command: {raw:?}")]
pub struct ParseError {
    pub raw: String,
}

/// Expected alert shape: marker, digit stock id, `<` or `>`, non-negative
/// decimal. Whitespace around the operator is optional; trailing text is
/// ignored.
static ALERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^設定\s+(\d+)\s*([<>])\s*(\d+\.?\d*)").expect("alert pattern is valid")
});

/// Parse one user utterance.
///
/// `Err` is only returned for a malformed alert command; every other string
/// maps to exactly one `Intent` variant.
pub fn parse(raw: &str) -> Result<Intent, ParseError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    let Some((&first, rest)) = tokens.split_first() else {
        return Ok(Intent::Unrecognized {
            raw: raw.to_string(),
        });
    };

    // Alert registration takes priority over the query path whenever the
    // text starts with the marker, regardless of what follows.
    if first == ALERT_MARKER {
        return parse_alert(raw).map(Intent::SetAlert);
    }

    if first == MULTI_QUERY_MARKER && !rest.is_empty() {
        return Ok(Intent::MultiQuery {
            stock_ids: rest.iter().map(|s| (*s).to_string()).collect(),
        });
    }

    let window = match rest.first() {
        Some(second) if THIRTY_DAY_SYNONYMS.contains(second) => Window::ThirtyDay,
        _ => Window::FiveDay,
    };

    Ok(Intent::SingleQuery {
        stock_id: first.to_string(),
        window,
    })
}

/// Parse an alert registration command on its own.
pub fn parse_alert(raw: &str) -> Result<Alert, ParseError> {
    let caps = ALERT_RE.captures(raw.trim()).ok_or_else(|| ParseError {
        raw: raw.to_string(),
    })?;

    let op = match &caps[2] {
        ">" => AlertOp::Above,
        _ => AlertOp::Below,
    };
    let target: f64 = caps[3].parse().map_err(|_| ParseError {
        raw: raw.to_string(),
    })?;

    Ok(Alert {
        stock_id: caps[1].to_string(),
        op,
        target,
    })
}
