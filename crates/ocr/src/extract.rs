//! Structured field extraction from recognized receipt text.
//!
//! Every field degrades independently: a receipt with no recognizable
//! amount still yields a record, just with that field at its fallback.
//! [`FieldCoverage`] keeps track of which fields actually matched so the
//! confidence policy can price the gaps in.

use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use jeonpyo_core::{FieldCoverage, Won};

use crate::recognizer::ExtractedText;

/// Merchant fallback when no line of text survived recognition.
pub const UNKNOWN_MERCHANT: &str = "unknown";

/// Upper bound on line items carried into a record.
pub const MAX_LINE_ITEMS: usize = 5;

macro_rules! re {
    ($name:ident, $pattern:literal) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("invalid regex"))
        }
    };
}

// Grouped form first so "4,500원" is not cut short at "500원".
re!(re_amount, r"(?:[0-9]{1,3}(?:,[0-9]{3})*원|[0-9]+원)");

// Y-M-D keeps groups 1-3, D-M-Y groups 4-6. The branch that matched
// decides how the digits are read.
re!(
    re_date,
    r"(?:([0-9]{4})[-/]([0-9]{2})[-/]([0-9]{2})|([0-9]{2})[-/]([0-9]{2})[-/]([0-9]{4}))"
);

/// Fields pulled out of one receipt's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFields {
    pub merchant: String,
    pub amount: Won,
    pub date: NaiveDate,
    pub items: Vec<String>,
    pub coverage: FieldCoverage,
}

/// Heuristic parser for Korean receipt layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldParser;

impl FieldParser {
    pub fn new() -> Self {
        FieldParser
    }

    /// Parse with today's date as the fallback for a missing receipt date.
    pub fn parse(&self, text: &ExtractedText) -> ParsedFields {
        self.parse_at(text, Utc::now().date_naive())
    }

    /// Parse with an explicit fallback date. Never fails; unmatched fields
    /// take their fallbacks and are marked absent in the coverage.
    pub fn parse_at(&self, text: &ExtractedText, today: NaiveDate) -> ParsedFields {
        let raw = text.raw();
        let merchant = first_nonblank_line(raw);
        let amount = first_amount(raw);
        let date = first_date(raw);
        let items = line_items(raw);

        let coverage = FieldCoverage {
            merchant: merchant.is_some(),
            amount: amount.is_some(),
            date: date.is_some(),
            items: items.len(),
        };
        if date.is_none() {
            tracing::debug!(fallback = %today, "no date recognized, using processing date");
        }

        ParsedFields {
            merchant: merchant.map_or_else(|| UNKNOWN_MERCHANT.to_string(), str::to_string),
            amount: Won::new(amount.unwrap_or(0)),
            date: date.unwrap_or(today),
            items,
            coverage,
        }
    }
}

/// Merchant name: first line with any visible content, trimmed.
fn first_nonblank_line(raw: &str) -> Option<&str> {
    raw.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Total: first `원`-suffixed number, digit separators stripped.
fn first_amount(raw: &str) -> Option<u64> {
    let matched = re_amount().find(raw)?;
    let digits: String = matched
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Purchase date: first match that is a real calendar date. Matches that
/// look like dates but do not exist (month 13, day 32) are skipped and the
/// scan continues in text order.
fn first_date(raw: &str) -> Option<NaiveDate> {
    for caps in re_date().captures_iter(raw) {
        let (y, m, d) = if caps.get(1).is_some() {
            (group(&caps, 1), group(&caps, 2), group(&caps, 3))
        } else {
            (group(&caps, 6), group(&caps, 5), group(&caps, 4))
        };
        if let (Some(y), Some(m), Some(d)) = (y, m, d) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m as u32, d as u32) {
                return Some(date);
            }
        }
    }
    None
}

fn group(caps: &regex::Captures<'_>, idx: usize) -> Option<i32> {
    caps.get(idx)?.as_str().parse().ok()
}

/// Line items: lines carrying a quantity marker, in text order, capped at
/// [`MAX_LINE_ITEMS`]. `EA` is matched case-sensitively; lowercase "ea"
/// appears inside too many ordinary words.
fn line_items(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| line.contains('개') || line.contains("EA") || line.contains("수량"))
        .take(MAX_LINE_ITEMS)
        .map(str::to_string)
        .collect()
}
