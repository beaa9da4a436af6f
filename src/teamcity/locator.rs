//! Locator strings and TeamCity timestamp helpers.
//!
//! A locator is TeamCity's `key:value,key:value` filter language. The count
//! dimension always leads, the remaining clauses keep insertion order.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

pub const DEFAULT_COUNT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct Locator {
    count: Option<u32>,
    clauses: Vec<String>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` of zero or absent falls back to [`DEFAULT_COUNT`].
    pub fn with_count(count: Option<u32>) -> Self {
        let count = count.filter(|c| *c > 0).unwrap_or(DEFAULT_COUNT);
        Self {
            count: Some(count),
            clauses: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &str, value: impl std::fmt::Display) -> &mut Self {
        self.clauses.push(format!("{}:{}", key, value));
        self
    }

    /// Skips `None` and empty strings.
    pub fn push_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(key, value);
        }
        self
    }

    pub fn push_bool(&mut self, key: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn push_num(&mut self, key: &str, value: Option<u32>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Appends a preformatted clause verbatim.
    pub fn push_raw(&mut self, clause: Option<&str>) -> &mut Self {
        if let Some(clause) = clause.map(str::trim).filter(|c| !c.is_empty()) {
            self.clauses.push(clause.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.clauses.is_empty()
    }

    pub fn build(&self) -> String {
        let mut parts = Vec::with_capacity(self.clauses.len() + 1);
        if let Some(count) = self.count {
            parts.push(format!("count:{}", count));
        }
        parts.extend(self.clauses.iter().cloned());
        parts.join(",")
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

const TC_DATE_WITH_OFFSET: &str = "%Y%m%dT%H%M%S%z";
const TC_DATE_NAIVE: &str = "%Y%m%dT%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse `20240101T100000+0000`, falling back to the offset-less form as UTC.
pub fn parse_teamcity_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_str(raw, TC_DATE_WITH_OFFSET) {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(raw, TC_DATE_NAIVE)
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Render a TeamCity timestamp as `YYYY-MM-DD HH:MM:SS` in its own offset.
/// Unparseable input is returned unchanged.
pub fn format_teamcity_date(raw: &str) -> String {
    match parse_teamcity_date(raw) {
        Some(date) => date.format(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Compact duration between two TeamCity timestamps: `45s`, `3m`, `3m 7s`,
/// `2h`, `2h 15m`. Empty when either side is missing or unparseable, or the
/// end precedes the start.
pub fn calculate_duration(start: &str, end: &str) -> String {
    if start.is_empty() || end.is_empty() {
        return String::new();
    }
    let (Some(start), Some(end)) = (parse_teamcity_date(start), parse_teamcity_date(end)) else {
        return String::new();
    };

    let seconds = (end - start).num_seconds();
    if seconds < 0 {
        return String::new();
    }
    format_seconds(seconds)
}

fn format_seconds(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let (minutes, rest) = (seconds / 60, seconds % 60);
        if rest == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, rest)
        }
    } else {
        let (hours, minutes) = (seconds / 3600, (seconds % 3600) / 60);
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
