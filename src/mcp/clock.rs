//! Wall-clock helpers shared by `initialize`, the runtime resource and the
//! `get_current_time` tool.

use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat, Utc};
use chrono_tz::Tz;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where to read the clock from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
}

impl FromStr for Zone {
    type Err = String;

    /// `Local`, `UTC`/`Z`, an IANA name such as `Europe/Rome`, or a numeric
    /// offset such as `+05:30` or `-0800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Zone::Utc);
        }
        if let Some(offset) = parse_offset(s) {
            return Ok(Zone::Fixed(offset));
        }
        s.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| format!("invalid timezone '{}': unknown time zone {}", s, s))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Zone {
    pub fn now(self) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => Local::now().fixed_offset(),
            Zone::Utc => Utc::now().fixed_offset(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset),
            Zone::Named(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
        }
    }

    pub fn label(self, at: &DateTime<FixedOffset>) -> String {
        match self {
            Zone::Local => format!("Local ({})", at.format("%:z")),
            Zone::Utc => "UTC".to_string(),
            Zone::Fixed(_) => at.format("%:z").to_string(),
            Zone::Named(tz) => tz.name().to_string(),
        }
    }
}

pub fn rfc3339(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn date(at: &DateTime<FixedOffset>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Render with a strftime pattern, rejecting patterns chrono cannot format.
pub fn custom(at: &DateTime<FixedOffset>, pattern: &str) -> Result<String, String> {
    let items: Vec<Item> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid time format '{}'", pattern));
    }
    Ok(at.format_with_items(items.into_iter()).to_string())
}
