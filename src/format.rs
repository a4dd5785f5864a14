use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 12,34,567.00
    #[default]
    Indian,
    /// 1,234,567.00
    Western,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub symbol: String,
    pub grouping: Grouping,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: "₹".to_string(),
            grouping: Grouping::Indian,
        }
    }
}

impl MoneyFormat {
    pub fn format(&self, v: f64) -> String {
        let s = format!("{:.2}", v.abs());
        let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
        let grouped = group_digits(int_part, self.grouping);
        // -0.004 rounds to 0.00 and must not print as negative.
        let negative = v < 0.0 && s.bytes().any(|b| b.is_ascii_digit() && b != b'0');
        let sign = if negative { "-" } else { "" };
        format!("{sign}{}{grouped}.{dec_part}", self.symbol)
    }
}

fn group_digits(int_part: &str, grouping: Grouping) -> String {
    let chars: Vec<char> = int_part.chars().collect();
    let mut out = String::new();
    let mut cnt = 0;
    // Indian grouping: the last three digits, then pairs.
    let mut group = 3;
    for i in (0..chars.len()).rev() {
        if cnt == group {
            out.push(',');
            cnt = 0;
            if grouping == Grouping::Indian {
                group = 2;
            }
        }
        out.push(chars[i]);
        cnt += 1;
    }
    out.chars().rev().collect()
}

pub fn parse_ymd(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// `DD/MM/YYYY`; unparseable input is shown as stored.
pub fn display_date(raw: &str) -> String {
    match parse_ymd(raw) {
        Some(d) => format!("{:02}/{:02}/{:04}", d.day(), u8::from(d.month()), d.year()),
        None => raw.to_string(),
    }
}

pub fn display_timestamp(ts: OffsetDateTime) -> String {
    format!(
        "{:02}/{:02}/{:04}, {:02}:{:02}:{:02}",
        ts.day(),
        u8::from(ts.month()),
        ts.year(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

pub fn month_name(m: Month) -> String {
    m.to_string()
}

/// Local wall-clock time, UTC when the local offset cannot be determined.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ';
        out.push(if ok { ch } else { '_' });
    }
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() { "expense-report.pdf".to_string() } else { trimmed }
}

pub fn statement_filename(month: Month, year: i32) -> String {
    sanitize_filename(&format!("expense-report-{}-{}.pdf", month_name(month), year))
}

/// First `max_chars` characters, counted as chars rather than bytes.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}
