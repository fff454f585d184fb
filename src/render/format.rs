use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NOT_ASSIGNED: &str = "Not assigned";

/// A value worth displaying: non-empty and not the "N/A" placeholder.
pub fn known(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NOT_AVAILABLE)
}

pub fn or_na(value: &Option<String>) -> &str {
    known(value).unwrap_or(NOT_AVAILABLE)
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_instant(raw)
        .map(|instant| instant.date_naive())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// Auto-update expiration as "June 2027". Unparsable input is returned as is.
pub fn format_aue(value: &Option<String>) -> String {
    let Some(raw) = known(value) else {
        return NOT_AVAILABLE.to_string();
    };
    match parse_date(raw) {
        Some(date) => date.format("%B %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn format_timestamp(value: &Option<String>) -> String {
    let Some(raw) = known(value) else {
        return NOT_AVAILABLE.to_string();
    };
    match parse_instant(raw) {
        Some(instant) => instant.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => raw.to_string(),
    }
}

pub fn format_date(value: &Option<String>) -> String {
    let Some(raw) = known(value) else {
        return NOT_AVAILABLE.to_string();
    };
    match parse_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

pub fn format_fee(balance: f64) -> String {
    if balance < 0.0 {
        format!("-${:.2}", balance.abs())
    } else {
        format!("${balance:.2}")
    }
}

/// Battery percentage without a trailing `.0` for whole numbers.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}%")
    } else {
        format!("{value:.1}%")
    }
}

/// Thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn aue_formats_month_and_year() {
        assert_eq!(format_aue(&some("2027-06-01")), "June 2027");
        assert_eq!(format_aue(&some("2027-06-01T00:00:00Z")), "June 2027");
        assert_eq!(format_aue(&some("2029-11-30T12:00:00")), "November 2029");
    }

    #[test]
    fn aue_keeps_unparsable_values() {
        assert_eq!(
            format_aue(&some("invalid-date-string")),
            "invalid-date-string"
        );
        assert_eq!(format_aue(&None), "N/A");
        assert_eq!(format_aue(&some("N/A")), "N/A");
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_timestamp(&some("2025-03-04T10:15:00+02:00")),
            "2025-03-04 08:15 UTC"
        );
        assert_eq!(
            format_timestamp(&some("2025-03-04T10:15:30.123456")),
            "2025-03-04 10:15 UTC"
        );
        assert_eq!(format_timestamp(&some("yesterday")), "yesterday");
    }

    #[test]
    fn fees_and_counts() {
        assert_eq!(format_fee(12.5), "$12.50");
        assert_eq!(format_fee(-2.0), "-$2.00");
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_percent(71.0), "71%");
        assert_eq!(format_percent(71.26), "71.3%");
    }
}
