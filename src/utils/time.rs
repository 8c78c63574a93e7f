use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Interprets user supplied timestamps. RFC 3339 is tried first, then natural phrases such as
/// "10 minutes ago" or "12:00 16/03/2025" (day/month/year) relative to `now`.
pub fn parse_timestamp(input: &str, now: DateTime<Local>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(v) = DateTime::parse_from_rfc3339(input) {
        return Ok(v.with_timezone(&Utc));
    }
    parse_date_string(input, now, Dialect::Uk)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| anyhow!("Can't interpret {input:?} as a timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, TimeZone, Utc};

    use super::parse_timestamp;

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_timestamp("2024-04-05T12:00:00+02:00", Local::now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 4, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_relative_phrase() {
        let now = Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let parsed = parse_timestamp("1 hour ago", now).unwrap();
        assert_eq!(parsed, now.with_timezone(&Utc) - Duration::hours(1));
    }

    #[test]
    fn rejects_garbage() {
        let error = parse_timestamp("not a time at all", Local::now()).unwrap_err();
        assert!(error.to_string().contains("not a time at all"));
    }
}
