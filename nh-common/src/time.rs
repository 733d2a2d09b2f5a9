//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp as ISO 8601 in UTC with millisecond precision
/// (e.g. `2025-10-26T14:30:45.123Z`)
pub fn to_iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert minutes to duration
pub fn minutes_to_duration(minutes: u64) -> std::time::Duration {
    std::time::Duration::from_secs(minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_iso8601_uses_millis_and_zulu() {
        let ts = Utc.with_ymd_and_hms(2025, 10, 26, 14, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(to_iso8601(ts), "2025-10-26T14:30:45.123Z");
    }

    #[test]
    fn test_now_formats_and_parses_back() {
        let formatted = to_iso8601(now());
        assert!(formatted.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&formatted).is_ok());
    }

    #[test]
    fn test_minutes_to_duration() {
        assert_eq!(minutes_to_duration(0), Duration::ZERO);
        assert_eq!(minutes_to_duration(14), Duration::from_secs(840));
    }
}
