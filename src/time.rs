use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;

/// Formats a timestamp for the game archive: RFC 3339 in UTC, to the second.
pub fn iso8601(st: SystemTime) -> String {
    let dt: DateTime<Utc> = st.into();
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_archive_timestamps() {
        let st = UNIX_EPOCH + Duration::from_millis(90_750);
        assert_eq!(iso8601(st), "1970-01-01T00:01:30Z");

        let parsed: DateTime<Utc> = serde_json::from_value(serde_json::json!(iso8601(st))).unwrap();
        assert_eq!(parsed.timestamp(), 90);
    }
}
