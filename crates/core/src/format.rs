use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("empty timestamp")]
    Empty,

    #[error("timestamp {0:?} must be MM:SS or HH:MM:SS")]
    Shape(String),

    #[error("timestamp {0:?} has a non-numeric component")]
    Component(String),
}

/// Parse `MM:SS` or `HH:MM:SS` into an absolute second offset.
pub fn parse_timestamp(value: &str) -> Result<u64, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts = value
        .split(':')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimestampError::Component(value.to_string()));
            }
            part.parse::<u64>()
                .map_err(|_| TimestampError::Component(value.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [minutes, seconds] => Ok(minutes * 60 + seconds),
        [hours, minutes, seconds] => Ok(hours * 3600 + minutes * 60 + seconds),
        _ => Err(TimestampError::Shape(value.to_string())),
    }
}

/// Format seconds as MM:SS, or HH:MM:SS past the first hour
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Filesystem-safe rendering of a timestamp, e.g. `01:02:03` -> `01-02-03`.
pub fn safe_timestamp(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            ':' => '-',
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}

/// Strip a surrounding markdown code fence from a model response.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_timestamp("00:00"), Ok(0));
        assert_eq!(parse_timestamp("03:07"), Ok(187));
        assert_eq!(parse_timestamp("75:30"), Ok(75 * 60 + 30));
    }

    #[test]
    fn parses_hours_minutes_seconds() {
        for (h, m, s) in [(0, 0, 0), (1, 2, 3), (2, 59, 59), (10, 0, 1)] {
            let text = format!("{:02}:{:02}:{:02}", h, m, s);
            assert_eq!(parse_timestamp(&text), Ok(h * 3600 + m * 60 + s), "{text}");
        }
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        assert!(matches!(parse_timestamp("42"), Err(TimestampError::Shape(_))));
        assert!(matches!(
            parse_timestamp("1:2:3:4"),
            Err(TimestampError::Shape(_))
        ));
        assert!(matches!(
            parse_timestamp("ab:10"),
            Err(TimestampError::Component(_))
        ));
        assert!(matches!(
            parse_timestamp("10:"),
            Err(TimestampError::Component(_))
        ));
        assert!(matches!(
            parse_timestamp("-1:10"),
            Err(TimestampError::Component(_))
        ));
    }

    #[test]
    fn format_round_trips_through_parse() {
        assert_eq!(format_timestamp(187), "03:07");
        assert_eq!(format_timestamp(3723), "01:02:03");
        assert_eq!(parse_timestamp(&format_timestamp(3723)), Ok(3723));
    }

    #[test]
    fn safe_timestamp_replaces_colons() {
        assert_eq!(safe_timestamp("01:02:03"), "01-02-03");
        assert_eq!(safe_timestamp(" 12:30 "), "12-30");
        assert_eq!(safe_timestamp("1/2"), "1_2");
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
