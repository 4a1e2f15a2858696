//! Small formatting helpers shared across the exporters.

use chrono::{DateTime, NaiveDateTime};

/// Format a duration in whole seconds as `M:SS`, or `H:MM:SS` once it
/// reaches an hour. Used for video timestamps.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0) as u64;

    let sec = total % 60;
    let min = (total % 3600) / 60;
    let hour = total / 3600;

    if hour > 0 {
        format!("{hour}:{min:02}:{sec:02}")
    } else {
        format!("{min}:{sec:02}")
    }
}

/// Format a millisecond offset as `H:MM:SS` (hours unpadded). Used for
/// audiobook clip and chapter positions.
#[must_use]
pub fn format_duration_from_ms(value: u64) -> String {
    let sec = value / 1000; // round down to second

    let val_sec = sec % 60;
    let val_min = (sec % 3600) / 60;
    let val_hour = sec / 3600;

    format!("{val_hour}:{val_min:02}:{val_sec:02}")
}

/// Extract the `YYYY-MM-DD` date component from an ISO 8601 timestamp.
///
/// Returns the input unchanged if it does not parse; the dates come from
/// remote APIs and a raw value is more useful in the output than an error.
#[must_use]
pub fn extract_date(iso: &str) -> String {
    DateTime::parse_from_rfc3339(&iso.replace('Z', "+00:00"))
        .map_or_else(|_| iso.to_string(), |dt| dt.date_naive().to_string())
}

/// Convert a `YYYY-MM-DD HH:MM:SS.sss` timestamp (as returned by the
/// Audible sidecar API) into RFC 2822, matching the index timestamps.
#[must_use]
pub fn format_sidecar_date(value: &str) -> String {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").map_or_else(
        |_| value.to_string(),
        |naive| naive.and_utc().to_rfc2822(),
    )
}

/// Strip characters that break filesystems or note apps from a name.
///
/// Removals and replacements follow what note tools tolerate:
/// `\0 # ^` dropped, `/` becomes " or ", brackets and `:` become dashes,
/// `|` becomes a dash, and whitespace runs collapse to one space.
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = false;

    for ch in name.trim().chars() {
        let replacement: &str = match ch {
            '\0' | '#' | '^' => "",
            '/' => " or ",
            '[' => "- ",
            ']' | ':' => " -",
            '|' | '\\' => "-",
            c if c.is_whitespace() => " ",
            _ => {
                last_was_space = false;
                out.push(ch);
                continue;
            }
        };
        for rc in replacement.chars() {
            if rc == ' ' {
                if last_was_space {
                    continue;
                }
                last_was_space = true;
            } else {
                last_was_space = false;
            }
            out.push(rc);
        }
    }

    // Collapse any remaining runs introduced by replacements.
    let mut collapsed = String::with_capacity(out.len());
    let mut prev_space = false;
    for ch in out.chars() {
        if ch == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        collapsed.push(ch);
    }

    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_under_an_hour() {
        assert_eq!(format_duration(59.0), "0:59");
        assert_eq!(format_duration(90.0), "1:30");
        assert_eq!(format_duration(600.0), "10:00");
    }

    #[test]
    fn test_format_duration_over_an_hour() {
        assert_eq!(format_duration(3600.0), "1:00:00");
        assert_eq!(format_duration(3661.0), "1:01:01");
        assert_eq!(format_duration(4500.0), "1:15:00");
    }

    #[test]
    fn test_format_duration_from_ms() {
        assert_eq!(format_duration_from_ms(0), "0:00:00");
        assert_eq!(format_duration_from_ms(61_500), "0:01:01");
        assert_eq!(format_duration_from_ms(3_600_000), "1:00:00");
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(extract_date("2023-04-01T12:30:00.000Z"), "2023-04-01");
        assert_eq!(extract_date("2023-04-01T12:30:00+07:00"), "2023-04-01");
        // Unparseable input passes through.
        assert_eq!(extract_date("not a date"), "not a date");
    }

    #[test]
    fn test_format_sidecar_date() {
        let formatted = format_sidecar_date("2023-04-01 12:30:00.123");
        assert!(formatted.starts_with("Sat, 01 Apr 2023 12:30:00"));
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Plain Title"), "Plain Title");
        assert_eq!(sanitize_file_stem("Either/Or"), "Either or Or");
        assert_eq!(sanitize_file_stem("Q: A Novel"), "Q - A Novel");
        assert_eq!(sanitize_file_stem("C# In [Depth]"), "C In - Depth -");
        assert_eq!(sanitize_file_stem("  spaced   out  "), "spaced out");
    }
}
