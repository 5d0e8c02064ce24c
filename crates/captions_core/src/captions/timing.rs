//! Timestamp parsing and formatting.
//!
//! All values are seconds as `f64`.
//!
//! | Format | Grammar |
//! |--------|---------|
//! | WebVTT | `[H+:]MM:SS[.mmm]` |
//! | SRT    | WebVTT with `,` as the decimal separator |
//! | SSA    | `H:MM:SS[.f]` with 1-3 fraction digits |

/// Parse a WebVTT timestamp.
///
/// Minutes and seconds are two digits and at most 59. The fraction, when
/// present, is exactly three digits. Surrounding whitespace is rejected.
pub fn parse_vtt_timestamp(text: &str) -> Option<f64> {
    let (clock, millis) = match text.split_once('.') {
        Some((clock, fraction)) => {
            if fraction.len() != 3 || !all_digits(fraction) {
                return None;
            }
            (clock, fraction.parse::<u32>().ok()?)
        }
        None => (text, 0),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, parse_two_digits(m)?, parse_two_digits(s)?),
        [h, m, s] => {
            if h.is_empty() || !all_digits(h) {
                return None;
            }
            (h.parse::<u64>().ok()?, parse_two_digits(m)?, parse_two_digits(s)?)
        }
        _ => return None,
    };

    if minutes > 59 || seconds > 59 {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`).
///
/// The first comma is treated as the decimal separator.
pub fn parse_srt_timestamp(text: &str) -> Option<f64> {
    parse_vtt_timestamp(&text.replacen(',', ".", 1))
}

/// Parse an SSA/ASS timestamp (`H:MM:SS.cc`).
///
/// The fraction is scaled by its digit count, so `.5`, `.50` and `.500`
/// are all half a second.
pub fn parse_ssa_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();

    let (clock, fraction) = match text.split_once('.') {
        Some((clock, fraction)) => {
            if fraction.is_empty() || fraction.len() > 3 || !all_digits(fraction) {
                return None;
            }
            let value: f64 = fraction.parse().ok()?;
            (clock, value / 10f64.powi(fraction.len() as i32))
        }
        None => (text, 0.0),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return None;
    };
    if h.is_empty() || !all_digits(h) {
        return None;
    }
    let hours: u64 = h.parse().ok()?;
    let minutes = parse_two_digits(m)?;
    let seconds = parse_two_digits(s)?;
    if minutes > 59 || seconds > 59 {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + fraction)
}

/// Format seconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}

fn parse_two_digits(text: &str) -> Option<u32> {
    if text.len() != 2 || !all_digits(text) {
        return None;
    }
    text.parse().ok()
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 0.0001)
    }

    #[test]
    fn parses_vtt_forms() {
        assert!(close(parse_vtt_timestamp("00:00"), 0.0));
        assert!(close(parse_vtt_timestamp("00:02"), 2.0));
        assert!(close(parse_vtt_timestamp("59:00"), 3540.0));
        assert!(close(parse_vtt_timestamp("01:23:45.678"), 5025.678));
        assert!(close(parse_vtt_timestamp("0:00:00.001"), 0.001));
        assert!(close(parse_vtt_timestamp("100:00:00.000"), 360000.0));
    }

    #[test]
    fn rejects_bad_vtt_forms() {
        assert_eq!(parse_vtt_timestamp(""), None);
        assert_eq!(parse_vtt_timestamp("00:60"), None);
        assert_eq!(parse_vtt_timestamp("60:00"), None);
        assert_eq!(parse_vtt_timestamp("00:00.10"), None);
        assert_eq!(parse_vtt_timestamp("00:00.1000"), None);
        assert_eq!(parse_vtt_timestamp("0:0"), None);
        assert_eq!(parse_vtt_timestamp(" 00:00"), None);
        assert_eq!(parse_vtt_timestamp("00:00-->00:02"), None);
        assert_eq!(parse_vtt_timestamp("00:00:00,000"), None);
    }

    #[test]
    fn parses_srt() {
        assert!(close(parse_srt_timestamp("00:00:12,720"), 12.72));
        assert!(close(parse_srt_timestamp("00:00:15.120"), 15.12));
        assert_eq!(parse_srt_timestamp("00:00:12,72"), None);
    }

    #[test]
    fn parses_ssa() {
        assert!(close(parse_ssa_timestamp("0:00:05.10"), 5.1));
        assert!(close(parse_ssa_timestamp("0:00:03.67"), 3.67));
        assert!(close(parse_ssa_timestamp(" 1:10:05.5 "), 4205.5));
        assert!(close(parse_ssa_timestamp("0:00:04"), 4.0));
        assert_eq!(parse_ssa_timestamp("0:00"), None);
        assert_eq!(parse_ssa_timestamp("0:00:04."), None);
    }

    #[test]
    fn format_round_trips_through_parse() {
        for &value in &[0.0, 1.5, 59.999, 3599.001, 5025.678, 86399.5] {
            let text = format_vtt_timestamp(value);
            assert!(close(parse_vtt_timestamp(&text), value), "{}", text);
            let text = format_srt_timestamp(value);
            assert!(close(parse_srt_timestamp(&text), value), "{}", text);
        }
        assert_eq!(format_vtt_timestamp(5025.678), "01:23:45.678");
        assert_eq!(format_srt_timestamp(12.72), "00:00:12,720");
    }
}
