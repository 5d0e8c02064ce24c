//! Setting value parsing shared by the cue and region grammars.

/// Parse a `0..=100` percentage with an optional `%` suffix.
pub fn parse_percentage(value: &str) -> Option<f64> {
    let number = value.strip_suffix('%').unwrap_or(value);
    let parsed = parse_float(number)?;
    (0.0..=100.0).contains(&parsed).then_some(parsed)
}

/// Parse an `X%,Y%` coordinate pair. Both halves must be valid.
pub fn parse_coords(value: &str) -> Option<(f64, f64)> {
    let (x, y) = value.split_once(',')?;
    Some((parse_percentage(x)?, parse_percentage(y)?))
}

/// Parse a finite decimal number.
pub fn parse_float(value: &str) -> Option<f64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit() || b"+-.".contains(&b)) {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a non-negative integer.
pub fn parse_count(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Split a `name:value` or `name=value` token on its first separator.
pub fn split_setting(token: &str) -> Option<(&str, &str)> {
    let index = token.find([':', '='])?;
    Some((&token[..index], &token[index + 1..]))
}

/// Whether a line looks like a settings line: optional whitespace, a
/// lowercase ASCII name, then `:` or `=`.
pub fn is_settings_line(line: &str) -> bool {
    let rest = line.trim_start();
    let name_len = rest.bytes().take_while(|b| b.is_ascii_lowercase()).count();
    name_len > 0 && matches!(rest.as_bytes().get(name_len), Some(b':' | b'='))
}
