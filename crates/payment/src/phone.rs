//! Phone number normalization for the provider.

/// Kenyan country prefix the provider expects.
const COUNTRY_PREFIX: &str = "254";

/// Normalizes a phone number to the provider's international form.
///
/// A leading `+` is stripped; a local-format leading `0` is rewritten to
/// the country prefix. Anything already in `254…` form passes through.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);
    match without_plus.strip_prefix('0') {
        Some(rest) => format!("{COUNTRY_PREFIX}{rest}"),
        None => without_plus.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_format_gets_country_prefix() {
        assert_eq!(normalize_phone("0712345678"), "254712345678");
    }

    #[test]
    fn plus_prefix_is_stripped() {
        assert_eq!(normalize_phone("+254712345678"), "254712345678");
    }

    #[test]
    fn international_form_passes_through() {
        assert_eq!(normalize_phone("254712345678"), "254712345678");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(normalize_phone(" 0712345678 "), "254712345678");
    }
}
