//! Text cleanup applied to captured values.
//!
//! Scanned registration forms arrive with invisible Unicode spaces and
//! Greek/Cyrillic homoglyphs substituted for Latin letters by broken
//! font encodings. Every captured value passes through here before
//! post-processing.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Invisible and non-standard space characters replaced by plain spaces.
const INVISIBLE_SPACES: &[char] = &[
    '\u{00A0}', // no-break space
    '\u{202F}', // narrow no-break space
    '\u{2007}', // figure space
    '\u{2009}', // thin space
    '\u{200A}', // hair space
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // BOM
    '\u{2063}', // invisible separator
    '\u{00AD}', // soft hyphen
];

/// Replace invisible spaces, collapse whitespace runs, and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true; // leading spaces are dropped
    for c in s.chars() {
        let c = if INVISIBLE_SPACES.contains(&c) { ' ' } else { c };
        if c == ' ' || c == '\t' || c == '\r' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = c == '\n';
        }
    }
    out.trim().to_string()
}

/// Map a Greek or Cyrillic lookalike to its Latin counterpart.
fn homoglyph(c: char) -> Option<&'static str> {
    Some(match c {
        // Greek capitals
        'Α' => "A", 'Β' => "B", 'Ε' => "E", 'Ζ' => "Z", 'Η' => "H", 'Ι' => "I",
        'Κ' => "K", 'Μ' => "M", 'Ν' => "N", 'Ο' => "O", 'Ρ' => "R", 'Τ' => "T",
        'Υ' => "Y", 'Χ' => "X", 'Δ' => "D", 'Λ' => "L", 'Σ' => "S", 'Φ' => "F",
        'Θ' => "Th", 'Ξ' => "X", 'Ψ' => "Ps", 'Ω' => "O",
        // Greek lowercase
        'ο' => "o", 'ρ' => "p", 'κ' => "k", 'ι' => "i", 'ν' => "v", 'χ' => "x",
        'τ' => "t", 'μ' => "m", 'υ' => "y", 'σ' => "s", 'ς' => "s", 'φ' => "f",
        'ψ' => "ps",
        // Cyrillic capitals
        'А' => "A", 'В' => "B", 'Е' => "E", 'К' => "K", 'М' => "M", 'Н' => "H",
        'О' => "O", 'Р' => "P", 'С' => "C", 'Т' => "T", 'У' => "Y", 'Х' => "X",
        'І' => "I",
        // Cyrillic lowercase
        'а' => "a", 'е' => "e", 'к' => "k", 'м' => "m", 'н' => "h", 'о' => "o",
        'р' => "p", 'с' => "c", 'т' => "t", 'у' => "y", 'х' => "x", 'і' => "i",
        _ => return None,
    })
}

/// Replace Greek/Cyrillic homoglyphs with their Latin counterparts.
pub fn fix_homoglyphs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match homoglyph(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// Strip everything but ASCII digits.
pub fn clean_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse a day-first date in common separator variants and re-render
/// as `DD/MM/YYYY`. `None` when the text is not a plausible date.
pub fn parse_date(s: &str) -> Option<String> {
    let cleaned = normalize_ws(s)
        .replace(['\\', '-', '.'], "/");

    let parts: Vec<&str> = cleaned.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let mut year: i32 = parts[2].parse().ok()?;
    if year < 100 {
        // Two-digit year: 00-50 are the 2000s.
        year += if year <= 50 { 2000 } else { 1900 };
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%d/%m/%Y").to_string())
}

/// Parse a decimal number accepting `,` or `.` as the decimal
/// separator and thousands groupings of the other one.
pub fn parse_number(s: &str) -> Option<Decimal> {
    let cleaned = normalize_ws(s).replace(' ', "");
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        // "1.234,56" -> comma is decimal
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        // "1,234.56" -> dot is decimal
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // "1234,56" -> decimal comma
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn normalize_ws_strips_invisible_spaces() {
        assert_eq!(normalize_ws("Maria\u{00A0}Silva"), "Maria Silva");
        assert_eq!(normalize_ws("\u{FEFF}Maria\u{200B} Silva  "), "Maria Silva");
        assert_eq!(normalize_ws("  a \t b\r"), "a b");
    }

    #[test]
    fn fix_homoglyphs_restores_latin() {
        // Greek omicron and cyrillic а in a Latin name
        assert_eq!(fix_homoglyphs("Mаri\u{03BF} Silva"), "Mario Silva");
        assert_eq!(fix_homoglyphs("ΜΑRΙΑ"), "MARIA");
        assert_eq!(fix_homoglyphs("plain ascii"), "plain ascii");
    }

    #[test]
    fn clean_digits_keeps_only_digits() {
        assert_eq!(clean_digits("123.456.789-00"), "12345678900");
        assert_eq!(clean_digits("no digits"), "");
    }

    #[test]
    fn parse_date_handles_separator_variants() {
        assert_eq!(parse_date("05/03/1990").as_deref(), Some("05/03/1990"));
        assert_eq!(parse_date("05-03-1990").as_deref(), Some("05/03/1990"));
        assert_eq!(parse_date("05.03.1990").as_deref(), Some("05/03/1990"));
        assert_eq!(parse_date("5/3/90").as_deref(), Some("05/03/1990"));
        assert_eq!(parse_date("05/03/55").as_deref(), Some("05/03/1955"));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("32/01/2020"), None);
        assert_eq!(parse_date("01/13/2020"), None);
        assert_eq!(parse_date("01/02"), None);
    }

    #[test]
    fn parse_number_handles_both_separators() {
        assert_eq!(parse_number("1.234,56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_number("1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_number("1234,56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_number("42"), Some(Decimal::new(42, 0)));
    }

    #[test]
    fn parse_number_rejects_garbage() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
