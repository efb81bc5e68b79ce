//! Field normalizer -- canonicalizes a value before cross-system comparison.
//!
//! The local store and the remote catalog render the same data
//! differently: prices carry currency symbols or ISO codes on either
//! side, descriptions arrive HTML-escaped and may be truncated remotely,
//! and casing drifts.  Every function here is pure and never fails; a
//! value that cannot be parsed falls back to its trimmed, case-folded
//! form so the comparison reports a mismatch instead of erroring.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Free-text fields are compared on their first 100 characters.
pub const DESCRIPTION_LIMIT: usize = 100;

const ELLIPSIS: &str = "...";

/// Anything that cannot be part of a number.
static PRICE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.,]").expect("valid regex"));

/// A thousands separator: `,` or `.` followed by a run of 3+ digits.
static THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,](\d{3,})").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex")
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// How a field is canonicalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trim and case-fold.
    Plain,
    /// Currency-aware numeric formatting to two decimals.
    Price,
    /// HTML tags stripped, entities decoded, whitespace collapsed.
    Text,
    /// [`FieldKind::Text`] plus truncation to [`DESCRIPTION_LIMIT`].
    LongText,
}

/// Canonicalize `value` according to `kind`.
pub fn normalize(value: &str, kind: FieldKind) -> String {
    match kind {
        FieldKind::Plain => fold(value),
        FieldKind::Price => normalize_price(value),
        FieldKind::Text => fold(&clean_text(value)),
        FieldKind::LongText => fold(&truncate(clean_text(value).trim(), DESCRIPTION_LIMIT)),
    }
}

/// Parse a currency-tagged price into `"0.00"` form.
///
/// `"34 GBP"`, `"£34.00"` and `"34.00"` all become `"34.00"`;
/// `"1.234,50 €"` becomes `"1234.50"`.  Works on the digit string, so
/// amounts of any magnitude keep every digit.
pub fn normalize_price(value: &str) -> String {
    let stripped = PRICE_NOISE_RE.replace_all(value, "");
    if stripped.is_empty() {
        return fold(value);
    }

    let without_thousands = THOUSANDS_RE.replace_all(&stripped, "${1}");
    let decimal = without_thousands.replace(',', ".");

    format_cents(&decimal).unwrap_or_else(|| fold(value))
}

/// Render `"<int>[.<frac>]"` with exactly two decimals, rounding half up.
/// `None` unless both parts are plain ASCII digits.
fn format_cents(decimal: &str) -> Option<String> {
    let (int, frac) = decimal.split_once('.').unwrap_or((decimal, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
        return None;
    }

    let mut digits: Vec<u8> = int.bytes().collect();
    let mut frac = frac.bytes();
    digits.push(frac.next().unwrap_or(b'0'));
    digits.push(frac.next().unwrap_or(b'0'));
    if frac.next().is_some_and(|b| b >= b'5') {
        round_up(&mut digits);
    }

    let point = digits.len() - 2;
    let int = std::str::from_utf8(&digits[..point]).ok()?.trim_start_matches('0');
    let cents = std::str::from_utf8(&digits[point..]).ok()?;
    Some(format!("{}.{cents}", if int.is_empty() { "0" } else { int }))
}

/// Add one to the last place of a decimal digit string.
fn round_up(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

/// Cut `value` to `max` characters, appending `...` when anything was
/// dropped.  Counts characters, not bytes.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Strip markup, decode entities and collapse whitespace.
pub fn clean_text(value: &str) -> String {
    let without_tags = TAG_RE.replace_all(value, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Decode the HTML entities WordPress emits in titles and descriptions.
/// Unknown named entities are left verbatim.
pub fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(hex) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "rsquo" => "\u{2019}",
        "lsquo" => "\u{2018}",
        "rdquo" => "\u{201d}",
        "ldquo" => "\u{201c}",
        _ => return None,
    };
    Some(decoded.to_string())
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}
