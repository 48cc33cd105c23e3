use std::sync::LazyLock;

use chrono::Month;
use indexmap::IndexMap;
use regex::Regex;

/// Statistic name → number as text, e.g. `"Avg Price" → "12.50"`.
pub type PriceGuideEntry = IndexMap<String, String>;

/// `"March 2019"` → that month's statistics, in page order.
pub type PriceGuideRecord = IndexMap<String, PriceGuideEntry>;

/// First field of every monthly summary block.
const SUMMARY_MARKER: &str = "Total Lots:";

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&month_year_pattern()).unwrap());

fn month_year_pattern() -> String {
    let names: Vec<&str> = (1..=12u8)
        .filter_map(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .collect();
    format!(r"(?:{}) [0-9]{{4}}", names.join("|"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Label(&'a str),
    Segment(&'a str),
}

/// Alternating segment/label tokens; always starts and ends with a segment.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in MONTH_YEAR_RE.find_iter(text) {
        tokens.push(Token::Segment(&text[last..m.start()]));
        tokens.push(Token::Label(m.as_str()));
        last = m.end();
    }
    tokens.push(Token::Segment(&text[last..]));
    tokens
}

/// Parse the flattened text of a price-guide table into per-month statistics.
///
/// A month whose segment lacks the summary marker gets an empty entry.
pub fn parse_price_guide(text: &str) -> PriceGuideRecord {
    let flattened = WHITESPACE_RE.replace_all(text, " ");
    let tokens = tokenize(&flattened);

    let mut record = PriceGuideRecord::new();
    for (pos, token) in tokens.iter().enumerate() {
        let Token::Label(label) = token else {
            continue;
        };
        let segment = match tokens.get(pos + 1) {
            Some(Token::Segment(s)) => *s,
            _ => "",
        };
        record.insert(label.to_string(), parse_summary(summary_block(segment)));
    }
    record
}

/// Drops the transaction listings in front of the marker.
fn summary_block(segment: &str) -> &str {
    segment
        .find(SUMMARY_MARKER)
        .map(|i| &segment[i..])
        .unwrap_or("")
}

/// Scan `Name: [CODE $]number` groups.
fn parse_summary(summary: &str) -> PriceGuideEntry {
    let mut entry = PriceGuideEntry::new();
    let mut rest = summary;

    while let Some(colon) = rest.find(':') {
        let name = field_name(&rest[..colon]);
        let after = &rest[colon + 1..];
        match scan_number(after) {
            Some((number, end)) if !name.is_empty() => {
                entry.insert(name.to_string(), number.to_string());
                rest = &after[end..];
            }
            _ => rest = after,
        }
    }
    entry
}

/// Trailing run of ASCII letters and spaces, trimmed.
fn field_name(prefix: &str) -> &str {
    let start = prefix
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic() || c.is_whitespace())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(prefix.len());
    prefix[start..].trim()
}

/// Number at the start of `s`, after an optional `CODE $` prefix.
/// Returns the digits and the byte offset just past them.
fn scan_number(s: &str) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    let mut i = skip_spaces(bytes, 0);

    let code_end = i + count_while(&bytes[i..], |b| b.is_ascii_uppercase());
    let dollar = skip_spaces(bytes, code_end);
    if bytes.get(dollar) == Some(&b'$') {
        i = skip_spaces(bytes, dollar + 1);
    }

    let int_len = count_while(&bytes[i..], |b| b.is_ascii_digit());
    if int_len == 0 {
        return None;
    }
    let mut end = i + int_len;
    if bytes.get(end) == Some(&b'.') {
        let frac_len = count_while(&bytes[end + 1..], |b| b.is_ascii_digit());
        if frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    Some((&s[i..end], end))
}

fn skip_spaces(bytes: &[u8], from: usize) -> usize {
    from + count_while(&bytes[from.min(bytes.len())..], |b| b == b' ')
}

fn count_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take_while(|b| pred(**b)).count()
}

// ── Tests ──
