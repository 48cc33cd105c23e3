use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use csv::StringRecord;
use regex::Regex;
use tracing::{info, trace};

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+").unwrap());

/// Fields a usable row carries: id, number, variant, category.
const MIN_FIELDS: usize = 4;

/// One set to scrape: catalog number plus variant, e.g. `10220-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputItem {
    pub identifier: u64,
    pub variant: u64,
}

impl fmt::Display for InputItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.identifier, self.variant)
    }
}

impl FromStr for InputItem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (id, variant) = s
            .split_once('-')
            .with_context(|| format!("expected <number>-<variant>, got {s:?}"))?;
        Ok(InputItem {
            identifier: id.parse().with_context(|| format!("bad set number in {s:?}"))?,
            variant: variant.parse().with_context(|| format!("bad variant in {s:?}"))?,
        })
    }
}

/// Keep rows whose fields 1 and 2 are numbers and whose field 3 is not the excluded category.
pub fn filter_rows<'a>(
    rows: impl IntoIterator<Item = &'a StringRecord>,
    excluded_category: &str,
) -> Vec<InputItem> {
    rows.into_iter()
        .filter_map(|row| {
            let item = parse_row(row, excluded_category);
            if item.is_none() {
                trace!(?row, "dropping input row");
            }
            item
        })
        .collect()
}

fn parse_row(row: &StringRecord, excluded_category: &str) -> Option<InputItem> {
    if row.len() < MIN_FIELDS {
        return None;
    }
    let identifier = parse_number(&row[1])?;
    let variant = parse_number(&row[2])?;
    if row[3].contains(excluded_category) {
        return None;
    }
    Some(InputItem { identifier, variant })
}

/// Must start with a digit and, right-trimmed, parse whole. `"12a"` is rejected.
fn parse_number(field: &str) -> Option<u64> {
    if !DIGITS_RE.is_match(field) {
        return None;
    }
    field.trim_end().parse().ok()
}

/// `,` unless the first record read that way is too short, then `;`.
fn detect_delimiter(text: &str) -> u8 {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let comma_fields = reader
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(0);

    if comma_fields >= MIN_FIELDS {
        b','
    } else {
        b';'
    }
}

/// Parse delimited text (no header row) and filter it into items.
pub fn read_items(text: &str, excluded_category: &str) -> Vec<InputItem> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    // Unreadable rows are malformed rows: dropped like the rest.
    let rows: Vec<StringRecord> = reader.records().filter_map(|r| r.ok()).collect();
    filter_rows(&rows, excluded_category)
}

pub fn load_items(path: &Path, excluded_category: &str) -> Result<Vec<InputItem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sets file {}", path.display()))?;
    let items = read_items(&text, excluded_category);
    info!("Loaded {} sets from {}", items.len(), path.display());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn filters_minifigures_and_non_numeric() {
        let rows = vec![
            row(&["1", "1001", "2", "Minifigures x"]),
            row(&["2", "1002", "3", "Set"]),
            row(&["3", "abc", "1", "Set"]),
        ];
        let items = filter_rows(&rows, "Minifigures");
        assert_eq!(items, vec![InputItem { identifier: 1002, variant: 3 }]);
    }

    #[test]
    fn short_rows_dropped() {
        let rows = vec![row(&["1", "1001", "2"]), row(&[])];
        assert!(filter_rows(&rows, "Minifigures").is_empty());
    }

    #[test]
    fn trailing_suffix_rejected() {
        let rows = vec![row(&["1", "12a", "1", "Set"]), row(&["1", "12", "1b", "Set"])];
        assert!(filter_rows(&rows, "Minifigures").is_empty());
    }

    #[test]
    fn leading_space_rejected_trailing_space_kept() {
        let rows = vec![row(&["1", " 12", "1", "Set"]), row(&["1", "12 ", "1", "Set"])];
        let items = filter_rows(&rows, "Minifigures");
        assert_eq!(items, vec![InputItem { identifier: 12, variant: 1 }]);
    }

    #[test]
    fn category_match_is_case_sensitive() {
        let rows = vec![row(&["1", "5", "1", "collectable minifigures"])];
        assert_eq!(filter_rows(&rows, "Minifigures").len(), 1);
    }

    #[test]
    fn semicolon_input() {
        let text = "SetID;Number;Variant;Theme\n7;6000;1;Castle\n8;71000;3;Collectable Minifigures\n";
        let items = read_items(text, "Minifigures");
        assert_eq!(items, vec![InputItem { identifier: 6000, variant: 1 }]);
    }

    #[test]
    fn quoted_comma_input() {
        let text = "\"SetID\",\"Number\",\"Variant\",\"Theme\"\n\"9\",\"10220\",\"1\",\"Advanced Models, Vehicles\"\n";
        let items = read_items(text, "Minifigures");
        assert_eq!(items, vec![InputItem { identifier: 10220, variant: 1 }]);
    }

    #[test]
    fn quoted_semicolon_in_comma_input() {
        let text = "\"9\",\"10220\",\"1\",\"Castle; Knights\"\n\"10\",\"6086\",\"1\",\"Castle\"\n";
        let items = read_items(text, "Minifigures");
        assert_eq!(
            items,
            vec![
                InputItem { identifier: 10220, variant: 1 },
                InputItem { identifier: 6086, variant: 1 },
            ]
        );
    }

    #[test]
    fn delimiter_sniffing() {
        assert_eq!(detect_delimiter("a,b,c,d\n"), b',');
        assert_eq!(detect_delimiter("a;b;c;d\n"), b';');
        assert_eq!(detect_delimiter("\n\na,\"x;y\",c,d\n"), b',');
    }

    #[test]
    fn identifiers_beyond_u32() {
        let rows = vec![row(&["1", "5000000000", "1", "Set"])];
        let items = filter_rows(&rows, "Minifigures");
        assert_eq!(items, vec![InputItem { identifier: 5_000_000_000, variant: 1 }]);
    }

    #[test]
    fn sets_fixture() {
        let items = load_items(Path::new("tests/fixtures/sets.csv"), "Minifigures").unwrap();
        let keys: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        assert_eq!(keys, vec!["10220-1", "6086-1", "9999-2"]);
    }

    #[test]
    fn item_key_round_trip() {
        let item: InputItem = "10220-1".parse().unwrap();
        assert_eq!(item, InputItem { identifier: 10220, variant: 1 });
        assert_eq!(item.to_string(), "10220-1");
        assert!("10220".parse::<InputItem>().is_err());
    }
}
