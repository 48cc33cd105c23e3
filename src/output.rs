use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::input::InputItem;
use crate::parser::info::InfoRecord;
use crate::parser::price_guide::PriceGuideEntry;

const DELIMITER: u8 = b';';

pub const INFO_FIELDS: [&str; 16] = [
    "Set number",
    "Name",
    "Set type",
    "Theme group",
    "Theme",
    "Subtheme",
    "Year released",
    "Tags",
    "Dimensions",
    "Weight",
    "Pieces",
    "Minifigs",
    "RRP",
    "Age range",
    "Packaging",
    "Availability",
];

pub const PRICE_FIELDS: [&str; 10] = [
    "Set number",
    "Name",
    "Year",
    "Month",
    "Total Lots",
    "Total Qty",
    "Min Price",
    "Avg Price",
    "Qty Avg Price",
    "Max Price",
];

/// One line of the info file. Field order matches `INFO_FIELDS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InfoRow {
    #[serde(rename = "Set number")]
    pub set_number: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Set type")]
    pub set_type: String,
    #[serde(rename = "Theme group")]
    pub theme_group: String,
    #[serde(rename = "Theme")]
    pub theme: String,
    #[serde(rename = "Subtheme")]
    pub subtheme: String,
    #[serde(rename = "Year released")]
    pub year_released: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Dimensions")]
    pub dimensions: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Pieces")]
    pub pieces: String,
    #[serde(rename = "Minifigs")]
    pub minifigs: String,
    #[serde(rename = "RRP")]
    pub rrp: String,
    #[serde(rename = "Age range")]
    pub age_range: String,
    #[serde(rename = "Packaging")]
    pub packaging: String,
    #[serde(rename = "Availability")]
    pub availability: String,
}

impl InfoRow {
    /// Missing fields stay empty; fields outside the schema are dropped.
    pub fn from_record(item: &InputItem, record: &InfoRecord) -> Self {
        for key in record.keys().filter(|k| !INFO_FIELDS.contains(&k.as_str())) {
            debug!(set = %item, field = %key, "no info column for field");
        }
        let field = |name: &str| record.get(name).cloned().unwrap_or_default();

        InfoRow {
            set_number: item.to_string(),
            name: field("Name"),
            set_type: field("Set type"),
            theme_group: field("Theme group"),
            theme: field("Theme"),
            subtheme: field("Subtheme"),
            year_released: field("Year released"),
            tags: field("Tags"),
            dimensions: field("Dimensions"),
            weight: field("Weight"),
            pieces: field("Pieces"),
            minifigs: field("Minifigs"),
            rrp: field("RRP"),
            age_range: field("Age range"),
            packaging: field("Packaging"),
            availability: field("Availability"),
        }
    }
}

/// One month of one set. Field order matches `PRICE_FIELDS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceRow {
    #[serde(rename = "Set number")]
    pub set_number: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Total Lots")]
    pub total_lots: String,
    #[serde(rename = "Total Qty")]
    pub total_qty: String,
    #[serde(rename = "Min Price")]
    pub min_price: String,
    #[serde(rename = "Avg Price")]
    pub avg_price: String,
    #[serde(rename = "Qty Avg Price")]
    pub qty_avg_price: String,
    #[serde(rename = "Max Price")]
    pub max_price: String,
}

impl PriceRow {
    /// `label` is the `"Month Year"` heading the entry was found under.
    pub fn from_entry(item: &InputItem, name: &str, label: &str, entry: &PriceGuideEntry) -> Self {
        let (month, year) = label.split_once(' ').unwrap_or((label, ""));
        for key in entry.keys().filter(|k| !PRICE_FIELDS.contains(&k.as_str())) {
            debug!(set = %item, month = %label, field = %key, "no price column for statistic");
        }
        let stat = |name: &str| entry.get(name).cloned().unwrap_or_default();

        PriceRow {
            set_number: item.to_string(),
            name: name.to_string(),
            year: year.to_string(),
            month: month.to_string(),
            total_lots: stat("Total Lots"),
            total_qty: stat("Total Qty"),
            min_price: stat("Min Price"),
            avg_price: stat("Avg Price"),
            qty_avg_price: stat("Qty Avg Price"),
            max_price: stat("Max Price"),
        }
    }
}

/// Both output files, headers written up front.
pub struct CsvSink<W: Write> {
    info: csv::Writer<W>,
    prices: csv::Writer<W>,
    info_rows: usize,
    price_rows: usize,
}

impl CsvSink<File> {
    pub fn create(info_path: &Path, prices_path: &Path) -> Result<Self> {
        let info = File::create(info_path)
            .with_context(|| format!("Failed to create {}", info_path.display()))?;
        let prices = File::create(prices_path)
            .with_context(|| format!("Failed to create {}", prices_path.display()))?;
        CsvSink::from_writers(info, prices)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writers(info: W, prices: W) -> Result<Self> {
        let mut info = writer(info);
        let mut prices = writer(prices);
        info.write_record(INFO_FIELDS)?;
        prices.write_record(PRICE_FIELDS)?;
        Ok(CsvSink {
            info,
            prices,
            info_rows: 0,
            price_rows: 0,
        })
    }

    pub fn write_info(&mut self, row: &InfoRow) -> Result<()> {
        self.info.serialize(row).context("Failed to write info row")?;
        self.info_rows += 1;
        Ok(())
    }

    pub fn write_prices(&mut self, rows: &[PriceRow]) -> Result<()> {
        for row in rows {
            self.prices.serialize(row).context("Failed to write price row")?;
        }
        self.price_rows += rows.len();
        Ok(())
    }

    /// Flushes both files and returns `(info_rows, price_rows)`.
    pub fn finish(mut self) -> Result<(usize, usize)> {
        self.info.flush()?;
        self.prices.flush()?;
        Ok((self.info_rows, self.price_rows))
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (W, W) {
        let info = self.info.into_inner().map_err(|e| e.into_error()).unwrap();
        let prices = self.prices.into_inner().map_err(|e| e.into_error()).unwrap();
        (info, prices)
    }
}

fn writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> InputItem {
        InputItem {
            identifier: 10220,
            variant: 1,
        }
    }

    #[test]
    fn info_row_fills_known_fields() {
        let mut record = InfoRecord::new();
        record.insert("Name".into(), "Camper".into());
        record.insert("Tags".into(), "Van,Retro".into());
        record.insert("Rating".into(), "4.5".into());

        let row = InfoRow::from_record(&item(), &record);
        assert_eq!(row.set_number, "10220-1");
        assert_eq!(row.name, "Camper");
        assert_eq!(row.tags, "Van,Retro");
        assert!(row.theme.is_empty());
    }

    #[test]
    fn price_row_splits_label() {
        let mut entry = PriceGuideEntry::new();
        entry.insert("Total Lots".into(), "4".into());
        entry.insert("Avg Price".into(), "12.50".into());

        let row = PriceRow::from_entry(&item(), "Camper", "March 2019", &entry);
        assert_eq!(row.month, "March");
        assert_eq!(row.year, "2019");
        assert_eq!(row.total_lots, "4");
        assert_eq!(row.avg_price, "12.50");
        assert!(row.max_price.is_empty());
    }

    #[test]
    fn headers_written_without_rows() {
        let sink = CsvSink::from_writers(Vec::new(), Vec::new()).unwrap();
        let (info, prices) = sink.into_inner();
        assert_eq!(String::from_utf8(info).unwrap(), INFO_FIELDS.join(";") + "\n");
        assert_eq!(String::from_utf8(prices).unwrap(), PRICE_FIELDS.join(";") + "\n");
    }

    #[test]
    fn rows_semicolon_delimited_and_quoted() {
        let mut sink = CsvSink::from_writers(Vec::new(), Vec::new()).unwrap();
        let mut record = InfoRecord::new();
        record.insert("Name".into(), "Camper; deluxe".into());
        record.insert("Tags".into(), "Van,Retro".into());
        sink.write_info(&InfoRow::from_record(&item(), &record)).unwrap();

        let (info, _) = sink.into_inner();
        let text = String::from_utf8(info).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.starts_with("10220-1;\"Camper; deluxe\";"));
        assert!(line.contains(";Van,Retro;"));
        assert_eq!(line.matches(';').count(), INFO_FIELDS.len());
    }

    #[test]
    fn serialized_columns_match_header() {
        let mut w = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());
        w.serialize(PriceRow::default()).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().next().unwrap(), PRICE_FIELDS.join(";"));

        let mut w = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());
        w.serialize(InfoRow::default()).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().next().unwrap(), INFO_FIELDS.join(";"));
    }
}
