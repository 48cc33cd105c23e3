pub mod info;
pub mod nodes;
pub mod price_guide;

use scraper::Html;
use serde::Serialize;

use crate::error::{Anchor, ItemError};
use crate::input::InputItem;
use crate::output::{InfoRow, PriceRow};

/// Everything written for one set.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecords {
    pub info: InfoRow,
    pub prices: Vec<PriceRow>,
}

/// Two-document pipeline: catalog page → info row, price-guide page → one row per month.
///
/// Both anchors must be present; otherwise nothing is produced for the item.
pub fn process_item(
    item: &InputItem,
    catalog_html: &str,
    price_html: &str,
) -> Result<ItemRecords, ItemError> {
    let catalog = Html::parse_document(catalog_html);
    let price_page = Html::parse_document(price_html);

    let panel = nodes::info_panel_nodes(&catalog)
        .ok_or(ItemError::StructuralMismatch(Anchor::InfoPanel))?;
    let table_text = nodes::price_table_text(&price_page)
        .ok_or(ItemError::StructuralMismatch(Anchor::PriceTable))?;

    let record = info::extract_info(&panel);
    let guide = price_guide::parse_price_guide(&table_text);

    let name = record.get("Name").map(String::as_str).unwrap_or_default();
    let prices = guide
        .iter()
        .map(|(label, entry)| PriceRow::from_entry(item, name, label, entry))
        .collect();

    Ok(ItemRecords {
        info: InfoRow::from_record(item, &record),
        prices,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn item() -> InputItem {
        InputItem {
            identifier: 10220,
            variant: 1,
        }
    }

    #[test]
    fn merges_both_documents() {
        let records = process_item(
            &item(),
            &fixture("brickset_set"),
            &fixture("bricklink_price_guide"),
        )
        .unwrap();

        assert_eq!(records.info.set_number, "10220-1");
        assert_eq!(records.info.name, "Volkswagen T1 Camper Van");
        assert_eq!(records.info.theme, "Advanced Models");
        assert_eq!(records.info.tags, "Camper Van,Volkswagen,Vehicle");

        assert_eq!(records.prices.len(), 3);
        let april = &records.prices[0];
        assert_eq!(april.set_number, "10220-1");
        assert_eq!(april.name, "Volkswagen T1 Camper Van");
        assert_eq!((april.month.as_str(), april.year.as_str()), ("April", "2019"));
        assert_eq!(april.qty_avg_price, "193.33");

        let february = &records.prices[2];
        assert_eq!(february.month, "February");
        assert!(february.total_lots.is_empty());
    }

    #[test]
    fn missing_info_panel() {
        let err = process_item(&item(), "<html><body>404</body></html>", &fixture("bricklink_price_guide"))
            .unwrap_err();
        assert!(matches!(err, ItemError::StructuralMismatch(Anchor::InfoPanel)));
    }

    #[test]
    fn missing_price_table() {
        let err = process_item(&item(), &fixture("brickset_set"), "<html><body>Quota exceeded</body></html>")
            .unwrap_err();
        assert!(matches!(err, ItemError::StructuralMismatch(Anchor::PriceTable)));
    }

    #[test]
    fn swapped_documents_do_not_match() {
        let err = process_item(&item(), &fixture("bricklink_price_guide"), &fixture("brickset_set"))
            .unwrap_err();
        assert!(matches!(err, ItemError::StructuralMismatch(_)));
    }
}
