use indexmap::IndexMap;

use super::nodes::Node;

/// Field name → value, in the order fields first appear on the page.
pub type InfoRecord = IndexMap<String, String>;

/// Never retained. "Set number" is the item key and is filled in by the caller.
pub const ADMINISTRATIVE_FIELDS: &[&str] = &[
    "Set number",
    "Current value",
    "Price per piece",
    "Barcodes",
    "Notes",
    "LEGO item numbers",
];

/// Fields whose value is wrapped in a link on the catalog page.
const LINKED_FIELDS: &[&str] = &["Theme", "Subtheme", "Year released", "Pieces", "Minifigs"];

const TAGS_FIELD: &str = "Tags";

/// Walk label/value nodes into a record.
///
/// The first and last nodes are wrappers and are skipped. Values seen under a
/// label are joined with `,` and committed when the next label arrives, so the
/// group still pending when the walk ends is dropped.
pub fn extract_info(nodes: &[Node]) -> InfoRecord {
    let mut record = InfoRecord::new();
    let mut key = String::new();
    let mut values: Vec<String> = Vec::new();

    let inner = match nodes {
        [_, inner @ .., _] => inner,
        _ => &[],
    };

    for node in inner {
        match node {
            Node::Label(label) => {
                if is_retained(&key) && !values.is_empty() {
                    record.insert(std::mem::take(&mut key), values.join(","));
                }
                key = label.clone();
                values.clear();
            }
            Node::Value {
                text,
                links,
                grouped_links,
            } => {
                if LINKED_FIELDS.contains(&key.as_str()) && !links.is_empty() {
                    values.push(links[0].clone());
                } else if key == TAGS_FIELD {
                    values.extend(grouped_links.iter().cloned());
                } else {
                    values.push(text.clone());
                }
            }
            Node::Wrapper => {}
        }
    }

    record
}

fn is_retained(key: &str) -> bool {
    !key.is_empty() && !ADMINISTRATIVE_FIELDS.contains(&key)
}

// ── Tests ──
