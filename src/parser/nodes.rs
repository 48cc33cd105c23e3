use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static DL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl").unwrap());
static PRICE_TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.pcipgInnerTable").unwrap());

/// Label that marks the catalog page's info panel.
const INFO_PANEL_LABEL: &str = "Set number";

/// One child of a definition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Anything that is neither a `dt` nor a `dd`.
    Wrapper,
    /// `dt`: its own text.
    Label(String),
    /// `dd`: own text, direct `a` children, and `a` children of a direct `span`.
    Value {
        text: String,
        links: Vec<String>,
        grouped_links: Vec<String>,
    },
}

impl Node {
    fn from_element(el: ElementRef<'_>) -> Node {
        match el.value().name() {
            "dt" => Node::Label(own_text(el)),
            "dd" => Node::Value {
                text: own_text(el),
                links: child_elements(el, "a").map(full_text).collect(),
                grouped_links: child_elements(el, "span")
                    .flat_map(|span| child_elements(span, "a"))
                    .map(full_text)
                    .collect(),
            },
            _ => Node::Wrapper,
        }
    }
}

/// Children of the first `dl` that has a `dt` reading "Set number", in document order.
pub fn info_panel_nodes(doc: &Html) -> Option<Vec<Node>> {
    let panel = doc.select(&DL_SEL).find(|dl| {
        child_elements(*dl, "dt").any(|dt| full_text(dt) == INFO_PANEL_LABEL)
    })?;

    Some(
        panel
            .children()
            .filter_map(ElementRef::wrap)
            .map(Node::from_element)
            .collect(),
    )
}

/// All text under the first price-guide table, unmodified.
pub fn price_table_text(doc: &Html) -> Option<String> {
    doc.select(&PRICE_TABLE_SEL)
        .next()
        .map(|table| table.text().collect())
}

fn child_elements<'a>(el: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == tag)
}

fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|c| c.value().as_text())
        .map(|t| &**t)
        .collect()
}

fn full_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

#[cfg(test)]
impl Node {
    pub fn label(text: &str) -> Node {
        Node::Label(text.to_string())
    }

    pub fn value(text: &str) -> Node {
        Node::Value {
            text: text.to_string(),
            links: Vec::new(),
            grouped_links: Vec::new(),
        }
    }

    pub fn linked_value(text: &str, link: &str) -> Node {
        Node::Value {
            text: text.to_string(),
            links: vec![link.to_string()],
            grouped_links: Vec::new(),
        }
    }

    pub fn grouped_value(links: &[&str]) -> Node {
        Node::Value {
            text: String::new(),
            links: Vec::new(),
            grouped_links: links.iter().map(|l| l.to_string()).collect(),
        }
    }
}
