use std::fmt;

use thiserror::Error;

/// Structural element an extractor needs to find before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `dl` holding a `dt` "Set number" on the catalog page.
    InfoPanel,
    /// `table.pcipgInnerTable` on the price-guide page.
    PriceTable,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::InfoPanel => f.write_str("info panel"),
            Anchor::PriceTable => f.write_str("price guide table"),
        }
    }
}

/// Per-item failure. None of these stop the run; the item is listed as not found.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0} not found")]
    StructuralMismatch(Anchor),

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}
