use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "bricks";
const ENV_PREFIX: &str = "BRICKS";

const DEFAULT_CATALOG_URL: &str = "https://brickset.com/sets/";
const DEFAULT_PRICE_GUIDE_URL: &str = "https://www.bricklink.com/v2/catalog/catalogitem_pgtab.page?S={set}&st=2&gm=1&gc=0&ei=0&prec=1&showflag=0&showbulk=0&currency=1";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Placeholder replaced with `"{id}-{variant}"` in `price_guide_url`.
pub const SET_PLACEHOLDER: &str = "{set}";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Catalog base URL; the set key is appended.
    pub catalog_url: String,
    /// Price-guide URL template containing `{set}`.
    pub price_guide_url: String,
    pub info_output: String,
    pub prices_output: String,
    /// Input rows whose category contains this are skipped.
    pub excluded_category: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Defaults, then `bricks.toml` if present, then `BRICKS_*` env vars.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("price_guide_url", DEFAULT_PRICE_GUIDE_URL)?
            .set_default("info_output", "sets_info.csv")?
            .set_default("prices_output", "sets_prices.csv")?
            .set_default("excluded_category", "Minifigures")?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("request_timeout_secs", 30_i64)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load settings")?;

        settings
            .try_deserialize()
            .context("Invalid settings")
    }
}
