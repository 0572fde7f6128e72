use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::aggregate::EmptyCartPolicy;
use crate::render::Layout;

pub const DEFAULT_FILENAME: &str = "shop_list.pdf";
pub const DEFAULT_TITLE: &str = "Shopping list";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub shopping_list: ShoppingListConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        let font = match &self.render.font_path {
            Some(path) => path.display().to_string(),
            None => "bundled".to_string(),
        };
        info!(
            fixture = %self.store.fixture.display(),
            filename = %self.shopping_list.filename,
            empty_cart = ?self.shopping_list.empty_cart,
            font = %font,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// YAML fixture with ingredients, recipes and carts
    pub fixture: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListConfig {
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default)]
    pub empty_cart: EmptyCartPolicy,
}

impl Default for ShoppingListConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            empty_cart: EmptyCartPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// TrueType/OpenType font to embed; the bundled Roboto face is used when unset
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(flatten)]
    pub layout: Layout,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            font_path: None,
            layout: Layout::default(),
        }
    }
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
