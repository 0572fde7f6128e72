//! Shopping-list export pipeline: aggregate the cart, render it, hand back an attachment.
//!
//! This is the one entrypoint a request handler needs:
//!   - reads the user's cart through a [`RecipeStore`]
//!   - merges ingredient lines with the [`Aggregator`]
//!   - renders the merged list to PDF in memory with the [`ShoppingListRenderer`]
//!   - returns a [`ShoppingListDownload`] carrying filename, content type and bytes
//!
//! Nothing is written to disk; every call owns its output buffer.
//!
//! # Major Types
//! - [`ShoppingListService`]: aggregator, renderer and filename built once from [`Config`]
//! - [`ShoppingListDownload`]: the finished attachment

use tracing::{error, info};

use crate::aggregate::{AggregateError, Aggregator};
use crate::config::Config;
use crate::contract::{RecipeStore, UserId};
use crate::render::{RenderError, ShoppingListRenderer};

pub const CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum ShoppingListError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct ShoppingListDownload {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
    /// Number of merged lines in the document
    pub lines: usize,
    /// Ingredient lines skipped because their ingredient no longer exists
    pub skipped: usize,
}

impl ShoppingListDownload {
    /// Value for the `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

pub async fn download_shopping_list<S>(
    store: &S,
    aggregator: &Aggregator,
    renderer: &ShoppingListRenderer,
    user: UserId,
    filename: &str,
) -> Result<ShoppingListDownload, ShoppingListError>
where
    S: RecipeStore + ?Sized,
{
    info!(user, "[EXPORT] Starting shopping list export");

    let aggregation = match aggregator.aggregate(store, user).await {
        Ok(aggregation) => aggregation,
        Err(e) => {
            error!(user, error = %e, "[EXPORT][ERROR] Aggregation failed");
            return Err(e.into());
        }
    };

    let content = match renderer.render(&aggregation.lines) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(user, error = %e, "[EXPORT][ERROR] Rendering failed");
            return Err(e.into());
        }
    };

    info!(
        user,
        filename,
        lines = aggregation.lines.len(),
        skipped = aggregation.orphaned.len(),
        size = content.len(),
        "[EXPORT] Shopping list ready"
    );
    Ok(ShoppingListDownload {
        filename: filename.to_string(),
        content_type: CONTENT_TYPE,
        content,
        lines: aggregation.lines.len(),
        skipped: aggregation.orphaned.len(),
    })
}

/// Aggregator, renderer and attachment name, built once and shared by every export.
#[derive(Debug, Clone)]
pub struct ShoppingListService {
    aggregator: Aggregator,
    renderer: ShoppingListRenderer,
    filename: String,
}

impl ShoppingListService {
    pub fn new(aggregator: Aggregator, renderer: ShoppingListRenderer, filename: impl Into<String>) -> Self {
        Self {
            aggregator,
            renderer,
            filename: filename.into(),
        }
    }

    /// Builds the renderer (loading any configured font) from config.
    pub fn from_config(config: &Config) -> Result<Self, RenderError> {
        let render = &config.render;
        let renderer = match &render.font_path {
            Some(path) => ShoppingListRenderer::with_font_file(&render.title, render.layout, path)?,
            None => ShoppingListRenderer::new(&render.title, render.layout)?,
        };
        Ok(Self::new(
            Aggregator::new(config.shopping_list.empty_cart),
            renderer,
            &config.shopping_list.filename,
        ))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn renderer(&self) -> &ShoppingListRenderer {
        &self.renderer
    }

    pub async fn download<S>(&self, store: &S, user: UserId) -> Result<ShoppingListDownload, ShoppingListError>
    where
        S: RecipeStore + ?Sized,
    {
        download_shopping_list(store, &self.aggregator, &self.renderer, user, &self.filename).await
    }
}
