//! # contract: data model and the persistence seam for shopping-list export
//!
//! This module defines the plain records the export pipeline reads
//! (cart entries, recipe ingredient lines, ingredients), the derived
//! [`AggregatedLine`], and a single trait ([`RecipeStore`]) through which all
//! cart/recipe/ingredient data is read and cart entries are changed.
//!
//! ## Interface & Extensibility
//! - Implement [`RecipeStore`] to back the pipeline with a real database, the
//!   bundled fixture store ([`crate::store::MemoryStore`]), or a mock.
//! - All methods are async and return [`StoreError`] (a boxed error), so any
//!   backend can surface its own failures unchanged.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockRecipeStore` is exported
//!   with the `test-export-mocks` feature (enabled by default).

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type RecipeId = i64;
pub type IngredientId = i64;

/// Error type for RecipeStore implementors (boxed so backends keep their own error types)
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// A recipe placed in a user's shopping cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CartEntry {
    pub user: UserId,
    pub recipe: RecipeId,
}

/// One ingredient used by one recipe, with the amount the recipe needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredientLine {
    pub recipe: RecipeId,
    pub ingredient: IngredientId,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

/// One merged shopping-list entry: the total of every cart line sharing
/// this (name, measurement_unit) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: u64,
}

impl AggregatedLine {
    pub fn new(name: impl Into<String>, measurement_unit: impl Into<String>, total_amount: u64) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            total_amount,
        }
    }

    /// Text shown for this entry in the exported document.
    pub fn display_text(&self) -> String {
        format!(
            "{} ({}) — {}",
            self.name, self.measurement_unit, self.total_amount
        )
    }
}

/// Read (and cart-write) access to the recipe data the export pipeline needs.
///
/// The implementor owns persistence; the pipeline only holds results for the
/// duration of one call.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Ids of the recipes in the user's cart. May contain duplicates if the
    /// backend permits duplicate entries.
    async fn cart_recipe_ids(&self, user: UserId) -> Result<Vec<RecipeId>, StoreError>;

    /// Every ingredient line belonging to any of the given recipes.
    async fn ingredient_lines(
        &self,
        recipes: &[RecipeId],
    ) -> Result<Vec<RecipeIngredientLine>, StoreError>;

    /// Look up one ingredient; `None` when it no longer exists.
    async fn ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError>;

    async fn recipe_exists(&self, id: RecipeId) -> Result<bool, StoreError>;

    /// Insert a cart entry. Returns false if it was already present.
    async fn add_cart_entry(&self, entry: CartEntry) -> Result<bool, StoreError>;

    /// Remove a cart entry. Returns false if it was not present.
    async fn remove_cart_entry(&self, entry: CartEntry) -> Result<bool, StoreError>;

    /// Ingredients whose name starts with `prefix`, sorted by name then unit.
    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, StoreError>;
}
