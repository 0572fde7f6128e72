//! Fixture-backed, in-memory [`RecipeStore`].
//!
//! The fixture is a YAML document with `ingredients`, `recipes` (each with
//! nested ingredient lines) and `carts`. It is validated once on load; after
//! that the store only serves reads and cart changes from memory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::contract::{
    CartEntry, Ingredient, IngredientId, RecipeId, RecipeIngredientLine, RecipeStore, StoreError,
    UserId,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<FixtureRecipe>,
    #[serde(default)]
    pub carts: Vec<CartEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRecipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default)]
    pub author: Option<UserId>,
    #[serde(default)]
    pub ingredients: Vec<FixtureRecipeIngredient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRecipeIngredient {
    pub ingredient: IngredientId,
    pub amount: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate ingredient id {0}")]
    DuplicateIngredient(IngredientId),
    #[error("duplicate recipe id {0}")]
    DuplicateRecipe(RecipeId),
    #[error("recipe {recipe} has a non-positive amount for ingredient {ingredient}")]
    NonPositiveAmount {
        recipe: RecipeId,
        ingredient: IngredientId,
    },
    #[error("cart entry for user {user} references unknown recipe {recipe}")]
    UnknownCartRecipe { user: UserId, recipe: RecipeId },
}

impl Fixture {
    pub fn from_yaml(content: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|source| {
            error!(error = ?source, path = %path_ref.display(), "Failed to read fixture file");
            FixtureError::Io {
                path: path_ref.display().to_string(),
                source,
            }
        })?;
        let fixture = Self::from_yaml(&content).map_err(|e| {
            error!(error = %e, path = %path_ref.display(), "Failed to parse fixture file");
            e
        })?;
        info!(
            path = %path_ref.display(),
            ingredients = fixture.ingredients.len(),
            recipes = fixture.recipes.len(),
            carts = fixture.carts.len(),
            "Loaded fixture"
        );
        Ok(fixture)
    }
}

#[derive(Debug, Default)]
struct State {
    ingredients: BTreeMap<IngredientId, Ingredient>,
    recipes: BTreeMap<RecipeId, FixtureRecipe>,
    // Insertion order is kept; the set below guards uniqueness.
    carts: Vec<CartEntry>,
    cart_index: BTreeSet<CartEntry>,
}

/// In-memory store built from a validated [`Fixture`].
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn from_fixture(fixture: Fixture) -> Result<Self, FixtureError> {
        let mut state = State::default();

        for ingredient in fixture.ingredients {
            let id = ingredient.id;
            if state.ingredients.insert(id, ingredient).is_some() {
                return Err(FixtureError::DuplicateIngredient(id));
            }
        }

        for recipe in fixture.recipes {
            if let Some(line) = recipe.ingredients.iter().find(|l| l.amount == 0) {
                return Err(FixtureError::NonPositiveAmount {
                    recipe: recipe.id,
                    ingredient: line.ingredient,
                });
            }
            let id = recipe.id;
            if state.recipes.insert(id, recipe).is_some() {
                return Err(FixtureError::DuplicateRecipe(id));
            }
        }

        for entry in fixture.carts {
            if !state.recipes.contains_key(&entry.recipe) {
                return Err(FixtureError::UnknownCartRecipe {
                    user: entry.user,
                    recipe: entry.recipe,
                });
            }
            if state.cart_index.insert(entry) {
                state.carts.push(entry);
            } else {
                debug!(user = entry.user, recipe = entry.recipe, "Ignoring duplicate cart entry in fixture");
            }
        }

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        Self::from_fixture(Fixture::load(path)?)
    }
}

#[async_trait::async_trait]
impl RecipeStore for MemoryStore {
    async fn cart_recipe_ids(&self, user: UserId) -> Result<Vec<RecipeId>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .iter()
            .filter(|entry| entry.user == user)
            .map(|entry| entry.recipe)
            .collect())
    }

    async fn ingredient_lines(
        &self,
        recipes: &[RecipeId],
    ) -> Result<Vec<RecipeIngredientLine>, StoreError> {
        let state = self.state.read().await;
        let mut lines = Vec::new();
        for recipe_id in recipes {
            let Some(recipe) = state.recipes.get(recipe_id) else {
                debug!(recipe = recipe_id, "Recipe not found while collecting ingredient lines");
                continue;
            };
            lines.extend(recipe.ingredients.iter().map(|l| RecipeIngredientLine {
                recipe: recipe.id,
                ingredient: l.ingredient,
                amount: l.amount,
            }));
        }
        Ok(lines)
    }

    async fn ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.state.read().await.ingredients.get(&id).cloned())
    }

    async fn recipe_exists(&self, id: RecipeId) -> Result<bool, StoreError> {
        Ok(self.state.read().await.recipes.contains_key(&id))
    }

    async fn add_cart_entry(&self, entry: CartEntry) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if !state.cart_index.insert(entry) {
            return Ok(false);
        }
        state.carts.push(entry);
        Ok(true)
    }

    async fn remove_cart_entry(&self, entry: CartEntry) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if !state.cart_index.remove(&entry) {
            return Ok(false);
        }
        state.carts.retain(|e| *e != entry);
        Ok(true)
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<Ingredient> = state
            .ingredients
            .values()
            .filter(|i| i.name.starts_with(prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
        });
        Ok(found)
    }
}
