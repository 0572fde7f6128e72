//! Merges the ingredient lines of every recipe in a user's cart into one
//! shopping list.
//!
//! Lines are grouped by ingredient identity, `(name, measurement_unit)`, and
//! their amounts summed as integers. Output is sorted by name, then by unit.
//! A line whose ingredient no longer exists is skipped and reported in
//! [`Aggregation::orphaned`] instead of failing the whole list.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::contract::{
    AggregatedLine, IngredientId, RecipeId, RecipeIngredientLine, RecipeStore, StoreError, UserId,
};

/// What to do when the user's cart holds no recipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCartPolicy {
    /// Produce an empty list (and so an empty document).
    #[default]
    RenderEmpty,
    /// Fail with [`AggregateError::EmptyCart`].
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("shopping cart of user {user} is empty")]
    EmptyCart { user: UserId },
    #[error("store error: {0}")]
    Store(StoreError),
}

/// A recipe line whose ingredient could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ingredient {ingredient} referenced by recipe {recipe} does not exist")]
pub struct IngredientLookupFailure {
    pub recipe: RecipeId,
    pub ingredient: IngredientId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub lines: Vec<AggregatedLine>,
    pub orphaned: Vec<IngredientLookupFailure>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    policy: EmptyCartPolicy,
}

impl Aggregator {
    pub fn new(policy: EmptyCartPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> EmptyCartPolicy {
        self.policy
    }

    pub async fn aggregate<S>(&self, store: &S, user: UserId) -> Result<Aggregation, AggregateError>
    where
        S: RecipeStore + ?Sized,
    {
        let recipe_ids = store
            .cart_recipe_ids(user)
            .await
            .map_err(|e| {
                error!(user, error = %e, "Failed to read shopping cart");
                AggregateError::Store(e)
            })?;

        // Duplicate cart entries must not count a recipe twice.
        let recipes: Vec<RecipeId> = recipe_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if recipes.is_empty() {
            return match self.policy {
                EmptyCartPolicy::RenderEmpty => {
                    info!(user, "Shopping cart is empty, producing an empty list");
                    Ok(Aggregation::default())
                }
                EmptyCartPolicy::Reject => {
                    warn!(user, "Shopping cart is empty, rejecting");
                    Err(AggregateError::EmptyCart { user })
                }
            };
        }

        let lines = store.ingredient_lines(&recipes).await.map_err(|e| {
            error!(user, error = %e, "Failed to read recipe ingredient lines");
            AggregateError::Store(e)
        })?;
        debug!(user, recipes = recipes.len(), lines = lines.len(), "Collected ingredient lines");

        let ingredient_ids: BTreeSet<IngredientId> = lines.iter().map(|l| l.ingredient).collect();
        let lookups = ingredient_ids.iter().map(|id| store.ingredient(*id));
        let resolved = try_join_all(lookups).await.map_err(|e| {
            error!(user, error = %e, "Failed to look up ingredients");
            AggregateError::Store(e)
        })?;
        let ingredients: BTreeMap<IngredientId, (String, String)> = resolved
            .into_iter()
            .flatten()
            .map(|i| (i.id, (i.name, i.measurement_unit)))
            .collect();

        let aggregation = group_lines(&lines, &ingredients);
        for orphan in &aggregation.orphaned {
            warn!(
                user,
                recipe = orphan.recipe,
                ingredient = orphan.ingredient,
                "Skipping ingredient line with missing ingredient"
            );
        }
        info!(
            user,
            recipes = recipes.len(),
            merged = aggregation.lines.len(),
            orphaned = aggregation.orphaned.len(),
            "Aggregated shopping cart"
        );
        Ok(aggregation)
    }
}

/// Group lines by (name, unit) of their resolved ingredient and sum amounts.
/// Lines whose ingredient is absent from `ingredients` are reported as orphaned.
pub fn group_lines(
    lines: &[RecipeIngredientLine],
    ingredients: &BTreeMap<IngredientId, (String, String)>,
) -> Aggregation {
    let mut totals: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut orphaned = Vec::new();

    for line in lines {
        match ingredients.get(&line.ingredient) {
            Some((name, unit)) => {
                *totals.entry((name.as_str(), unit.as_str())).or_insert(0) += u64::from(line.amount);
            }
            None => orphaned.push(IngredientLookupFailure {
                recipe: line.recipe,
                ingredient: line.ingredient,
            }),
        }
    }

    Aggregation {
        lines: totals
            .into_iter()
            .map(|((name, unit), total)| AggregatedLine::new(name, unit, total))
            .collect(),
        orphaned,
    }
}
