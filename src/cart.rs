//! Adding recipes to and removing them from a user's shopping cart.

use tracing::{error, info, warn};

use crate::contract::{CartEntry, RecipeId, RecipeStore, StoreError, UserId};

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("recipe {0} does not exist")]
    RecipeNotFound(RecipeId),
    #[error("recipe {recipe} is already in the shopping cart of user {user}")]
    AlreadyInCart { user: UserId, recipe: RecipeId },
    #[error("recipe {recipe} is not in the shopping cart of user {user}")]
    NotInCart { user: UserId, recipe: RecipeId },
    #[error("store error: {0}")]
    Store(StoreError),
}

async fn ensure_recipe<S>(store: &S, recipe: RecipeId) -> Result<(), CartError>
where
    S: RecipeStore + ?Sized,
{
    match store.recipe_exists(recipe).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(recipe, "Recipe not found");
            Err(CartError::RecipeNotFound(recipe))
        }
        Err(e) => {
            error!(recipe, error = %e, "Failed to look up recipe");
            Err(CartError::Store(e))
        }
    }
}

pub async fn add_recipe<S>(store: &S, user: UserId, recipe: RecipeId) -> Result<CartEntry, CartError>
where
    S: RecipeStore + ?Sized,
{
    ensure_recipe(store, recipe).await?;
    let entry = CartEntry { user, recipe };
    let inserted = store.add_cart_entry(entry).await.map_err(|e| {
        error!(user, recipe, error = %e, "Failed to add cart entry");
        CartError::Store(e)
    })?;
    if !inserted {
        warn!(user, recipe, "Recipe already in shopping cart");
        return Err(CartError::AlreadyInCart { user, recipe });
    }
    info!(user, recipe, "Added recipe to shopping cart");
    Ok(entry)
}

pub async fn remove_recipe<S>(store: &S, user: UserId, recipe: RecipeId) -> Result<(), CartError>
where
    S: RecipeStore + ?Sized,
{
    ensure_recipe(store, recipe).await?;
    let removed = store
        .remove_cart_entry(CartEntry { user, recipe })
        .await
        .map_err(|e| {
            error!(user, recipe, error = %e, "Failed to remove cart entry");
            CartError::Store(e)
        })?;
    if !removed {
        warn!(user, recipe, "Recipe not in shopping cart");
        return Err(CartError::NotInCart { user, recipe });
    }
    info!(user, recipe, "Removed recipe from shopping cart");
    Ok(())
}
