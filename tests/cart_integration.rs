use std::path::PathBuf;

use shoplist::aggregate::Aggregator;
use shoplist::cart::{add_recipe, remove_recipe, CartError};
use shoplist::contract::{AggregatedLine, CartEntry, MockRecipeStore, RecipeStore};
use shoplist::store::MemoryStore;

fn fixture_store() -> MemoryStore {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recipes.yaml");
    MemoryStore::load(path).expect("fixture should load")
}

#[tokio::test]
async fn test_add_recipe_then_aggregate_includes_it() {
    let store = fixture_store();

    let entry = add_recipe(&store, 2, 20).await.expect("add should succeed");
    assert_eq!(entry, CartEntry { user: 2, recipe: 20 });
    assert_eq!(store.cart_recipe_ids(2).await.unwrap(), vec![20]);

    let aggregation = Aggregator::default().aggregate(&store, 2).await.unwrap();
    assert_eq!(
        aggregation.lines,
        vec![
            AggregatedLine::new("Flour", "g", 300),
            AggregatedLine::new("Sugar", "g", 50),
        ]
    );
}

#[tokio::test]
async fn test_add_recipe_twice_is_rejected() {
    let store = fixture_store();
    let err = add_recipe(&store, 1, 10).await.unwrap_err();
    assert!(matches!(err, CartError::AlreadyInCart { user: 1, recipe: 10 }));
    assert_eq!(store.cart_recipe_ids(1).await.unwrap(), vec![10, 20]);
}

#[tokio::test]
async fn test_unknown_recipe_is_rejected() {
    let store = fixture_store();
    assert!(matches!(
        add_recipe(&store, 1, 404).await,
        Err(CartError::RecipeNotFound(404))
    ));
    assert!(matches!(
        remove_recipe(&store, 1, 404).await,
        Err(CartError::RecipeNotFound(404))
    ));
}

#[tokio::test]
async fn test_remove_recipe_updates_aggregation() {
    let store = fixture_store();
    remove_recipe(&store, 1, 20).await.expect("remove should succeed");

    let aggregation = Aggregator::default().aggregate(&store, 1).await.unwrap();
    assert_eq!(aggregation.lines, vec![AggregatedLine::new("Flour", "g", 200)]);
}

#[tokio::test]
async fn test_remove_recipe_not_in_cart_is_rejected() {
    let store = fixture_store();
    let err = remove_recipe(&store, 2, 10).await.unwrap_err();
    assert!(matches!(err, CartError::NotInCart { user: 2, recipe: 10 }));
}

#[tokio::test]
async fn test_store_error_during_add_is_surfaced() {
    let mut store = MockRecipeStore::new();
    store.expect_recipe_exists().returning(|_| Ok(true));
    store
        .expect_add_cart_entry()
        .returning(|_| Err("disk full".into()));

    let err = add_recipe(&store, 1, 10).await.unwrap_err();
    match err {
        CartError::Store(e) => assert_eq!(e.to_string(), "disk full"),
        other => panic!("expected store error, got {other:?}"),
    }
}
