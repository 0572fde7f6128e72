use std::path::PathBuf;

use shoplist::aggregate::{AggregateError, Aggregator, EmptyCartPolicy};
use shoplist::contract::MockRecipeStore;
use shoplist::render::{Layout, ShoppingListRenderer};
use shoplist::shopping_list::{
    download_shopping_list, ShoppingListError, ShoppingListService, CONTENT_TYPE,
};
use shoplist::store::MemoryStore;

fn fixture_store() -> MemoryStore {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recipes.yaml");
    MemoryStore::load(path).expect("fixture should load")
}

fn service(policy: EmptyCartPolicy) -> ShoppingListService {
    let renderer = ShoppingListRenderer::new("Shopping list", Layout::default()).unwrap();
    ShoppingListService::new(Aggregator::new(policy), renderer, "shop_list.pdf")
}

#[tokio::test]
async fn test_download_produces_pdf_attachment() {
    let store = fixture_store();
    let download = service(EmptyCartPolicy::RenderEmpty)
        .download(&store, 1)
        .await
        .expect("export should succeed");

    assert_eq!(download.filename, "shop_list.pdf");
    assert_eq!(download.content_type, CONTENT_TYPE);
    assert_eq!(
        download.content_disposition(),
        "attachment; filename=\"shop_list.pdf\""
    );
    assert_eq!(download.lines, 2);
    assert_eq!(download.skipped, 0);
    assert_eq!(&download.content[0..4], b"%PDF");
}

#[tokio::test]
async fn test_download_reports_skipped_orphans() {
    let store = fixture_store();
    let download = service(EmptyCartPolicy::RenderEmpty)
        .download(&store, 3)
        .await
        .unwrap();
    assert_eq!(download.lines, 2);
    assert_eq!(download.skipped, 1);
}

#[tokio::test]
async fn test_empty_cart_renders_empty_document_by_default() {
    let store = fixture_store();
    let download = service(EmptyCartPolicy::RenderEmpty)
        .download(&store, 2)
        .await
        .expect("empty cart renders an empty document");
    assert_eq!(download.lines, 0);
    assert_eq!(&download.content[0..4], b"%PDF");
}

#[tokio::test]
async fn test_empty_cart_rejected_when_configured() {
    let store = fixture_store();
    let err = service(EmptyCartPolicy::Reject)
        .download(&store, 2)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ShoppingListError::Aggregate(AggregateError::EmptyCart { user: 2 })
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_concurrent_exports_do_not_interfere() {
    let store = fixture_store();
    let svc = service(EmptyCartPolicy::RenderEmpty);

    let (first, empty, third) = tokio::join!(
        svc.download(&store, 1),
        svc.download(&store, 2),
        svc.download(&store, 3),
    );
    let (first, empty, third) = (first.unwrap(), empty.unwrap(), third.unwrap());

    assert_eq!(first.lines, 2);
    assert_eq!(empty.lines, 0);
    assert_eq!(third.lines, 2);
    assert_ne!(first.content, empty.content);

    let again = svc.download(&store, 1).await.unwrap();
    assert_eq!(again.lines, first.lines);
    assert_eq!(again.content, first.content);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_aggregate_error() {
    let mut store = MockRecipeStore::new();
    store
        .expect_cart_recipe_ids()
        .returning(|_| Err("database unavailable".into()));

    let renderer = ShoppingListRenderer::new("Shopping list", Layout::default()).unwrap();
    let err = download_shopping_list(&store, &Aggregator::default(), &renderer, 1, "shop_list.pdf")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShoppingListError::Aggregate(AggregateError::Store(_))
    ));
}
