use anyhow::Result;
use std::path::Path;
use storefront::catalog::{CatalogError, CatalogStore, JsonCatalogStore, NewProduct};
use tempfile::TempDir;

async fn open_store(dir: &Path) -> Result<JsonCatalogStore> {
    Ok(JsonCatalogStore::open(dir.join("categories.json"), dir.join("products.json")).await?)
}

fn new_product(category_id: i64, name: &str, price: f64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: "Fruity".to_string(),
        price,
        category_id,
        image_path: None,
    }
}

#[tokio::test]
async fn test_add_and_get() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    let category_id = store.add_category("  Liquids ").await?;
    assert_eq!(category_id, 1);

    let category = store.get_category(category_id).await?.expect("category exists");
    assert_eq!(category.name, "Liquids");

    let product_id = store.add_product(new_product(category_id, "Mango 30ml", 250.0)).await?;
    let product = store.get_product(product_id).await?.expect("product exists");
    assert_eq!(product.name, "Mango 30ml");
    assert_eq!(product.category_id, category_id);
    assert_eq!(product.image_path, None);

    assert!(store.get_product(999).await?.is_none());
    assert!(store.get_category(999).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_ids_are_never_reused() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    let first = store.add_category("First").await?;
    assert!(store.delete_category(first).await?.is_some());
    let second = store.add_category("Second").await?;

    assert!(second > first);
    Ok(())
}

#[tokio::test]
async fn test_delete_category_cascades() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    let liquids = store.add_category("Liquids").await?;
    let devices = store.add_category("Devices").await?;
    let mango = store
        .add_product(NewProduct {
            image_path: Some("images/mango.jpg".to_string()),
            ..new_product(liquids, "Mango 30ml", 250.0)
        })
        .await?;
    store.add_product(new_product(liquids, "Lime", 200.0)).await?;
    let pod = store
        .add_product(NewProduct {
            image_path: Some("images/pod.jpg".to_string()),
            ..new_product(devices, "Pod", 1500.0)
        })
        .await?;

    // Only the removed products' images are handed back for cleanup
    assert_eq!(
        store.delete_category(liquids).await?,
        Some(vec!["images/mango.jpg".to_string()])
    );

    assert!(store.get_product(mango).await?.is_none());
    assert!(store.get_product(pod).await?.is_some());
    assert!(store
        .list_products()
        .await?
        .iter()
        .all(|p| p.category_id != liquids));

    assert_eq!(store.delete_category(liquids).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_update_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    let category_id = store.add_category("Liquids").await?;
    let product_id = store.add_product(new_product(category_id, "Mango", 250.0)).await?;

    assert!(store.update_product(product_id, "Mango 60ml", "Bigger", 400.0).await?);
    let once = store.get_product(product_id).await?;
    assert!(store.update_product(product_id, "Mango 60ml", "Bigger", 400.0).await?);
    let twice = store.get_product(product_id).await?;

    assert_eq!(once, twice);
    assert!(!store.update_product(999, "Ghost", "None", 1.0).await?);
    assert!(!store.update_category(999, "Ghost").await?);
    Ok(())
}

#[tokio::test]
async fn test_reload_keeps_data_and_counters() -> Result<()> {
    let dir = TempDir::new()?;

    {
        let store = open_store(dir.path()).await?;
        let category_id = store.add_category("Liquids").await?;
        store.add_product(new_product(category_id, "Mango 30ml", 250.0)).await?;
        let extra = store.add_category("Temporary").await?;
        store.delete_category(extra).await?;
    }

    let store = open_store(dir.path()).await?;
    let categories = store.list_categories().await?;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Liquids");
    assert_eq!(store.list_products().await?.len(), 1);

    // The deleted category took id 2
    assert_eq!(store.add_category("Devices").await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_document_layout() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;
    store.add_category("Liquids").await?;

    let raw = tokio::fs::read_to_string(dir.path().join("categories.json")).await?;
    let document: serde_json::Value = serde_json::from_str(&raw)?;

    assert_eq!(document["next_id"], 2);
    assert_eq!(document["categories"][0]["id"], 1);
    assert_eq!(document["categories"][0]["name"], "Liquids");
    Ok(())
}

#[tokio::test]
async fn test_next_id_repaired_on_load() -> Result<()> {
    let dir = TempDir::new()?;
    tokio::fs::write(
        dir.path().join("categories.json"),
        r#"{"categories": [{"id": 5, "name": "Old"}], "next_id": 1}"#,
    )
    .await?;

    let store = open_store(dir.path()).await?;
    assert_eq!(store.add_category("New").await?, 6);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_document_is_an_error() -> Result<()> {
    let dir = TempDir::new()?;
    tokio::fs::write(dir.path().join("products.json"), "{ not json").await?;

    let result =
        JsonCatalogStore::open(dir.path().join("categories.json"), dir.path().join("products.json"))
            .await;
    assert!(matches!(result, Err(CatalogError::Document(_))));
    Ok(())
}

#[tokio::test]
async fn test_boundary_validation() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    assert!(matches!(
        store.add_category("   ").await,
        Err(CatalogError::Validation(_))
    ));

    let category_id = store.add_category("Liquids").await?;
    assert!(matches!(
        store.add_product(new_product(category_id, "Mango", 0.0)).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(matches!(
        store.add_product(new_product(category_id, "", 10.0)).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(matches!(
        store.add_product(new_product(42, "Orphan", 10.0)).await,
        Err(CatalogError::CategoryNotFound(42))
    ));

    assert!(store.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_product_image_link() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path()).await?;

    let category_id = store.add_category("Liquids").await?;
    let product_id = store.add_product(new_product(category_id, "Mango", 250.0)).await?;

    assert!(store.update_product_image(product_id, Some("images/a.jpg")).await?);
    assert_eq!(
        store.get_product(product_id).await?.and_then(|p| p.image_path),
        Some("images/a.jpg".to_string())
    );

    assert!(store.update_product_image(product_id, None).await?);
    assert_eq!(store.get_product(product_id).await?.and_then(|p| p.image_path), None);

    assert!(store.delete_product(product_id).await?);
    assert!(!store.delete_product(product_id).await?);
    Ok(())
}
