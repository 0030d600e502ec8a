use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use storefront::bot::{advance, Commit, FieldChange, FlowInput, FlowOutcome, Rejection};
use storefront::catalog::{Catalog, ImageOutcome, JsonCatalogStore, Photo};
use storefront::dialogue::FlowState;
use storefront::image_store::ImageStore;
use tempfile::TempDir;

async fn setup_catalog(dir: &Path) -> Result<Catalog> {
    let store = JsonCatalogStore::open(dir.join("categories.json"), dir.join("products.json")).await?;
    Ok(Catalog::new(Arc::new(store), ImageStore::new(dir.join("images"))))
}

fn text(value: &str) -> FlowInput {
    FlowInput::Text(value.to_string())
}

fn photo() -> FlowInput {
    FlowInput::Photo(Photo {
        bytes: vec![0x89, b'P', b'N', b'G'],
        extension: ".png".to_string(),
    })
}

/// Feeds inputs one by one, expecting every step but the last to advance
async fn run_flow(catalog: &Catalog, start: FlowState, inputs: Vec<FlowInput>) -> Result<FlowOutcome> {
    let mut state = start;
    let mut outcome = FlowOutcome::NotInFlow;

    for input in inputs {
        outcome = advance(catalog, state.clone(), input).await?;
        if let FlowOutcome::Advance(next) = &outcome {
            state = next.clone();
        }
    }

    Ok(outcome)
}

async fn product_in(catalog: &Catalog, category: &str) -> Result<(i64, i64)> {
    let category_id = catalog.add_category(category).await?;
    let outcome = run_flow(
        catalog,
        FlowState::AwaitingProductName { category_id },
        vec![text("Mango 30ml"), text("Fruity"), text("250"), FlowInput::Skip],
    )
    .await?;

    match outcome {
        FlowOutcome::Done(Commit::ProductAdded { product_id, .. }) => Ok((category_id, product_id)),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_add_category_flow() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;

    let outcome = advance(&catalog, FlowState::AwaitingCategoryName, text("  Liquids  ")).await?;
    assert_eq!(
        outcome,
        FlowOutcome::Done(Commit::CategoryAdded {
            category_id: 1,
            name: "Liquids".to_string()
        })
    );
    assert_eq!(catalog.list_categories().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_name_reprompts_without_writing() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;

    let outcome = advance(&catalog, FlowState::AwaitingCategoryName, text("   ")).await?;
    assert_eq!(outcome, FlowOutcome::Reprompt(Rejection::EmptyCategoryName));

    let outcome = advance(&catalog, FlowState::AwaitingCategoryName, photo()).await?;
    assert_eq!(outcome, FlowOutcome::Reprompt(Rejection::ExpectedText));

    assert!(catalog.list_categories().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_add_product_steps_buffer_values() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;
    let category_id = catalog.add_category("Liquids").await?;

    let step = advance(&catalog, FlowState::AwaitingProductName { category_id }, text("Mango")).await?;
    let state = match step {
        FlowOutcome::Advance(state) => state,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(
        state,
        FlowState::AwaitingProductDescription {
            category_id,
            name: "Mango".to_string()
        }
    );

    let step = advance(&catalog, state, text("Fruity")).await?;
    let state = match step {
        FlowOutcome::Advance(state) => state,
        other => panic!("unexpected outcome {other:?}"),
    };

    for bad_price in ["0", "-5", "abc", ""] {
        let outcome = advance(&catalog, state.clone(), text(bad_price)).await?;
        assert_eq!(outcome, FlowOutcome::Reprompt(Rejection::InvalidPrice));
    }

    let step = advance(&catalog, state, text("19,99")).await?;
    assert_eq!(
        step,
        FlowOutcome::Advance(FlowState::AwaitingProductImage {
            category_id,
            name: "Mango".to_string(),
            description: "Fruity".to_string(),
            price: 19.99,
        })
    );

    // Nothing is written before the last step
    assert!(catalog.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_image_step_accepts_photo_or_skip() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;
    let category_id = catalog.add_category("Liquids").await?;

    let image_step = FlowState::AwaitingProductImage {
        category_id,
        name: "Mango".to_string(),
        description: "Fruity".to_string(),
        price: 250.0,
    };

    let outcome = advance(&catalog, image_step.clone(), text("here you go")).await?;
    assert_eq!(outcome, FlowOutcome::Reprompt(Rejection::ExpectedImage));

    let outcome = advance(&catalog, image_step.clone(), text("skip")).await?;
    assert!(matches!(
        outcome,
        FlowOutcome::Done(Commit::ProductAdded {
            image: ImageOutcome::None,
            ..
        })
    ));

    let outcome = advance(&catalog, image_step, photo()).await?;
    let product_id = match outcome {
        FlowOutcome::Done(Commit::ProductAdded {
            product_id,
            image: ImageOutcome::Saved,
            ..
        }) => product_id,
        other => panic!("unexpected outcome {other:?}"),
    };

    let product = catalog.get_product(product_id).await?.expect("product exists");
    assert!(product.image_path.is_some_and(|path| path.ends_with(".png")));
    Ok(())
}

#[tokio::test]
async fn test_field_edits_touch_one_field() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;
    let (category_id, product_id) = product_in(&catalog, "Liquids").await?;

    let outcome = advance(
        &catalog,
        FlowState::AwaitingFieldPrice {
            product_id,
            category_id,
        },
        text("300"),
    )
    .await?;
    assert_eq!(
        outcome,
        FlowOutcome::Done(Commit::FieldUpdated {
            product_id,
            category_id,
            change: FieldChange::Price(300.0)
        })
    );

    advance(
        &catalog,
        FlowState::AwaitingFieldName {
            product_id,
            category_id,
        },
        text("Mango 60ml"),
    )
    .await?;

    let product = catalog.get_product(product_id).await?.expect("product exists");
    assert_eq!(product.name, "Mango 60ml");
    assert_eq!(product.description, "Fruity");
    assert_eq!(product.price, 300.0);

    let outcome = advance(
        &catalog,
        FlowState::AwaitingFieldImage {
            product_id,
            category_id,
        },
        FlowInput::Skip,
    )
    .await?;
    assert_eq!(outcome, FlowOutcome::Reprompt(Rejection::ExpectedPhoto));

    let outcome = advance(
        &catalog,
        FlowState::AwaitingFieldImage {
            product_id,
            category_id,
        },
        photo(),
    )
    .await?;
    assert_eq!(
        outcome,
        FlowOutcome::Done(Commit::FieldUpdated {
            product_id,
            category_id,
            change: FieldChange::Image(ImageOutcome::Saved)
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_legacy_full_edit() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;
    let (_, product_id) = product_in(&catalog, "Liquids").await?;

    let outcome = run_flow(
        &catalog,
        FlowState::EditingProductName { product_id },
        vec![text("Lime"), text("Sour"), text("199.5")],
    )
    .await?;

    assert_eq!(
        outcome,
        FlowOutcome::Done(Commit::ProductUpdated {
            product_id,
            name: "Lime".to_string()
        })
    );

    let product = catalog.get_product(product_id).await?.expect("product exists");
    assert_eq!(product.description, "Sour");
    assert_eq!(product.price, 199.5);
    Ok(())
}

#[tokio::test]
async fn test_entity_removed_mid_flow() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;
    let (category_id, product_id) = product_in(&catalog, "Liquids").await?;

    let rename = FlowState::AwaitingNewCategoryName { category_id };
    let add = FlowState::AwaitingProductImage {
        category_id,
        name: "Lime".to_string(),
        description: "Sour".to_string(),
        price: 10.0,
    };
    let edit = FlowState::AwaitingFieldDescription {
        product_id,
        category_id,
    };

    assert!(catalog.delete_category(category_id).await?);

    assert_eq!(advance(&catalog, rename, text("Juices")).await?, FlowOutcome::Missing);
    assert_eq!(advance(&catalog, add, FlowInput::Skip).await?, FlowOutcome::Missing);
    assert_eq!(advance(&catalog, edit, text("New")).await?, FlowOutcome::Missing);
    assert!(catalog.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_idle_state_is_not_a_flow() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = setup_catalog(dir.path()).await?;

    let outcome = advance(&catalog, FlowState::Idle, text("hello")).await?;
    assert_eq!(outcome, FlowOutcome::NotInFlow);
    Ok(())
}
