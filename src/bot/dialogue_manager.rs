//! Dialogue Manager module for handling dialogue state transitions
//!
//! [`advance`] feeds one admin input into the current [`FlowState`]. It
//! validates and buffers the input, and writes to the catalog only when a flow
//! completes.

use tracing::{debug, info};

use crate::catalog::validation::{parse_price, validate_text, ValidationError};
use crate::catalog::{Catalog, CatalogError, ImageOutcome, Photo, ProductDraft};
use crate::dialogue::FlowState;

/// One admin message, as seen by a flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowInput {
    Text(String),
    Photo(Photo),
    /// The optional step was skipped
    Skip,
    /// Anything else, including photos sent where text is expected
    Other,
}

/// Why an input was refused; the state stays where it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyCategoryName,
    EmptyProductName,
    EmptyDescription,
    InvalidPrice,
    /// The optional image step wants a photo or a skip
    ExpectedImage,
    /// The image edit wants a photo
    ExpectedPhoto,
    ExpectedText,
}

impl Rejection {
    /// Localization key of the message shown to the admin
    pub fn message_key(&self) -> &'static str {
        match self {
            Rejection::EmptyCategoryName => "error-empty-category-name",
            Rejection::EmptyProductName => "error-empty-product-name",
            Rejection::EmptyDescription => "error-empty-description",
            Rejection::InvalidPrice => "error-invalid-price",
            Rejection::ExpectedImage => "error-expected-image",
            Rejection::ExpectedPhoto => "error-expected-photo",
            Rejection::ExpectedText => "error-expected-text",
        }
    }
}

/// Single field replaced by a field edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Name(String),
    Description,
    Price(f64),
    Image(ImageOutcome),
}

/// A completed flow and what it wrote
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    CategoryAdded {
        category_id: i64,
        name: String,
    },
    CategoryRenamed {
        category_id: i64,
        name: String,
    },
    ProductAdded {
        product_id: i64,
        category_id: i64,
        name: String,
        image: ImageOutcome,
    },
    ProductUpdated {
        product_id: i64,
        name: String,
    },
    FieldUpdated {
        product_id: i64,
        category_id: i64,
        change: FieldChange,
    },
}

/// Result of feeding one input into a flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// No flow is running
    NotInFlow,
    Reprompt(Rejection),
    Advance(FlowState),
    Done(Commit),
    /// The category or product being edited no longer exists
    Missing,
}

fn text_or(input: &FlowInput, rejection: Rejection) -> Result<&str, FlowOutcome> {
    match input {
        FlowInput::Text(text) => Ok(text),
        _ => Err(FlowOutcome::Reprompt(rejection)),
    }
}

fn required_text(input: &FlowInput, empty: Rejection) -> Result<String, FlowOutcome> {
    let text = text_or(input, Rejection::ExpectedText)?;
    validate_text(text).map_err(|_| FlowOutcome::Reprompt(empty))
}

fn required_price(input: &FlowInput) -> Result<f64, FlowOutcome> {
    let text = text_or(input, Rejection::ExpectedText)?;
    parse_price(text).map_err(|e: ValidationError| {
        debug!(error = %e, "Rejected price input");
        FlowOutcome::Reprompt(Rejection::InvalidPrice)
    })
}

/// Whether a text message asks to skip the optional image
pub fn is_skip_text(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("skip") || text.eq_ignore_ascii_case("/skip")
}

/// Feeds `input` into `state`.
///
/// Catalog writes happen only on the last step of a flow; every earlier step
/// is pure.
pub async fn advance(
    catalog: &Catalog,
    state: FlowState,
    input: FlowInput,
) -> Result<FlowOutcome, CatalogError> {
    let outcome = match step(catalog, state, input).await {
        Ok(outcome) => outcome,
        Err(StepError::Outcome(outcome)) => outcome,
        Err(StepError::Catalog(CatalogError::CategoryNotFound(_))) => FlowOutcome::Missing,
        Err(StepError::Catalog(e)) => return Err(e),
    };

    if let FlowOutcome::Done(commit) = &outcome {
        info!(commit = ?commit, "Flow completed");
    }

    Ok(outcome)
}

enum StepError {
    Outcome(FlowOutcome),
    Catalog(CatalogError),
}

impl From<FlowOutcome> for StepError {
    fn from(outcome: FlowOutcome) -> Self {
        StepError::Outcome(outcome)
    }
}

impl From<CatalogError> for StepError {
    fn from(e: CatalogError) -> Self {
        StepError::Catalog(e)
    }
}

async fn step(
    catalog: &Catalog,
    state: FlowState,
    input: FlowInput,
) -> Result<FlowOutcome, StepError> {
    let outcome = match state {
        FlowState::Idle => FlowOutcome::NotInFlow,

        FlowState::AwaitingCategoryName => {
            let name = required_text(&input, Rejection::EmptyCategoryName)?;
            let category_id = catalog.add_category(&name).await?;
            FlowOutcome::Done(Commit::CategoryAdded { category_id, name })
        }

        FlowState::AwaitingNewCategoryName { category_id } => {
            let name = required_text(&input, Rejection::EmptyCategoryName)?;
            if !catalog.update_category(category_id, &name).await? {
                return Ok(FlowOutcome::Missing);
            }
            FlowOutcome::Done(Commit::CategoryRenamed { category_id, name })
        }

        FlowState::AwaitingProductName { category_id } => {
            let name = required_text(&input, Rejection::EmptyProductName)?;
            FlowOutcome::Advance(FlowState::AwaitingProductDescription { category_id, name })
        }

        FlowState::AwaitingProductDescription { category_id, name } => {
            let description = required_text(&input, Rejection::EmptyDescription)?;
            FlowOutcome::Advance(FlowState::AwaitingProductPrice {
                category_id,
                name,
                description,
            })
        }

        FlowState::AwaitingProductPrice {
            category_id,
            name,
            description,
        } => {
            let price = required_price(&input)?;
            FlowOutcome::Advance(FlowState::AwaitingProductImage {
                category_id,
                name,
                description,
                price,
            })
        }

        FlowState::AwaitingProductImage {
            category_id,
            name,
            description,
            price,
        } => {
            let photo = match input {
                FlowInput::Photo(photo) => Some(photo),
                FlowInput::Skip => None,
                FlowInput::Text(text) if is_skip_text(&text) => None,
                _ => return Ok(FlowOutcome::Reprompt(Rejection::ExpectedImage)),
            };

            let draft = ProductDraft {
                category_id,
                name: name.clone(),
                description,
                price,
            };
            let (product_id, image) = catalog.create_product(draft, photo).await?;

            FlowOutcome::Done(Commit::ProductAdded {
                product_id,
                category_id,
                name,
                image,
            })
        }

        FlowState::EditingProductName { product_id } => {
            let name = required_text(&input, Rejection::EmptyProductName)?;
            FlowOutcome::Advance(FlowState::EditingProductDescription { product_id, name })
        }

        FlowState::EditingProductDescription { product_id, name } => {
            let description = required_text(&input, Rejection::EmptyDescription)?;
            FlowOutcome::Advance(FlowState::EditingProductPrice {
                product_id,
                name,
                description,
            })
        }

        FlowState::EditingProductPrice {
            product_id,
            name,
            description,
        } => {
            let price = required_price(&input)?;
            if !catalog
                .update_product(product_id, &name, &description, price)
                .await?
            {
                return Ok(FlowOutcome::Missing);
            }
            FlowOutcome::Done(Commit::ProductUpdated { product_id, name })
        }

        FlowState::AwaitingFieldName {
            product_id,
            category_id,
        } => {
            let name = required_text(&input, Rejection::EmptyProductName)?;
            let updated = match catalog.get_product(product_id).await? {
                Some(product) => {
                    catalog
                        .update_product(product_id, &name, &product.description, product.price)
                        .await?
                }
                None => false,
            };
            if !updated {
                return Ok(FlowOutcome::Missing);
            }
            FlowOutcome::Done(Commit::FieldUpdated {
                product_id,
                category_id,
                change: FieldChange::Name(name),
            })
        }

        FlowState::AwaitingFieldDescription {
            product_id,
            category_id,
        } => {
            let description = required_text(&input, Rejection::EmptyDescription)?;
            let updated = match catalog.get_product(product_id).await? {
                Some(product) => {
                    catalog
                        .update_product(product_id, &product.name, &description, product.price)
                        .await?
                }
                None => false,
            };
            if !updated {
                return Ok(FlowOutcome::Missing);
            }
            FlowOutcome::Done(Commit::FieldUpdated {
                product_id,
                category_id,
                change: FieldChange::Description,
            })
        }

        FlowState::AwaitingFieldPrice {
            product_id,
            category_id,
        } => {
            let price = required_price(&input)?;
            let updated = match catalog.get_product(product_id).await? {
                Some(product) => {
                    catalog
                        .update_product(product_id, &product.name, &product.description, price)
                        .await?
                }
                None => false,
            };
            if !updated {
                return Ok(FlowOutcome::Missing);
            }
            FlowOutcome::Done(Commit::FieldUpdated {
                product_id,
                category_id,
                change: FieldChange::Price(price),
            })
        }

        FlowState::AwaitingFieldImage {
            product_id,
            category_id,
        } => {
            let photo = match input {
                FlowInput::Photo(photo) => photo,
                _ => return Ok(FlowOutcome::Reprompt(Rejection::ExpectedPhoto)),
            };
            match catalog.replace_image(product_id, photo).await? {
                Some(outcome) => FlowOutcome::Done(Commit::FieldUpdated {
                    product_id,
                    category_id,
                    change: FieldChange::Image(outcome),
                }),
                None => FlowOutcome::Missing,
            }
        }
    };

    Ok(outcome)
}
