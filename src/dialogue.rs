//! Admin conversation state, one value per chat.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Where an admin conversation currently stands.
///
/// Every variant except `Idle` waits for exactly one input. The fields carry
/// the values accepted so far.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FlowState {
    #[default]
    Idle,

    // Add category
    AwaitingCategoryName,

    // Rename category
    AwaitingNewCategoryName {
        category_id: i64,
    },

    // Add product
    AwaitingProductName {
        category_id: i64,
    },
    AwaitingProductDescription {
        category_id: i64,
        name: String,
    },
    AwaitingProductPrice {
        category_id: i64,
        name: String,
        description: String,
    },
    AwaitingProductImage {
        category_id: i64,
        name: String,
        description: String,
        price: f64,
    },

    // Full product edit, kept for keyboards sent by older versions
    EditingProductName {
        product_id: i64,
    },
    EditingProductDescription {
        product_id: i64,
        name: String,
    },
    EditingProductPrice {
        product_id: i64,
        name: String,
        description: String,
    },

    // Single field edits
    AwaitingFieldName {
        product_id: i64,
        category_id: i64,
    },
    AwaitingFieldDescription {
        product_id: i64,
        category_id: i64,
    },
    AwaitingFieldPrice {
        product_id: i64,
        category_id: i64,
    },
    AwaitingFieldImage {
        product_id: i64,
        category_id: i64,
    },
}

impl FlowState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FlowState::Idle)
    }

    /// Whether the current step takes a photo as its input
    pub fn accepts_photo(&self) -> bool {
        matches!(
            self,
            FlowState::AwaitingProductImage { .. } | FlowState::AwaitingFieldImage { .. }
        )
    }

    /// Whether the current step can be skipped
    pub fn accepts_skip(&self) -> bool {
        matches!(self, FlowState::AwaitingProductImage { .. })
    }

    /// Product edited by the current flow, if it edits an existing product
    pub fn product_id(&self) -> Option<i64> {
        match self {
            FlowState::EditingProductName { product_id }
            | FlowState::EditingProductDescription { product_id, .. }
            | FlowState::EditingProductPrice { product_id, .. }
            | FlowState::AwaitingFieldName { product_id, .. }
            | FlowState::AwaitingFieldDescription { product_id, .. }
            | FlowState::AwaitingFieldPrice { product_id, .. }
            | FlowState::AwaitingFieldImage { product_id, .. } => Some(*product_id),
            _ => None,
        }
    }
}

/// Type alias for the admin dialogue
pub type AdminDialogue = Dialogue<FlowState, InMemStorage<FlowState>>;
