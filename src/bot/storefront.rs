//! Storefront core: turns commands, button presses and flow inputs into
//! [`Reply`] values without touching Telegram.

use anyhow::Result;
use teloxide::utils::html;
use tracing::{debug, info, warn};

use super::actions::{Action, Command, ProductField};
use super::dialogue_manager::{advance, Commit, FieldChange, FlowInput, FlowOutcome};
use super::reply::{OutgoingMessage, Reply};
use super::ui_builder::{
    create_add_product_select_keyboard, create_admin_categories_keyboard,
    create_admin_category_products_keyboard, create_admin_keyboard, create_admin_products_keyboard,
    create_categories_keyboard, create_product_admin_keyboard, create_product_keyboard,
    create_products_keyboard, create_prompt_keyboard, create_to_categories_keyboard,
    format_admin_product_details, format_price, format_product_details, format_welcome,
};
use crate::catalog::{Catalog, ImageOutcome, Product};
use crate::config::ShopSettings;
use crate::dialogue::FlowState;
use crate::localization::{t_args_lang, t_lang};

/// Shop behaviour shared by all chats
#[derive(Debug, Clone)]
pub struct Storefront {
    catalog: Catalog,
    shop: ShopSettings,
}

impl Storefront {
    pub fn new(catalog: Catalog, shop: ShopSettings) -> Self {
        Self { catalog, shop }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shop(&self) -> &ShopSettings {
        &self.shop
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        user_id == self.shop.admin_id
    }

    /// Handles a slash command
    pub async fn handle_command(
        &self,
        user_id: u64,
        language_code: Option<&str>,
        command: Command,
        state: &FlowState,
    ) -> Result<Reply> {
        debug!(user_id, command = ?command, "Handling command");

        match command {
            Command::Start => Ok(Reply::message(self.categories_view(language_code).await?)),
            Command::Admin => {
                if !self.is_admin(user_id) {
                    warn!(user_id, "Non-admin user requested the admin panel");
                    return Ok(Reply::text(t_lang("admin-access-denied", language_code)));
                }
                Ok(Reply::message(admin_panel(language_code)))
            }
            Command::Cancel => Ok(self.cancel(user_id, state, language_code)),
            Command::Skip => {
                if state.is_idle() {
                    Ok(Reply::text(t_lang("text-hint", language_code)))
                } else {
                    self.handle_input(user_id, language_code, state.clone(), FlowInput::Skip)
                        .await
                }
            }
        }
    }

    /// Handles an inline button press
    pub async fn handle_action(
        &self,
        user_id: u64,
        language_code: Option<&str>,
        action: Action,
        state: &FlowState,
    ) -> Result<Reply> {
        if action.requires_admin() && !self.is_admin(user_id) {
            warn!(user_id, action = %action, "Rejected admin action from non-admin user");
            return Ok(Reply::alert(t_lang("access-denied", language_code)));
        }

        debug!(user_id, action = %action, "Handling action");
        let lang = language_code;

        let reply = match action {
            Action::ShowCategory(category_id) | Action::BackToCategory(category_id) => {
                match self.category_view(category_id, lang).await? {
                    Some(view) => Reply::message(view.edit_source()),
                    None => Reply::alert(t_lang("category-not-found", lang)),
                }
            }
            Action::ShowProduct(product_id) => match self.product_view(product_id, lang).await? {
                Some(view) => Reply::message(view.edit_source()),
                None => Reply::alert(t_lang("product-not-found", lang)),
            },
            Action::Order(product_id) => match self.catalog.get_product(product_id).await? {
                Some(product) => {
                    info!(user_id, product_id, "Order contact requested");
                    let text = t_args_lang(
                        "order-message",
                        &[
                            ("contact", &html::escape(&self.shop.seller_contact)),
                            ("product", &html::escape(&product.name)),
                        ],
                        lang,
                    );
                    Reply::message(
                        OutgoingMessage::new(text).keyboard(create_to_categories_keyboard(lang)),
                    )
                    .with_notice(t_lang("order-contact-sent", lang), false)
                }
                None => Reply::alert(t_lang("product-not-found", lang)),
            },
            Action::BackToCategories => {
                Reply::message(self.categories_view(lang).await?.edit_source())
            }

            Action::AdminCategories => {
                Reply::message(self.admin_categories_view(lang).await?.edit_source())
            }
            Action::AdminProducts => {
                Reply::message(self.admin_products_view(lang).await?.edit_source())
            }
            Action::BackToAdmin => Reply::message(admin_panel(lang).edit_source()),
            Action::AddCategory => {
                self.start_flow(FlowState::AwaitingCategoryName, lang)
                    .await?
            }
            Action::EditCategory(category_id) => {
                if self.catalog.get_category(category_id).await?.is_none() {
                    return Ok(Reply::alert(t_lang("category-not-found", lang)));
                }
                self.start_flow(FlowState::AwaitingNewCategoryName { category_id }, lang)
                    .await?
            }
            Action::DeleteCategory(category_id) => {
                let category = match self.catalog.get_category(category_id).await? {
                    Some(category) => category,
                    None => return Ok(Reply::alert(t_lang("category-not-found", lang))),
                };
                self.catalog.delete_category(category_id).await?;
                info!(user_id, category_id, "Category deleted");

                Reply::message(self.admin_categories_view(lang).await?.edit_source()).with_notice(
                    t_args_lang("category-deleted", &[("name", &category.name)], lang),
                    false,
                )
            }
            Action::AddProductSelect => {
                let categories = self.catalog.list_categories().await?;
                if categories.is_empty() {
                    return Ok(Reply::alert(t_lang("admin-no-categories", lang)));
                }
                Reply::message(
                    OutgoingMessage::new(t_lang("admin-select-category", lang))
                        .keyboard(create_add_product_select_keyboard(&categories, lang))
                        .edit_source(),
                )
            }
            Action::AddProduct(category_id) => {
                if self.catalog.get_category(category_id).await?.is_none() {
                    return Ok(Reply::alert(t_lang("category-not-found", lang)));
                }
                self.start_flow(FlowState::AwaitingProductName { category_id }, lang)
                    .await?
            }
            Action::AdminCategoryProducts(category_id) => {
                match self.admin_category_view(category_id, lang).await? {
                    Some(view) => Reply::message(view.edit_source()),
                    None => Reply::alert(t_lang("category-not-found", lang)),
                }
            }
            Action::ViewProduct(product_id) => {
                match self.admin_product_view(product_id, lang).await? {
                    Some(view) => Reply::message(view.edit_source()),
                    None => Reply::alert(t_lang("product-not-found", lang)),
                }
            }
            Action::EditProduct(product_id) => {
                if self.catalog.get_product(product_id).await?.is_none() {
                    return Ok(Reply::alert(t_lang("product-not-found", lang)));
                }
                self.start_flow(FlowState::EditingProductName { product_id }, lang)
                    .await?
            }
            Action::EditProductField { field, product_id } => {
                let product = match self.catalog.get_product(product_id).await? {
                    Some(product) => product,
                    None => return Ok(Reply::alert(t_lang("product-not-found", lang))),
                };
                let category_id = product.category_id;
                let state = match field {
                    ProductField::Name => FlowState::AwaitingFieldName {
                        product_id,
                        category_id,
                    },
                    ProductField::Price => FlowState::AwaitingFieldPrice {
                        product_id,
                        category_id,
                    },
                    ProductField::Description => FlowState::AwaitingFieldDescription {
                        product_id,
                        category_id,
                    },
                    ProductField::Image => FlowState::AwaitingFieldImage {
                        product_id,
                        category_id,
                    },
                };
                self.start_flow(state, lang).await?
            }
            Action::DeleteProductImage(product_id) => {
                match self.catalog.remove_image(product_id).await? {
                    None => Reply::alert(t_lang("product-not-found", lang)),
                    Some(false) => Reply::notice(t_lang("image-none", lang)),
                    Some(true) => {
                        info!(user_id, product_id, "Product image deleted");
                        let mut reply = Reply::notice(t_lang("image-deleted", lang));
                        if let Some(view) = self.admin_product_view(product_id, lang).await? {
                            reply = reply.with(view.edit_source());
                        }
                        reply
                    }
                }
            }
            Action::DeleteProduct(product_id) => {
                let product = match self.catalog.get_product(product_id).await? {
                    Some(product) => product,
                    None => return Ok(Reply::alert(t_lang("product-not-found", lang))),
                };
                self.catalog.delete_product(product_id).await?;
                info!(user_id, product_id, "Product deleted");

                let mut reply = Reply::notice(t_args_lang(
                    "product-deleted",
                    &[("name", &product.name)],
                    lang,
                ));
                if let Some(view) = self.admin_category_view(product.category_id, lang).await? {
                    reply = reply.with(view.edit_source());
                }
                reply
            }
            Action::SkipImage => {
                if !state.accepts_skip() {
                    return Ok(Reply::notice(t_lang("unknown-action", lang)));
                }
                self.handle_input(user_id, lang, state.clone(), FlowInput::Skip)
                    .await?
            }
            Action::CancelFlow => self.cancel(user_id, state, lang),
        };

        Ok(reply)
    }

    /// Feeds a message into the chat's current flow
    pub async fn handle_input(
        &self,
        user_id: u64,
        language_code: Option<&str>,
        state: FlowState,
        input: FlowInput,
    ) -> Result<Reply> {
        let lang = language_code;

        if state.is_idle() {
            return Ok(Reply::text(t_lang("text-hint", lang)));
        }
        if !self.is_admin(user_id) {
            warn!(user_id, state = ?state, "Rejected flow input from non-admin user");
            return Ok(Reply::text(t_lang("access-denied", lang)));
        }

        let missing_key = if state.product_id().is_some() {
            "product-not-found"
        } else {
            "category-not-found"
        };
        let skippable = state.accepts_skip();

        let reply = match advance(&self.catalog, state, input).await? {
            FlowOutcome::NotInFlow => Reply::text(t_lang("text-hint", lang)),
            FlowOutcome::Reprompt(rejection) => {
                debug!(user_id, rejection = ?rejection, "Flow input rejected");
                Reply::message(
                    OutgoingMessage::new(t_lang(rejection.message_key(), lang))
                        .keyboard(create_prompt_keyboard(skippable, lang)),
                )
            }
            FlowOutcome::Advance(next) => {
                Reply::message(self.prompt_for(&next, lang).await?).set_state(next)
            }
            FlowOutcome::Done(commit) => self.committed(commit, lang).await?.clear_state(),
            FlowOutcome::Missing => {
                warn!(user_id, "Edited entity disappeared during flow");
                Reply::text(t_lang(missing_key, lang)).clear_state()
            }
        };

        Ok(reply)
    }

    fn cancel(&self, user_id: u64, state: &FlowState, lang: Option<&str>) -> Reply {
        if state.is_idle() {
            return Reply::text(t_lang("nothing-to-cancel", lang));
        }
        if !self.is_admin(user_id) {
            warn!(user_id, state = ?state, "Rejected cancel from non-admin user");
            return Reply::text(t_lang("access-denied", lang));
        }
        info!(user_id, state = ?state, "Flow cancelled");

        Reply::text(t_lang("flow-cancelled", lang))
            .with(admin_panel(lang))
            .clear_state()
    }

    async fn start_flow(&self, state: FlowState, lang: Option<&str>) -> Result<Reply> {
        Ok(Reply::message(self.prompt_for(&state, lang).await?).set_state(state))
    }

    /// Prompt asking for the input `state` waits for
    async fn prompt_for(&self, state: &FlowState, lang: Option<&str>) -> Result<OutgoingMessage> {
        let current = match state.product_id() {
            Some(product_id) => self.catalog.get_product(product_id).await?,
            None => None,
        };
        let with_current = |key: &str, fallback: &str, value: Option<String>| match value {
            Some(value) => t_args_lang(key, &[("current", &value)], lang),
            None => t_lang(fallback, lang),
        };
        let current_name = current.as_ref().map(|p| html::escape(&p.name));
        let current_description = current.as_ref().map(|p| html::escape(&p.description));
        let current_price = current.as_ref().map(|p| format_price(p.price));

        let text = match state {
            FlowState::Idle => t_lang("text-hint", lang),
            FlowState::AwaitingCategoryName => t_lang("prompt-category-name", lang),
            FlowState::AwaitingNewCategoryName { category_id } => {
                let current = self
                    .catalog
                    .get_category(*category_id)
                    .await?
                    .map(|c| html::escape(&c.name));
                with_current("prompt-new-category-name", "prompt-category-name", current)
            }
            FlowState::AwaitingProductName { .. } => t_lang("prompt-product-name", lang),
            FlowState::AwaitingProductDescription { .. } => {
                t_lang("prompt-product-description", lang)
            }
            FlowState::AwaitingProductPrice { .. } => t_lang("prompt-product-price", lang),
            FlowState::AwaitingProductImage { .. } => t_lang("prompt-product-image", lang),
            FlowState::EditingProductName { .. } | FlowState::AwaitingFieldName { .. } => {
                with_current("prompt-current-name", "prompt-product-name", current_name)
            }
            FlowState::EditingProductDescription { .. }
            | FlowState::AwaitingFieldDescription { .. } => with_current(
                "prompt-current-description",
                "prompt-product-description",
                current_description,
            ),
            FlowState::EditingProductPrice { .. } | FlowState::AwaitingFieldPrice { .. } => {
                with_current("prompt-current-price", "prompt-product-price", current_price)
            }
            FlowState::AwaitingFieldImage { .. } => t_lang("prompt-new-image", lang),
        };

        Ok(OutgoingMessage::new(text).keyboard(create_prompt_keyboard(state.accepts_skip(), lang)))
    }

    /// Reply to a completed flow: the result, then the screen it belongs to
    async fn committed(&self, commit: Commit, lang: Option<&str>) -> Result<Reply> {
        let mut reply = Reply::new();

        match commit {
            Commit::CategoryAdded { name, .. } => {
                reply = reply
                    .with(OutgoingMessage::new(t_args_lang(
                        "category-added",
                        &[("name", &html::escape(&name))],
                        lang,
                    )))
                    .with(self.admin_categories_view(lang).await?);
            }
            Commit::CategoryRenamed { name, .. } => {
                reply = reply
                    .with(OutgoingMessage::new(t_args_lang(
                        "category-renamed",
                        &[("name", &html::escape(&name))],
                        lang,
                    )))
                    .with(self.admin_categories_view(lang).await?);
            }
            Commit::ProductAdded {
                category_id,
                name,
                image,
                ..
            } => {
                match image {
                    ImageOutcome::Saved => {
                        reply = reply.with(OutgoingMessage::new(t_lang("image-saved", lang)))
                    }
                    ImageOutcome::Failed => {
                        reply = reply.with(OutgoingMessage::new(t_lang("image-save-failed", lang)))
                    }
                    ImageOutcome::None => {}
                }
                reply = reply.with(OutgoingMessage::new(t_args_lang(
                    "product-added",
                    &[("name", &html::escape(&name))],
                    lang,
                )));
                if let Some(view) = self.admin_category_view(category_id, lang).await? {
                    reply = reply.with(view);
                }
            }
            Commit::ProductUpdated { product_id, name } => {
                reply = reply.with(OutgoingMessage::new(t_args_lang(
                    "product-updated",
                    &[("name", &html::escape(&name))],
                    lang,
                )));
                if let Some(view) = self.admin_product_view(product_id, lang).await? {
                    reply = reply.with(view);
                }
            }
            Commit::FieldUpdated {
                product_id, change, ..
            } => {
                let text = match change {
                    FieldChange::Name(name) => t_args_lang(
                        "product-name-changed",
                        &[("name", &html::escape(&name))],
                        lang,
                    ),
                    FieldChange::Description => t_lang("product-description-changed", lang),
                    FieldChange::Price(price) => t_args_lang(
                        "product-price-changed",
                        &[("price", &format_price(price))],
                        lang,
                    ),
                    FieldChange::Image(ImageOutcome::Failed) => t_lang("image-save-failed", lang),
                    FieldChange::Image(_) => t_lang("product-image-changed", lang),
                };
                reply = reply.with(OutgoingMessage::new(text));
                if let Some(view) = self.admin_product_view(product_id, lang).await? {
                    reply = reply.with(view);
                }
            }
        }

        Ok(reply)
    }

    /// Welcome text and the category buttons
    async fn categories_view(&self, lang: Option<&str>) -> Result<OutgoingMessage> {
        let categories = self.catalog.list_categories().await?;
        let mut text = format_welcome(self.shop.group.as_deref(), lang);

        if categories.is_empty() {
            text.push_str("\n\n");
            text.push_str(&t_lang("no-categories", lang));
            return Ok(OutgoingMessage::new(text));
        }

        Ok(OutgoingMessage::new(text).keyboard(create_categories_keyboard(&categories, lang)))
    }

    async fn category_view(
        &self,
        category_id: i64,
        lang: Option<&str>,
    ) -> Result<Option<OutgoingMessage>> {
        let category = match self.catalog.get_category(category_id).await? {
            Some(category) => category,
            None => return Ok(None),
        };
        let products = self.catalog.list_products_by_category(category_id).await?;
        let name = html::escape(&category.name);

        if products.is_empty() {
            return Ok(Some(
                OutgoingMessage::new(t_args_lang("category-empty", &[("category", &name)], lang))
                    .keyboard(create_to_categories_keyboard(lang)),
            ));
        }

        Ok(Some(
            OutgoingMessage::new(t_args_lang(
                "category-products-title",
                &[("category", &name)],
                lang,
            ))
            .keyboard(create_products_keyboard(&products, lang)),
        ))
    }

    async fn product_view(
        &self,
        product_id: i64,
        lang: Option<&str>,
    ) -> Result<Option<OutgoingMessage>> {
        let product = match self.catalog.get_product(product_id).await? {
            Some(product) => product,
            None => return Ok(None),
        };

        let mut view = OutgoingMessage::new(format_product_details(&product, lang))
            .keyboard(create_product_keyboard(&product, lang));
        if let Some(path) = self.stored_image(&product).await {
            view = view.photo(path);
        }

        Ok(Some(view))
    }

    async fn stored_image(&self, product: &Product) -> Option<String> {
        let path = product.image_path.as_deref()?;
        if self.catalog.images().exists(path).await {
            Some(path.to_string())
        } else {
            debug!(product_id = product.id, path = %path, "Product image missing on disk");
            None
        }
    }

    async fn admin_categories_view(&self, lang: Option<&str>) -> Result<OutgoingMessage> {
        let categories = self.catalog.list_categories().await?;
        Ok(OutgoingMessage::new(t_lang("admin-categories-title", lang))
            .keyboard(create_admin_categories_keyboard(&categories, lang)))
    }

    async fn admin_products_view(&self, lang: Option<&str>) -> Result<OutgoingMessage> {
        let (categories, products) = self.catalog.snapshot().await?;

        let counted = categories
            .into_iter()
            .map(|category| {
                let count = products
                    .iter()
                    .filter(|p| p.category_id == category.id)
                    .count();
                (category, count)
            })
            .collect::<Vec<_>>();

        let title = if counted.is_empty() {
            t_lang("admin-no-categories", lang)
        } else {
            t_lang("admin-products-title", lang)
        };

        Ok(OutgoingMessage::new(title).keyboard(create_admin_products_keyboard(&counted, lang)))
    }

    async fn admin_category_view(
        &self,
        category_id: i64,
        lang: Option<&str>,
    ) -> Result<Option<OutgoingMessage>> {
        let category = match self.catalog.get_category(category_id).await? {
            Some(category) => category,
            None => return Ok(None),
        };
        let products = self.catalog.list_products_by_category(category_id).await?;

        Ok(Some(
            OutgoingMessage::new(t_args_lang(
                "admin-category-products-title",
                &[("category", &html::escape(&category.name))],
                lang,
            ))
            .keyboard(create_admin_category_products_keyboard(&category, &products, lang)),
        ))
    }

    async fn admin_product_view(
        &self,
        product_id: i64,
        lang: Option<&str>,
    ) -> Result<Option<OutgoingMessage>> {
        Ok(self.catalog.get_product(product_id).await?.map(|product| {
            OutgoingMessage::new(format_admin_product_details(&product, lang))
                .keyboard(create_product_admin_keyboard(&product, lang))
        }))
    }
}

fn admin_panel(lang: Option<&str>) -> OutgoingMessage {
    OutgoingMessage::new(t_lang("admin-welcome", lang)).keyboard(create_admin_keyboard(lang))
}
