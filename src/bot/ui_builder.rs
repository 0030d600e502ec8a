//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

use super::actions::{Action, ProductField};
use crate::catalog::{Category, Product};
use crate::localization::{t_args_lang, t_lang};

/// Format a price for display: whole amounts lose their fraction, others keep two decimals at most
pub fn format_price(price: f64) -> String {
    // No fractional digits survive at this magnitude, and scaling by 100 can overflow
    if price.abs() >= 1e15 {
        return format!("{price:.0}");
    }

    let rounded = (price * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        rounded.to_string()
    }
}

fn button(text: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

fn back_button(key: &str, action: Action, language_code: Option<&str>) -> Vec<InlineKeyboardButton> {
    vec![button(t_lang(key, language_code), action)]
}

/// Welcome text, with the community link when one is configured
pub fn format_welcome(group: Option<&str>, language_code: Option<&str>) -> String {
    let mut text = t_lang("welcome-message", language_code);
    if let Some(link) = group {
        text.push_str("\n\n");
        text.push_str(&t_args_lang(
            "welcome-community",
            &[("link", &html::escape(link))],
            language_code,
        ));
    }
    text
}

/// Customer-facing product card
pub fn format_product_details(product: &Product, language_code: Option<&str>) -> String {
    t_args_lang(
        "product-details",
        &[
            ("name", &html::escape(&product.name)),
            ("description", &html::escape(&product.description)),
            ("price", &format_price(product.price)),
        ],
        language_code,
    )
}

/// Admin product card listing the editable fields
pub fn format_admin_product_details(product: &Product, language_code: Option<&str>) -> String {
    let image = if product.image_path.is_some() {
        t_lang("image-present", language_code)
    } else {
        t_lang("image-absent", language_code)
    };

    t_args_lang(
        "admin-product-details",
        &[
            ("name", &html::escape(&product.name)),
            ("description", &html::escape(&product.description)),
            ("price", &format_price(product.price)),
            ("image", &image),
        ],
        language_code,
    )
}

/// One button per category, for customers
pub fn create_categories_keyboard(
    categories: &[Category],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let buttons = categories
        .iter()
        .map(|category| {
            vec![button(
                t_args_lang("category-button", &[("name", &category.name)], language_code),
                Action::ShowCategory(category.id),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// Products of one category, plus the way back to the category list
pub fn create_products_keyboard(
    products: &[Product],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = products
        .iter()
        .map(|product| {
            vec![button(
                t_args_lang(
                    "product-button",
                    &[("name", &product.name), ("price", &format_price(product.price))],
                    language_code,
                ),
                Action::ShowProduct(product.id),
            )]
        })
        .collect::<Vec<_>>();

    buttons.push(back_button(
        "button-to-categories",
        Action::BackToCategories,
        language_code,
    ));

    InlineKeyboardMarkup::new(buttons)
}

/// Order button and the two ways back from a product card
pub fn create_product_keyboard(product: &Product, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(t_lang("button-order", language_code), Action::Order(product.id))],
        back_button(
            "button-back-to-products",
            Action::BackToCategory(product.category_id),
            language_code,
        ),
        back_button("button-to-categories", Action::BackToCategories, language_code),
    ])
}

/// Single "to categories" button
pub fn create_to_categories_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_button(
        "button-to-categories",
        Action::BackToCategories,
        language_code,
    )])
}

/// Admin panel entry points
pub fn create_admin_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(
            t_lang("button-admin-categories", language_code),
            Action::AdminCategories,
        )],
        vec![button(
            t_lang("button-admin-products", language_code),
            Action::AdminProducts,
        )],
    ])
}

/// Rename and delete buttons for every category
pub fn create_admin_categories_keyboard(
    categories: &[Category],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = categories
        .iter()
        .map(|category| {
            vec![
                button(
                    t_args_lang("button-edit-category", &[("name", &category.name)], language_code),
                    Action::EditCategory(category.id),
                ),
                button(
                    t_lang("button-delete", language_code),
                    Action::DeleteCategory(category.id),
                ),
            ]
        })
        .collect::<Vec<_>>();

    buttons.push(vec![button(
        t_lang("button-add-category", language_code),
        Action::AddCategory,
    )]);
    buttons.push(back_button("button-back-to-admin", Action::BackToAdmin, language_code));

    InlineKeyboardMarkup::new(buttons)
}

/// Categories with their product counts, entry to per-category product management
pub fn create_admin_products_keyboard(
    categories: &[(Category, usize)],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = categories
        .iter()
        .map(|(category, count)| {
            vec![button(
                t_args_lang(
                    "admin-category-button",
                    &[("name", &category.name), ("count", &count.to_string())],
                    language_code,
                ),
                Action::AdminCategoryProducts(category.id),
            )]
        })
        .collect::<Vec<_>>();

    buttons.push(vec![button(
        t_lang("button-add-product", language_code),
        Action::AddProductSelect,
    )]);
    buttons.push(back_button("button-back-to-admin", Action::BackToAdmin, language_code));

    InlineKeyboardMarkup::new(buttons)
}

/// Category picker for a new product
pub fn create_add_product_select_keyboard(
    categories: &[Category],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = categories
        .iter()
        .map(|category| {
            vec![button(
                t_args_lang("category-button", &[("name", &category.name)], language_code),
                Action::AddProduct(category.id),
            )]
        })
        .collect::<Vec<_>>();

    buttons.push(back_button(
        "button-back-to-admin-products",
        Action::AdminProducts,
        language_code,
    ));

    InlineKeyboardMarkup::new(buttons)
}

/// View, edit and delete buttons for the products of one category
pub fn create_admin_category_products_keyboard(
    category: &Category,
    products: &[Product],
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = products
        .iter()
        .map(|product| {
            vec![
                button(
                    t_args_lang(
                        "admin-product-button",
                        &[("name", &product.name), ("price", &format_price(product.price))],
                        language_code,
                    ),
                    Action::ViewProduct(product.id),
                ),
                button(t_lang("button-edit", language_code), Action::EditProduct(product.id)),
                button(
                    t_lang("button-delete", language_code),
                    Action::DeleteProduct(product.id),
                ),
            ]
        })
        .collect::<Vec<_>>();

    buttons.push(vec![button(
        t_args_lang("button-add-product-to", &[("category", &category.name)], language_code),
        Action::AddProduct(category.id),
    )]);
    buttons.push(back_button(
        "button-back-to-admin-products",
        Action::AdminProducts,
        language_code,
    ));

    InlineKeyboardMarkup::new(buttons)
}

/// Per-field edit actions for one product
pub fn create_product_admin_keyboard(
    product: &Product,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let edit = |key: &str, field: ProductField| {
        button(
            t_lang(key, language_code),
            Action::EditProductField {
                field,
                product_id: product.id,
            },
        )
    };

    let mut buttons = vec![
        vec![
            edit("button-edit-name", ProductField::Name),
            edit("button-edit-price", ProductField::Price),
        ],
        vec![
            edit("button-edit-description", ProductField::Description),
            edit("button-edit-image", ProductField::Image),
        ],
    ];

    if product.image_path.is_some() {
        buttons.push(vec![button(
            t_lang("button-delete-image", language_code),
            Action::DeleteProductImage(product.id),
        )]);
    }

    buttons.push(vec![button(
        t_lang("button-delete-product", language_code),
        Action::DeleteProduct(product.id),
    )]);
    buttons.push(back_button(
        "button-back-to-admin-category",
        Action::AdminCategoryProducts(product.category_id),
        language_code,
    ));

    InlineKeyboardMarkup::new(buttons)
}

/// Cancel button under a prompt, with Skip for optional steps
pub fn create_prompt_keyboard(skippable: bool, language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if skippable {
        row.push(button(t_lang("button-skip-image", language_code), Action::SkipImage));
    }
    row.push(button(t_lang("button-cancel", language_code), Action::CancelFlow));

    InlineKeyboardMarkup::new(vec![row])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn data(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn product(image_path: Option<&str>) -> Product {
        Product {
            id: 4,
            name: "Mango 30ml".to_string(),
            description: "Fruity".to_string(),
            price: 250.0,
            category_id: 2,
            image_path: image_path.map(str::to_string),
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(250.0), "250");
        assert_eq!(format_price(19.99), "19.99");
        assert_eq!(format_price(0.5), "0.5");
        assert_eq!(format_price(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_format_huge_price() {
        assert_eq!(format_price(1e15), "1000000000000000");

        let huge = format_price(1e307);
        assert!(!huge.contains("inf"));
        assert!(huge.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_product_keyboard_navigation() {
        let keyboard = create_product_keyboard(&product(None), Some("en"));
        assert_eq!(
            data(&keyboard),
            vec!["order_4", "back_to_category_2", "back_to_categories"]
        );
    }

    #[test]
    fn test_product_admin_keyboard_image_button() {
        let without = data(&create_product_admin_keyboard(&product(None), None));
        assert!(!without.contains(&"delete_product_image_4".to_string()));
        assert!(without.contains(&"edit_product_image_4".to_string()));
        assert_eq!(without.last().map(String::as_str), Some("admin_category_products_2"));

        let with = data(&create_product_admin_keyboard(&product(Some("images/a.jpg")), None));
        assert!(with.contains(&"delete_product_image_4".to_string()));
    }

    #[test]
    fn test_prompt_keyboard() {
        assert_eq!(data(&create_prompt_keyboard(false, None)), vec!["cancel_flow"]);
        assert_eq!(
            data(&create_prompt_keyboard(true, None)),
            vec!["skip_image", "cancel_flow"]
        );
    }

    #[test]
    fn test_product_details_are_escaped() {
        let mut product = product(None);
        product.name = "<b>Bold</b> & co".to_string();

        let text = format_product_details(&product, Some("en"));
        assert!(text.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; co"));
        assert!(text.contains("250"));
    }
}
