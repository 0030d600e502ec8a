//! Callback identifiers and chat commands.
//!
//! Callback data keeps the `<verb>_<entity>_<id>` wire format, so buttons sent
//! by earlier deployments still resolve. Parameterized identifiers are split
//! on their last underscore; the prefixes below never end in a number, which
//! keeps the split unambiguous.

use std::fmt;

/// Product field targeted by a single-field edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Name,
    Price,
    Description,
    Image,
}

impl ProductField {
    fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::Description => "description",
            ProductField::Image => "image",
        }
    }
}

/// Everything an inline button can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Browsing
    ShowCategory(i64),
    ShowProduct(i64),
    Order(i64),
    BackToCategories,
    BackToCategory(i64),

    // Administration
    AdminCategories,
    AdminProducts,
    BackToAdmin,
    AddCategory,
    EditCategory(i64),
    DeleteCategory(i64),
    AddProductSelect,
    AddProduct(i64),
    AdminCategoryProducts(i64),
    ViewProduct(i64),
    EditProduct(i64),
    EditProductField { field: ProductField, product_id: i64 },
    DeleteProductImage(i64),
    DeleteProduct(i64),
    SkipImage,
    CancelFlow,
}

impl Action {
    /// Parses callback data, returning `None` for anything unrecognised
    pub fn parse(data: &str) -> Option<Action> {
        let fixed = match data {
            "back_to_categories" => Some(Action::BackToCategories),
            "admin_categories" => Some(Action::AdminCategories),
            "admin_products" => Some(Action::AdminProducts),
            "back_to_admin" => Some(Action::BackToAdmin),
            "add_category" => Some(Action::AddCategory),
            "admin_add_product_select" => Some(Action::AddProductSelect),
            "skip_image" => Some(Action::SkipImage),
            "cancel_flow" => Some(Action::CancelFlow),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        let (prefix, raw_id) = data.rsplit_once('_')?;
        let id: i64 = raw_id.parse().ok()?;

        let action = match prefix {
            "category" => Action::ShowCategory(id),
            "product" => Action::ShowProduct(id),
            "order" => Action::Order(id),
            "back_to_category" => Action::BackToCategory(id),
            "edit_category" => Action::EditCategory(id),
            "delete_category" => Action::DeleteCategory(id),
            "add_product" => Action::AddProduct(id),
            "admin_category_products" => Action::AdminCategoryProducts(id),
            "view_product" => Action::ViewProduct(id),
            "edit_product" => Action::EditProduct(id),
            "edit_product_name" => Action::EditProductField {
                field: ProductField::Name,
                product_id: id,
            },
            "edit_product_price" => Action::EditProductField {
                field: ProductField::Price,
                product_id: id,
            },
            "edit_product_description" => Action::EditProductField {
                field: ProductField::Description,
                product_id: id,
            },
            "edit_product_image" => Action::EditProductField {
                field: ProductField::Image,
                product_id: id,
            },
            "delete_product_image" => Action::DeleteProductImage(id),
            "delete_product" => Action::DeleteProduct(id),
            _ => return None,
        };

        Some(action)
    }

    /// Whether only the shop admin may trigger this action
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Action::ShowCategory(_)
                | Action::ShowProduct(_)
                | Action::Order(_)
                | Action::BackToCategories
                | Action::BackToCategory(_)
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ShowCategory(id) => write!(f, "category_{id}"),
            Action::ShowProduct(id) => write!(f, "product_{id}"),
            Action::Order(id) => write!(f, "order_{id}"),
            Action::BackToCategories => f.write_str("back_to_categories"),
            Action::BackToCategory(id) => write!(f, "back_to_category_{id}"),
            Action::AdminCategories => f.write_str("admin_categories"),
            Action::AdminProducts => f.write_str("admin_products"),
            Action::BackToAdmin => f.write_str("back_to_admin"),
            Action::AddCategory => f.write_str("add_category"),
            Action::EditCategory(id) => write!(f, "edit_category_{id}"),
            Action::DeleteCategory(id) => write!(f, "delete_category_{id}"),
            Action::AddProductSelect => f.write_str("admin_add_product_select"),
            Action::AddProduct(id) => write!(f, "add_product_{id}"),
            Action::AdminCategoryProducts(id) => write!(f, "admin_category_products_{id}"),
            Action::ViewProduct(id) => write!(f, "view_product_{id}"),
            Action::EditProduct(id) => write!(f, "edit_product_{id}"),
            Action::EditProductField { field, product_id } => {
                write!(f, "edit_product_{}_{product_id}", field.as_str())
            }
            Action::DeleteProductImage(id) => write!(f, "delete_product_image_{id}"),
            Action::DeleteProduct(id) => write!(f, "delete_product_{id}"),
            Action::SkipImage => f.write_str("skip_image"),
            Action::CancelFlow => f.write_str("cancel_flow"),
        }
    }
}

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Admin,
    Cancel,
    Skip,
}

impl Command {
    /// Parses `/start`, `/start@shop_bot payload` and friends
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.trim().split_whitespace().next()?;
        let word = word.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);

        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "admin" => Some(Command::Admin),
            "cancel" => Some(Command::Cancel),
            "skip" => Some(Command::Skip),
            _ => None,
        }
    }
}
