use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront::bot::{callback_handler, message_handler, Storefront};
use storefront::catalog::{Catalog, CatalogStore, JsonCatalogStore, PgCatalogStore};
use storefront::config::{BotConfig, LogFormat, StorageConfig};
use storefront::dialogue::FlowState;
use storefront::image_store::ImageStore;
use storefront::localization::init_localization;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn CatalogStore>> {
    let store: Arc<dyn CatalogStore> = match storage {
        StorageConfig::Json {
            categories_file,
            products_file,
        } => {
            info!(
                categories_file = %categories_file.display(),
                products_file = %products_file.display(),
                "Using JSON catalog store"
            );
            Arc::new(
                JsonCatalogStore::open(categories_file, products_file)
                    .await
                    .context("Failed to open JSON catalog")?,
            )
        }
        StorageConfig::Postgres { database_url } => {
            info!("Using PostgreSQL catalog store");
            Arc::new(
                PgCatalogStore::connect(database_url)
                    .await
                    .context("Failed to connect to PostgreSQL")?,
            )
        }
    };

    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Storefront Telegram Bot");

    init_localization()?;

    let store = open_store(&config.storage).await?;
    let images = ImageStore::new(&config.images_dir);
    info!(images_dir = %images.root().display(), admin_id = config.shop.admin_id, "Catalog ready");

    let storefront = Arc::new(Storefront::new(Catalog::new(store, images), config.shop));

    let bot = Bot::new(config.bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<FlowState>, FlowState>()
                .endpoint(message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<FlowState>, FlowState>()
                .endpoint(callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<FlowState>::new(), storefront])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
