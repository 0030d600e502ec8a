//! Message Handler module for processing incoming Telegram messages

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::FileId;
use teloxide::utils::html;
use tracing::{debug, error, warn};

use crate::catalog::Photo;
use crate::dialogue::{AdminDialogue, FlowState};
use crate::image_store::detect_extension;
use crate::localization::t_lang;

use super::actions::Command;
use super::dialogue_manager::FlowInput;
use super::reply::{apply_state, deliver, OutgoingMessage, Reply};
use super::storefront::Storefront;

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url)
        .await
        .context("Failed to request file from Telegram")?
        .error_for_status()
        .context("Telegram refused the file download")?;
    let bytes = response.bytes().await?;

    Ok(bytes.to_vec())
}

/// File id of the image attached to the message, if any
fn attached_image(msg: &Message) -> Option<FileId> {
    if let Some(photos) = msg.photo() {
        // Sizes are ordered from smallest to largest
        return photos.last().map(|photo| photo.file.id.clone());
    }

    let doc = msg.document()?;
    match &doc.mime_type {
        Some(mime_type) if mime_type.to_string().starts_with("image/") => Some(doc.file.id.clone()),
        _ => None,
    }
}

async fn photo_input(bot: &Bot, msg: &Message, file_id: FileId) -> Result<FlowInput> {
    let bytes = download_file(bot, file_id).await?;
    let extension = detect_extension(&bytes).to_string();
    debug!(chat_id = %msg.chat.id, size = bytes.len(), extension = %extension, "Photo downloaded");

    Ok(FlowInput::Photo(Photo { bytes, extension }))
}

async fn route_message(
    bot: &Bot,
    msg: &Message,
    storefront: &Storefront,
    state: FlowState,
    user_id: u64,
    language_code: Option<&str>,
) -> Result<Reply> {
    if let Some(text) = msg.text() {
        debug!(user_id, message_length = text.len(), "Received text message from user");

        if let Some(command) = Command::parse(text) {
            return storefront
                .handle_command(user_id, language_code, command, &state)
                .await;
        }

        return storefront
            .handle_input(user_id, language_code, state, FlowInput::Text(text.to_string()))
            .await;
    }

    if let Some(file_id) = attached_image(msg) {
        // Only download when the flow will actually keep the photo
        if state.accepts_photo() && storefront.is_admin(user_id) {
            let input = match photo_input(bot, msg, file_id).await {
                Ok(input) => input,
                Err(e) => {
                    error!(user_id, error = %e, "Failed to download photo");
                    return Ok(Reply::text(t_lang("error-generic", language_code)));
                }
            };
            return storefront
                .handle_input(user_id, language_code, state, input)
                .await;
        }
        debug!(user_id, "Received photo outside an image step");
    } else {
        debug!(user_id, "Received unsupported message type from user");
    }

    storefront
        .handle_input(user_id, language_code, state, FlowInput::Other)
        .await
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    storefront: Arc<Storefront>,
    dialogue: AdminDialogue,
) -> Result<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => {
            debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
            return Ok(());
        }
    };
    let user_id = user.id.0;
    let language_code = user.language_code.as_deref();

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id, dialogue_state = ?state, "Retrieved dialogue state");

    let reply = match route_message(&bot, &msg, &storefront, state, user_id, language_code).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(user_id, error = %e, "Failed to handle message");
            Reply::text(t_lang("error-generic", language_code))
        }
    };

    let Reply {
        mut messages,
        notice,
        state,
    } = reply;
    // Messages have no popup, so the notice becomes a regular message
    if let Some(notice) = notice {
        messages.push(OutgoingMessage::new(html::escape(&notice.text)));
    }

    if let Err(e) = apply_state(&dialogue, state).await {
        warn!(user_id, error = %e, "Failed to update dialogue state");
    }
    deliver(&bot, msg.chat.id, None, messages).await?;

    Ok(())
}
