//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::dialogue::AdminDialogue;
use crate::localization::t_lang;

use super::actions::Action;
use super::reply::{apply_state, deliver, Reply};
use super::storefront::Storefront;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    storefront: Arc<Storefront>,
    dialogue: AdminDialogue,
) -> Result<()> {
    let user_id = q.from.id.0;
    let language_code = q.from.language_code.as_deref();
    let data = q.data.as_deref().unwrap_or("");
    debug!(user_id, data = %data, "Received callback query from user");

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id, dialogue_state = ?state, "Retrieved dialogue state");

    let reply = match Action::parse(data) {
        Some(action) => {
            match storefront
                .handle_action(user_id, language_code, action, &state)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    error!(user_id, action = %action, error = %e, "Failed to handle callback");
                    Reply::alert(t_lang("error-generic", language_code))
                }
            }
        }
        None => {
            warn!(user_id, data = %data, "Unknown callback data");
            Reply::notice(t_lang("unknown-action", language_code))
        }
    };

    let Reply {
        messages,
        notice,
        state,
    } = reply;

    if let Err(e) = apply_state(&dialogue, state).await {
        warn!(user_id, error = %e, "Failed to update dialogue state");
    }

    let (chat_id, source) = match &q.message {
        Some(message) => (message.chat().id, Some(message.id())),
        None => (ChatId(q.from.id.0 as i64), None),
    };
    if let Err(e) = deliver(&bot, chat_id, source, messages).await {
        error!(user_id, error = %e, "Failed to deliver callback reply");
    }

    // Answer the callback query to remove the loading state
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = notice {
        answer = answer.text(notice.text).show_alert(notice.alert);
    }
    answer.await?;

    Ok(())
}
