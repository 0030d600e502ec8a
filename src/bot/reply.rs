//! Transport-free replies and their delivery through Telegram

use anyhow::Result;
use std::path::PathBuf;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use tracing::{debug, warn};

use crate::dialogue::{AdminDialogue, FlowState};

/// How a message reaches the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Post a new message
    Send,
    /// Replace the message whose button was pressed, sending anew if that fails
    EditSource,
}

/// One message to show, HTML formatted
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// Image sent with `text` as its caption
    pub photo: Option<PathBuf>,
    pub delivery: Delivery,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            photo: None,
            delivery: Delivery::Send,
        }
    }

    pub fn keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn photo(mut self, path: impl Into<PathBuf>) -> Self {
        self.photo = Some(path.into());
        self
    }

    pub fn edit_source(mut self) -> Self {
        self.delivery = Delivery::EditSource;
        self
    }

    /// Callback data of every button, row by row
    pub fn callback_data(&self) -> Vec<String> {
        self.keyboard
            .iter()
            .flat_map(|keyboard| keyboard.inline_keyboard.iter().flatten())
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Label of every button, row by row
    pub fn button_labels(&self) -> Vec<String> {
        self.keyboard
            .iter()
            .flat_map(|keyboard| keyboard.inline_keyboard.iter().flatten())
            .map(|button| button.text.clone())
            .collect()
    }
}

/// Short popup answer to a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub alert: bool,
}

/// What to do with the chat's flow state after a reply
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StateChange {
    #[default]
    Keep,
    Set(FlowState),
    Clear,
}

/// Everything produced in answer to one update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub messages: Vec<OutgoingMessage>,
    pub notice: Option<Notice>,
    pub state: StateChange,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(message: OutgoingMessage) -> Self {
        Self::new().with(message)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::message(OutgoingMessage::new(text))
    }

    /// A popup notice with no messages
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new().with_notice(text, false)
    }

    /// A blocking alert with no messages
    pub fn alert(text: impl Into<String>) -> Self {
        Self::new().with_notice(text, true)
    }

    pub fn with(mut self, message: OutgoingMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_notice(mut self, text: impl Into<String>, alert: bool) -> Self {
        self.notice = Some(Notice {
            text: text.into(),
            alert,
        });
        self
    }

    pub fn set_state(mut self, state: FlowState) -> Self {
        self.state = StateChange::Set(state);
        self
    }

    pub fn clear_state(mut self) -> Self {
        self.state = StateChange::Clear;
        self
    }

    /// Texts of all messages, in order
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }

    /// Callback data of every button across all messages
    pub fn callback_data(&self) -> Vec<String> {
        self.messages.iter().flat_map(|m| m.callback_data()).collect()
    }

    /// Text shown to the user, messages first and the notice last
    pub fn full_text(&self) -> String {
        let mut parts: Vec<&str> = self.texts();
        if let Some(notice) = &self.notice {
            parts.push(&notice.text);
        }
        parts.join("\n")
    }
}

/// Applies the state change of a reply to the chat's dialogue
pub async fn apply_state(dialogue: &AdminDialogue, change: StateChange) -> Result<()> {
    match change {
        StateChange::Keep => {}
        StateChange::Set(state) => {
            debug!(chat_id = %dialogue.chat_id(), state = ?state, "Updating flow state");
            dialogue.update(state).await?;
        }
        StateChange::Clear => {
            debug!(chat_id = %dialogue.chat_id(), "Clearing flow state");
            dialogue.exit().await?;
        }
    }
    Ok(())
}

/// Sends the messages of a reply to `chat_id`.
///
/// `source` is the message carrying the pressed button, if any.
pub async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    source: Option<MessageId>,
    messages: Vec<OutgoingMessage>,
) -> Result<()> {
    for message in messages {
        let source = match message.delivery {
            Delivery::EditSource => source,
            Delivery::Send => None,
        };

        match (&message.photo, source) {
            (Some(photo), source) => {
                // Text messages cannot become photos, so the old one is replaced
                if let Some(source_id) = source {
                    if let Err(e) = bot.delete_message(chat_id, source_id).await {
                        debug!(chat_id = %chat_id, error = %e, "Could not delete source message");
                    }
                }
                send_photo(bot, chat_id, photo.clone(), &message).await?;
            }
            (None, Some(source_id)) => {
                let mut request = bot
                    .edit_message_text(chat_id, source_id, message.text.clone())
                    .parse_mode(ParseMode::Html);
                if let Some(keyboard) = message.keyboard.clone() {
                    request = request.reply_markup(keyboard);
                }

                if let Err(e) = request.await {
                    // Photo messages have no text to edit
                    debug!(chat_id = %chat_id, error = %e, "Edit failed, sending a new message");
                    if let Err(e) = bot.delete_message(chat_id, source_id).await {
                        debug!(chat_id = %chat_id, error = %e, "Could not delete source message");
                    }
                    send_text(bot, chat_id, &message).await?;
                }
            }
            (None, None) => send_text(bot, chat_id, &message).await?,
        }
    }

    Ok(())
}

async fn send_text(bot: &Bot, chat_id: ChatId, message: &OutgoingMessage) -> Result<()> {
    let mut request = bot
        .send_message(chat_id, message.text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(keyboard) = message.keyboard.clone() {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

async fn send_photo(
    bot: &Bot,
    chat_id: ChatId,
    photo: PathBuf,
    message: &OutgoingMessage,
) -> Result<()> {
    let mut request = bot
        .send_photo(chat_id, InputFile::file(&photo))
        .caption(message.text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(keyboard) = message.keyboard.clone() {
        request = request.reply_markup(keyboard);
    }

    if let Err(e) = request.await {
        warn!(chat_id = %chat_id, path = %photo.display(), error = %e, "Failed to send photo, sending text only");
        send_text(bot, chat_id, message).await?;
    }

    Ok(())
}
