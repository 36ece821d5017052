//! Types for sending messages via the WhatsApp Cloud API.

use serde::{Deserialize, Serialize};

/// Maximum reply buttons per interactive message.
pub const MAX_BUTTONS: usize = 3;
/// Maximum characters in a reply-button title.
pub const MAX_BUTTON_TITLE: usize = 20;
/// Maximum rows across all sections of a list message.
pub const MAX_LIST_ROWS: usize = 10;
/// Maximum characters in a list-row title.
pub const MAX_ROW_TITLE: usize = 24;
/// Maximum characters in a list-row description.
pub const MAX_ROW_DESCRIPTION: usize = 72;
/// Maximum characters in a header or list button label.
pub const MAX_HEADER: usize = 60;

/// A message to send, serialized in the shape the `/messages` endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    messaging_product: &'static str,
    recipient_type: &'static str,
    /// Recipient phone number.
    pub to: String,
    #[serde(flatten)]
    pub content: MessageContent,
}

/// Message body, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { text: TextBody },
    Interactive { interactive: Interactive },
    Image { image: MediaLink },
    Video { video: MediaLink },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    pub preview_url: bool,
    pub body: String,
}

/// Media referenced by public URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaLink {
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Interactive message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Interactive {
    Button {
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<Header>,
        body: Body,
        action: ButtonAction,
    },
    List {
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<Header>,
        body: Body,
        action: ListAction,
    },
}

/// Text header of an interactive message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub header_type: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonAction {
    pub buttons: Vec<ReplyButtonWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyButtonWire {
    #[serde(rename = "type")]
    pub button_type: &'static str,
    pub reply: ReplyButton,
}

/// A reply button: the `id` comes back in the webhook when tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListAction {
    /// Label of the button that opens the list.
    pub button: String,
    pub sections: Vec<ListSection>,
}

/// A titled group of list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

impl ListSection {
    pub fn new(title: impl Into<String>, rows: Vec<ListRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// A selectable list row: the `id` comes back in the webhook when picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ListRow {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl OutgoingMessage {
    fn addressed(recipient: impl Into<String>, content: MessageContent) -> Self {
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: recipient.into(),
            content,
        }
    }

    /// A plain text message.
    pub fn text(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self::addressed(
            recipient,
            MessageContent::Text {
                text: TextBody {
                    preview_url: false,
                    body: body.into(),
                },
            },
        )
    }

    /// A message with up to three reply buttons. Extra buttons are dropped
    /// and titles are cut to the API limits.
    pub fn buttons(
        recipient: impl Into<String>,
        header: Option<&str>,
        body: impl Into<String>,
        buttons: Vec<ReplyButton>,
    ) -> Self {
        if buttons.len() > MAX_BUTTONS {
            tracing::warn!(
                count = buttons.len(),
                "Too many reply buttons, keeping first {}",
                MAX_BUTTONS
            );
        }

        let buttons = buttons
            .into_iter()
            .take(MAX_BUTTONS)
            .map(|b| ReplyButtonWire {
                button_type: "reply",
                reply: ReplyButton {
                    id: b.id,
                    title: truncate_chars(&b.title, MAX_BUTTON_TITLE),
                },
            })
            .collect();

        Self::addressed(
            recipient,
            MessageContent::Interactive {
                interactive: Interactive::Button {
                    header: header.map(text_header),
                    body: Body { text: body.into() },
                    action: ButtonAction { buttons },
                },
            },
        )
    }

    /// A list message. Rows beyond the API limit are dropped and titles and
    /// descriptions are cut to the API limits.
    pub fn list(
        recipient: impl Into<String>,
        header: Option<&str>,
        body: impl Into<String>,
        button: &str,
        sections: Vec<ListSection>,
    ) -> Self {
        let mut remaining = MAX_LIST_ROWS;
        let total: usize = sections.iter().map(|s| s.rows.len()).sum();
        if total > MAX_LIST_ROWS {
            tracing::warn!(rows = total, "Too many list rows, keeping first {}", MAX_LIST_ROWS);
        }

        let sections = sections
            .into_iter()
            .filter_map(|section| {
                let rows: Vec<ListRow> = section
                    .rows
                    .into_iter()
                    .take(remaining)
                    .map(|row| ListRow {
                        id: row.id,
                        title: truncate_chars(&row.title, MAX_ROW_TITLE),
                        description: row
                            .description
                            .map(|d| truncate_chars(&d, MAX_ROW_DESCRIPTION)),
                    })
                    .collect();
                remaining -= rows.len();
                (!rows.is_empty()).then(|| ListSection {
                    title: truncate_chars(&section.title, MAX_ROW_TITLE),
                    rows,
                })
            })
            .collect();

        Self::addressed(
            recipient,
            MessageContent::Interactive {
                interactive: Interactive::List {
                    header: header.map(text_header),
                    body: Body { text: body.into() },
                    action: ListAction {
                        button: truncate_chars(button, MAX_BUTTON_TITLE),
                        sections,
                    },
                },
            },
        )
    }

    /// An image by public URL.
    pub fn image(recipient: impl Into<String>, link: impl Into<String>, caption: Option<&str>) -> Self {
        Self::addressed(
            recipient,
            MessageContent::Image {
                image: MediaLink {
                    link: link.into(),
                    caption: caption.map(str::to_string),
                },
            },
        )
    }

    /// A video by public URL.
    pub fn video(recipient: impl Into<String>, link: impl Into<String>, caption: Option<&str>) -> Self {
        Self::addressed(
            recipient,
            MessageContent::Video {
                video: MediaLink {
                    link: link.into(),
                    caption: caption.map(str::to_string),
                },
            },
        )
    }

    /// The `type` value this message is sent with.
    pub fn kind(&self) -> &'static str {
        match &self.content {
            MessageContent::Text { .. } => "text",
            MessageContent::Interactive { .. } => "interactive",
            MessageContent::Image { .. } => "image",
            MessageContent::Video { .. } => "video",
        }
    }

    /// Main text of the message: text body, interactive body, or media caption.
    pub fn body_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(&text.body),
            MessageContent::Interactive { interactive } => match interactive {
                Interactive::Button { body, .. } | Interactive::List { body, .. } => {
                    Some(&body.text)
                }
            },
            MessageContent::Image { image: media } | MessageContent::Video { video: media } => {
                media.caption.as_deref()
            }
        }
    }

    /// Ids the user can reply with: button ids or list row ids.
    pub fn reply_ids(&self) -> Vec<&str> {
        match &self.content {
            MessageContent::Interactive {
                interactive: Interactive::Button { action, .. },
            } => action.buttons.iter().map(|b| b.reply.id.as_str()).collect(),
            MessageContent::Interactive {
                interactive: Interactive::List { action, .. },
            } => action
                .sections
                .iter()
                .flat_map(|s| s.rows.iter().map(|r| r.id.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn text_header(text: &str) -> Header {
    Header {
        header_type: "text",
        text: truncate_chars(text, MAX_HEADER),
    }
}

/// Cut a string to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Response from a successful send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

impl SendResponse {
    /// Id of the first accepted message.
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

/// Graph API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}
