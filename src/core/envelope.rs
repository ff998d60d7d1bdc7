//! Outbound event envelopes
//!
//! An event travels either as a named-field record (one struct per kind) or
//! as a [`GenericEnvelope`] carrying three ordered value lists and a
//! category code. The generic form has no field names, so each category has
//! a fixed layout that every producer must follow:
//!
//! | Category     | `stringValues`               | `intValues`    |
//! |--------------|------------------------------|----------------|
//! | Chat         | `[user, content, userColor]` | `[durationMs]` |
//! | Notification | `[title, content]`           | `[durationMs]` |
//! | EmoteWall    | `[url]`                      | `[count]`      |
//!
//! `boolValues` is unused by these layouts.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ENVELOPE_DURATION_MS;
use crate::core::category::Category;
use crate::error::{RelayError, Result};

fn default_duration() -> i32 {
    DEFAULT_ENVELOPE_DURATION_MS
}

/// A chat line for the chat overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name, usually pre-rendered as an HTML span
    pub user: String,
    #[serde(rename = "userColor")]
    pub user_color: String,
    pub content: String,
    /// Display time in milliseconds
    #[serde(default = "default_duration")]
    pub duration: i32,
}

impl ChatMessage {
    pub fn new(user: String, user_color: String, content: String) -> Self {
        Self {
            user,
            user_color,
            content,
            duration: DEFAULT_ENVELOPE_DURATION_MS,
        }
    }

    pub fn with_duration(mut self, duration: i32) -> Self {
        self.duration = duration;
        self
    }
}

/// An alert popup for the notification overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub content: String,
    #[serde(default = "default_duration")]
    pub duration: i32,
}

impl Notification {
    pub fn new(title: String, content: String) -> Self {
        Self {
            title,
            content,
            duration: DEFAULT_ENVELOPE_DURATION_MS,
        }
    }

    pub fn with_duration(mut self, duration: i32) -> Self {
        self.duration = duration;
        self
    }
}

/// An emote burst for the emote wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emote {
    pub url: String,
    #[serde(default)]
    pub count: i32,
}

impl Emote {
    pub fn new(url: String, count: i32) -> Self {
        Self { url, count }
    }
}

/// Category-tagged record of ordered values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEnvelope {
    #[serde(rename = "type")]
    category: Category,
    #[serde(rename = "stringValues", default)]
    string_values: Vec<String>,
    #[serde(rename = "intValues", default)]
    int_values: Vec<i32>,
    #[serde(rename = "boolValues", default)]
    bool_values: Vec<bool>,
}

impl GenericEnvelope {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            string_values: Vec::new(),
            int_values: Vec::new(),
            bool_values: Vec::new(),
        }
    }

    pub fn add_string(&mut self, value: impl Into<String>) -> &mut Self {
        self.string_values.push(value.into());
        self
    }

    pub fn add_int(&mut self, value: i32) -> &mut Self {
        self.int_values.push(value);
        self
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.bool_values.push(value);
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn string_values(&self) -> &[String] {
        &self.string_values
    }

    pub fn int_values(&self) -> &[i32] {
        &self.int_values
    }

    pub fn bool_values(&self) -> &[bool] {
        &self.bool_values
    }

    /// Read the values back into the named record for this category
    pub fn to_named(&self) -> Result<Envelope> {
        let strings = &self.string_values;
        let ints = &self.int_values;
        let envelope = match (self.category, strings.as_slice(), ints.as_slice()) {
            (Category::Chat, [user, content, color], [duration]) => {
                Envelope::Chat(ChatMessage {
                    user: user.clone(),
                    user_color: color.clone(),
                    content: content.clone(),
                    duration: *duration,
                })
            }
            (Category::Notification, [title, content], [duration]) => {
                Envelope::Notification(Notification {
                    title: title.clone(),
                    content: content.clone(),
                    duration: *duration,
                })
            }
            (Category::EmoteWall, [url], [count]) => Envelope::EmoteWall(Emote {
                url: url.clone(),
                count: *count,
            }),
            (category, _, _) => {
                return Err(RelayError::MessageParseError(format!(
                    "{} envelope has {} strings and {} ints, which does not match its layout",
                    category,
                    strings.len(),
                    ints.len()
                )))
            }
        };
        Ok(envelope)
    }
}

/// One outbound event, tagged by the shape it carries
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Chat(ChatMessage),
    Notification(Notification),
    EmoteWall(Emote),
    Generic(GenericEnvelope),
}

impl Envelope {
    pub fn category(&self) -> Category {
        match self {
            Envelope::Chat(_) => Category::Chat,
            Envelope::Notification(_) => Category::Notification,
            Envelope::EmoteWall(_) => Category::EmoteWall,
            Envelope::Generic(generic) => generic.category(),
        }
    }

    /// Lay the named fields out in the documented generic order
    pub fn to_generic(&self) -> GenericEnvelope {
        match self {
            Envelope::Chat(chat) => {
                let mut generic = GenericEnvelope::new(Category::Chat);
                generic
                    .add_string(chat.user.as_str())
                    .add_string(chat.content.as_str())
                    .add_string(chat.user_color.as_str())
                    .add_int(chat.duration);
                generic
            }
            Envelope::Notification(notification) => {
                let mut generic = GenericEnvelope::new(Category::Notification);
                generic
                    .add_string(notification.title.as_str())
                    .add_string(notification.content.as_str())
                    .add_int(notification.duration);
                generic
            }
            Envelope::EmoteWall(emote) => {
                let mut generic = GenericEnvelope::new(Category::EmoteWall);
                generic.add_string(emote.url.as_str()).add_int(emote.count);
                generic
            }
            Envelope::Generic(generic) => generic.clone(),
        }
    }
}

impl From<ChatMessage> for Envelope {
    fn from(chat: ChatMessage) -> Self {
        Envelope::Chat(chat)
    }
}

impl From<Notification> for Envelope {
    fn from(notification: Notification) -> Self {
        Envelope::Notification(notification)
    }
}

impl From<Emote> for Envelope {
    fn from(emote: Emote) -> Self {
        Envelope::EmoteWall(emote)
    }
}

impl From<GenericEnvelope> for Envelope {
    fn from(generic: GenericEnvelope) -> Self {
        Envelope::Generic(generic)
    }
}
