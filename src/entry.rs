// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Log entries and their deferred messages.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use serde_json::Value;

/// A function that decorates the text of one fragment.
pub type Style = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The target a message is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human readable text; styles apply when color is enabled.
    #[default]
    Text,
    /// Plain text destined for a JSON document; styles never apply.
    Json,
}

/// Something that can be rendered into the message column of a log line.
pub trait Render {
    /// Render with or without styles. Must not have side effects.
    fn format(&self, color: bool, output: OutputFormat) -> String;
}

impl Render for str {
    fn format(&self, _: bool, _: OutputFormat) -> String {
        self.to_owned()
    }
}

impl Render for String {
    fn format(&self, _: bool, _: OutputFormat) -> String {
        self.clone()
    }
}

/// One piece of a message with an optional style.
#[derive(Clone)]
pub struct Fragment {
    text: String,
    style: Option<Style>,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("text", &self.text)
            .field("styled", &self.style.is_some())
            .finish()
    }
}

impl Fragment {
    /// Create an unstyled fragment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    /// Create a fragment with an optional style.
    pub fn styled(text: impl Into<String>, style: Option<Style>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// The raw text of this fragment.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Render for Fragment {
    fn format(&self, color: bool, output: OutputFormat) -> String {
        match (&self.style, color, output) {
            (Some(style), true, OutputFormat::Text) => style(&self.text),
            _ => self.text.clone(),
        }
    }
}

impl Render for [Fragment] {
    fn format(&self, color: bool, output: OutputFormat) -> String {
        self.iter()
            .map(|part| part.format(color, output))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The message of an entry: plain text, or the fragments of a message builder.
#[derive(Debug, Clone)]
pub enum Message {
    /// A plain string.
    Text(String),
    /// Styled fragments, rendered by the transport.
    Fragments(Vec<Fragment>),
}

impl Message {
    /// Whether there is nothing to render.
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.is_empty(),
            Message::Fragments(parts) => parts.iter().all(|p| p.text.is_empty()),
        }
    }

    pub(crate) fn prepend(&mut self, prefix: &[String]) {
        if prefix.is_empty() {
            return;
        }
        match self {
            Message::Text(text) => {
                let mut indented = prefix.join(" ");
                indented.push(' ');
                indented.push_str(text);
                *text = indented;
            }
            Message::Fragments(parts) => {
                parts.splice(0..0, prefix.iter().map(Fragment::plain));
            }
        }
    }
}

impl Render for Message {
    fn format(&self, color: bool, output: OutputFormat) -> String {
        match self {
            Message::Text(text) => text.format(color, output),
            Message::Fragments(parts) => parts.format(color, output),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_owned())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<Vec<Fragment>> for Message {
    fn from(parts: Vec<Fragment>) -> Self {
        Message::Fragments(parts)
    }
}

/// One emitted log record.
///
/// Entries are created by message builders and are read-only once handed to the manager.
#[derive(Debug, Clone)]
pub struct Entry {
    level: String,
    timestamp: Option<Timestamp>,
    session_id: Option<String>,
    request_ids: Vec<String>,
    packages: Vec<String>,
    message: Message,
    data: Option<Value>,
}

impl Entry {
    /// Create an entry with the given level name and message and no context.
    pub fn new(level: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            level: level.into(),
            timestamp: None,
            session_id: None,
            request_ids: vec![],
            packages: vec![],
            message: message.into(),
            data: None,
        }
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the session id.
    pub fn with_session_id(mut self, sid: Option<String>) -> Self {
        self.session_id = sid;
        self
    }

    /// Set the request id chain.
    pub fn with_request_ids(mut self, ids: Vec<String>) -> Self {
        self.request_ids = ids;
        self
    }

    /// Set the package chain.
    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    /// Set the structured data.
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// The level name.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// The observed time.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// The session id.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The request ids, from the root logger down.
    pub fn request_ids(&self) -> &[String] {
        &self.request_ids
    }

    /// The packages, from the root logger down.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// The message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The structured data.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub(crate) fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}
