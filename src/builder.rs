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

//! Message builders: per-call accumulators that produce entries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::Entry;
use crate::Error;
use crate::Fragment;
use crate::Logger;
use crate::Message;
use crate::OutputFormat;
use crate::Render;
use crate::Style;
use crate::color::Theme;
use crate::logger::MarkId;

/// Constructs message builders; installed on the manager to customize every builder.
pub type BuilderFactory = Arc<dyn Fn(BuilderParams) -> MessageBuilder + Send + Sync>;

/// Everything a [`BuilderFactory`] receives for one level access.
#[derive(Debug, Clone)]
pub struct BuilderParams {
    /// The canonical level name.
    pub level: String,
    /// The logger the builder emits through.
    pub emitter: Logger,
    /// Whether the level passes every threshold at creation time.
    pub meets_threshold: bool,
    /// Whether entries at the level trigger a flush.
    pub meets_flush_threshold: bool,
    /// The theme configured on the manager.
    pub theme: Option<Arc<Theme>>,
}

/// A duration for [`MessageBuilder::ewt`]: milliseconds, or a mark to demark.
#[derive(Debug, Clone)]
pub enum Elapsed {
    /// A duration in milliseconds.
    Millis(f64),
    /// A mark set on the emitting logger.
    Mark(MarkId),
}

impl From<f64> for Elapsed {
    fn from(ms: f64) -> Self {
        Elapsed::Millis(ms)
    }
}

impl From<Duration> for Elapsed {
    fn from(d: Duration) -> Self {
        Elapsed::Millis(d.as_secs_f64() * 1000.0)
    }
}

impl From<MarkId> for Elapsed {
    fn from(id: MarkId) -> Self {
        Elapsed::Mark(id)
    }
}

impl From<&MarkId> for Elapsed {
    fn from(id: &MarkId) -> Self {
        Elapsed::Mark(id.clone())
    }
}

/// Accumulates the fragments and data of one log call.
///
/// Fragments accumulate regardless of thresholds; the threshold check happens in
/// [`MessageBuilder::emit`]. Threshold flags are computed once, when the builder is created.
///
/// # Examples
///
/// ```
/// # async fn run() -> Result<(), logmgr::Error> {
/// use logmgr::LogMgr;
/// use logmgr::level::LevelSet;
///
/// let mgr = LogMgr::new(LevelSet::min());
/// let log = mgr.get_logger().await?;
/// log.at("info")?.h1("Output").value(5).emit();
/// # Ok(())
/// # }
/// ```
#[must_use = "call `emit` to hand the message to the logger"]
#[derive(Debug)]
pub struct MessageBuilder {
    level: String,
    emitter: Logger,
    parts: Vec<Fragment>,
    data: Option<Value>,
    meets_threshold: bool,
    meets_flush_threshold: bool,
    theme: Option<Arc<Theme>>,
}

impl MessageBuilder {
    /// Create a builder; this is the default [`BuilderFactory`].
    pub fn new(params: BuilderParams) -> MessageBuilder {
        MessageBuilder {
            level: params.level,
            emitter: params.emitter,
            parts: vec![],
            data: None,
            meets_threshold: params.meets_threshold,
            meets_flush_threshold: params.meets_flush_threshold,
            theme: params.theme,
        }
    }

    /// Replace the theme used by the named style methods.
    pub fn with_theme(mut self, theme: Option<Arc<Theme>>) -> Self {
        self.theme = theme;
        self
    }

    /// The level name.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// The logger this builder emits through.
    pub fn emitter(&self) -> &Logger {
        &self.emitter
    }

    /// Whether the message will be emitted.
    pub fn meets_threshold(&self) -> bool {
        self.meets_threshold
    }

    /// Whether the message will trigger a flush.
    pub fn meets_flush_threshold(&self) -> bool {
        self.meets_flush_threshold
    }

    /// Append one fragment made of `values` joined by a space.
    ///
    /// Strings are taken verbatim; objects and arrays are JSON-encoded.
    pub fn stylize<I, V>(mut self, style: Option<Style>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let text = join_values(values);
        self.parts.push(Fragment::styled(text, style));
        self
    }

    /// Append an unstyled fragment.
    pub fn text(self, text: impl fmt::Display) -> Self {
        self.append_fragment(Fragment::plain(text.to_string()))
    }

    /// Append a fragment styled by the theme style of the given name.
    pub fn themed(self, name: &str, text: impl fmt::Display) -> Self {
        let style = self.theme.as_ref().and_then(|t| t.style(name));
        self.append_fragment(Fragment::styled(text.to_string(), style))
    }

    /// Append a top level heading.
    pub fn h1(self, text: impl fmt::Display) -> Self {
        self.themed("h1", text)
    }

    /// Append a second level heading.
    pub fn h2(self, text: impl fmt::Display) -> Self {
        self.themed("h2", text)
    }

    /// Append a third level heading.
    pub fn h3(self, text: impl fmt::Display) -> Self {
        self.themed("h3", text)
    }

    /// Append an action.
    pub fn action(self, text: impl fmt::Display) -> Self {
        self.themed("action", text)
    }

    /// Append a label.
    pub fn label(self, text: impl fmt::Display) -> Self {
        self.themed("label", text)
    }

    /// Append a value; objects and arrays are JSON-encoded.
    pub fn value(self, value: impl Into<Value>) -> Self {
        self.themed("value", join_values([value]))
    }

    /// Append a path.
    pub fn path(self, path: impl fmt::Display) -> Self {
        self.themed("path", path)
    }

    /// Append a date.
    pub fn date(self, date: impl fmt::Display) -> Self {
        self.themed("date", date)
    }

    /// Append a warning.
    pub fn warn(self, text: impl fmt::Display) -> Self {
        self.themed("warn", text)
    }

    /// Append an error.
    pub fn error(self, text: impl fmt::Display) -> Self {
        self.themed("error", text)
    }

    /// Append struck-through text.
    pub fn strikethru(self, text: impl fmt::Display) -> Self {
        self.themed("strikethru", text)
    }

    /// Attach structured data. Skipped when the message will not be emitted.
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        if self.meets_threshold {
            self.data = Some(data.into());
        }
        self
    }

    /// Append a fragment.
    pub fn append_fragment(mut self, fragment: Fragment) -> Self {
        self.parts.push(fragment);
        self
    }

    /// Insert a fragment before all others.
    pub fn prepend_fragment(mut self, fragment: Fragment) -> Self {
        self.parts.insert(0, fragment);
        self
    }

    /// The fragments accumulated so far.
    pub fn fragments(&self) -> &[Fragment] {
        &self.parts
    }

    /// Render the accumulated fragments, joined by a single space.
    pub fn format(&self, color: bool, output: OutputFormat) -> String {
        self.parts.format(color, output)
    }

    /// Finish the message.
    ///
    /// Return `None` if the level does not meet the thresholds. Otherwise the entry is handed to
    /// the emitting logger and returned.
    pub fn emit(self) -> Option<Entry> {
        self.emit_with(std::iter::empty::<Value>())
    }

    /// Append `values` as one final unstyled fragment, then [`emit`](Self::emit).
    pub fn emit_with<I, V>(mut self, values: I) -> Option<Entry>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if !self.meets_threshold {
            return None;
        }

        let trailing = join_values(values);
        if !trailing.is_empty() {
            self.parts.push(Fragment::plain(trailing));
        }

        let parts = std::mem::take(&mut self.parts);
        let entry = self
            .emitter
            .make_entry(&self.level, Message::Fragments(parts), self.data.take());
        self.emitter.emit(entry.clone());
        Some(entry)
    }

    /// Emit with a response time, given directly or as a mark to demark.
    ///
    /// Non-positive durations emit without a response time.
    pub fn ewt(self, elapsed: impl Into<Elapsed>, keep: bool) -> Result<Option<Entry>, Error> {
        let ms = match elapsed.into() {
            Elapsed::Millis(ms) => ms,
            Elapsed::Mark(id) => self.emitter.demark(&id, keep)?,
        };
        if ms > 0.0 {
            Ok(self.themed("ewt", response_time(ms)).emit())
        } else {
            Ok(self.emit())
        }
    }
}

fn response_time(ms: f64) -> String {
    let digits = if ms > 100.0 {
        0
    } else if ms > 10.0 {
        1
    } else if ms > 1.0 {
        2
    } else {
        3
    };
    format!("({ms:.digits$} ms response)")
}

fn join_values<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values
        .into_iter()
        .map(|v| match v.into() {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn response_time_precision() {
        assert_eq!(response_time(1234.56), "(1235 ms response)");
        assert_eq!(response_time(42.31), "(42.3 ms response)");
        assert_eq!(response_time(5.678), "(5.68 ms response)");
        assert_eq!(response_time(0.5), "(0.500 ms response)");
    }

    #[test]
    fn values_are_stringified() {
        assert_eq!(join_values(["a", "b"]), "a b");
        assert_eq!(join_values([json!(5), json!(true)]), "5 true");
        assert_eq!(join_values([json!({"k": [1, 2]})]), r#"{"k":[1,2]}"#);
        assert_eq!(join_values(Vec::<Value>::new()), "");
    }
}
