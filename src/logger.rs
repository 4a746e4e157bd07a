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

//! Loggers: context carriers that create message builders and gate emission.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use jiff::Timestamp;
use serde_json::Value;

use crate::Entry;
use crate::Error;
use crate::ErrorKind;
use crate::LogMgr;
use crate::Message;
use crate::MessageBuilder;
use crate::level::LevelRef;
use crate::level::LevelSet;
use crate::utils::lock;

/// Context added to a child logger.
///
/// Request ids and packages are appended to the parent's chains; a session id replaces the
/// parent's one.
///
/// # Examples
///
/// ```
/// use logmgr::ChildParams;
///
/// let params = ChildParams::new().pkg("db").req_id("r-17");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChildParams {
    session_id: Option<String>,
    request_ids: Vec<String>,
    packages: Vec<String>,
}

impl ChildParams {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the session id.
    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.session_id = Some(sid.into());
        self
    }

    /// Append a request id.
    pub fn req_id(mut self, id: impl Into<String>) -> Self {
        self.request_ids.push(id.into());
        self
    }

    /// Append a package name.
    pub fn pkg(mut self, pkg: impl Into<String>) -> Self {
        self.packages.push(pkg.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    session_id: Option<String>,
    request_ids: Vec<String>,
    packages: Vec<String>,
}

impl Context {
    pub(crate) fn extend(mut self, params: ChildParams) -> Context {
        if let Some(sid) = params.session_id {
            self.session_id = Some(sid);
        }
        self.request_ids.extend(params.request_ids);
        self.packages.extend(params.packages);
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoggerState {
    threshold: Mutex<Option<i32>>,
    marks: Mutex<HashMap<String, Instant>>,
    indent: Mutex<Vec<String>>,
    warned: AtomicBool,
}

impl LoggerState {
    pub(crate) fn threshold(&self) -> Option<i32> {
        *lock(&self.threshold)
    }

    fn inherit(&self) -> LoggerState {
        LoggerState {
            threshold: Mutex::new(None),
            marks: Mutex::new(lock(&self.marks).clone()),
            indent: Mutex::new(lock(&self.indent).clone()),
            warned: AtomicBool::new(false),
        }
    }
}

/// The id of a timing mark set with [`Logger::mark`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkId(String);

impl MarkId {
    fn generate() -> MarkId {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        MarkId(format!("mark-{}", NEXT.fetch_add(1, Ordering::Relaxed)))
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MarkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkId {
    fn from(id: &str) -> Self {
        MarkId(id.to_owned())
    }
}

/// A logger bound to a [`LogMgr`].
///
/// Cloning a logger is cheap and shares its threshold, marks and indentation. Use
/// [`Logger::child`] to derive a logger with additional context.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    mgr: LogMgr,
    parent: Option<Logger>,
    context: Context,
    state: Arc<LoggerState>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.inner.context)
            .field("threshold", &self.inner.state.threshold())
            .field("root", &self.inner.parent.is_none())
            .finish()
    }
}

impl Logger {
    pub(crate) fn from_parts(
        mgr: LogMgr,
        parent: Option<Logger>,
        context: Context,
        state: Arc<LoggerState>,
    ) -> Logger {
        Logger {
            inner: Arc::new(LoggerInner {
                mgr,
                parent,
                context,
                state,
            }),
        }
    }

    /// Derive a child logger.
    ///
    /// The child copies this logger's context, marks and indentation, then appends the request
    /// ids and packages of `params`. Its threshold is unset and falls back to this logger.
    pub fn child(&self, params: ChildParams) -> Logger {
        let context = self.inner.context.clone().extend(params);
        let state = Arc::new(self.inner.state.inherit());
        Logger::from_parts(self.inner.mgr.clone(), Some(self.clone()), context, state)
    }

    /// The manager this logger emits to.
    pub fn mgr(&self) -> &LogMgr {
        &self.inner.mgr
    }

    /// The level table of the manager.
    pub fn levels(&self) -> &Arc<LevelSet> {
        self.inner.mgr.levels()
    }

    /// The logger this one was derived from, if any.
    pub fn parent(&self) -> Option<&Logger> {
        self.inner.parent.as_ref()
    }

    /// The session id.
    pub fn session_id(&self) -> Option<&str> {
        self.inner.context.session_id.as_deref()
    }

    /// The request id chain, from the root logger down.
    pub fn request_ids(&self) -> &[String] {
        &self.inner.context.request_ids
    }

    /// The package chain, from the root logger down.
    pub fn packages(&self) -> &[String] {
        &self.inner.context.packages
    }

    /// The threshold set on this logger, if any.
    pub fn threshold(&self) -> Option<i32> {
        self.inner.state.threshold()
    }

    /// The threshold of this logger or, if unset, of the nearest ancestor that has one.
    pub fn effective_threshold(&self) -> Option<i32> {
        self.threshold()
            .or_else(|| self.parent().and_then(Logger::effective_threshold))
    }

    /// Set the threshold of this logger.
    ///
    /// The most restrictive of this threshold and the manager's one applies. If this threshold is
    /// less restrictive, a warning is emitted once.
    pub fn set_threshold(&self, level: impl Into<LevelRef>) -> Result<&Self, Error> {
        let levels = self.levels();
        let value = levels.as_value(level)?;
        *lock(&self.inner.state.threshold) = Some(value);

        let mgr_threshold = self.inner.mgr.threshold();
        if !levels.meets_value(value, mgr_threshold)
            && !self.inner.state.warned.swap(true, Ordering::SeqCst)
        {
            let message = format!(
                "Logger threshold {} is less restrictive than LogMgr threshold {}; the LogMgr threshold will apply",
                levels.as_name(value)?,
                levels.as_name(mgr_threshold)?,
            );
            let entry = self.make_entry(levels.warn_level().name(), message.into(), None);
            self.inner.mgr.force_emit(entry);
        }

        Ok(self)
    }

    /// Whether `level` would be emitted.
    ///
    /// With an explicit threshold only the level table is consulted. Otherwise this is the
    /// manager's composite check, including this logger's effective threshold.
    pub fn meets_threshold(
        &self,
        level: impl Into<LevelRef>,
        explicit: Option<LevelRef>,
    ) -> Result<bool, Error> {
        match explicit {
            Some(threshold) => self.levels().meets_threshold(level, threshold),
            None => self.inner.mgr.meets_threshold(
                level,
                self.effective_threshold().map(LevelRef::Value),
            ),
        }
    }

    /// A new message builder at the given level.
    pub fn at(&self, level: impl Into<LevelRef>) -> Result<MessageBuilder, Error> {
        self.inner.mgr.get_msg_builder(level, self)
    }

    pub(crate) fn builder_for(&self, level: &str) -> MessageBuilder {
        self.at(level)
            .unwrap_or_else(|err| panic!("failed to create a message builder: {err}"))
    }

    /// Record the current time under a newly generated id.
    pub fn mark(&self) -> MarkId {
        let id = MarkId::generate();
        self.mark_as(id.as_str())
    }

    /// Record the current time under the given name, replacing any previous mark of that name.
    pub fn mark_as(&self, name: impl Into<String>) -> MarkId {
        let name = name.into();
        lock(&self.inner.state.marks).insert(name.clone(), Instant::now());
        MarkId(name)
    }

    /// Milliseconds elapsed since the mark was set. The mark is removed unless `keep` is set.
    pub fn demark(&self, id: impl AsRef<str>, keep: bool) -> Result<f64, Error> {
        let id = id.as_ref();
        let mut marks = lock(&self.inner.state.marks);
        let start = if keep {
            marks.get(id).copied()
        } else {
            marks.remove(id)
        };
        let start = start.ok_or_else(|| {
            Error::new(ErrorKind::MissingMark, "mark was never set or already demarked")
                .with_context("mark", id)
        })?;
        Ok(start.elapsed().as_secs_f64() * 1000.0)
    }

    /// Push one indentation string.
    pub fn indent(&self, indent: impl Into<String>) -> &Self {
        lock(&self.inner.state.indent).push(indent.into());
        self
    }

    /// Pop up to `n` indentation strings.
    pub fn outdent(&self, n: usize) -> &Self {
        let mut indent = lock(&self.inner.state.indent);
        let keep = indent.len().saturating_sub(n);
        indent.truncate(keep);
        self
    }

    /// Remove all indentation.
    pub fn nodent(&self) -> &Self {
        lock(&self.inner.state.indent).clear();
        self
    }

    /// Hand an entry to the manager.
    ///
    /// The entry is dropped if its message is empty or its level does not meet this logger's
    /// threshold. Indentation is applied before the hand-off. An entry whose level is not in the
    /// table is dropped and its [`ErrorKind::UnknownLevel`] error goes to the manager's trap; use
    /// [`try_emit`](Self::try_emit) to get the error back instead.
    pub fn emit(&self, entry: Entry) {
        if let Err(err) = self.try_emit(entry) {
            self.inner.mgr.trap(&err);
        }
    }

    /// Like [`emit`](Self::emit), but return an [`ErrorKind::UnknownLevel`] error for an entry
    /// whose level is not in the table.
    pub fn try_emit(&self, mut entry: Entry) -> Result<(), Error> {
        let value = self.levels().as_value(entry.level())?;
        if entry.message().is_empty() || !self.inner.mgr.admits(value, self.effective_threshold()) {
            return Ok(());
        }

        let indent = lock(&self.inner.state.indent).clone();
        entry.message_mut().prepend(&indent);
        self.inner.mgr.emit(entry);
        Ok(())
    }

    pub(crate) fn make_entry(&self, level: &str, message: Message, data: Option<Value>) -> Entry {
        let context = &self.inner.context;
        Entry::new(level, message)
            .with_timestamp(Timestamp::now())
            .with_session_id(context.session_id.clone())
            .with_request_ids(context.request_ids.clone())
            .with_packages(context.packages.clone())
            .with_data(data)
    }
}
