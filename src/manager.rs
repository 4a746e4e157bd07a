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

//! The root coordinator of levels, thresholds, transports and the root logger.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::TryLockError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use jiff::Timestamp;

use crate::BuilderFactory;
use crate::BuilderParams;
use crate::DisplayOptions;
use crate::Entry;
use crate::Error;
use crate::Logger;
use crate::MessageBuilder;
use crate::color::LevelColor;
use crate::color::Theme;
use crate::config::LogConfig;
use crate::level::LevelRef;
use crate::level::LevelSet;
use crate::logger::ChildParams;
use crate::logger::Context;
use crate::logger::LoggerState;
use crate::transport::Transport;
use crate::transport::TransportMgr;
use crate::transport::TransportState;
use crate::trap::DefaultTrap;
use crate::trap::Trap;
use crate::utils::lock;

/// The log manager.
///
/// A `LogMgr` is a cheap handle: clones share the same levels, thresholds, transports, queue and
/// root logger. Entries are queued until every transport is ready, then drained in order.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), logmgr::Error> {
/// use logmgr::LogMgr;
/// use logmgr::level::LevelSet;
///
/// let mgr = LogMgr::new(LevelSet::std());
/// let log = mgr.get_logger().await?;
/// log.at("info")?.text("service started").emit();
/// mgr.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LogMgr {
    shared: Arc<Shared>,
}

struct Shared {
    levels: Arc<LevelSet>,
    threshold: AtomicI32,
    transports: TransportMgr,
    queue: Mutex<VecDeque<Entry>>,
    draining: Mutex<()>,
    root: Mutex<Option<Arc<LoggerState>>>,
    root_context: Context,
    factory: BuilderFactory,
    theme: Option<Arc<Theme>>,
    warned: AtomicBool,
}

impl fmt::Debug for LogMgr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogMgr")
            .field("levels", &self.shared.levels)
            .field("threshold", &self.threshold())
            .field("transports", &self.shared.transports)
            .field("queued", &self.queued())
            .field("root_context", &self.shared.root_context)
            .field("theme", &self.shared.theme)
            .finish()
    }
}

impl LogMgr {
    /// Create a manager with default settings over the given level table.
    ///
    /// The threshold is the table's default level.
    pub fn new(levels: LevelSet) -> LogMgr {
        let threshold = levels.default_level().value();
        LogMgrBuilder::default().assemble(levels, threshold)
    }

    /// Start building a manager.
    pub fn builder() -> LogMgrBuilder {
        LogMgrBuilder::default()
    }

    /// The level table.
    pub fn levels(&self) -> &Arc<LevelSet> {
        &self.shared.levels
    }

    /// The global threshold value.
    pub fn threshold(&self) -> i32 {
        self.shared.threshold.load(Ordering::Acquire)
    }

    /// Set the global threshold and propagate it to every transport.
    ///
    /// If the root logger has its own, more restrictive threshold, a warning is emitted once: the
    /// root logger's threshold keeps applying to its tree.
    pub fn set_threshold(&self, level: impl Into<LevelRef>) -> Result<(), Error> {
        let levels = &self.shared.levels;
        let value = levels.as_value(level)?;
        self.shared.threshold.store(value, Ordering::Release);
        self.shared.transports.set_threshold(value);

        let root_threshold = lock(&self.shared.root)
            .as_ref()
            .and_then(|state| state.threshold());
        if let Some(root_threshold) = root_threshold {
            if !levels.meets_value(value, root_threshold)
                && !self.shared.warned.swap(true, Ordering::SeqCst)
            {
                let message = format!(
                    "LogMgr threshold {} is less restrictive than root Logger threshold {}; the Logger threshold will apply",
                    levels.as_name(value)?,
                    levels.as_name(root_threshold)?,
                );
                let entry = self.root_logger().make_entry(
                    levels.warn_level().name(),
                    message.into(),
                    None,
                );
                self.force_emit(entry);
            }
        }

        Ok(())
    }

    /// Set the display options of every transport.
    pub fn show(&self, opts: &DisplayOptions) {
        self.shared.transports.show(opts);
    }

    /// The display options given to new transports.
    pub fn display_options(&self) -> DisplayOptions {
        self.shared.transports.display_options()
    }

    /// The transports of this manager.
    pub fn transports(&self) -> &TransportMgr {
        &self.shared.transports
    }

    /// A fresh state for a transport bound to this manager.
    pub fn transport_state(&self) -> TransportState {
        self.shared.transports.new_state()
    }

    /// Register a transport, setting it up if the manager is started.
    ///
    /// # Errors
    ///
    /// Return the setup error of the transport, which is then not registered.
    pub async fn add_transport(&self, transport: Arc<dyn Transport>) -> Result<(), Error> {
        let kind = transport.kind();
        let result = self.shared.transports.add(transport).await;
        if result.is_ok() {
            self.diagnostic(format!("Added transport '{kind}'"));
        }
        self.flush_queue();
        result
    }

    /// Remove and destroy the first transport of the same kind. Return whether one was removed.
    pub async fn remove_transport(&self, transport: &dyn Transport) -> Result<bool, Error> {
        let removed = self.shared.transports.remove(transport).await?;
        if removed {
            self.diagnostic(format!("Removed transport '{}'", transport.kind()));
        }
        Ok(removed)
    }

    /// Set up every transport, then drain the queue.
    pub async fn start(&self) -> Result<(), Error> {
        let result = self.shared.transports.start().await;
        self.flush_queue();
        result
    }

    /// Drain the queue, then stop every transport.
    pub async fn stop(&self) -> Result<(), Error> {
        self.flush_queue();
        self.shared.transports.stop().await
    }

    /// The root logger, starting the transports first if needed.
    ///
    /// A console transport is installed if none was added.
    pub async fn get_logger(&self) -> Result<Logger, Error> {
        if !self.shared.transports.is_started() {
            self.start().await?;
        }
        Ok(self.root_logger())
    }

    fn root_logger(&self) -> Logger {
        let state = lock(&self.shared.root)
            .get_or_insert_with(|| Arc::new(LoggerState::default()))
            .clone();
        Logger::from_parts(
            self.clone(),
            None,
            self.shared.root_context.clone(),
            state,
        )
    }

    /// A message builder at `level` that emits through `logger`.
    ///
    /// The threshold flags are computed once, here.
    pub fn get_msg_builder(
        &self,
        level: impl Into<LevelRef>,
        logger: &Logger,
    ) -> Result<MessageBuilder, Error> {
        let levels = &self.shared.levels;
        let value = levels.as_value(level)?;
        let params = BuilderParams {
            level: levels.as_name(value)?.to_owned(),
            emitter: logger.clone(),
            meets_threshold: self.admits(value, logger.effective_threshold()),
            meets_flush_threshold: levels.meets_flush_threshold(value),
            theme: self.shared.theme.clone(),
        };
        Ok((self.shared.factory)(params))
    }

    /// Queue an entry if it meets the global threshold and any transport's threshold, then drain.
    ///
    /// Entries at flush-eligible levels also flush the transports. An entry whose level is not in
    /// the table is dropped and its [`ErrorKind::UnknownLevel`](crate::ErrorKind::UnknownLevel)
    /// error goes to the trap; use [`try_emit`](Self::try_emit) to get the error back instead.
    pub fn emit(&self, entry: Entry) {
        if let Err(err) = self.try_emit(entry) {
            self.trap(&err);
        }
    }

    /// Like [`emit`](Self::emit), but return an error for an entry whose level is not in the
    /// table.
    pub fn try_emit(&self, entry: Entry) -> Result<(), Error> {
        let value = self.shared.levels.as_value(entry.level())?;
        if self.admits(value, None) {
            self.enqueue(entry);
        }
        Ok(())
    }

    /// Queue an entry regardless of thresholds, then drain.
    pub fn force_emit(&self, entry: Entry) {
        self.enqueue(entry);
    }

    fn enqueue(&self, entry: Entry) {
        lock(&self.shared.queue).push_back(entry);
        self.flush_queue();
    }

    /// Whether `level` passes the explicit threshold, the global one and any transport's one.
    ///
    /// # Errors
    ///
    /// Return an error if a level is unknown, or if no transport is registered.
    pub fn meets_threshold(
        &self,
        level: impl Into<LevelRef>,
        explicit: Option<LevelRef>,
    ) -> Result<bool, Error> {
        let levels = &self.shared.levels;
        let value = levels.as_value(level)?;
        if let Some(threshold) = explicit {
            if !levels.meets_value(value, levels.as_value(threshold)?) {
                return Ok(false);
            }
        }
        if !levels.meets_value(value, self.threshold()) {
            return Ok(false);
        }
        self.shared.transports.meets_any_threshold_value(value)
    }

    /// The same checks as [`meets_threshold`](Self::meets_threshold), except that entries are
    /// admitted while no transport is registered, so they can queue until one is.
    pub(crate) fn admits(&self, value: i32, explicit: Option<i32>) -> bool {
        let levels = &self.shared.levels;
        if explicit.is_some_and(|threshold| !levels.meets_value(value, threshold)) {
            return false;
        }
        if !levels.meets_value(value, self.threshold()) {
            return false;
        }
        let transports = &self.shared.transports;
        transports.is_empty() || transports.meets_any_threshold_value(value).unwrap_or(true)
    }

    /// Whether entries at `level` trigger a flush.
    pub fn meets_flush_threshold(&self, level: impl Into<LevelRef>) -> bool {
        self.shared.levels.meets_flush_threshold(level)
    }

    /// Dispatch queued entries in order while every transport is ready.
    ///
    /// The transports are flushed right after an entry at a flush-eligible level is dispatched;
    /// flush errors go to the trap. Only one caller drains at a time. Entries queued while another caller drains, including
    /// entries emitted by a transport during dispatch, are picked up by that caller.
    pub fn flush_queue(&self) {
        loop {
            let guard = match self.shared.draining.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(err)) => err.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };

            while self.shared.transports.all_ready() {
                let Some(entry) = lock(&self.shared.queue).pop_front() else {
                    break;
                };
                self.shared.transports.emit(&entry);
                if self.shared.levels.meets_flush_threshold(entry.level()) {
                    if let Err(err) = self.shared.transports.flush() {
                        self.trap(&err);
                    }
                }
            }
            drop(guard);

            if lock(&self.shared.queue).is_empty() || !self.shared.transports.all_ready() {
                return;
            }
        }
    }

    /// Drain the queue and flush every transport.
    pub fn flush(&self) -> Result<(), Error> {
        self.flush_queue();
        self.shared.transports.flush()
    }

    /// The number of entries waiting for the transports to become ready.
    pub fn queued(&self) -> usize {
        lock(&self.shared.queue).len()
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.shared.transports.trap(err);
    }

    fn diagnostic(&self, message: String) {
        let levels = &self.shared.levels;
        let entry = self
            .root_logger()
            .make_entry(levels.lowest_level().name(), message.into(), None);
        self.emit(entry);
    }
}

/// A boxed closure creating a transport for a manager under construction.
type TransportFactory = Box<dyn FnOnce(&LogMgr) -> Arc<dyn Transport> + Send>;

/// A builder for [`LogMgr`].
///
/// # Examples
///
/// ```
/// use logmgr::LogMgr;
/// use logmgr::display::DisplayOptions;
/// use logmgr::level::LevelSet;
/// use logmgr::transport::Console;
///
/// let mgr = LogMgr::builder()
///     .levels(LevelSet::cli())
///     .threshold("debug")
///     .show(DisplayOptions::minimal())
///     .transport(|mgr| Console::new(mgr).stderr())
///     .build()
///     .unwrap();
/// assert_eq!(mgr.threshold(), 5);
/// ```
#[must_use = "call `build` to create the LogMgr"]
pub struct LogMgrBuilder {
    levels: Option<LevelSet>,
    colors: Option<LevelColor>,
    threshold: Option<LevelRef>,
    show: DisplayOptions,
    theme: Option<Arc<Theme>>,
    factory: BuilderFactory,
    trap: Box<dyn Trap>,
    root: ChildParams,
    transports: Vec<TransportFactory>,
}

impl Default for LogMgrBuilder {
    fn default() -> Self {
        Self {
            levels: None,
            colors: Some(LevelColor::default()),
            threshold: None,
            show: DisplayOptions::default(),
            theme: Some(Arc::new(Theme::colored())),
            factory: Arc::new(MessageBuilder::new),
            trap: Box::new(DefaultTrap::default()),
            root: ChildParams::default(),
            transports: vec![],
        }
    }
}

impl fmt::Debug for LogMgrBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogMgrBuilder")
            .field("levels", &self.levels)
            .field("colors", &self.colors)
            .field("threshold", &self.threshold)
            .field("show", &self.show)
            .field("theme", &self.theme)
            .field("trap", &self.trap)
            .field("root", &self.root)
            .field("transports", &self.transports.len())
            .finish()
    }
}

impl LogMgrBuilder {
    /// Set the level table. Default to [`LevelSet::std`].
    pub fn levels(mut self, levels: LevelSet) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Set the global threshold. Default to the table's default level.
    pub fn threshold(mut self, level: impl Into<LevelRef>) -> Self {
        self.threshold = Some(level.into());
        self
    }

    /// Set the display options given to transports.
    pub fn show(mut self, show: DisplayOptions) -> Self {
        self.show = show;
        self
    }

    /// Set the theme used by the named styles of message builders.
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(Arc::new(theme));
        self
    }

    /// Set the colors of level names.
    pub fn colors(mut self, colors: LevelColor) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Use neither level colors nor a theme.
    pub fn plain(mut self) -> Self {
        self.colors = None;
        self.theme = None;
        self
    }

    /// Set the factory creating message builders.
    pub fn factory(
        mut self,
        factory: impl Fn(BuilderParams) -> MessageBuilder + Send + Sync + 'static,
    ) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Set the trap for transport failures. Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the context of the root logger.
    pub fn root(mut self, params: ChildParams) -> Self {
        self.root = params;
        self
    }

    /// Add a transport created from the manager being built.
    ///
    /// Transports added later come first in dispatch order.
    pub fn transport<T, F>(mut self, f: F) -> Self
    where
        T: Transport,
        F: FnOnce(&LogMgr) -> T + Send + 'static,
    {
        self.transports.push(Box::new(move |mgr| Arc::new(f(mgr))));
        self
    }

    /// Apply a configuration. Fields absent from the configuration are left unchanged.
    ///
    /// # Errors
    ///
    /// Return an error if the configuration names an unknown level table.
    pub fn config(mut self, config: LogConfig) -> Result<Self, Error> {
        if let Some(name) = config.levels {
            self.levels = Some(LevelSet::named(&name)?);
        }
        if let Some(threshold) = config.threshold {
            self.threshold = Some(LevelRef::Name(threshold));
        }
        if let Some(show) = config.show {
            self.show = show;
        }
        Ok(self)
    }

    /// Build the manager.
    ///
    /// # Errors
    ///
    /// Return an error if the threshold is not a level of the table.
    pub fn build(mut self) -> Result<LogMgr, Error> {
        let levels = self.levels.take().unwrap_or_else(LevelSet::std);
        let threshold = match self.threshold.take() {
            Some(level) => levels.as_value(level)?,
            None => levels.default_level().value(),
        };
        Ok(self.assemble(levels, threshold))
    }

    fn assemble(self, levels: LevelSet, threshold: i32) -> LogMgr {
        let levels = match &self.colors {
            Some(colors) => colors.apply(levels),
            None => levels,
        };
        let levels = Arc::new(levels);
        let transports = TransportMgr::new(
            levels.clone(),
            Timestamp::now(),
            threshold,
            self.show,
            self.trap,
        );
        let mgr = LogMgr {
            shared: Arc::new(Shared {
                levels,
                threshold: AtomicI32::new(threshold),
                transports,
                queue: Mutex::new(VecDeque::new()),
                draining: Mutex::new(()),
                root: Mutex::new(None),
                root_context: Context::default().extend(self.root),
                factory: self.factory,
                theme: self.theme,
                warned: AtomicBool::new(false),
            }),
        };
        for factory in self.transports {
            let transport = factory(&mgr);
            mgr.shared.transports.register(transport);
        }
        mgr
    }
}
