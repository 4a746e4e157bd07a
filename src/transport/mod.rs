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

//! Transports: the output sinks entries are dispatched to.

use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use jiff::Timestamp;

use crate::DisplayOptions;
use crate::Entry;
use crate::Error;
use crate::layout::LayoutContext;
use crate::level::LevelSet;
use crate::utils::read;
use crate::utils::write;

mod buffer;
mod console;
mod manager;

pub use self::buffer::Buffer;
pub use self::console::Console;
pub use self::manager::TransportMgr;

/// An output sink.
///
/// Lifecycle methods are async; `emit` is a synchronous best-effort write. A transport must
/// re-check its own threshold in `emit`: the manager forwards every accepted entry to every
/// transport.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync + 'static {
    /// The kind of this transport, used to match transports for removal.
    fn kind(&self) -> &'static str;

    /// The threshold, display options and readiness of this transport.
    fn state(&self) -> &TransportState;

    /// Allocate resources. Default to marking the transport ready.
    async fn setup(&self) -> Result<(), Error> {
        self.state().set_ready(true);
        Ok(())
    }

    /// Flush and release resources. Must be idempotent.
    async fn stop(&self) -> Result<(), Error> {
        self.state().set_ready(false);
        self.flush()
    }

    /// Tear down. Default to [`stop`](Self::stop).
    async fn destroy(&self) -> Result<(), Error> {
        self.stop().await
    }

    /// Write an entry if it meets this transport's threshold.
    fn emit(&self, entry: &Entry) -> Result<(), Error>;

    /// Flush any buffered entries.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// The threshold value of this transport.
    fn threshold(&self) -> i32 {
        self.state().threshold()
    }

    /// Set the threshold value of this transport.
    fn set_threshold(&self, value: i32) {
        self.state().set_threshold(value);
    }

    /// Replace the display options of this transport.
    fn show(&self, opts: &DisplayOptions) {
        self.state().set_show(opts.clone());
    }

    /// Whether this transport accepts entries.
    fn ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Whether `other` is the same kind of transport.
    fn matches(&self, other: &dyn Transport) -> bool {
        self.kind() == other.kind()
    }
}

/// State shared by all transports: level table, threshold, display options and readiness.
#[derive(Debug)]
pub struct TransportState {
    levels: Arc<LevelSet>,
    epoch: Timestamp,
    threshold: AtomicI32,
    show: RwLock<DisplayOptions>,
    ready: AtomicBool,
}

impl TransportState {
    /// Create a state that is not ready yet.
    pub fn new(
        levels: Arc<LevelSet>,
        epoch: Timestamp,
        threshold: i32,
        show: DisplayOptions,
    ) -> Self {
        Self {
            levels,
            epoch,
            threshold: AtomicI32::new(threshold),
            show: RwLock::new(show),
            ready: AtomicBool::new(false),
        }
    }

    /// The level table.
    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    /// The threshold value.
    pub fn threshold(&self) -> i32 {
        self.threshold.load(Ordering::Acquire)
    }

    /// Set the threshold value.
    pub fn set_threshold(&self, value: i32) {
        self.threshold.store(value, Ordering::Release);
    }

    /// A copy of the display options.
    pub fn show(&self) -> DisplayOptions {
        read(&self.show).clone()
    }

    /// Replace the display options.
    pub fn set_show(&self, show: DisplayOptions) {
        *write(&self.show) = show;
    }

    /// Whether the transport accepts entries.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Mark the transport ready or not.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Whether the entry's level meets this transport's threshold. Unknown levels never do.
    pub fn meets_threshold(&self, entry: &Entry) -> bool {
        self.levels
            .as_value(entry.level())
            .map(|value| self.levels.meets_value(value, self.threshold()))
            .unwrap_or(false)
    }

    /// Run `f` with a layout context built from this state.
    pub fn with_layout_context<R>(&self, color: bool, f: impl FnOnce(&LayoutContext<'_>) -> R) -> R {
        let show = read(&self.show);
        let ctx = LayoutContext {
            levels: &self.levels,
            show: &show,
            threshold: self.threshold(),
            epoch: self.epoch,
            color,
        };
        f(&ctx)
    }
}
