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

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::Entry;
use crate::Error;
use crate::LogMgr;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::transport::Transport;
use crate::transport::TransportState;
use crate::utils::lock;

/// A transport that keeps entries and their rendered lines in memory.
///
/// Useful in tests, and for capturing output before handing it elsewhere.
#[derive(Debug)]
pub struct Buffer {
    state: TransportState,
    layout: Box<dyn Layout>,
    manual_ready: bool,
    entries: Mutex<Vec<Entry>>,
    lines: Mutex<Vec<String>>,
    flushes: AtomicUsize,
}

impl Buffer {
    /// Create a buffer bound to the manager's levels, threshold and display options.
    pub fn new(mgr: &LogMgr) -> Self {
        Self {
            state: mgr.transport_state(),
            layout: Box::new(TextLayout::default()),
            manual_ready: false,
            entries: Mutex::new(vec![]),
            lines: Mutex::new(vec![]),
            flushes: AtomicUsize::new(0),
        }
    }

    /// Set the layout used for [`lines`](Self::lines). Default to an uncolored [`TextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Do not become ready on setup; readiness is driven by [`set_ready`](Self::set_ready).
    pub fn manual_ready(mut self) -> Self {
        self.manual_ready = true;
        self
    }

    /// Mark the buffer ready or not.
    pub fn set_ready(&self, ready: bool) {
        self.state.set_ready(ready);
    }

    /// The entries received so far.
    pub fn entries(&self) -> Vec<Entry> {
        lock(&self.entries).clone()
    }

    /// The rendered lines received so far.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Drop everything received so far.
    pub fn clear(&self) {
        lock(&self.entries).clear();
        lock(&self.lines).clear();
    }

    /// How many times the buffer was flushed.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Transport for Buffer {
    fn kind(&self) -> &'static str {
        "buffer"
    }

    fn state(&self) -> &TransportState {
        &self.state
    }

    async fn setup(&self) -> Result<(), Error> {
        if !self.manual_ready {
            self.state.set_ready(true);
        }
        Ok(())
    }

    fn emit(&self, entry: &Entry) -> Result<(), Error> {
        if !self.state.meets_threshold(entry) {
            return Ok(());
        }

        let line = self
            .state
            .with_layout_context(false, |ctx| self.layout.format(entry, ctx))?;
        lock(&self.entries).push(entry.clone());
        lock(&self.lines).push(line);
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        self.flushes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
