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

use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use jiff::Timestamp;

use crate::DisplayOptions;
use crate::Entry;
use crate::Error;
use crate::ErrorKind;
use crate::level::LevelSet;
use crate::transport::Console;
use crate::transport::Transport;
use crate::transport::TransportState;
use crate::trap::Trap;
use crate::utils::read;
use crate::utils::write;

type Transports = Arc<Vec<Arc<dyn Transport>>>;

/// An ordered collection of transports with an aggregated lifecycle.
///
/// The most recently added transport comes first. Dispatch iterates over a snapshot of the list,
/// so adding or removing a transport never races an in-flight fan-out.
pub struct TransportMgr {
    levels: Arc<LevelSet>,
    epoch: Timestamp,
    threshold: AtomicI32,
    show: RwLock<DisplayOptions>,
    transports: RwLock<Transports>,
    running: AtomicBool,
    started: AtomicBool,
    trap: Box<dyn Trap>,
}

impl fmt::Debug for TransportMgr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportMgr")
            .field("threshold", &self.threshold)
            .field("transports", &self.snapshot())
            .field("running", &self.running)
            .field("started", &self.started)
            .field("trap", &self.trap)
            .finish()
    }
}

impl TransportMgr {
    pub(crate) fn new(
        levels: Arc<LevelSet>,
        epoch: Timestamp,
        threshold: i32,
        show: DisplayOptions,
        trap: Box<dyn Trap>,
    ) -> Self {
        Self {
            levels,
            epoch,
            threshold: AtomicI32::new(threshold),
            show: RwLock::new(show),
            transports: RwLock::new(Arc::new(vec![])),
            running: AtomicBool::new(false),
            started: AtomicBool::new(false),
            trap,
        }
    }

    /// A fresh transport state carrying the current threshold and display options.
    pub fn new_state(&self) -> TransportState {
        TransportState::new(
            self.levels.clone(),
            self.epoch,
            self.threshold.load(Ordering::Acquire),
            read(&self.show).clone(),
        )
    }

    fn snapshot(&self) -> Transports {
        read(&self.transports).clone()
    }

    /// The number of registered transports.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no transport is registered.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Whether [`start`](Self::start) has completed.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether the manager is started and not in the middle of adding a transport.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Register a transport in front of the existing ones.
    ///
    /// If the manager was already started, the transport is set up first. A transport that fails
    /// to set up is not registered.
    pub async fn add(&self, transport: Arc<dyn Transport>) -> Result<(), Error> {
        self.running.store(false, Ordering::Release);
        let started = self.is_started();
        if started {
            if let Err(err) = transport.setup().await {
                self.running.store(started, Ordering::Release);
                return Err(err.with_context("transport", transport.kind()));
            }
        }

        self.register(transport);
        self.running.store(started, Ordering::Release);
        Ok(())
    }

    pub(crate) fn register(&self, transport: Arc<dyn Transport>) {
        let mut transports = write(&self.transports);
        let mut next = Vec::with_capacity(transports.len() + 1);
        next.push(transport);
        next.extend(transports.iter().cloned());
        *transports = Arc::new(next);
    }

    /// Remove and destroy the first transport of the same kind as `transport`.
    ///
    /// Return whether a transport was removed.
    pub async fn remove(&self, transport: &dyn Transport) -> Result<bool, Error> {
        let removed = {
            let mut transports = write(&self.transports);
            match transports.iter().position(|t| t.matches(transport)) {
                Some(idx) => {
                    let mut next = transports.as_ref().clone();
                    let removed = next.remove(idx);
                    *transports = Arc::new(next);
                    Some(removed)
                }
                None => None,
            }
        };

        match removed {
            Some(removed) => {
                removed.destroy().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Set up every transport concurrently, installing a [`Console`] first if there are none.
    pub async fn start(&self) -> Result<(), Error> {
        if self.is_empty() {
            let console = Console::with_state(self.new_state());
            let mut transports = write(&self.transports);
            if transports.is_empty() {
                *transports = Arc::new(vec![Arc::new(console)]);
            }
        }

        let transports = self.snapshot();
        let results = join_all(transports.iter().map(|t| t.setup())).await;
        self.started.store(true, Ordering::Release);
        self.running.store(true, Ordering::Release);
        aggregate("failed to set up transports", results)
    }

    /// Stop every transport concurrently and wait for all of them.
    pub async fn stop(&self) -> Result<(), Error> {
        self.running.store(false, Ordering::Release);
        self.started.store(false, Ordering::Release);
        let transports = self.snapshot();
        let results = join_all(transports.iter().map(|t| t.stop())).await;
        aggregate("failed to stop transports", results)
    }

    /// Set the threshold of the manager and every transport.
    pub fn set_threshold(&self, value: i32) {
        self.threshold.store(value, Ordering::Release);
        for transport in self.snapshot().iter() {
            transport.set_threshold(value);
        }
    }

    /// Set the display options of the manager and every transport.
    pub fn show(&self, opts: &DisplayOptions) {
        *write(&self.show) = opts.clone();
        for transport in self.snapshot().iter() {
            transport.show(opts);
        }
    }

    /// The display options given to new transports.
    pub fn display_options(&self) -> DisplayOptions {
        read(&self.show).clone()
    }

    /// Whether any transport would accept a level of the given value.
    ///
    /// # Errors
    ///
    /// Return a [`ErrorKind::NoTransports`] error if no transport is registered.
    pub fn meets_any_threshold_value(&self, value: i32) -> Result<bool, Error> {
        let transports = self.snapshot();
        if transports.is_empty() {
            return Err(Error::new(ErrorKind::NoTransports, "no transport is registered"));
        }
        Ok(transports
            .iter()
            .any(|t| self.levels.meets_value(value, t.threshold())))
    }

    /// Whether the manager is running and every transport is ready.
    pub fn all_ready(&self) -> bool {
        let transports = self.snapshot();
        self.is_running() && !transports.is_empty() && transports.iter().all(|t| t.ready())
    }

    /// Forward an entry to every transport. Failures go to the trap.
    pub fn emit(&self, entry: &Entry) {
        for transport in self.snapshot().iter() {
            if let Err(err) = transport.emit(entry) {
                self.trap.trap(&err.with_context("transport", transport.kind()));
            }
        }
    }

    /// Flush every transport.
    pub fn flush(&self) -> Result<(), Error> {
        let transports = self.snapshot();
        let results = transports.iter().map(|t| t.flush()).collect::<Vec<_>>();
        aggregate("failed to flush transports", results)
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.trap.trap(err);
    }
}

fn aggregate(message: &str, results: Vec<Result<(), Error>>) -> Result<(), Error> {
    let errors = results.into_iter().filter_map(Result::err).collect::<Vec<_>>();
    if errors.is_empty() {
        return Ok(());
    }

    let mut err = Error::new(ErrorKind::Transport, message);
    for source in errors {
        err = err.with_source(source);
    }
    Err(err)
}
