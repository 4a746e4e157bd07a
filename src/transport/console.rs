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

use std::io::IsTerminal;
use std::io::Write;

use async_trait::async_trait;

use crate::Entry;
use crate::Error;
use crate::LogMgr;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::transport::Transport;
use crate::transport::TransportState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// A transport that writes lines to stdout or stderr.
///
/// This is the transport installed when a manager starts without any.
#[derive(Debug)]
pub struct Console {
    state: TransportState,
    stream: Stream,
    layout: Box<dyn Layout>,
    color: bool,
}

impl Console {
    /// Create a console transport bound to the manager's levels, threshold and display options.
    ///
    /// # Examples
    ///
    /// ```
    /// use logmgr::LogMgr;
    /// use logmgr::level::LevelSet;
    /// use logmgr::transport::Console;
    ///
    /// let mgr = LogMgr::new(LevelSet::std());
    /// let console = Console::new(&mgr).stderr().no_color();
    /// ```
    pub fn new(mgr: &LogMgr) -> Self {
        Console::with_state(mgr.transport_state())
    }

    pub(crate) fn with_state(state: TransportState) -> Self {
        Self {
            state,
            stream: Stream::Stdout,
            layout: Box::new(TextLayout::default()),
            color: std::io::stdout().is_terminal(),
        }
    }

    /// Write to stderr instead of stdout.
    pub fn stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self.color = std::io::stderr().is_terminal();
        self
    }

    /// Set the layout. Default to [`TextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Disable colored output.
    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }
}

#[async_trait]
impl Transport for Console {
    fn kind(&self) -> &'static str {
        "console"
    }

    fn state(&self) -> &TransportState {
        &self.state
    }

    fn emit(&self, entry: &Entry) -> Result<(), Error> {
        if !self.state.meets_threshold(entry) {
            return Ok(());
        }

        let mut line = self
            .state
            .with_layout_context(self.color, |ctx| self.layout.format(entry, ctx))?;
        line.push('\n');
        match self.stream {
            Stream::Stdout => std::io::stdout().write_all(line.as_bytes()),
            Stream::Stderr => std::io::stderr().write_all(line.as_bytes()),
        }
        .map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        match self.stream {
            Stream::Stdout => std::io::stdout().flush(),
            Stream::Stderr => std::io::stderr().flush(),
        }
        .map_err(Error::from_io_error)
    }
}
