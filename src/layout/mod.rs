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

//! Layouts for formatting entries into lines.

use std::fmt;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::DisplayOptions;
use crate::Entry;
use crate::Error;
use crate::display::TimestampFormat;
use crate::level::LevelSet;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::TextLayout;

/// Everything a layout may consult besides the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    /// The level table of the manager.
    pub levels: &'a LevelSet,
    /// The display options of the transport.
    pub show: &'a DisplayOptions,
    /// The threshold of the transport, used for level column alignment.
    pub threshold: i32,
    /// When the manager was created, for elapsed timestamps.
    pub epoch: Timestamp,
    /// Whether styles and level colors apply.
    pub color: bool,
}

/// A layout for formatting entries.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Format an entry into one line, without a trailing newline.
    fn format(&self, entry: &Entry, ctx: &LayoutContext<'_>) -> Result<String, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

pub(crate) fn format_timestamp(
    ts: Timestamp,
    format: TimestampFormat,
    ctx: &LayoutContext<'_>,
    tz: &TimeZone,
) -> String {
    match format {
        TimestampFormat::Utc => format!("{ts:.3}"),
        TimestampFormat::Local => format!("{:.3}", ts.display_with_offset(tz.to_offset(ts))),
        TimestampFormat::Elapsed => {
            let secs = ts.duration_since(ctx.epoch).as_secs_f64();
            format!("{secs:.3}s")
        }
    }
}
