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

use jiff::tz::TimeZone;

use crate::Entry;
use crate::Error;
use crate::OutputFormat;
use crate::Render;
use crate::display::Column;
use crate::layout::Layout;
use crate::layout::LayoutContext;
use crate::layout::format_timestamp;

/// A text layout with aligned, optionally colored columns.
///
/// Output format:
///
/// ```text
/// 0.012s INFO    sid-1 r1.r2 app.db Connected to postgres {"pool":4}
/// ```
///
/// Which columns appear, and their widths, follow the transport's
/// [`DisplayOptions`](crate::DisplayOptions).
#[derive(Debug, Clone)]
pub struct TextLayout {
    timezone: TimeZone,
    separator: &'static str,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            timezone: TimeZone::system(),
            separator: ".",
        }
    }
}

impl TextLayout {
    /// Set the timezone for local timestamps.
    ///
    /// Defaults to the system timezone if not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use logmgr::layout::TextLayout;
    ///
    /// let layout = TextLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// Set the separator used when joining request ids and packages. Default to `.`.
    pub fn separator(mut self, separator: &'static str) -> Self {
        self.separator = separator;
        self
    }
}

fn fit(text: String, column: Column, natural: usize) -> Option<String> {
    match column {
        Column::Hidden => None,
        Column::Shown => Some(format!("{text:<natural$}")),
        Column::Width(width) => {
            let text = text.chars().take(width).collect::<String>();
            Some(format!("{text:<width$}"))
        }
    }
}

impl Layout for TextLayout {
    fn format(&self, entry: &Entry, ctx: &LayoutContext<'_>) -> Result<String, Error> {
        let show = ctx.show;
        let mut columns = Vec::with_capacity(7);

        if let (Some(format), Some(ts)) = (show.timestamp, entry.timestamp()) {
            columns.push(format_timestamp(ts, format, ctx, &self.timezone));
        }

        let width = ctx.levels.max_width(ctx.threshold);
        if let Some(level) = fit(entry.level().to_owned(), show.level, width) {
            if ctx.color {
                columns.push(ctx.levels.apply_colors(&level, entry.level()));
            } else {
                columns.push(level);
            }
        }

        if show.sid {
            if let Some(sid) = entry.session_id() {
                columns.push(sid.to_owned());
            }
        }

        if !entry.request_ids().is_empty() {
            let ids = entry.request_ids().join(self.separator);
            columns.extend(fit(ids, show.req_id, 0));
        }

        if !entry.packages().is_empty() {
            let packages = entry.packages().join(self.separator);
            columns.extend(fit(packages, show.pkg, 0));
        }

        columns.push(entry.message().format(ctx.color, OutputFormat::Text));

        if show.data {
            if let Some(data) = entry.data() {
                columns.push(serde_json::to_string(data).map_err(Error::from_json_error)?);
            }
        }

        Ok(columns.join(" "))
    }
}
