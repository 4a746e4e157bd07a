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
use serde::Serialize;
use serde_json::Value;

use crate::Entry;
use crate::Error;
use crate::OutputFormat;
use crate::Render;
use crate::layout::Layout;
use crate::layout::LayoutContext;
use crate::layout::format_timestamp;

/// A JSON layout, one object per entry.
///
/// Output format:
///
/// ```json
/// {"time":"1.250s","level":"INFO","sid":"sid-1","reqIds":["r1"],"pkgs":["app"],"msg":"Connected","data":{"pool":4}}
/// ```
///
/// Hidden columns of the transport's [`DisplayOptions`](crate::DisplayOptions) are omitted.
/// Messages are always rendered without styles.
#[derive(Debug, Clone)]
pub struct JsonLayout {
    timezone: TimeZone,
}

impl Default for JsonLayout {
    fn default() -> Self {
        Self {
            timezone: TimeZone::system(),
        }
    }
}

impl JsonLayout {
    /// Set the timezone for local timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }
}

#[derive(Debug, Serialize)]
struct EntryLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<&'a str>,
    #[serde(rename = "reqIds", skip_serializing_if = "<[String]>::is_empty")]
    req_ids: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pkgs: &'a [String],
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

impl Layout for JsonLayout {
    fn format(&self, entry: &Entry, ctx: &LayoutContext<'_>) -> Result<String, Error> {
        let show = ctx.show;
        let time = match (show.timestamp, entry.timestamp()) {
            (Some(format), Some(ts)) => Some(format_timestamp(ts, format, ctx, &self.timezone)),
            _ => None,
        };

        let line = EntryLine {
            time,
            level: show.level.is_visible().then(|| entry.level()),
            sid: if show.sid { entry.session_id() } else { None },
            req_ids: if show.req_id.is_visible() {
                entry.request_ids()
            } else {
                &[]
            },
            pkgs: if show.pkg.is_visible() {
                entry.packages()
            } else {
                &[]
            },
            msg: entry.message().format(false, OutputFormat::Json),
            data: if show.data { entry.data() } else { None },
        };

        serde_json::to_string(&line).map_err(Error::from_json_error)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;

    use super::*;
    use crate::DisplayOptions;
    use crate::Fragment;
    use crate::level::LevelSet;

    #[test]
    fn json_line() {
        let levels = LevelSet::min();
        let show = DisplayOptions::default();
        let ctx = LayoutContext {
            levels: &levels,
            show: &show,
            threshold: 2,
            epoch: Timestamp::from_second(1_700_000_000).unwrap(),
            color: true,
        };
        let entry = Entry::new(
            "WARN",
            vec![Fragment::plain("disk"), Fragment::plain("low")],
        )
        .with_timestamp(Timestamp::from_millisecond(1_700_000_000_500).unwrap())
        .with_packages(vec!["app".to_owned()])
        .with_data(Some(json!({"free": "1G"})));

        insta::assert_snapshot!(
            JsonLayout::default().format(&entry, &ctx).unwrap(),
            @r#"{"time":"0.500s","level":"WARN","pkgs":["app"],"msg":"disk low","data":{"free":"1G"}}"#
        );
    }
}
