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

//! Display options handed to transports.
//!
//! The manager stores and propagates these options; only layouts interpret them.

use serde::Deserialize;
use serde::Serialize;

/// Visibility and width of one column of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ColumnRepr", into = "ColumnRepr")]
pub enum Column {
    /// The column is not rendered.
    Hidden,
    /// The column is rendered with its natural width.
    #[default]
    Shown,
    /// The column is padded or truncated to the given width.
    Width(usize),
}

impl Column {
    /// Whether the column is rendered at all.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Column::Hidden)
    }
}

impl From<bool> for Column {
    fn from(show: bool) -> Self {
        if show { Column::Shown } else { Column::Hidden }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnRepr {
    Flag(bool),
    Width(usize),
}

impl From<ColumnRepr> for Column {
    fn from(repr: ColumnRepr) -> Self {
        match repr {
            ColumnRepr::Flag(show) => Column::from(show),
            ColumnRepr::Width(width) => Column::Width(width),
        }
    }
}

impl From<Column> for ColumnRepr {
    fn from(column: Column) -> Self {
        match column {
            Column::Hidden => ColumnRepr::Flag(false),
            Column::Shown => ColumnRepr::Flag(true),
            Column::Width(width) => ColumnRepr::Width(width),
        }
    }
}

/// How timestamps are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    /// ISO 8601 in UTC.
    Utc,
    /// ISO 8601 in the system timezone.
    Local,
    /// Seconds elapsed since the manager was created.
    Elapsed,
}

/// Which parts of an entry transports should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayOptions {
    /// The level column.
    pub level: Column,
    /// The timestamp column, if any.
    pub timestamp: Option<TimestampFormat>,
    /// Whether to render the session id.
    pub sid: bool,
    /// The request id column.
    pub req_id: Column,
    /// The package column.
    pub pkg: Column,
    /// Whether to render structured data.
    pub data: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            level: Column::Shown,
            timestamp: Some(TimestampFormat::Elapsed),
            sid: true,
            req_id: Column::Shown,
            pkg: Column::Shown,
            data: true,
        }
    }
}

impl DisplayOptions {
    /// Options rendering only the level and the message.
    pub fn minimal() -> Self {
        Self {
            level: Column::Shown,
            timestamp: None,
            sid: false,
            req_id: Column::Hidden,
            pkg: Column::Hidden,
            data: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_mixed_columns() {
        let opts: DisplayOptions = serde_json::from_str(
            r#"{"level": 7, "timestamp": "utc", "sid": false, "reqId": false, "pkg": 12}"#,
        )
        .unwrap();
        assert_eq!(opts.level, Column::Width(7));
        assert_eq!(opts.timestamp, Some(TimestampFormat::Utc));
        assert!(!opts.sid);
        assert_eq!(opts.req_id, Column::Hidden);
        assert_eq!(opts.pkg, Column::Width(12));
        assert!(opts.data);
    }

    #[test]
    fn serialize_columns_as_flags_or_widths() {
        let json = serde_json::to_value(DisplayOptions::minimal()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "level": true,
                "timestamp": null,
                "sid": false,
                "reqId": false,
                "pkg": false,
                "data": false,
            })
        );
    }
}
