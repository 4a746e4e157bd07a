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

//! Declarative configuration for a [`LogMgr`](crate::LogMgr).

use serde::Deserialize;
use serde::Serialize;

use crate::DisplayOptions;
use crate::Error;
use crate::ErrorKind;

/// Manager settings loaded from JSON or environment variables.
///
/// Apply with [`LogMgrBuilder::config`](crate::LogMgrBuilder::config).
///
/// ```
/// use logmgr::config::LogConfig;
///
/// let config = LogConfig::from_json(r#"{"levels":"cli","threshold":"debug","show":{"sid":false}}"#)
///     .unwrap();
/// assert_eq!(config.levels.as_deref(), Some("cli"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// The name of a predefined level table: `std`, `cli` or `min`.
    pub levels: Option<String>,
    /// The name of the global threshold level.
    pub threshold: Option<String>,
    /// The display options given to transports.
    pub show: Option<DisplayOptions>,
}

impl LogConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<LogConfig, Error> {
        serde_json::from_str(json).map_err(|err| {
            Error::new(ErrorKind::Config, "malformed log configuration").with_source(err)
        })
    }

    /// Read `<PREFIX>_LEVELS` (level table), `<PREFIX>_LEVEL` (threshold) and `<PREFIX>_SHOW`
    /// (display options as JSON) from the environment.
    ///
    /// Unset variables leave the corresponding field empty.
    pub fn from_env(prefix: &str) -> Result<LogConfig, Error> {
        LogConfig::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LogConfig, Error> {
        let prefix = prefix.to_ascii_uppercase();
        let show = match lookup(&format!("{prefix}_SHOW")) {
            Some(json) => Some(serde_json::from_str(&json).map_err(|err| {
                Error::new(ErrorKind::Config, "malformed display options")
                    .with_context("variable", format!("{prefix}_SHOW"))
                    .with_source(err)
            })?),
            None => None,
        };

        Ok(LogConfig {
            levels: lookup(&format!("{prefix}_LEVELS")),
            threshold: lookup(&format!("{prefix}_LEVEL")),
            show,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::LogMgr;
    use crate::display::Column;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = LogConfig::from_lookup(
            "app",
            env(&[
                ("APP_LEVELS", "min"),
                ("APP_LEVEL", "verbose"),
                ("APP_SHOW", r#"{"pkg":12,"timestamp":null}"#),
                ("OTHER_LEVEL", "spam"),
            ]),
        )
        .unwrap();

        assert_eq!(config.levels.as_deref(), Some("min"));
        assert_eq!(config.threshold.as_deref(), Some("verbose"));
        let show = config.show.unwrap();
        assert_eq!(show.pkg, Column::Width(12));
        assert_eq!(show.timestamp, None);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = LogConfig::from_lookup("app", env(&[("APP_SHOW", "{")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = LogConfig::from_json(r#"{"color":true}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn configures_builder() {
        let config = LogConfig::from_json(r#"{"levels":"cli","threshold":"prompt"}"#).unwrap();
        let mgr = LogMgr::builder().config(config).unwrap().build().unwrap();
        assert_eq!(mgr.threshold(), 6);
        assert!(mgr.levels().contains("SILLY"));

        let config = LogConfig::from_json(r#"{"levels":"syslog"}"#).unwrap();
        let err = LogMgr::builder().config(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
