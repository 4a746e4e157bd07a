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

//! A bridge to forward records from the `log` crate to a [`Logger`].

use crate::Logger;
use crate::level::LevelSet;

/// A [`log::Log`] implementation emitting every record through a logger.
///
/// Each `log` level maps to the nearest level of the logger's table:
///
/// | `log`   | level table                                  |
/// |---------|----------------------------------------------|
/// | `Error` | `ERROR`, `CRITICAL`, `FATAL`, else most severe |
/// | `Warn`  | `WARN`, else the warn level                  |
/// | `Info`  | `INFO`, else the default level               |
/// | `Debug` | `DEBUG`, `VERBOSE`, else the lowest level    |
/// | `Trace` | `TRACE`, `SILLY`, `SPAM`, else the lowest level |
#[derive(Debug)]
pub struct LogCrateBridge {
    logger: Logger,
    names: [String; 5],
}

impl LogCrateBridge {
    /// Bridge records to `logger`.
    pub fn new(logger: Logger) -> Self {
        let levels = logger.levels().clone();
        let most_severe = levels.iter().next().unwrap_or(levels.default_level()).name();
        let names = [
            nearest(&levels, &["ERROR", "CRITICAL", "FATAL"], most_severe),
            nearest(&levels, &["WARN"], levels.warn_level().name()),
            nearest(&levels, &["INFO"], levels.default_level().name()),
            nearest(&levels, &["DEBUG", "VERBOSE"], levels.lowest_level().name()),
            nearest(&levels, &["TRACE", "SILLY", "SPAM"], levels.lowest_level().name()),
        ];
        Self { logger, names }
    }

    /// The level name a `log` level maps to.
    pub fn level_name(&self, level: log::Level) -> &str {
        &self.names[level as usize - 1]
    }
}

fn nearest(levels: &LevelSet, candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .find(|name| levels.contains(name))
        .copied()
        .unwrap_or(fallback)
        .to_owned()
}

impl log::Log for LogCrateBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger
            .at(self.level_name(metadata.level()))
            .is_ok_and(|builder| builder.meets_threshold())
    }

    fn log(&self, record: &log::Record) {
        let Ok(builder) = self.logger.at(self.level_name(record.level())) else {
            return;
        };
        if !builder.meets_threshold() {
            return;
        }

        let mut data = serde_json::Map::new();
        data.insert("target".to_owned(), record.target().into());
        if let Some(module) = record.module_path() {
            data.insert("module".to_owned(), module.into());
        }
        builder.text(record.args()).data(data).emit();
    }

    fn flush(&self) {
        if let Err(err) = self.logger.mgr().flush() {
            self.logger.mgr().trap(&err);
        }
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] with a [`LogCrateBridge`] over `logger`, and
/// sets the global maximum log level to `Trace`. To override this, call [`log::set_max_level`]
/// after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate(logger: Logger) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogCrateBridge::new(logger)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate(logger: Logger) {
    try_setup_log_crate(logger).expect(
        "logmgr::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogMgr;

    #[tokio::test]
    async fn maps_to_nearest_levels() {
        let mgr = LogMgr::new(LevelSet::cli());
        let bridge = LogCrateBridge::new(mgr.get_logger().await.unwrap());
        assert_eq!(bridge.level_name(log::Level::Error), "ERROR");
        assert_eq!(bridge.level_name(log::Level::Warn), "WARN");
        assert_eq!(bridge.level_name(log::Level::Info), "INFO");
        assert_eq!(bridge.level_name(log::Level::Debug), "DEBUG");
        assert_eq!(bridge.level_name(log::Level::Trace), "SILLY");

        let mgr = LogMgr::new(LevelSet::std());
        let bridge = LogCrateBridge::new(mgr.get_logger().await.unwrap());
        assert_eq!(bridge.level_name(log::Level::Trace), "TRACE");
        assert!(log::Log::enabled(
            &bridge,
            &log::Metadata::builder().level(log::Level::Warn).build()
        ));
        assert!(!log::Log::enabled(
            &bridge,
            &log::Metadata::builder().level(log::Level::Debug).build()
        ));
    }
}
