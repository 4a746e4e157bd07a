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

//! Typed loggers with one method per level of a predefined table.

use std::ops::Deref;

use crate::Error;
use crate::ErrorKind;
use crate::Logger;
use crate::MessageBuilder;
use crate::logger::ChildParams;

macro_rules! flavor {
    (
        $(#[$meta:meta])*
        $name:ident { $($method:ident => $level:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            logger: Logger,
        }

        impl $name {
            /// The levels the accessor methods of this flavor need.
            pub const LEVELS: &'static [&'static str] = &[$($level),+];

            /// Wrap a logger.
            ///
            /// # Errors
            ///
            /// Return a [`ErrorKind::InvalidLoggerType`] error if the logger's level table lacks
            /// any of [`LEVELS`](Self::LEVELS).
            pub fn new(logger: Logger) -> Result<Self, Error> {
                let levels = logger.levels();
                if let Some(missing) = Self::LEVELS.iter().find(|l| !levels.contains(l)) {
                    return Err(Error::new(
                        ErrorKind::InvalidLoggerType,
                        concat!("level table does not provide every level of ", stringify!($name)),
                    )
                    .with_context("level", missing));
                }
                Ok(Self { logger })
            }

            /// The wrapped logger.
            pub fn logger(&self) -> &Logger {
                &self.logger
            }

            /// Unwrap the logger.
            pub fn into_logger(self) -> Logger {
                self.logger
            }

            /// Derive a child logger of the same flavor.
            pub fn child(&self, params: ChildParams) -> Self {
                Self {
                    logger: self.logger.child(params),
                }
            }

            $(
                #[doc = concat!("A message builder at `", $level, "`.")]
                ///
                /// # Panics
                ///
                /// Panic if the level table changed under this logger, which cannot happen for
                /// loggers created through [`new`](Self::new).
                pub fn $method(&self) -> MessageBuilder {
                    self.logger.builder_for($level)
                }
            )+
        }

        impl Deref for $name {
            type Target = Logger;

            fn deref(&self) -> &Logger {
                &self.logger
            }
        }

        impl TryFrom<Logger> for $name {
            type Error = Error;

            fn try_from(logger: Logger) -> Result<Self, Error> {
                $name::new(logger)
            }
        }
    };
}

flavor! {
    /// A logger over the [`std`](crate::level::LevelSet::std) table.
    StdLogger {
        fatal => "FATAL",
        critical => "CRITICAL",
        error => "ERROR",
        warn => "WARN",
        info => "INFO",
        verbose => "VERBOSE",
        debug => "DEBUG",
        trace => "TRACE",
        spam => "SPAM",
    }
}

flavor! {
    /// A logger over the [`cli`](crate::level::LevelSet::cli) table.
    CliLogger {
        error => "ERROR",
        warn => "WARN",
        help => "HELP",
        data => "DATA",
        info => "INFO",
        debug => "DEBUG",
        prompt => "PROMPT",
        verbose => "VERBOSE",
        input => "INPUT",
        silly => "SILLY",
    }
}

flavor! {
    /// A logger over the [`min`](crate::level::LevelSet::min) table.
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), logmgr::Error> {
    /// use logmgr::LogMgr;
    /// use logmgr::flavor::MinLogger;
    /// use logmgr::level::LevelSet;
    ///
    /// let mgr = LogMgr::new(LevelSet::min());
    /// let log = MinLogger::new(mgr.get_logger().await?)?;
    /// log.warn().text("disk almost full").emit();
    /// # Ok(())
    /// # }
    /// ```
    MinLogger {
        error => "ERROR",
        warn => "WARN",
        info => "INFO",
        verbose => "VERBOSE",
        debug => "DEBUG",
        trace => "TRACE",
        spam => "SPAM",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogMgr;
    use crate::level::LevelSet;

    #[tokio::test]
    async fn flavors_check_levels() {
        let mgr = LogMgr::new(LevelSet::min());
        let logger = mgr.get_logger().await.unwrap();

        let err = StdLogger::new(logger.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoggerType);
        assert!(CliLogger::try_from(logger.clone()).is_err());

        let log = MinLogger::new(logger).unwrap();
        assert_eq!(log.error().level(), "ERROR");
        assert!(log.error().meets_flush_threshold());
        assert!(log.info().meets_threshold());
        assert!(!log.spam().meets_threshold());
    }

    #[tokio::test]
    async fn std_table_supports_min_flavor() {
        let mgr = LogMgr::new(LevelSet::std());
        let logger = mgr.get_logger().await.unwrap();
        let log = MinLogger::new(logger).unwrap();
        let child = log.child(ChildParams::new().pkg("db"));
        assert_eq!(child.packages(), ["db"]);
        assert_eq!(child.warn().level(), "WARN");
    }
}
