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

//! Logmgr is a structured logging core: leveled, context-tagged messages are built through a
//! chainable builder, filtered against thresholds, and dispatched to transports.
//!
//! # Overview
//!
//! A [`LogMgr`] owns a [`LevelSet`](level::LevelSet), a global threshold and a set of
//! [transports](transport). It hands out a root [`Logger`]; loggers derive children that
//! accumulate a session id, request ids and packages. Each log call creates a
//! [`MessageBuilder`] at one level, chains styled fragments and data onto it, and emits an
//! [`Entry`]. Entries are queued until every transport is ready, then dispatched in order.
//!
//! # Examples
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), logmgr::Error> {
//! use logmgr::ChildParams;
//! use logmgr::LogMgr;
//! use logmgr::level::LevelSet;
//!
//! let mgr = LogMgr::builder()
//!     .levels(LevelSet::std())
//!     .threshold("verbose")
//!     .build()?;
//! let root = mgr.get_logger().await?;
//! let log = root.child(ChildParams::new().pkg("db").req_id("r-17"));
//!
//! let mark = log.mark();
//! log.at("info")?.action("connect").path("/var/run/db.sock").emit();
//! log.at("verbose")?.label("pool").value(4).ewt(&mark, false)?;
//!
//! mgr.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Typed loggers expose one method per level:
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), logmgr::Error> {
//! use logmgr::LogMgr;
//! use logmgr::flavor::StdLogger;
//! use logmgr::level::LevelSet;
//!
//! let mgr = LogMgr::new(LevelSet::std());
//! let log = StdLogger::new(mgr.get_logger().await?)?;
//! log.critical().error("disk failure").emit();
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod color;
pub mod config;
pub mod display;
pub mod flavor;
pub mod layout;
pub mod level;
pub mod transport;
pub mod trap;

#[cfg(feature = "bridge-log")]
pub mod bridge;

mod builder;
mod entry;
mod error;
mod logger;
mod manager;
mod utils;

pub use self::builder::BuilderFactory;
pub use self::builder::BuilderParams;
pub use self::builder::Elapsed;
pub use self::builder::MessageBuilder;
pub use self::display::DisplayOptions;
pub use self::entry::Entry;
pub use self::entry::Fragment;
pub use self::entry::Message;
pub use self::entry::OutputFormat;
pub use self::entry::Render;
pub use self::entry::Style;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::logger::ChildParams;
pub use self::logger::Logger;
pub use self::logger::MarkId;
pub use self::manager::LogMgr;
pub use self::manager::LogMgrBuilder;
