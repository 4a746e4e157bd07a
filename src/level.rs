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

//! Level tables and direction-aware threshold comparison.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;

/// A function that decorates a level name, typically with terminal colors.
pub type LevelFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A level given either by name or by numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LevelRef {
    /// A level name, matched case-insensitively.
    Name(String),
    /// A numeric level value.
    Value(i32),
}

impl fmt::Display for LevelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelRef::Name(name) => f.write_str(name),
            LevelRef::Value(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for LevelRef {
    fn from(name: &str) -> Self {
        LevelRef::Name(name.to_owned())
    }
}

impl From<String> for LevelRef {
    fn from(name: String) -> Self {
        LevelRef::Name(name)
    }
}

impl From<&String> for LevelRef {
    fn from(name: &String) -> Self {
        LevelRef::Name(name.clone())
    }
}

impl From<i32> for LevelRef {
    fn from(value: i32) -> Self {
        LevelRef::Value(value)
    }
}

/// Whether a bigger number means a more severe level or a less severe one.
///
/// The variants name the numeric order of severity, not the declaration order. Tables are declared
/// from the most severe level down, so a table whose values grow with declaration order, like
/// [`LevelSet::min`], is `Descending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A bigger number is more severe, e.g. OpenTelemetry severities.
    Ascending,
    /// A smaller number is more severe, e.g. syslog severities.
    Descending,
}

/// One named severity of a [`LevelSet`].
#[derive(Clone)]
pub struct LevelDef {
    name: String,
    value: i32,
    default: bool,
    lowest: bool,
    warn: bool,
    flush: bool,
    formatter: Option<LevelFormatter>,
}

impl fmt::Debug for LevelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelDef")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("default", &self.default)
            .field("lowest", &self.lowest)
            .field("warn", &self.warn)
            .field("flush", &self.flush)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl LevelDef {
    /// Create a level with the given name and value. The name is stored uppercase.
    pub fn new(name: impl AsRef<str>, value: i32) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            value,
            default: false,
            lowest: false,
            warn: false,
            flush: false,
            formatter: None,
        }
    }

    /// Mark this level as the default threshold of the table.
    pub fn default_level(mut self) -> Self {
        self.default = true;
        self
    }

    /// Mark this level as the least severe level of the table.
    pub fn lowest(mut self) -> Self {
        self.lowest = true;
        self
    }

    /// Mark this level as the one used for warnings raised by the manager itself.
    pub fn warn(mut self) -> Self {
        self.warn = true;
        self
    }

    /// Entries at this level flush the transports immediately.
    pub fn flush(mut self) -> Self {
        self.flush = true;
        self
    }

    /// Set the formatter applied by [`LevelSet::apply_colors`].
    pub fn formatter(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(f));
        self
    }

    /// The uppercase name of this level.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The numeric value of this level.
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Whether entries at this level trigger a flush.
    pub fn is_flush_eligible(&self) -> bool {
        self.flush
    }
}

/// An immutable table of levels.
///
/// The comparison direction is inferred once, from the first and the last declared level.
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<LevelDef>,
    by_name: HashMap<String, usize>,
    by_value: HashMap<i32, usize>,
    direction: Direction,
    default: usize,
    lowest: usize,
    warn: usize,
}

impl LevelSet {
    /// Build a level table from levels in declaration order.
    ///
    /// # Errors
    ///
    /// Return a [`ErrorKind::Config`] error if the table is empty, has duplicate names or values,
    /// is not declared monotonically, lacks a default level, or flags more than one default,
    /// lowest or warn level.
    pub fn new(levels: impl IntoIterator<Item = LevelDef>) -> Result<LevelSet, Error> {
        let levels = levels.into_iter().collect::<Vec<_>>();
        let (Some(first), Some(last)) = (levels.first(), levels.last()) else {
            return Err(Error::new(ErrorKind::Config, "level table is empty"));
        };
        // Tables are declared from the most severe level down to the least severe one.
        let direction = if first.value > last.value {
            Direction::Ascending
        } else {
            Direction::Descending
        };

        let mut by_name = HashMap::with_capacity(levels.len());
        let mut by_value = HashMap::with_capacity(levels.len());
        for (idx, level) in levels.iter().enumerate() {
            if by_name.insert(level.name.clone(), idx).is_some() {
                return Err(Error::new(ErrorKind::Config, "duplicate level name")
                    .with_context("level", &level.name));
            }
            if by_value.insert(level.value, idx).is_some() {
                return Err(Error::new(ErrorKind::Config, "duplicate level value")
                    .with_context("value", level.value));
            }
        }

        for pair in levels.windows(2) {
            let monotonic = match direction {
                Direction::Ascending => pair[0].value > pair[1].value,
                Direction::Descending => pair[0].value < pair[1].value,
            };
            if !monotonic {
                return Err(
                    Error::new(ErrorKind::Config, "levels are not declared monotonically")
                        .with_context("previous", &pair[0].name)
                        .with_context("next", &pair[1].name),
                );
            }
        }

        let default = single_flagged(&levels, "default", |l| l.default)?
            .ok_or_else(|| Error::new(ErrorKind::Config, "level table has no default level"))?;
        let lowest = single_flagged(&levels, "lowest", |l| l.lowest)?.unwrap_or(levels.len() - 1);
        let warn = single_flagged(&levels, "warn", |l| l.warn)?.unwrap_or(default);

        Ok(LevelSet {
            levels,
            by_name,
            by_value,
            direction,
            default,
            lowest,
            warn,
        })
    }

    /// The minimal table: ERROR, WARN, INFO, VERBOSE, DEBUG, TRACE and SPAM.
    pub fn min() -> LevelSet {
        LevelSet::new([
            LevelDef::new("ERROR", 0).flush(),
            LevelDef::new("WARN", 1).warn(),
            LevelDef::new("INFO", 2).default_level(),
            LevelDef::new("VERBOSE", 3),
            LevelDef::new("DEBUG", 4),
            LevelDef::new("TRACE", 5),
            LevelDef::new("SPAM", 6).lowest(),
        ])
        .expect("min level table is well-formed")
    }

    /// The standard table, adding FATAL and CRITICAL above ERROR.
    pub fn std() -> LevelSet {
        LevelSet::new([
            LevelDef::new("FATAL", 0).flush(),
            LevelDef::new("CRITICAL", 1).flush(),
            LevelDef::new("ERROR", 2).flush(),
            LevelDef::new("WARN", 3).warn(),
            LevelDef::new("INFO", 4).default_level(),
            LevelDef::new("VERBOSE", 5),
            LevelDef::new("DEBUG", 6),
            LevelDef::new("TRACE", 7),
            LevelDef::new("SPAM", 8).lowest(),
        ])
        .expect("std level table is well-formed")
    }

    /// The table used by command line tools.
    pub fn cli() -> LevelSet {
        LevelSet::new([
            LevelDef::new("ERROR", 0).flush(),
            LevelDef::new("WARN", 1).warn(),
            LevelDef::new("HELP", 2),
            LevelDef::new("DATA", 3),
            LevelDef::new("INFO", 4).default_level(),
            LevelDef::new("DEBUG", 5),
            LevelDef::new("PROMPT", 6),
            LevelDef::new("VERBOSE", 7),
            LevelDef::new("INPUT", 8),
            LevelDef::new("SILLY", 9).lowest(),
        ])
        .expect("cli level table is well-formed")
    }

    /// Look up one of the predefined tables by name: `std`, `cli` or `min`.
    pub fn named(name: &str) -> Result<LevelSet, Error> {
        match name.to_ascii_lowercase().as_str() {
            "std" => Ok(LevelSet::std()),
            "cli" => Ok(LevelSet::cli()),
            "min" => Ok(LevelSet::min()),
            _ => Err(Error::new(ErrorKind::Config, "unknown level table").with_context("name", name)),
        }
    }

    /// Return a copy of this table with a formatter attached to the given level.
    pub fn with_formatter(
        mut self,
        level: impl Into<LevelRef>,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Result<LevelSet, Error> {
        let idx = self.index_of(&level.into())?;
        self.levels[idx].formatter = Some(Arc::new(f));
        Ok(self)
    }

    /// The comparison direction of this table.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Iterate over the levels in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &LevelDef> {
        self.levels.iter()
    }

    /// Whether a level with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_uppercase())
    }

    /// The default threshold level.
    pub fn default_level(&self) -> &LevelDef {
        &self.levels[self.default]
    }

    /// The least severe level.
    pub fn lowest_level(&self) -> &LevelDef {
        &self.levels[self.lowest]
    }

    /// The level used for warnings raised by the manager itself.
    pub fn warn_level(&self) -> &LevelDef {
        &self.levels[self.warn]
    }

    /// Resolve a name or value to the canonical level value.
    pub fn as_value(&self, level: impl Into<LevelRef>) -> Result<i32, Error> {
        let idx = self.index_of(&level.into())?;
        Ok(self.levels[idx].value)
    }

    /// Resolve a value or name to the canonical uppercase level name.
    pub fn as_name(&self, level: impl Into<LevelRef>) -> Result<&str, Error> {
        let idx = self.index_of(&level.into())?;
        Ok(&self.levels[idx].name)
    }

    /// Whether `level` is at least as severe as `threshold`.
    pub fn meets_threshold(
        &self,
        level: impl Into<LevelRef>,
        threshold: impl Into<LevelRef>,
    ) -> Result<bool, Error> {
        let level = self.as_value(level)?;
        let threshold = self.as_value(threshold)?;
        Ok(self.meets_value(level, threshold))
    }

    pub(crate) fn meets_value(&self, level: i32, threshold: i32) -> bool {
        match self.direction {
            Direction::Ascending => level >= threshold,
            Direction::Descending => level <= threshold,
        }
    }

    /// Whether entries at `level` trigger a flush. Unknown levels never do.
    pub fn meets_flush_threshold(&self, level: impl Into<LevelRef>) -> bool {
        self.index_of(&level.into())
            .map(|idx| self.levels[idx].flush)
            .unwrap_or(false)
    }

    /// The longest level name among the levels that meet `threshold`.
    pub fn max_width(&self, threshold: i32) -> usize {
        self.levels
            .iter()
            .filter(|l| self.meets_value(l.value, threshold))
            .map(|l| l.name.len())
            .max()
            .unwrap_or_default()
    }

    /// Run the formatter of `level` over `text`, if it has one.
    pub fn apply_colors(&self, text: &str, level: impl Into<LevelRef>) -> String {
        match self.index_of(&level.into()) {
            Ok(idx) => match &self.levels[idx].formatter {
                Some(f) => f(text),
                None => text.to_owned(),
            },
            Err(_) => text.to_owned(),
        }
    }

    fn index_of(&self, level: &LevelRef) -> Result<usize, Error> {
        let found = match level {
            LevelRef::Name(name) => self.by_name.get(&name.to_uppercase()),
            LevelRef::Value(value) => self.by_value.get(value),
        };
        found.copied().ok_or_else(|| Error::unknown_level(level))
    }
}

fn single_flagged(
    levels: &[LevelDef],
    flag: &'static str,
    pred: impl Fn(&LevelDef) -> bool,
) -> Result<Option<usize>, Error> {
    let mut found = None;
    for (idx, level) in levels.iter().enumerate() {
        if pred(level) {
            if found.is_some() {
                return Err(Error::new(ErrorKind::Config, "level flag set more than once")
                    .with_context("flag", flag)
                    .with_context("level", &level.name));
            }
            found = Some(idx);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otel() -> LevelSet {
        LevelSet::new([
            LevelDef::new("error", 17).flush(),
            LevelDef::new("warn", 13).warn(),
            LevelDef::new("info", 9).default_level(),
            LevelDef::new("debug", 5),
            LevelDef::new("trace", 1),
        ])
        .unwrap()
    }

    #[test]
    fn min_table_scenario() {
        let levels = LevelSet::min();
        assert_eq!(levels.direction(), Direction::Descending);
        assert_eq!(levels.as_value("info").unwrap(), 2);
        assert!(levels.meets_threshold(2, 4).unwrap());
        assert!(!levels.meets_threshold("SPAM", "DEBUG").unwrap());
        assert!(levels.meets_flush_threshold("ERROR"));
        assert!(!levels.meets_flush_threshold("INFO"));
    }

    #[test]
    fn direction_invariance() {
        for levels in [LevelSet::min(), LevelSet::std(), LevelSet::cli(), otel()] {
            for a in levels.iter() {
                for b in levels.iter() {
                    let expected = match levels.direction() {
                        Direction::Ascending => a.value() >= b.value(),
                        Direction::Descending => a.value() <= b.value(),
                    };
                    assert_eq!(
                        levels.meets_threshold(a.name(), b.name()).unwrap(),
                        expected,
                        "{} vs {}",
                        a.name(),
                        b.name()
                    );
                }
            }
        }
        assert_eq!(otel().direction(), Direction::Ascending);
        assert!(otel().meets_threshold("error", "info").unwrap());
        assert!(!otel().meets_threshold("debug", "info").unwrap());
    }

    #[test]
    fn names_round_trip_uppercase() {
        let levels = LevelSet::cli();
        for name in ["error", "Warn", "silly", "PROMPT"] {
            let value = levels.as_value(name).unwrap();
            assert_eq!(levels.as_name(value).unwrap(), name.to_uppercase());
        }
    }

    #[test]
    fn unknown_levels_are_rejected() {
        let levels = LevelSet::min();
        assert_eq!(
            levels.as_value("loud").unwrap_err().kind(),
            ErrorKind::UnknownLevel
        );
        assert_eq!(levels.as_name(42).unwrap_err().kind(), ErrorKind::UnknownLevel);
        assert!(levels.meets_threshold("INFO", 99).is_err());
        assert!(!levels.meets_flush_threshold("loud"));
    }

    #[test]
    fn derived_levels() {
        let levels = LevelSet::std();
        assert_eq!(levels.default_level().name(), "INFO");
        assert_eq!(levels.lowest_level().name(), "SPAM");
        assert_eq!(levels.warn_level().name(), "WARN");

        let bare = LevelSet::new([LevelDef::new("a", 0), LevelDef::new("b", 1).default_level()])
            .unwrap();
        assert_eq!(bare.lowest_level().name(), "B");
        assert_eq!(bare.warn_level().name(), "B");
    }

    #[test]
    fn max_width_respects_threshold() {
        let levels = LevelSet::min();
        assert_eq!(levels.max_width(levels.as_value("INFO").unwrap()), 5);
        assert_eq!(levels.max_width(levels.as_value("VERBOSE").unwrap()), 7);
        assert_eq!(levels.max_width(levels.as_value("ERROR").unwrap()), 5);
    }

    #[test]
    fn apply_colors_uses_formatter() {
        let levels = LevelSet::min()
            .with_formatter("warn", |s| format!("<{s}>"))
            .unwrap();
        assert_eq!(levels.apply_colors("WARN", "WARN"), "<WARN>");
        assert_eq!(levels.apply_colors("INFO", "INFO"), "INFO");
    }

    #[test]
    fn malformed_tables_are_config_errors() {
        let cases = [
            vec![],
            vec![
                LevelDef::new("a", 0).default_level(),
                LevelDef::new("A", 1),
            ],
            vec![
                LevelDef::new("a", 0).default_level(),
                LevelDef::new("b", 0),
            ],
            vec![
                LevelDef::new("a", 0).default_level(),
                LevelDef::new("b", 5),
                LevelDef::new("c", 2),
            ],
            vec![LevelDef::new("a", 0), LevelDef::new("b", 1)],
            vec![
                LevelDef::new("a", 0).default_level(),
                LevelDef::new("b", 1).default_level(),
            ],
        ];
        for levels in cases {
            let err = LevelSet::new(levels).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{err}");
        }
    }

    #[test]
    fn named_tables() {
        assert!(LevelSet::named("CLI").unwrap().contains("silly"));
        assert_eq!(
            LevelSet::named("syslog").unwrap_err().kind(),
            ErrorKind::Config
        );
    }
}
