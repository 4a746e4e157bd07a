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

//! Terminal styling: level colors and message themes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use colored::Color;
use colored::Colorize;

use crate::Style;
use crate::level::LevelSet;

/// Colors for level names, attached to a [`LevelSet`] as level formatters.
#[derive(Debug, Clone)]
pub struct LevelColor {
    colors: Vec<(&'static str, Color)>,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            colors: vec![
                ("FATAL", Color::BrightRed),
                ("CRITICAL", Color::BrightRed),
                ("ERROR", Color::Red),
                ("WARN", Color::Yellow),
                ("HELP", Color::Cyan),
                ("DATA", Color::White),
                ("INFO", Color::Green),
                ("VERBOSE", Color::Cyan),
                ("DEBUG", Color::Blue),
                ("PROMPT", Color::BrightBlue),
                ("TRACE", Color::Magenta),
                ("INPUT", Color::BrightBlack),
                ("SPAM", Color::BrightBlack),
                ("SILLY", Color::BrightBlack),
            ],
        }
    }
}

impl LevelColor {
    /// Customize the color of a level. Names are matched case-insensitively.
    pub fn color(mut self, level: &'static str, color: Color) -> Self {
        match self
            .colors
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(level))
        {
            Some(entry) => entry.1 = color,
            None => self.colors.push((level, color)),
        }
        self
    }

    /// Attach a formatter to every level of `levels` that has a color.
    pub fn apply(&self, mut levels: LevelSet) -> LevelSet {
        for (name, color) in self.colors.iter().copied() {
            if levels.contains(name) {
                levels = levels
                    .with_formatter(name, move |s| s.color(color).to_string())
                    .expect("level exists");
            }
        }
        levels
    }
}

/// Named fragment styles used by the convenience methods of a message builder.
#[derive(Clone, Default)]
pub struct Theme {
    styles: HashMap<String, Style>,
}

impl fmt::Debug for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.styles.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Theme").field("styles", &names).finish()
    }
}

impl Theme {
    /// A theme without any style.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default colored theme.
    pub fn colored() -> Self {
        Theme::new()
            .with_style("h1", |s| s.bold().magenta().to_string())
            .with_style("h2", |s| s.magenta().to_string())
            .with_style("h3", |s| s.yellow().to_string())
            .with_style("action", |s| s.black().on_yellow().to_string())
            .with_style("label", |s| s.blue().to_string())
            .with_style("value", |s| s.green().to_string())
            .with_style("path", |s| s.underline().white().to_string())
            .with_style("date", |s| s.cyan().to_string())
            .with_style("warn", |s| s.bright_yellow().to_string())
            .with_style("error", |s| s.bold().bright_red().to_string())
            .with_style("strikethru", |s| s.strikethrough().to_string())
            .with_style("ewt", |s| s.dimmed().to_string())
    }

    /// Register or replace a named style.
    pub fn with_style(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.styles.insert(name.into(), Arc::new(f));
        self
    }

    /// Look up a named style.
    pub fn style(&self, name: &str) -> Option<Style> {
        self.styles.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_colors_attach_formatters() {
        colored::control::set_override(true);
        let levels = LevelColor::default()
            .color("info", Color::Cyan)
            .apply(LevelSet::min());
        assert_eq!(levels.apply_colors("INFO", "INFO"), "INFO".cyan().to_string());
        assert_eq!(levels.apply_colors("ERROR", "ERROR"), "ERROR".red().to_string());
        colored::control::unset_override();
    }

    #[test]
    fn theme_lookup() {
        let theme = Theme::new().with_style("h1", |s| format!("# {s}"));
        let h1 = theme.style("h1").unwrap();
        assert_eq!(h1("Title"), "# Title");
        assert!(theme.style("h2").is_none());
        assert!(Theme::colored().style("path").is_some());
    }
}
