//! The terminal option bag and its dynamic name-based access.
//!
//! `TerminalOptions` is what the host passes at construction. Field wire names
//! are camelCase so an options object serialized by a web host deserializes
//! unchanged. Names outside the declared set are kept in `extensions` and are
//! never rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{CursorStyle, Theme};

/// Dynamically-typed option value as it crosses the host boundary.
pub type OptionValue = serde_json::Value;

/// Declared options with a known type and default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionName {
    Cols,
    Rows,
    CursorBlink,
    CursorStyle,
    DisableStdin,
    WindowsMode,
    ConvertEol,
    AllowProposedApi,
    Scrollback,
    FontSize,
    FontFamily,
    LineHeight,
    LetterSpacing,
    Theme,
}

impl OptionName {
    /// Every declared option, in declaration order.
    pub const ALL: [OptionName; 14] = [
        OptionName::Cols,
        OptionName::Rows,
        OptionName::CursorBlink,
        OptionName::CursorStyle,
        OptionName::DisableStdin,
        OptionName::WindowsMode,
        OptionName::ConvertEol,
        OptionName::AllowProposedApi,
        OptionName::Scrollback,
        OptionName::FontSize,
        OptionName::FontFamily,
        OptionName::LineHeight,
        OptionName::LetterSpacing,
        OptionName::Theme,
    ];

    /// Wire name used by hosts and by the engine option interface.
    pub fn as_str(self) -> &'static str {
        match self {
            OptionName::Cols => "cols",
            OptionName::Rows => "rows",
            OptionName::CursorBlink => "cursorBlink",
            OptionName::CursorStyle => "cursorStyle",
            OptionName::DisableStdin => "disableStdin",
            OptionName::WindowsMode => "windowsMode",
            OptionName::ConvertEol => "convertEol",
            OptionName::AllowProposedApi => "allowProposedApi",
            OptionName::Scrollback => "scrollback",
            OptionName::FontSize => "fontSize",
            OptionName::FontFamily => "fontFamily",
            OptionName::LineHeight => "lineHeight",
            OptionName::LetterSpacing => "letterSpacing",
            OptionName::Theme => "theme",
        }
    }

    /// Look up a declared option by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.as_str() == name)
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a stored option: either declared or an inert host extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Known(OptionName),
    Extension(String),
}

impl OptionKey {
    /// Resolve a wire name to a key. Never fails.
    pub fn parse(name: &str) -> Self {
        match OptionName::from_name(name) {
            Some(known) => OptionKey::Known(known),
            None => OptionKey::Extension(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OptionKey::Known(name) => name.as_str(),
            OptionKey::Extension(name) => name,
        }
    }

    pub fn known(&self) -> Option<OptionName> {
        match self {
            OptionKey::Known(name) => Some(*name),
            OptionKey::Extension(_) => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option bag for a terminal instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOptions {
    /// Terminal width in columns
    #[serde(default = "crate::defaults::cols")]
    pub cols: u16,

    /// Terminal height in rows
    #[serde(default = "crate::defaults::rows")]
    pub rows: u16,

    #[serde(default)]
    pub cursor_blink: bool,

    #[serde(default)]
    pub cursor_style: CursorStyle,

    /// Drop host keystrokes instead of emitting them as input data
    #[serde(default)]
    pub disable_stdin: bool,

    /// Windows PTY (conpty) input translation
    #[serde(default)]
    pub windows_mode: bool,

    /// Translate bare `\n` to `\r\n` when writing to the engine
    #[serde(default)]
    pub convert_eol: bool,

    #[serde(default)]
    pub allow_proposed_api: bool,

    /// Lines kept above the viewport
    #[serde(default = "crate::defaults::scrollback")]
    pub scrollback: usize,

    #[serde(default = "crate::defaults::font_size")]
    pub font_size: f32,

    #[serde(default = "crate::defaults::font_family")]
    pub font_family: String,

    #[serde(default = "crate::defaults::line_height")]
    pub line_height: f32,

    #[serde(default = "crate::defaults::letter_spacing")]
    pub letter_spacing: f32,

    #[serde(default)]
    pub theme: Theme,

    /// Options outside the declared set, stored verbatim
    #[serde(flatten)]
    pub extensions: BTreeMap<String, OptionValue>,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            cols: crate::defaults::cols(),
            rows: crate::defaults::rows(),
            cursor_blink: false,
            cursor_style: CursorStyle::default(),
            disable_stdin: false,
            windows_mode: false,
            convert_eol: false,
            allow_proposed_api: false,
            scrollback: crate::defaults::scrollback(),
            font_size: crate::defaults::font_size(),
            font_family: crate::defaults::font_family(),
            line_height: crate::defaults::line_height(),
            letter_spacing: crate::defaults::letter_spacing(),
            theme: Theme::default(),
            extensions: BTreeMap::new(),
        }
    }
}

impl TerminalOptions {
    /// Parse a JSON options bag. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a YAML options document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load options from a YAML file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading terminal options from {:?}", path);
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        let options = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse options file {}", path.display()))?;
        Ok(options)
    }

    /// Read any option by wire name. Unknown names resolve through
    /// `extensions` and yield `None` when never set.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        match OptionKey::parse(name) {
            OptionKey::Known(known) => Some(self.value_of(known)),
            OptionKey::Extension(name) => self.extensions.get(&name).cloned(),
        }
    }

    /// Current value of a declared option.
    pub fn value_of(&self, name: OptionName) -> OptionValue {
        use serde_json::json;

        match name {
            OptionName::Cols => json!(self.cols),
            OptionName::Rows => json!(self.rows),
            OptionName::CursorBlink => json!(self.cursor_blink),
            OptionName::CursorStyle => json!(self.cursor_style),
            OptionName::DisableStdin => json!(self.disable_stdin),
            OptionName::WindowsMode => json!(self.windows_mode),
            OptionName::ConvertEol => json!(self.convert_eol),
            OptionName::AllowProposedApi => json!(self.allow_proposed_api),
            OptionName::Scrollback => json!(self.scrollback),
            OptionName::FontSize => json!(self.font_size),
            OptionName::FontFamily => json!(self.font_family),
            OptionName::LineHeight => json!(self.line_height),
            OptionName::LetterSpacing => json!(self.letter_spacing),
            OptionName::Theme => serde_json::to_value(&self.theme).unwrap_or_default(),
        }
    }

    /// Assign an option by wire name.
    ///
    /// Declared options are type-checked; extensions accept any value.
    pub fn assign(&mut self, name: &str, value: OptionValue) -> Result<OptionKey, ConfigError> {
        let key = OptionKey::parse(name);
        match &key {
            OptionKey::Known(known) => self.assign_known(*known, value)?,
            OptionKey::Extension(name) => {
                self.extensions.insert(name.clone(), value);
            }
        }
        Ok(key)
    }

    fn assign_known(&mut self, name: OptionName, value: OptionValue) -> Result<(), ConfigError> {
        match name {
            OptionName::Cols => self.cols = decode(name, value)?,
            OptionName::Rows => self.rows = decode(name, value)?,
            OptionName::CursorBlink => self.cursor_blink = decode(name, value)?,
            OptionName::CursorStyle => self.cursor_style = decode(name, value)?,
            OptionName::DisableStdin => self.disable_stdin = decode(name, value)?,
            OptionName::WindowsMode => self.windows_mode = decode(name, value)?,
            OptionName::ConvertEol => self.convert_eol = decode(name, value)?,
            OptionName::AllowProposedApi => self.allow_proposed_api = decode(name, value)?,
            OptionName::Scrollback => self.scrollback = decode(name, value)?,
            OptionName::FontSize => self.font_size = decode(name, value)?,
            OptionName::FontFamily => self.font_family = decode(name, value)?,
            OptionName::LineHeight => self.line_height = decode(name, value)?,
            OptionName::LetterSpacing => self.letter_spacing = decode(name, value)?,
            OptionName::Theme => self.theme = decode(name, value)?,
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(name: OptionName, value: OptionValue) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|source| ConfigError::InvalidValue {
        name: name.as_str().to_string(),
        source,
    })
}
