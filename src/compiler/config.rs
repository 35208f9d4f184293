//! Configuration for compiled statement output

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a compile configuration
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read compile configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse compile configuration TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How auxiliary blocks are laid out in the `WITH` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLayout {
    /// One block per line group, bodies on their own lines
    #[default]
    Pretty,
    /// Everything on one line: `WITH a AS (...), b AS (...) final`
    Compact,
}

/// Configuration options for compiled output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    /// Block layout in the `WITH` clause
    pub layout: BlockLayout,

    /// Spaces added before each line of a block body (pretty layout only)
    pub indent: usize,

    /// Whether to trim surrounding whitespace from bodies before emission
    pub trim_bodies: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            layout: BlockLayout::Pretty,
            indent: 0,
            trim_bodies: true,
        }
    }
}

/// TOML structure for deserializing compile configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    output: Option<TomlOutput>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlOutput {
    layout: Option<BlockLayout>,
    indent: Option<usize>,
    trim_bodies: Option<bool>,
}

impl CompileConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    ///
    /// ```toml
    /// [output]
    /// layout = "compact"
    /// indent = 2
    /// trim_bodies = false
    /// ```
    ///
    /// Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigFileError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(output) = parsed.output {
            if let Some(layout) = output.layout {
                config.layout = layout;
            }
            if let Some(indent) = output.indent {
                config.indent = indent;
            }
            if let Some(trim) = output.trim_bodies {
                config.trim_bodies = trim;
            }
        }

        Ok(config)
    }

    /// Set the block layout
    pub fn with_layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the body indentation
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether bodies are trimmed
    pub fn with_trim_bodies(mut self, trim: bool) -> Self {
        self.trim_bodies = trim;
        self
    }
}
