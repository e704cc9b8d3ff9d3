use anyhow::Result;
use serde::Deserialize;
use std::fs;

use crate::decompiler::{DecompileOptions, Translator};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "unrpy.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub translation: Option<Translator>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
    #[serde(default)]
    pub base_indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
            base_indent: 0,
        }
    }
}

fn default_indent_width() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Ren'Py 6.99 and later give images init priority 500 instead of 990
    #[serde(default = "default_modern_image_priority")]
    pub modern_image_priority: bool,
    /// Elect and emit an `init offset` statement
    #[serde(default)]
    pub init_offset: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            modern_image_priority: default_modern_image_priority(),
            init_offset: false,
        }
    }
}

fn default_modern_image_priority() -> bool {
    true
}

impl Config {
    pub fn decompile_options(&self) -> DecompileOptions {
        DecompileOptions {
            indent_width: self.output.indent_width,
            base_indent: self.output.base_indent,
            modern_image_priority: self.engine.modern_image_priority,
            set_init_offset: self.engine.init_offset,
        }
    }
}

/// Load and parse an unrpy.toml configuration file
pub fn load_config(path: &str) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("could not find config file `{}`", path)
            } else {
                anyhow::anyhow!("failed to read `{}`: {}", path, e)
            }
        })?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse `{}`: {}", path, e))?;

    validate_indent_width(config.output.indent_width)
        .map_err(|e| anyhow::anyhow!("invalid `{}`: {}", path, e))?;

    Ok(config)
}

/// Indentation must be between 1 and 8 spaces
pub fn validate_indent_width(width: usize) -> Result<()> {
    if !(1..=8).contains(&width) {
        anyhow::bail!("indent_width must be between 1 and 8, got {}", width);
    }
    Ok(())
}
