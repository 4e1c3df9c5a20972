//! Engine configuration

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid module name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown engine '{0}'")]
    UnknownEngine(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// `htmlEncode(..)` rather than `HtmlEncode(..)` helper names.
    #[serde(default)]
    pub camel_case: bool,
    /// Drop literals that consist of a single line break.
    #[serde(default = "default_true")]
    pub skip_excessive_new_lines: bool,
    #[serde(default = "default_extension")]
    pub template_extension: String,
    #[serde(default = "default_index")]
    pub index_file: String,
    /// Root for `~/...` includes.
    #[serde(default)]
    pub library_root: Option<PathBuf>,
    /// Overrides the target's module name grammar.
    #[serde(default)]
    pub module_name_pattern: Option<String>,
    /// Module used when a template declares none.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
    /// Parameter type of the generated render method.
    #[serde(default)]
    pub model_type: Option<String>,
}

fn default_true() -> bool { true }
fn default_extension() -> String { ".blade".to_string() }
fn default_index() -> String { "index.blade".to_string() }
fn default_max_include_depth() -> usize { 32 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            camel_case: false,
            skip_excessive_new_lines: true,
            template_extension: default_extension(),
            index_file: default_index(),
            library_root: None,
            module_name_pattern: None,
            namespace: None,
            max_include_depth: default_max_include_depth(),
            model_type: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Module grammar from `module_name_pattern`, or `fallback`.
    pub fn module_grammar(&self, fallback: &IdentifierGrammar) -> Result<IdentifierGrammar, ConfigError> {
        match &self.module_name_pattern {
            Some(pattern) => IdentifierGrammar::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }),
            None => Ok(fallback.clone()),
        }
    }
}

static CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("class name pattern"));

static DOTTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?[A-Za-z_]\w*(\.@?[A-Za-z_]\w*)*$").expect("dotted name pattern")
});

/// Identifier rule a declared module or class name must satisfy.
#[derive(Debug, Clone)]
pub struct IdentifierGrammar {
    pattern: Regex,
}

impl IdentifierGrammar {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(pattern)? })
    }

    /// Plain identifiers: letters, digits and `_`, not starting with a digit.
    pub fn class_name() -> Self {
        Self { pattern: CLASS_NAME.clone() }
    }

    /// Dot separated identifiers, each optionally prefixed with `@`.
    pub fn dotted() -> Self {
        Self { pattern: DOTTED_NAME.clone() }
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for IdentifierGrammar {
    fn default() -> Self {
        Self::dotted()
    }
}
