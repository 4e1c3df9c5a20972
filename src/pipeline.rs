//! Compilation Pipeline - single entry point
//!
//! An [`Engine`] pairs one emitter with one loader. Every template it parses
//! is bound to the emitter's engine name, so a template written for another
//! target fails at its `<%@@ Name @@%>` declaration.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::{EngineConfig, IdentifierGrammar};
use crate::deps::MergeRule;
use crate::emitter::Emitter;
use crate::error::{DependencyError, ParseError};
use crate::hashing::compute_unit_hash;
use crate::loader::{FsLoader, TemplateLoader};
use crate::parser::{parse_template, scan_engine_name};
use crate::template::{Template, TemplateSettings};
use crate::ENGINE_VERSION;

/// A rendered template together with what it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledUnit {
    pub id: String,
    pub engine: String,
    pub engine_version: String,
    pub module: String,
    pub class: String,
    pub template_path: String,
    pub created_at: DateTime<Utc>,
    pub fingerprint: String,
    /// Included template paths, depth-first.
    pub includes: Vec<String>,
    pub source: String,
}

pub struct Engine {
    emitter: Box<dyn Emitter>,
    loader: Box<dyn TemplateLoader>,
}

impl Engine {
    /// Engine reading includes from the filesystem.
    pub fn new(emitter: impl Emitter + 'static) -> Self {
        Self::from_boxed(Box::new(emitter))
    }

    pub fn from_boxed(emitter: Box<dyn Emitter>) -> Self {
        Self {
            emitter,
            loader: Box::new(FsLoader),
        }
    }

    pub fn with_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn emitter(&self) -> &dyn Emitter {
        self.emitter.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        self.emitter.config()
    }

    pub fn parse(&self, source: &str, settings: TemplateSettings) -> Result<Template, ParseError> {
        debug!(engine = self.emitter.name(), path = %settings.path, "parsing template");
        parse_template(self.emitter.as_ref(), self.loader.as_ref(), source, settings, &[])
    }

    /// Parse a template file; its directory becomes the include root.
    pub fn parse_file(&self, path: &Path) -> Result<Template, ParseError> {
        let source = self
            .loader
            .read(path)
            .map_err(|source| ParseError::TemplateRead {
                path: path.display().to_string(),
                source,
            })?;
        self.parse(&source, TemplateSettings::for_file(path))
    }

    pub fn render(&self, template: &Template) -> String {
        self.emitter.render_unit(template)
    }

    pub fn compile(&self, source: &str, settings: TemplateSettings) -> Result<CompiledUnit, ParseError> {
        let template = self.parse(source, settings)?;
        Ok(self.compiled(&template))
    }

    pub fn compile_file(&self, path: &Path) -> Result<CompiledUnit, ParseError> {
        let template = self.parse_file(path)?;
        Ok(self.compiled(&template))
    }

    fn compiled(&self, template: &Template) -> CompiledUnit {
        let source = self.render(template);
        let engine = self.emitter.name().to_string();

        CompiledUnit {
            id: Uuid::new_v4().to_string(),
            fingerprint: compute_unit_hash(&engine, &template.full_class_name(), &source),
            engine,
            engine_version: ENGINE_VERSION.to_string(),
            module: template.module_name().to_string(),
            class: template.class_name().to_string(),
            template_path: template.settings().path.clone(),
            created_at: Utc::now(),
            includes: template.included_paths(),
            source,
        }
    }
}

/// Engine declared by `<%@@ Name @@%>`, read without binding to any target.
///
/// Parsing stops at the first declaration; includes are not followed.
pub fn detect_engine_name(source: &str) -> Result<Option<String>, ParseError> {
    let detector = Detector::default();
    let name = scan_engine_name(&detector, &FsLoader, source)?;
    trace!(engine = ?name, "engine detection finished");
    Ok(name)
}

/// Emits nothing; only the declarations a template makes are kept.
#[derive(Default)]
struct Detector {
    config: EngineConfig,
    grammar: IdentifierGrammar,
}

impl Emitter for Detector {
    fn name(&self) -> &str {
        ""
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn write_literal(&self, _text: &str) -> String {
        String::new()
    }

    fn write_value(&self, _expr: &str) -> String {
        String::new()
    }

    fn dependency_rule(&self) -> MergeRule {
        MergeRule::new("", "")
    }

    fn module_grammar(&self) -> &IdentifierGrammar {
        &self.grammar
    }

    fn absorb_include(&self, _parent: &mut Template, _child: &Template) -> Result<(), DependencyError> {
        Ok(())
    }

    fn render_content(&self, _template: &Template) -> String {
        String::new()
    }
}
