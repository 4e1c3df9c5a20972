//! Parsed Template - the structure a template is parsed into

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IdentifierGrammar;
use crate::error::NameError;
use crate::state::{NameKind, Transform};

/// A write-once name: generated placeholder until declared explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "name", rename_all = "lowercase")]
pub enum NameSlot {
    Unset,
    Generated(String),
    Explicit(String),
}

impl NameSlot {
    pub fn value(&self) -> Option<&str> {
        match self {
            NameSlot::Unset => None,
            NameSlot::Generated(name) | NameSlot::Explicit(name) => Some(name),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, NameSlot::Explicit(_))
    }

    /// Declare the name. Redeclaring the same name is a no-op.
    pub fn assign(&mut self, kind: NameKind, name: &str) -> Result<(), NameError> {
        match self {
            NameSlot::Explicit(existing) if existing == name => Ok(()),
            NameSlot::Explicit(existing) => Err(NameError::Conflict {
                kind,
                existing: existing.clone(),
                given: name.to_string(),
            }),
            _ => {
                *self = NameSlot::Explicit(name.to_string());
                Ok(())
            }
        }
    }
}

/// How a template was located; fixed once the template is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    /// Path relative to `absolute_dir`.
    pub path: String,
    /// Include root the path is relative to.
    pub absolute_dir: PathBuf,
    /// `false` for templates pulled from the library root.
    pub is_local: bool,
    pub is_include: bool,
}

impl TemplateSettings {
    /// Settings for a top-level template file; its directory becomes the root.
    pub fn for_file(file: &Path) -> Self {
        let absolute_dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let path = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        Self {
            path,
            absolute_dir,
            is_local: true,
            is_include: false,
        }
    }

    /// Settings for template text that lives in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            absolute_dir: dir.into(),
            ..Self::default()
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            absolute_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            is_local: true,
            is_include: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "transform", rename_all = "lowercase")]
pub enum FragmentKind {
    Literal,
    Value,
    Transform(Transform),
    Code,
}

/// One piece of generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Text as written in the template.
    pub source: String,
    /// Target-language code emitted for it.
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentStream {
    fragments: Vec<Fragment>,
}

impl FragmentStream {
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Emitted code of every fragment, in order.
    pub fn code(&self) -> String {
        self.fragments.iter().map(|f| f.code.as_str()).collect()
    }

    /// Whether the stream emits anything but whitespace.
    pub fn has_content(&self) -> bool {
        self.fragments.iter().any(|f| !f.code.trim().is_empty())
    }
}

/// Module + class pair that identifies a composed template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub module: String,
    pub class: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            f.write_str(&self.class)
        } else {
            write!(f, "{}.{}", self.module, self.class)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    module_name: NameSlot,
    class_name: NameSlot,
    engine_name: NameSlot,
    module_grammar: IdentifierGrammar,
    pub dependencies: String,
    pub external_code: String,
    pub body: FragmentStream,
    pub functions: FragmentStream,
    inner_templates: Vec<Template>,
    settings: TemplateSettings,
}

impl Template {
    /// A template with generated module and class names.
    ///
    /// `namespace` replaces the generated module name.
    pub fn new(settings: TemplateSettings, module_grammar: IdentifierGrammar, namespace: Option<&str>) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let module = namespace
            .map(str::to_string)
            .unwrap_or_else(|| format!("BladeModule{}", id));

        Self {
            module_name: NameSlot::Generated(module),
            class_name: NameSlot::Generated(format!("BladeTemplate{}", id)),
            engine_name: NameSlot::Unset,
            module_grammar,
            dependencies: String::new(),
            external_code: String::new(),
            body: FragmentStream::default(),
            functions: FragmentStream::default(),
            inner_templates: vec![],
            settings,
        }
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn module_name(&self) -> &str {
        self.module_name.value().unwrap_or_default()
    }

    pub fn class_name(&self) -> &str {
        self.class_name.value().unwrap_or_default()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.value()
    }

    pub fn module_slot(&self) -> &NameSlot {
        &self.module_name
    }

    pub fn class_slot(&self) -> &NameSlot {
        &self.class_name
    }

    pub fn set_class_name(&mut self, name: &str) -> Result<(), NameError> {
        if !IdentifierGrammar::class_name().accepts(name) {
            return Err(NameError::InvalidIdentifier {
                kind: NameKind::Class,
                name: name.to_string(),
            });
        }
        self.class_name.assign(NameKind::Class, name)
    }

    pub fn set_module_name(&mut self, name: &str) -> Result<(), NameError> {
        if !self.module_grammar.accepts(name) {
            return Err(NameError::InvalidIdentifier {
                kind: NameKind::Module,
                name: name.to_string(),
            });
        }
        self.module_name.assign(NameKind::Module, name)
    }

    /// Bind or confirm the engine; names compare exactly.
    pub fn set_engine_name(&mut self, name: &str) -> Result<(), NameError> {
        if !IdentifierGrammar::class_name().accepts(name) {
            return Err(NameError::InvalidIdentifier {
                kind: NameKind::Engine,
                name: name.to_string(),
            });
        }
        self.engine_name.assign(NameKind::Engine, name)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            module: self.module_name().to_string(),
            class: self.class_name().to_string(),
        }
    }

    /// `Module.Class`.
    pub fn full_class_name(&self) -> String {
        self.identity().to_string()
    }

    pub fn inner_templates(&self) -> &[Template] {
        &self.inner_templates
    }

    pub(crate) fn add_inner_template(&mut self, template: Template) {
        self.inner_templates.push(template);
    }

    /// Depth-first search of the whole include tree for `identity`.
    pub fn contains_identity(&self, identity: &Identity) -> bool {
        self.inner_templates
            .iter()
            .any(|inner| inner.identity() == *identity || inner.contains_identity(identity))
    }

    /// This template's identity followed by every included one, depth-first.
    pub fn identities(&self) -> Vec<Identity> {
        let mut identities = vec![self.identity()];
        for inner in &self.inner_templates {
            identities.extend(inner.identities());
        }
        identities
    }

    /// Paths of every included template, depth-first.
    pub fn included_paths(&self) -> Vec<String> {
        let mut paths = vec![];
        for inner in &self.inner_templates {
            paths.push(inner.settings.path.clone());
            paths.extend(inner.included_paths());
        }
        paths
    }

    pub fn add_dependency(&mut self, declaration: &str) {
        append_line(&mut self.dependencies, declaration);
    }

    pub fn add_external_code(&mut self, code: &str) {
        append_line(&mut self.external_code, code);
    }

    /// Non-empty, trimmed dependency lines.
    pub fn dependency_lines(&self) -> Vec<&str> {
        self.dependencies
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Whether rendering the body or functions would emit anything.
    pub fn has_content(&self) -> bool {
        self.body.has_content() || self.functions.has_content()
    }
}

fn append_line(target: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(text);
}
