//! Blade Core - template to source code compiler
//!
//! Templates mix literal text with `<% ... %>` directives. The parser turns
//! them into a [`Template`]; an [`Emitter`] turns that into source code for
//! its target language (C#, JavaScript, Visual Basic, Java). Running the generated
//! code is left to the target's own toolchain.

pub mod config;
pub mod deps;
pub mod emitter;
pub mod error;
pub mod hashing;
pub mod loader;
pub mod path;
pub mod pipeline;
pub mod reader;
pub mod state;
pub mod targets;
pub mod template;

mod include;
mod parser;

pub use config::{ConfigError, EngineConfig, IdentifierGrammar};
pub use deps::{merge_dependencies, normalize_alias, MergeRule};
pub use emitter::Emitter;
pub use error::{DependencyError, NameError, ParseError, PathError};
pub use hashing::{compute_unit_hash, sha256_hex};
pub use loader::{FsLoader, MemoryLoader, TemplateLoader};
pub use path::{normalize, refine};
pub use pipeline::{detect_engine_name, CompiledUnit, Engine};
pub use reader::{Location, SymbolReader};
pub use state::{DirectiveFamily, NameKind, ParseState, Transform};
pub use targets::{CSharp, Java, JavaScript, VisualBasic};
pub use template::{Fragment, FragmentKind, Identity, NameSlot, Template, TemplateSettings};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
