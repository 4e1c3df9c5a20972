//! Emitter - the target-language collaborator
//!
//! The parser knows nothing about the language it generates. Everything
//! target specific (statement syntax, dependency keywords, how an included
//! template is folded into its parent, the final source layout) goes through
//! this trait.

use crate::config::{EngineConfig, IdentifierGrammar};
use crate::deps::{merge_dependencies, MergeRule};
use crate::error::DependencyError;
use crate::state::Transform;
use crate::template::Template;

pub trait Emitter: Send + Sync {
    /// Engine name templates are bound to, e.g. `CSharp`.
    fn name(&self) -> &str;

    fn config(&self) -> &EngineConfig;

    /// Statement appending verbatim `text` to the rendered output.
    fn write_literal(&self, text: &str) -> String;

    /// Statement appending the value of `expr` to the rendered output.
    fn write_value(&self, expr: &str) -> String;

    /// Statement appending `expr` passed through a runtime helper.
    fn transform(&self, transform: Transform, expr: &str) -> String {
        let helper = transform.helper_name(self.config().camel_case);
        self.write_value(&format!("{}({})", helper, expr))
    }

    fn dependency_rule(&self) -> MergeRule;

    fn merge_dependencies(&self, current: &str, new: &str) -> Result<String, DependencyError> {
        merge_dependencies(current, new, &self.dependency_rule())
    }

    /// Grammar explicit module names must satisfy.
    fn module_grammar(&self) -> &IdentifierGrammar;

    /// Seed a freshly created template, before any markup is parsed.
    fn prepare(&self, _template: &mut Template) {}

    /// Fold an included template into the template that includes it.
    fn absorb_include(&self, parent: &mut Template, child: &Template) -> Result<(), DependencyError>;

    /// The generated unit without its dependency block.
    fn render_content(&self, template: &Template) -> String;

    /// One compilable source document.
    fn render_unit(&self, template: &Template) -> String {
        format!(
            "{}\n\n{}\n",
            template.dependencies.trim_end(),
            self.render_content(template).trim_matches('\n')
        )
    }
}
