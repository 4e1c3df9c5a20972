use serde_json::Value;

use crate::config::{ConfigError, EngineConfig, IdentifierGrammar};
use crate::deps::MergeRule;
use crate::emitter::Emitter;
use crate::error::DependencyError;
use crate::state::Transform;
use crate::template::Template;

const IMPORT: MergeRule = MergeRule::new("import", ";");

const BASE_IMPORT: &str = "import './BladeTemplateJavascriptBase';";

/// JavaScript emitter: an ES class per template, included templates imported.
#[derive(Debug, Clone)]
pub struct JavaScript {
    config: EngineConfig,
    module_grammar: IdentifierGrammar,
}

impl JavaScript {
    pub const NAME: &'static str = "Javascript";

    pub fn new() -> Self {
        Self {
            config: Self::camel_cased(EngineConfig::default()),
            module_grammar: IdentifierGrammar::dotted(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let module_grammar = config.module_grammar(&IdentifierGrammar::dotted())?;
        Ok(Self {
            config: Self::camel_cased(config),
            module_grammar,
        })
    }

    // helpers are always camel case in JavaScript
    fn camel_cased(mut config: EngineConfig) -> EngineConfig {
        config.camel_case = true;
        config
    }
}

impl Default for JavaScript {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for JavaScript {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn write_literal(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("\nthis._buffer.push({});", Value::String(text.to_string()))
    }

    fn write_value(&self, expr: &str) -> String {
        format!("\nthis._buffer.push({});", expr)
    }

    fn transform(&self, transform: Transform, expr: &str) -> String {
        let helper = transform.helper_name(self.config.camel_case);
        self.write_value(&format!("this.{}({})", helper, expr))
    }

    fn dependency_rule(&self) -> MergeRule {
        IMPORT
    }

    fn module_grammar(&self) -> &IdentifierGrammar {
        &self.module_grammar
    }

    fn prepare(&self, template: &mut Template) {
        template.add_dependency(BASE_IMPORT);
    }

    /// Included templates stay separate modules; the parent imports them.
    fn absorb_include(&self, parent: &mut Template, child: &Template) -> Result<(), DependencyError> {
        let imported = format!("{}\nimport './{}';", child.dependencies, child.full_class_name());
        parent.dependencies = self.merge_dependencies(&parent.dependencies, &imported)?;
        Ok(())
    }

    fn render_content(&self, template: &Template) -> String {
        format!(
            r#"
{external}
export class {class} extends BladeTemplateJavascriptBase {{
    render(model) {{
        this._buffer = [];
        {body}
        const result = this._buffer.join('');

        this._buffer = [];

        return result;
    }}
    {functions}
}}
"#,
            external = template.external_code,
            class = template.class_name(),
            body = template.body.code(),
            functions = template.functions.code(),
        )
    }
}
