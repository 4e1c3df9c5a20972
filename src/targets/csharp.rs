use crate::config::{ConfigError, EngineConfig, IdentifierGrammar};
use crate::deps::{normalize_alias, MergeRule};
use crate::emitter::Emitter;
use crate::error::DependencyError;
use crate::template::Template;

use super::{double_quotes, model_parameter};

const USING: MergeRule = MergeRule::new("using", ";").with_refiner(normalize_alias);

const HELPERS: &str = r#"        System.Text.StringBuilder _buffer = new System.Text.StringBuilder();
        #region Encode/Decode Helpers
        protected virtual string HtmlEncode(object s) => System.Net.WebUtility.HtmlEncode(s?.ToString());
        protected virtual string HtmlDecode(object s) => System.Net.WebUtility.HtmlDecode(s?.ToString());
        protected virtual string UrlEncode(object value)
        {
            var s = value?.ToString();
            if (string.IsNullOrEmpty(s))
            {
                return "";
            }
            var i = s.IndexOf('?');
            var encoded = new System.Collections.Generic.List<string>();
            foreach (var part in s.Substring(i + 1).Split('&'))
            {
                var kv = part.Split('=');
                encoded.Add(System.Net.WebUtility.UrlEncode(kv[0]) + (kv.Length > 1 ? "=" + System.Net.WebUtility.UrlEncode(kv[1]) : ""));
            }
            return s.Substring(0, i + 1) + string.Join("&", encoded);
        }
        protected virtual string FullUrlEncode(object s) => System.Net.WebUtility.UrlEncode(s?.ToString());
        protected virtual string UrlDecode(object s) => System.Net.WebUtility.UrlDecode(s?.ToString());
        protected virtual string FullUrlDecode(object s) => System.Net.WebUtility.UrlDecode(s?.ToString());
        protected virtual string Md5(object s)
        {
            using (var md5 = System.Security.Cryptography.MD5.Create())
            {
                var bytes = md5.ComputeHash(System.Text.Encoding.UTF8.GetBytes(s?.ToString() ?? ""));
                return string.Concat(System.Linq.Enumerable.Select(bytes, b => b.ToString("x2")));
            }
        }
        protected virtual string Base64Encode(object s) => System.Convert.ToBase64String(System.Text.Encoding.UTF8.GetBytes(s?.ToString() ?? ""));
        protected virtual string Base64Decode(object s) => System.Text.Encoding.UTF8.GetString(System.Convert.FromBase64String(s?.ToString() ?? ""));
        #endregion"#;

/// C# emitter: one namespace + class per template, `StringBuilder` output.
#[derive(Debug, Clone)]
pub struct CSharp {
    config: EngineConfig,
    module_grammar: IdentifierGrammar,
}

impl CSharp {
    pub const NAME: &'static str = "CSharp";

    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            module_grammar: IdentifierGrammar::dotted(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let module_grammar = config.module_grammar(&IdentifierGrammar::dotted())?;
        Ok(Self { config, module_grammar })
    }
}

impl Default for CSharp {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for CSharp {
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
        format!("\n_buffer.Append(@\"{}\");", double_quotes(text))
    }

    fn write_value(&self, expr: &str) -> String {
        format!("\n_buffer.Append({});", expr)
    }

    fn dependency_rule(&self) -> MergeRule {
        USING
    }

    fn module_grammar(&self) -> &IdentifierGrammar {
        &self.module_grammar
    }

    /// The child class is emitted next to the parent's, in its external code.
    fn absorb_include(&self, parent: &mut Template, child: &Template) -> Result<(), DependencyError> {
        parent.dependencies = self.merge_dependencies(&parent.dependencies, &child.dependencies)?;
        parent.add_external_code(self.render_content(child).trim_matches('\n'));
        Ok(())
    }

    fn render_content(&self, template: &Template) -> String {
        format!(
            r#"
{external}
namespace {module}
{{
    public class {class}
    {{
{helpers}
        public string Render({model})
        {{
            {body}
            var result = _buffer.ToString();

            _buffer.Clear();

            return result;
        }}
        {functions}
    }}
}}
"#,
            external = template.external_code,
            module = template.module_name(),
            class = template.class_name(),
            helpers = HELPERS,
            model = model_parameter(&self.config, "dynamic model = (object)null"),
            body = template.body.code(),
            functions = template.functions.code(),
        )
    }
}
