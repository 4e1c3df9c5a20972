use serde_json::Value;

use crate::config::{ConfigError, EngineConfig, IdentifierGrammar};
use crate::deps::MergeRule;
use crate::emitter::Emitter;
use crate::error::DependencyError;
use crate::template::{NameSlot, Template};

const IMPORT: MergeRule = MergeRule::new("import", ";");

const DEFAULT_PACKAGE: &str = "Blade";

const DEFAULT_IMPORTS: &str = "import org.apache.commons.text.StringEscapeUtils;
import java.net.URLEncoder;
import java.net.URLDecoder;
import java.util.Base64;
import javax.xml.bind.DatatypeConverter;
import java.nio.charset.StandardCharsets;
import java.security.MessageDigest;
import java.io.UnsupportedEncodingException;
import java.security.NoSuchAlgorithmException;";

const HELPERS: &str = r#"    protected StringBuilder _buffer = new StringBuilder();
    boolean isNullOrEmpty(String str) {
        return str == null || str.isEmpty();
    }
    // Encode/Decode Helpers
    protected String htmlEncode(Object s) {
        return StringEscapeUtils.escapeHtml4(String.valueOf(s));
    }
    protected String htmlDecode(Object s) {
        return StringEscapeUtils.unescapeHtml4(String.valueOf(s));
    }
    protected String urlEncode(Object value) {
        String s = value == null ? "" : value.toString();
        try {
            if (!isNullOrEmpty(s)) {
                int i = s.indexOf('?');
                String encodedParts = "";
                for (String part : s.substring(i + 1).split("&")) {
                    String[] arr = part.split("=");
                    encodedParts += (isNullOrEmpty(encodedParts) ? "" : "&") + URLEncoder.encode(arr[0], "UTF-8") + (arr.length > 1 ? "=" + URLEncoder.encode(arr[1], "UTF-8") : "");
                }
                return s.substring(0, i + 1) + encodedParts;
            }
        } catch (UnsupportedEncodingException e) { }
        return "";
    }
    protected String fullUrlEncode(Object s) {
        try {
            return URLEncoder.encode(String.valueOf(s), "UTF-8");
        } catch (UnsupportedEncodingException e) {
            return "";
        }
    }
    protected String urlDecode(Object s) {
        try {
            return URLDecoder.decode(String.valueOf(s), "UTF-8");
        } catch (UnsupportedEncodingException e) {
            return "";
        }
    }
    protected String fullUrlDecode(Object s) {
        return urlDecode(s);
    }
    protected String md5(Object s) {
        try {
            MessageDigest md = MessageDigest.getInstance("MD5");
            md.update(String.valueOf(s).getBytes(StandardCharsets.UTF_8));
            return DatatypeConverter.printHexBinary(md.digest());
        } catch (NoSuchAlgorithmException e) {
            return "";
        }
    }
    protected String base64Encode(Object s) {
        return Base64.getEncoder().encodeToString(String.valueOf(s).getBytes(StandardCharsets.UTF_8));
    }
    protected String base64Decode(Object s) {
        return new String(Base64.getDecoder().decode(String.valueOf(s)), StandardCharsets.UTF_8);
    }"#;

/// Java emitter: one class per template in a single `package`.
///
/// Included templates become package-private classes in the same file.
#[derive(Debug, Clone)]
pub struct Java {
    config: EngineConfig,
    module_grammar: IdentifierGrammar,
}

impl Java {
    pub const NAME: &'static str = "Java";

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

    fn camel_cased(mut config: EngineConfig) -> EngineConfig {
        config.camel_case = true;
        config
    }

    /// Declared module, else the configured namespace, else `Blade`.
    pub fn package<'t>(&'t self, template: &'t Template) -> &'t str {
        match template.module_slot() {
            NameSlot::Explicit(module) => module.as_str(),
            _ => self.config.namespace.as_deref().unwrap_or(DEFAULT_PACKAGE),
        }
    }

    fn model_parameter(&self) -> String {
        match self.config.model_type.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => format!("{} model", model),
            _ => "Object model".to_string(),
        }
    }
}

impl Default for Java {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for Java {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    // a JSON string literal is also a valid Java string literal
    fn write_literal(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("\n_buffer.append({});", Value::String(text.to_string()))
    }

    fn write_value(&self, expr: &str) -> String {
        format!("\n_buffer.append({});", expr)
    }

    fn dependency_rule(&self) -> MergeRule {
        IMPORT
    }

    fn module_grammar(&self) -> &IdentifierGrammar {
        &self.module_grammar
    }

    fn prepare(&self, template: &mut Template) {
        template.add_dependency(DEFAULT_IMPORTS);
    }

    fn absorb_include(&self, parent: &mut Template, child: &Template) -> Result<(), DependencyError> {
        parent.dependencies = self.merge_dependencies(&parent.dependencies, &child.dependencies)?;
        parent.add_external_code(self.render_content(child).trim_matches('\n'));
        Ok(())
    }

    fn render_content(&self, template: &Template) -> String {
        let visibility = if template.settings().is_include { "" } else { "public " };

        format!(
            r#"
{external}
{visibility}class {class} {{
{helpers}
    public String render({model}) {{
        {body}
        String result = _buffer.toString();

        _buffer.setLength(0);

        return result;
    }}
    {functions}
}}
"#,
            external = template.external_code,
            visibility = visibility,
            class = template.class_name(),
            helpers = HELPERS,
            model = self.model_parameter(),
            body = template.body.code(),
            functions = template.functions.code(),
        )
    }

    /// `package` has to precede the imports.
    fn render_unit(&self, template: &Template) -> String {
        format!(
            "package {};\n\n{}\n\n{}\n",
            self.package(template),
            template.dependencies.trim_end(),
            self.render_content(template).trim_matches('\n')
        )
    }
}
