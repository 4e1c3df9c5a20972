use crate::config::{ConfigError, EngineConfig, IdentifierGrammar};
use crate::deps::{normalize_alias, MergeRule};
use crate::emitter::Emitter;
use crate::error::DependencyError;
use crate::template::Template;

use super::{double_quotes, model_parameter};

const IMPORTS: MergeRule = MergeRule::new("Imports", "")
    .ignore_keyword_case()
    .with_refiner(normalize_alias);

const DEFAULT_IMPORTS: &str = "Imports Blade
Imports System
Imports System.IO
Imports System.Text
Imports System.Linq
Imports System.Net
Imports System.Collections
Imports System.Collections.Generic";

const WRITE_TYPES: [&str; 17] = [
    "Boolean", "Char()", "Char", "Byte", "SByte", "Integer", "UInteger", "Short", "UShort", "Long", "ULong",
    "Single", "Double", "Decimal", "Object", "String", "System.Text.StringBuilder",
];

const BASE_CLASS_HEAD: &str = r#"Namespace Blade
    Public MustInherit Class BladeTemplateVisualBasicBase
        Protected _buffer As StringBuilder

        Public Sub New()
            _buffer = New StringBuilder()
        End Sub
        #Region "Encode/Decode Helpers"
        Protected Overridable Function HtmlEncode(ByVal s As String) As String
            Return Net.WebUtility.HtmlEncode(s)
        End Function

        Protected Overridable Function HtmlDecode(ByVal s As String) As String
            Return Net.WebUtility.HtmlDecode(s)
        End Function

        Protected Overridable Function UrlEncode(ByVal s As String) As String
            If String.IsNullOrEmpty(s) Then
                Return ""
            End If
            Dim i = s.IndexOf("?"c)
            Dim encoded = New List(Of String)
            For Each part In s.Substring(i + 1).Split("&"c)
                Dim kv = part.Split("="c)
                encoded.Add(Net.WebUtility.UrlEncode(kv(0)) & If(kv.Length > 1, "=" & Net.WebUtility.UrlEncode(kv(1)), ""))
            Next
            Return s.Substring(0, i + 1) & String.Join("&", encoded)
        End Function

        Protected Overridable Function FullUrlEncode(ByVal s As String) As String
            Return Net.WebUtility.UrlEncode(s)
        End Function

        Protected Overridable Function UrlDecode(ByVal s As String) As String
            Return Net.WebUtility.UrlDecode(s)
        End Function

        Protected Overridable Function FullUrlDecode(ByVal s As String) As String
            Return Net.WebUtility.UrlDecode(s)
        End Function

        Protected Overridable Function Md5(ByVal s As String) As String
            Using hasher = Security.Cryptography.MD5.Create()
                Dim bytes = hasher.ComputeHash(Encoding.UTF8.GetBytes(s))
                Return String.Concat(bytes.Select(Function(b) b.ToString("x2")))
            End Using
        End Function

        Protected Overridable Function Base64Encode(ByVal s As String) As String
            Return Convert.ToBase64String(Encoding.UTF8.GetBytes(s))
        End Function

        Protected Overridable Function Base64Decode(ByVal s As String) As String
            Return Encoding.UTF8.GetString(Convert.FromBase64String(s))
        End Function"#;

const BASE_CLASS_TAIL: &str = r#"
        Protected Sub WriteLine(ByVal x As Object)
            _buffer.AppendLine(x?.ToString())
        End Sub
        #End Region
    End Class
End Namespace"#;

/// Visual Basic emitter: templates share a generated helper base class.
#[derive(Debug, Clone)]
pub struct VisualBasic {
    config: EngineConfig,
    module_grammar: IdentifierGrammar,
}

impl VisualBasic {
    pub const NAME: &'static str = "VisualBasic";

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

    fn base_class() -> String {
        let writers: String = WRITE_TYPES
            .iter()
            .map(|t| {
                format!(
                    "\n        Protected Sub Write(x As {})\n            _buffer.Append(x)\n        End Sub",
                    t
                )
            })
            .collect();

        format!("{}\n{}{}", BASE_CLASS_HEAD, writers, BASE_CLASS_TAIL)
    }
}

impl Default for VisualBasic {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for VisualBasic {
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
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| format!("\"{}\"", double_quotes(line.trim_end_matches('\r'))))
            .collect();
        format!("\n_buffer.Append({})", lines.join(" & vbLf & "))
    }

    fn write_value(&self, expr: &str) -> String {
        format!("\n_buffer.Append({})", expr)
    }

    fn dependency_rule(&self) -> MergeRule {
        IMPORTS
    }

    fn module_grammar(&self) -> &IdentifierGrammar {
        &self.module_grammar
    }

    fn prepare(&self, template: &mut Template) {
        if template.settings().is_include {
            return;
        }
        template.add_dependency(DEFAULT_IMPORTS);
        template.add_external_code(&Self::base_class());
    }

    fn absorb_include(&self, parent: &mut Template, child: &Template) -> Result<(), DependencyError> {
        let mut imported = child.dependencies.clone();
        if child.has_content() {
            imported.push_str(&format!("\nImports {}", child.module_name()));
        }
        parent.dependencies = self.merge_dependencies(&parent.dependencies, &imported)?;

        let settings = child.settings();
        let origin = format!("{} ({})", settings.path, settings.absolute_dir.display());
        parent.add_external_code(&format!(
            "' ------ include: {origin} (start) -------\n{}\n' ------ include: {origin} ( end ) -------",
            self.render_content(child).trim_matches('\n'),
            origin = origin,
        ));
        Ok(())
    }

    fn render_content(&self, template: &Template) -> String {
        if !template.has_content() {
            return format!("\n{}\n", template.external_code);
        }

        format!(
            r#"
{external}
Namespace {module}
    Public Class {class}
        Inherits BladeTemplateVisualBasicBase

        Public Function Render({model}) As String
            {body}
            Dim result As String = _buffer.ToString()

            _buffer.Clear()

            Return result
        End Function
        {functions}
    End Class
End Namespace
"#,
            external = template.external_code,
            module = template.module_name(),
            class = template.class_name(),
            model = model_parameter(&self.config, "Optional model As Object = Nothing"),
            body = template.body.code(),
            functions = template.functions.code(),
        )
    }
}
