//! Parser states and directive families.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime helper applied to a write directive's expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    HtmlEncode,
    HtmlDecode,
    UrlEncode,
    UrlDecode,
    FullUrlEncode,
    FullUrlDecode,
    Md5,
    Base64Encode,
    Base64Decode,
}

impl Transform {
    pub const ALL: [Transform; 9] = [
        Transform::HtmlEncode,
        Transform::HtmlDecode,
        Transform::UrlEncode,
        Transform::UrlDecode,
        Transform::FullUrlEncode,
        Transform::FullUrlDecode,
        Transform::Md5,
        Transform::Base64Encode,
        Transform::Base64Decode,
    ];

    /// Name of the runtime helper, `htmlEncode` or `HtmlEncode` style.
    pub fn helper_name(self, camel_case: bool) -> &'static str {
        match (self, camel_case) {
            (Transform::HtmlEncode, true) => "htmlEncode",
            (Transform::HtmlEncode, false) => "HtmlEncode",
            (Transform::HtmlDecode, true) => "htmlDecode",
            (Transform::HtmlDecode, false) => "HtmlDecode",
            (Transform::UrlEncode, true) => "urlEncode",
            (Transform::UrlEncode, false) => "UrlEncode",
            (Transform::UrlDecode, true) => "urlDecode",
            (Transform::UrlDecode, false) => "UrlDecode",
            (Transform::FullUrlEncode, true) => "fullUrlEncode",
            (Transform::FullUrlEncode, false) => "FullUrlEncode",
            (Transform::FullUrlDecode, true) => "fullUrlDecode",
            (Transform::FullUrlDecode, false) => "FullUrlDecode",
            (Transform::Md5, true) => "md5",
            (Transform::Md5, false) => "Md5",
            (Transform::Base64Encode, true) => "base64Encode",
            (Transform::Base64Encode, false) => "Base64Encode",
            (Transform::Base64Decode, true) => "base64Decode",
            (Transform::Base64Decode, false) => "Base64Decode",
        }
    }

    pub fn family(self) -> DirectiveFamily {
        match self {
            Transform::HtmlEncode => DirectiveFamily::HtmlEncode,
            Transform::HtmlDecode => DirectiveFamily::HtmlDecode,
            Transform::UrlEncode => DirectiveFamily::UrlEncode,
            Transform::UrlDecode => DirectiveFamily::UrlDecode,
            Transform::FullUrlEncode => DirectiveFamily::FullUrlEncode,
            Transform::FullUrlDecode => DirectiveFamily::FullUrlDecode,
            Transform::Md5 => DirectiveFamily::Md5,
            Transform::Base64Encode => DirectiveFamily::Base64Encode,
            Transform::Base64Decode => DirectiveFamily::Base64Decode,
        }
    }
}

/// Which kind of directive a family of parser states belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveFamily {
    Tag,
    Dependency,
    TemplateName,
    ModuleName,
    EngineName,
    ExternalCode,
    FullUrlEncode,
    Comment,
    Include,
    HtmlEncode,
    Write,
    HtmlDecode,
    UrlEncode,
    UrlDecode,
    FullUrlDecode,
    Md5,
    Base64Encode,
    Base64Decode,
    Block,
    Function,
}

impl DirectiveFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveFamily::Tag => "tag",
            DirectiveFamily::Dependency => "dependency",
            DirectiveFamily::TemplateName => "template-name",
            DirectiveFamily::ModuleName => "module-name",
            DirectiveFamily::EngineName => "engine-name",
            DirectiveFamily::ExternalCode => "external-code",
            DirectiveFamily::FullUrlEncode => "full-url-encode",
            DirectiveFamily::Comment => "comment",
            DirectiveFamily::Include => "include",
            DirectiveFamily::HtmlEncode => "html-encode",
            DirectiveFamily::Write => "write",
            DirectiveFamily::HtmlDecode => "html-decode",
            DirectiveFamily::UrlEncode => "url-encode",
            DirectiveFamily::UrlDecode => "url-decode",
            DirectiveFamily::FullUrlDecode => "full-url-decode",
            DirectiveFamily::Md5 => "md5",
            DirectiveFamily::Base64Encode => "base64-encode",
            DirectiveFamily::Base64Decode => "base64-decode",
            DirectiveFamily::Block => "block",
            DirectiveFamily::Function => "function",
        }
    }

    /// Opening markup, for error messages.
    pub fn opener(self) -> &'static str {
        match self {
            DirectiveFamily::Tag => "<%",
            DirectiveFamily::Dependency => "<%@",
            DirectiveFamily::TemplateName => "<%@`",
            DirectiveFamily::ModuleName => "<%$`",
            DirectiveFamily::EngineName => "<%@@",
            DirectiveFamily::ExternalCode => "<%!",
            DirectiveFamily::FullUrlEncode => "<%!=",
            DirectiveFamily::Comment => "<%*",
            DirectiveFamily::Include => "<%#",
            DirectiveFamily::HtmlEncode => "<%#=",
            DirectiveFamily::Write => "<%=",
            DirectiveFamily::HtmlDecode => "<%~=",
            DirectiveFamily::UrlEncode => "<%?=",
            DirectiveFamily::UrlDecode => "<%&=",
            DirectiveFamily::FullUrlDecode => "<%^=",
            DirectiveFamily::Md5 => "<%$=",
            DirectiveFamily::Base64Encode => "<%:=",
            DirectiveFamily::Base64Decode => "<%.=",
            DirectiveFamily::Block => "<%",
            DirectiveFamily::Function => "<%~",
        }
    }
}

impl fmt::Display for DirectiveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character right after `<%` that needs one more character to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `@`: dependency, `` @` `` class name, `@@` engine name.
    At,
    /// `!`: external code or `!=` full-url-encode.
    Bang,
    /// `#`: include or `#=` html-encode.
    Hash,
    /// `~`: function block or `~=` html-decode.
    Tilde,
    /// `$`: `$=` md5 or `` $` `` module name.
    Dollar,
    /// `?`, `&`, `^`, `:`, `.`: write transform when followed by `=`.
    Write(Transform),
}

/// A directive body that accumulates characters until its close tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Dependency,
    EngineName,
    ExternalCode,
    Comment,
    Write,
    Transform(Transform),
    Block,
    Function,
}

impl Region {
    pub fn family(self) -> DirectiveFamily {
        match self {
            Region::Dependency => DirectiveFamily::Dependency,
            Region::EngineName => DirectiveFamily::EngineName,
            Region::ExternalCode => DirectiveFamily::ExternalCode,
            Region::Comment => DirectiveFamily::Comment,
            Region::Write => DirectiveFamily::Write,
            Region::Transform(t) => t.family(),
            Region::Block => DirectiveFamily::Block,
            Region::Function => DirectiveFamily::Function,
        }
    }
}

/// Backtick-quoted names: `` <%@`Class`%> `` and `` <%$`Module`%> ``.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    Class,
    Module,
    Engine,
}

impl NameKind {
    pub fn family(self) -> DirectiveFamily {
        match self {
            NameKind::Class => DirectiveFamily::TemplateName,
            NameKind::Module => DirectiveFamily::ModuleName,
            NameKind::Engine => DirectiveFamily::EngineName,
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NameKind::Class => "class",
            NameKind::Module => "module",
            NameKind::Engine => "engine",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Buffering literal text.
    Start,
    /// Saw `<`.
    LessThan,
    /// Saw `<%`.
    TagOpen,
    Sigil(Sigil),
    Scan(Region),
    /// Saw `%` inside a region.
    Closing(Region),
    /// Saw `~` inside a block or function body.
    Tilde(Region),
    /// Saw `*` inside a comment.
    Star,
    /// Saw `\` inside a region.
    Escape(Region),
    /// Saw `\%` inside a region.
    EscapePercent(Region),
    Name(NameKind),
    /// Saw the closing backtick of a name.
    NameTick(NameKind),
    NameClose(NameKind),
    IncludeLead,
    IncludePath,
    IncludeAfterPath,
    IncludeClose,
}

impl ParseState {
    /// The directive family left open when input ends in this state.
    pub fn family(self) -> Option<DirectiveFamily> {
        match self {
            ParseState::Start => None,
            ParseState::LessThan | ParseState::TagOpen | ParseState::Sigil(_) => {
                Some(DirectiveFamily::Tag)
            }
            ParseState::Scan(r)
            | ParseState::Closing(r)
            | ParseState::Tilde(r)
            | ParseState::Escape(r)
            | ParseState::EscapePercent(r) => Some(r.family()),
            ParseState::Star => Some(DirectiveFamily::Comment),
            ParseState::Name(k) | ParseState::NameTick(k) | ParseState::NameClose(k) => {
                Some(k.family())
            }
            ParseState::IncludeLead
            | ParseState::IncludePath
            | ParseState::IncludeAfterPath
            | ParseState::IncludeClose => Some(DirectiveFamily::Include),
        }
    }
}
