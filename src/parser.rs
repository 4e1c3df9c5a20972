//! Template Parser - character-level state machine
//!
//! Consumes the [`SymbolReader`] one character at a time. Literal text is
//! buffered in `Start`; `<%` flushes it and the next character selects the
//! directive. Every directive body shares one close convention (`%>`) and one
//! escape (`\%>`), handled by the `Closing`, `Escape` and `EscapePercent`
//! states parametrized by the region they belong to.

use std::mem;

use tracing::{debug, trace};

use crate::emitter::Emitter;
use crate::error::ParseError;
use crate::include;
use crate::loader::TemplateLoader;
use crate::reader::{Location, SymbolReader};
use crate::state::{DirectiveFamily, NameKind, ParseState, Region, Sigil, Transform};
use crate::template::{Fragment, FragmentKind, Identity, Template, TemplateSettings};

/// Parse `source` into a new template bound to `emitter`.
///
/// `ancestors` are the identities of the templates including this one,
/// outermost first; none of them may reappear below it.
pub(crate) fn parse_template(
    emitter: &dyn Emitter,
    loader: &dyn TemplateLoader,
    source: &str,
    settings: TemplateSettings,
    ancestors: &[Identity],
) -> Result<Template, ParseError> {
    let template = new_template(emitter, settings)?;
    Parser::new(emitter, loader, source, template, ancestors).run()
}

/// Parse only as far as the first `<%@@ Name @@%>` declaration.
pub(crate) fn scan_engine_name(
    emitter: &dyn Emitter,
    loader: &dyn TemplateLoader,
    source: &str,
) -> Result<Option<String>, ParseError> {
    let template = Template::new(
        TemplateSettings::default(),
        emitter.module_grammar().clone(),
        None,
    );
    let mut parser = Parser::new(emitter, loader, source, template, &[]);
    parser.detect_engine = true;

    let template = parser.run()?;
    Ok(template.engine_name().map(str::to_string))
}

fn new_template(emitter: &dyn Emitter, settings: TemplateSettings) -> Result<Template, ParseError> {
    let config = emitter.config();
    let mut template = Template::new(
        settings,
        emitter.module_grammar().clone(),
        config.namespace.as_deref(),
    );

    template
        .set_engine_name(emitter.name())
        .map_err(|source| ParseError::Naming {
            location: Location::default(),
            source,
        })?;
    emitter.prepare(&mut template);

    Ok(template)
}

pub(crate) struct Parser<'a> {
    emitter: &'a dyn Emitter,
    loader: &'a dyn TemplateLoader,
    reader: SymbolReader,
    state: ParseState,
    buffer: String,
    function_started: bool,
    function_should_close: bool,
    quote: char,
    tag_start: Location,
    function_start: Location,
    template: Template,
    ancestors: &'a [Identity],
    detect_engine: bool,
    done: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        emitter: &'a dyn Emitter,
        loader: &'a dyn TemplateLoader,
        source: &str,
        template: Template,
        ancestors: &'a [Identity],
    ) -> Self {
        Self {
            emitter,
            loader,
            reader: SymbolReader::new(source),
            state: ParseState::Start,
            buffer: String::new(),
            function_started: false,
            function_should_close: false,
            quote: '"',
            tag_start: Location::default(),
            function_start: Location::default(),
            template,
            ancestors,
            detect_engine: false,
            done: false,
        }
    }

    pub(crate) fn run(mut self) -> Result<Template, ParseError> {
        while let Some(ch) = self.reader.next() {
            self.step(ch)?;
            if self.done {
                return Ok(self.template);
            }
        }
        self.finish()
    }

    fn step(&mut self, ch: char) -> Result<(), ParseError> {
        match self.state {
            ParseState::Start => {
                if ch == '<' {
                    self.state = ParseState::LessThan;
                } else {
                    self.buffer.push(ch);
                }
            }
            ParseState::LessThan => {
                if ch == '%' {
                    self.flush_literal();
                    self.tag_start = self.reader.location();
                    self.state = ParseState::TagOpen;
                } else {
                    self.buffer.push('<');
                    self.reader.store();
                    self.state = ParseState::Start;
                }
            }
            ParseState::TagOpen => self.open_tag(ch),
            ParseState::Sigil(sigil) => self.resolve_sigil(sigil, ch),
            ParseState::Scan(region) => self.scan(region, ch),
            ParseState::Closing(region) => {
                if ch == '>' {
                    self.state = ParseState::Start;
                    self.complete(region)?;
                } else {
                    self.buffer.push('%');
                    self.reader.store();
                    self.state = ParseState::Scan(region);
                }
            }
            ParseState::Tilde(region) => {
                if ch == '%' {
                    self.state = ParseState::Closing(region);
                } else {
                    self.buffer.push('~');
                    self.reader.store();
                    self.state = ParseState::Scan(region);
                }
            }
            ParseState::Star => {
                if ch == '%' {
                    self.state = ParseState::Closing(Region::Comment);
                } else {
                    self.reader.store();
                    self.state = ParseState::Scan(Region::Comment);
                }
            }
            ParseState::Escape(region) => {
                if ch == '%' {
                    self.state = ParseState::EscapePercent(region);
                } else {
                    self.buffer.push('\\');
                    self.buffer.push(ch);
                    self.state = ParseState::Scan(region);
                }
            }
            ParseState::EscapePercent(region) => {
                if ch == '>' {
                    self.buffer.push_str("%>");
                } else {
                    self.buffer.push_str("\\%");
                    self.reader.store();
                }
                self.state = ParseState::Scan(region);
            }
            ParseState::Name(kind) => {
                if ch == '`' {
                    self.state = ParseState::NameTick(kind);
                } else if is_name_char(kind, ch) {
                    self.buffer.push(ch);
                } else {
                    return Err(self.invalid_character(name_error_kind(kind), name_expected(kind), ch));
                }
            }
            ParseState::NameTick(kind) => {
                if ch == '%' {
                    self.state = ParseState::NameClose(kind);
                } else {
                    return Err(self.invalid_character("TemplateNameEndTagError", "%", ch));
                }
            }
            ParseState::NameClose(kind) => {
                if ch == '>' {
                    self.state = ParseState::Start;
                    self.complete_name(kind)?;
                } else {
                    return Err(self.invalid_character("TemplateNameEndTagError", ">", ch));
                }
            }
            ParseState::IncludeLead => {
                if ch == '"' || ch == '\'' {
                    self.quote = ch;
                    self.state = ParseState::IncludePath;
                } else if !ch.is_whitespace() {
                    return Err(self.invalid_character(
                        "IncludeError",
                        "string starter character (' or \")",
                        ch,
                    ));
                }
            }
            ParseState::IncludePath => {
                if ch == self.quote {
                    self.state = ParseState::IncludeAfterPath;
                } else if ch == '\r' || ch == '\n' {
                    return Err(self.invalid_character("UnTerminatedIncludePath", "closing quote", ch));
                } else {
                    self.buffer.push(ch);
                }
            }
            ParseState::IncludeAfterPath => {
                if ch == '%' {
                    self.state = ParseState::IncludeClose;
                } else if !ch.is_whitespace() {
                    return Err(self.invalid_character("IncludeEndError", "whitespace or %", ch));
                }
            }
            ParseState::IncludeClose => {
                if ch != '>' {
                    return Err(self.invalid_character("IncludePathEndTagError", ">", ch));
                }
                self.state = ParseState::Start;
                let path = mem::take(&mut self.buffer);
                self.include(&path)?;
            }
        }

        Ok(())
    }

    fn open_tag(&mut self, ch: char) {
        self.state = match ch {
            '@' => ParseState::Sigil(Sigil::At),
            '!' => ParseState::Sigil(Sigil::Bang),
            '*' => ParseState::Scan(Region::Comment),
            '#' => ParseState::Sigil(Sigil::Hash),
            '=' => ParseState::Scan(Region::Write),
            '~' => ParseState::Sigil(Sigil::Tilde),
            '$' => ParseState::Sigil(Sigil::Dollar),
            '?' => ParseState::Sigil(Sigil::Write(Transform::UrlEncode)),
            '&' => ParseState::Sigil(Sigil::Write(Transform::UrlDecode)),
            '^' => ParseState::Sigil(Sigil::Write(Transform::FullUrlDecode)),
            ':' => ParseState::Sigil(Sigil::Write(Transform::Base64Encode)),
            '.' => ParseState::Sigil(Sigil::Write(Transform::Base64Decode)),
            _ => {
                self.reader.store();
                ParseState::Scan(Region::Block)
            }
        };
    }

    /// `=` always selects the write form; anything else is re-read under the
    /// sigil's alternate meaning.
    fn resolve_sigil(&mut self, sigil: Sigil, ch: char) {
        let write = match sigil {
            Sigil::Bang => Some(Transform::FullUrlEncode),
            Sigil::Hash => Some(Transform::HtmlEncode),
            Sigil::Tilde => Some(Transform::HtmlDecode),
            Sigil::Dollar => Some(Transform::Md5),
            Sigil::Write(t) => Some(t),
            Sigil::At => None,
        };

        if ch == '=' {
            if let Some(t) = write {
                self.state = ParseState::Scan(Region::Transform(t));
                return;
            }
        }

        self.state = match (sigil, ch) {
            (Sigil::At, '`') => ParseState::Name(NameKind::Class),
            (Sigil::At, '@') => ParseState::Scan(Region::EngineName),
            (Sigil::Dollar, '`') => ParseState::Name(NameKind::Module),
            (Sigil::At, _) => {
                self.reader.store();
                ParseState::Scan(Region::Dependency)
            }
            (Sigil::Bang, _) => {
                self.reader.store();
                ParseState::Scan(Region::ExternalCode)
            }
            (Sigil::Hash, _) => {
                self.reader.store();
                ParseState::IncludeLead
            }
            (Sigil::Tilde, _) => {
                self.reader.store();
                if !self.function_started {
                    self.function_started = true;
                    self.function_start = self.tag_start;
                    self.buffer.push('\n');
                }
                ParseState::Scan(Region::Function)
            }
            (Sigil::Dollar, _) | (Sigil::Write(_), _) => {
                self.reader.store();
                ParseState::Scan(Region::Block)
            }
        };
    }

    fn scan(&mut self, region: Region, ch: char) {
        let comment = region == Region::Comment;
        let code = matches!(region, Region::Block | Region::Function);

        match ch {
            '%' if !comment => self.state = ParseState::Closing(region),
            '*' if comment => self.state = ParseState::Star,
            '~' if code => self.state = ParseState::Tilde(region),
            '\\' => self.state = ParseState::Escape(region),
            _ => self.buffer.push(ch),
        }
    }

    fn complete(&mut self, region: Region) -> Result<(), ParseError> {
        let content = mem::take(&mut self.buffer);

        match region {
            Region::Comment => {}
            Region::Dependency => self.template.add_dependency(content.trim()),
            Region::ExternalCode => self.template.add_external_code(content.trim_matches(&['\r', '\n'][..])),
            Region::EngineName => self.complete_engine_name(&content)?,
            Region::Write => {
                let expr = content.trim();
                let code = self.emitter.write_value(expr);
                self.append(FragmentKind::Value, expr, code);
            }
            Region::Transform(t) => {
                let expr = content.trim();
                let code = self.emitter.transform(t, expr);
                self.append(FragmentKind::Transform(t), expr, code);
            }
            Region::Block => {
                if !content.is_empty() {
                    self.append(FragmentKind::Code, &content, content.clone());
                }
                if self.reader.ended_with("~%>") {
                    if !self.function_started {
                        return Err(ParseError::FunctionCloseWithoutOpen {
                            location: self.tag_start,
                        });
                    }
                    self.close_function();
                }
            }
            Region::Function => {
                self.append(FragmentKind::Code, &content, content.clone());
                if self.reader.ended_with("~%>") || self.function_should_close {
                    self.close_function();
                } else {
                    self.function_should_close = true;
                }
            }
        }

        trace!(family = %region.family(), "directive closed");
        Ok(())
    }

    fn close_function(&mut self) {
        self.function_started = false;
        self.function_should_close = false;
    }

    fn complete_name(&mut self, kind: NameKind) -> Result<(), ParseError> {
        let name = mem::take(&mut self.buffer);
        let location = self.tag_start;

        if name.is_empty() {
            return Err(ParseError::MissingName { kind, location });
        }

        let result = match kind {
            NameKind::Class => self.template.set_class_name(&name),
            NameKind::Module => self.template.set_module_name(&name),
            NameKind::Engine => self.template.set_engine_name(&name),
        };
        result.map_err(|source| ParseError::Naming { location, source })?;

        // a name declared after an include can collide with it
        if kind != NameKind::Engine {
            let identity = self.template.identity();
            if self.ancestors.contains(&identity) || self.template.contains_identity(&identity) {
                return Err(ParseError::ClassAlreadyIncluded {
                    identity: identity.to_string(),
                    location,
                });
            }
        }

        debug!(%kind, name = %name, "name declared");
        Ok(())
    }

    fn complete_engine_name(&mut self, content: &str) -> Result<(), ParseError> {
        let declared = content
            .trim()
            .strip_suffix("@@")
            .ok_or_else(|| self.invalid_character("EngineNameEndTagError", "@@%>", '>'))?;

        self.buffer = declared.trim().to_string();
        self.complete_name(NameKind::Engine)?;

        if self.detect_engine {
            self.done = true;
        }
        Ok(())
    }

    fn include(&mut self, path: &str) -> Result<(), ParseError> {
        if self.detect_engine {
            return Ok(());
        }
        include::include_template(
            self.emitter,
            self.loader,
            &mut self.template,
            path,
            self.ancestors,
            self.tag_start,
        )
    }

    fn append(&mut self, kind: FragmentKind, source: &str, code: String) {
        let fragment = Fragment {
            kind,
            source: source.to_string(),
            code,
        };
        if self.function_started {
            self.template.functions.push(fragment);
        } else {
            self.template.body.push(fragment);
        }
    }

    fn flush_literal(&mut self) {
        let literal = mem::take(&mut self.buffer);
        if literal.is_empty() {
            return;
        }
        if self.emitter.config().skip_excessive_new_lines && (literal == "\n" || literal == "\r\n") {
            return;
        }
        let code = self.emitter.write_literal(&literal);
        self.append(FragmentKind::Literal, &literal, code);
    }

    fn finish(mut self) -> Result<Template, ParseError> {
        if self.state == ParseState::LessThan {
            self.buffer.push('<');
            self.state = ParseState::Start;
        }

        match self.state.family() {
            None => {}
            Some(DirectiveFamily::Function) => {
                return Err(ParseError::UnterminatedFunction {
                    location: self.function_start,
                })
            }
            Some(family) => {
                return Err(ParseError::UnterminatedTag {
                    family,
                    location: self.tag_start,
                })
            }
        }

        if self.function_started {
            return Err(ParseError::UnterminatedFunction {
                location: self.function_start,
            });
        }

        self.flush_literal();
        Ok(self.template)
    }

    fn invalid_character(&self, kind: &'static str, expected: &'static str, ch: char) -> ParseError {
        ParseError::InvalidCharacter {
            kind,
            ch,
            position: self.reader.position(),
            location: self.reader.location(),
            state: self.state,
            expected,
        }
    }
}

fn is_name_char(kind: NameKind, ch: char) -> bool {
    match kind {
        NameKind::Class | NameKind::Engine => ch.is_alphanumeric() || ch == '_',
        NameKind::Module => ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '@',
    }
}

fn name_error_kind(kind: NameKind) -> &'static str {
    match kind {
        NameKind::Module => "InvalidCharacterInModuleName",
        NameKind::Class | NameKind::Engine => "InvalidCharacterInTemplateName",
    }
}

fn name_expected(kind: NameKind) -> &'static str {
    match kind {
        NameKind::Module => "num|alpha|_|.",
        NameKind::Class | NameKind::Engine => "num|alpha|_",
    }
}
