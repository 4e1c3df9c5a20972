//! Error taxonomy for parsing and composing templates.

use std::io;

use thiserror::Error;

use crate::reader::Location;
use crate::state::{DirectiveFamily, NameKind, ParseState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("{kind} name '{name}' is invalid")]
    InvalidIdentifier { kind: NameKind, name: String },

    #[error("{kind} name mismatch: already '{existing}', cannot become '{given}'")]
    Conflict {
        kind: NameKind,
        existing: String,
        given: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{0}' surpasses root in going back")]
    Underflow(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("dependency declaration '{0}' names nothing")]
    MissingTarget(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error '{kind}' at position {position} {location}: expected {expected}, but saw {ch:?} (state = {state:?})")]
    InvalidCharacter {
        kind: &'static str,
        ch: char,
        position: usize,
        location: Location,
        state: ParseState,
        expected: &'static str,
    },

    #[error("Line: {location}: unterminated {family} ({})", .family.opener())]
    UnterminatedTag {
        family: DirectiveFamily,
        location: Location,
    },

    #[error("Line: {location}: function is not closed")]
    UnterminatedFunction { location: Location },

    #[error("Line: {location}: encountered function end tag without a previous function start tag")]
    FunctionCloseWithoutOpen { location: Location },

    #[error("Line: {location}: missing {kind} name")]
    MissingName { kind: NameKind, location: Location },

    #[error("Line: {location}: {source}")]
    Naming {
        location: Location,
        #[source]
        source: NameError,
    },

    #[error("Line: {location}: no include path specified")]
    IncludePathEmpty { location: Location },

    #[error("Line: {location}: using absolute path in include files is not allowed ('{path}')")]
    RootedIncludePrevented { path: String, location: Location },

    #[error("Line: {location}: include path {path} surpasses root in going back")]
    IncludePathUnderflow { path: String, location: Location },

    #[error("Line: {location}: library include '{path}' requires a configured library root")]
    LibraryRootMissing { path: String, location: Location },

    #[error("Line: {location}: include file {path} not found")]
    IncludeNotFound { path: String, location: Location },

    #[error("Line: {location}: error while reading include file '{path}'")]
    IncludeRead {
        path: String,
        location: Location,
        #[source]
        source: io::Error,
    },

    #[error("Line: {location}: error while parsing include file '{path}'")]
    IncludeParse {
        path: String,
        location: Location,
        #[source]
        source: Box<ParseError>,
    },

    #[error("Line: {location}: class '{identity}' already included")]
    ClassAlreadyIncluded { identity: String, location: Location },

    #[error("Line: {location}: error while merging include file '{path}' dependencies")]
    MergeDependencies {
        path: String,
        location: Location,
        #[source]
        source: DependencyError,
    },

    #[error("Line: {location}: include '{path}' exceeds the maximum include depth of {limit}")]
    IncludeDepthExceeded {
        path: String,
        limit: usize,
        location: Location,
    },

    #[error("error while reading template '{path}'")]
    TemplateRead {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    /// Row/column in the template that raised the error.
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::InvalidCharacter { location, .. }
            | ParseError::UnterminatedTag { location, .. }
            | ParseError::UnterminatedFunction { location }
            | ParseError::FunctionCloseWithoutOpen { location }
            | ParseError::MissingName { location, .. }
            | ParseError::Naming { location, .. }
            | ParseError::IncludePathEmpty { location }
            | ParseError::RootedIncludePrevented { location, .. }
            | ParseError::IncludePathUnderflow { location, .. }
            | ParseError::LibraryRootMissing { location, .. }
            | ParseError::IncludeNotFound { location, .. }
            | ParseError::IncludeRead { location, .. }
            | ParseError::IncludeParse { location, .. }
            | ParseError::ClassAlreadyIncluded { location, .. }
            | ParseError::MergeDependencies { location, .. }
            | ParseError::IncludeDepthExceeded { location, .. } => Some(*location),
            ParseError::TemplateRead { .. } => None,
        }
    }

    /// Innermost error of a chain of failed include parses.
    pub fn root_cause(&self) -> &ParseError {
        let mut current = self;
        while let ParseError::IncludeParse { source, .. } = current {
            current = source;
        }
        current
    }

    /// Chain of include paths leading to the root cause, outermost first.
    pub fn include_chain(&self) -> Vec<&str> {
        let mut chain = vec![];
        let mut current = self;
        while let ParseError::IncludeParse { path, source, .. } = current {
            chain.push(path.as_str());
            current = source;
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_include_chain() {
        let inner = ParseError::UnterminatedTag {
            family: DirectiveFamily::Block,
            location: Location::new(3, 4),
        };
        let middle = ParseError::IncludeParse {
            path: "b.blade".into(),
            location: Location::new(2, 1),
            source: Box::new(inner),
        };
        let outer = ParseError::IncludeParse {
            path: "a.blade".into(),
            location: Location::new(1, 9),
            source: Box::new(middle),
        };

        assert_eq!(outer.location(), Some(Location::new(1, 9)));
        assert_eq!(outer.include_chain(), vec!["a.blade", "b.blade"]);
        assert!(matches!(
            outer.root_cause(),
            ParseError::UnterminatedTag { family: DirectiveFamily::Block, .. }
        ));
    }

    #[test]
    fn test_unterminated_message_names_family() {
        let err = ParseError::UnterminatedTag {
            family: DirectiveFamily::Function,
            location: Location::new(1, 10),
        };
        assert_eq!(err.to_string(), "Line: (1, 10): unterminated function (<%~)");
    }
}
