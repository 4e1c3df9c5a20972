//! Symbol Reader - single-pass character cursor
//!
//! Yields the template one character at a time with one character of
//! pushback and 1-based row/column tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 1-based row/column of a character in a template source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

pub struct SymbolReader {
    chars: Vec<char>,
    /// Index of the next unread character.
    pos: usize,
    current: Option<char>,
    stored: bool,
    row: usize,
    col: usize,
    after_newline: bool,
}

impl SymbolReader {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            current: None,
            stored: false,
            row: 1,
            col: 0,
            after_newline: false,
        }
    }

    /// Push the current character back so the next call re-yields it.
    pub fn store(&mut self) {
        if self.current.is_some() {
            self.stored = true;
        }
    }

    /// Whether the characters just behind the cursor equal `suffix`.
    pub fn ended_with(&self, suffix: &str) -> bool {
        let suffix: Vec<char> = suffix.chars().collect();
        if suffix.len() > self.pos {
            return false;
        }
        self.chars[self.pos - suffix.len()..self.pos] == suffix[..]
    }

    pub fn current(&self) -> Option<char> {
        self.current
    }

    /// 1-based offset of the current character (0 before the first read).
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn location(&self) -> Location {
        Location::new(self.row, self.col)
    }
}

impl Iterator for SymbolReader {
    type Item = char;

    /// Advance and return the current character.
    ///
    /// A character pushed back with [`store`](Self::store) is re-yielded
    /// without moving the row/column again.
    fn next(&mut self) -> Option<char> {
        if self.stored {
            self.stored = false;
            return self.current;
        }

        let ch = *self.chars.get(self.pos)?;
        self.pos += 1;

        if self.after_newline {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.after_newline = ch == '\n';
        self.current = Some(ch);

        Some(ch)
    }
}
