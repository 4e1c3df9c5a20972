//! Dependency Merger - folds dependency blocks into one
//!
//! Two blocks of declarations (`using ...;`, `import ...;`, `Imports ...`)
//! are merged into a deduplicated block, keeping first-seen order.

use crate::error::DependencyError;

/// Rewrites a single declaration into its canonical spelling.
pub type Refiner = fn(&str) -> String;

/// How a target language spells a dependency declaration.
#[derive(Debug, Clone, Copy)]
pub struct MergeRule {
    pub keyword: &'static str,
    /// Statement terminator; empty for line-terminated languages.
    pub separator: &'static str,
    pub keyword_ignores_case: bool,
    pub refiner: Option<Refiner>,
}

impl MergeRule {
    pub const fn new(keyword: &'static str, separator: &'static str) -> Self {
        Self {
            keyword,
            separator,
            keyword_ignores_case: false,
            refiner: None,
        }
    }

    pub const fn ignore_keyword_case(mut self) -> Self {
        self.keyword_ignores_case = true;
        self
    }

    pub const fn with_refiner(mut self, refiner: Refiner) -> Self {
        self.refiner = Some(refiner);
        self
    }

    fn strip_keyword<'a>(&self, declaration: &'a str) -> Result<&'a str, DependencyError> {
        let keyword_len = self.keyword.len();
        let head = match declaration.get(..keyword_len) {
            Some(head) => head,
            None => return Ok(declaration),
        };

        let matches = if self.keyword_ignores_case {
            head.eq_ignore_ascii_case(self.keyword)
        } else {
            head == self.keyword
        };
        if !matches {
            return Ok(declaration);
        }

        let rest = &declaration[keyword_len..];
        match rest.chars().next() {
            None => Err(DependencyError::MissingTarget(declaration.to_string())),
            Some(c) if c.is_whitespace() => Ok(rest.trim()),
            Some(_) => Ok(declaration),
        }
    }

    /// Ordered, deduplicated declarations of a block, keyword stripped.
    pub fn declarations(&self, block: &str) -> Result<Vec<String>, DependencyError> {
        let mut result: Vec<String> = vec![];

        for line in block.lines() {
            let parts: Vec<&str> = if self.separator.is_empty() {
                vec![line]
            } else {
                line.split(self.separator).collect()
            };

            for part in parts {
                let current = part.trim();
                if current.is_empty() {
                    continue;
                }

                let stripped = self.strip_keyword(current)?;
                let declaration = match self.refiner {
                    Some(refine) => refine(stripped),
                    None => stripped.to_string(),
                };

                if !result.contains(&declaration) {
                    result.push(declaration);
                }
            }
        }

        Ok(result)
    }

    pub fn render(&self, declarations: &[String]) -> String {
        declarations
            .iter()
            .map(|d| format!("{} {}{}", self.keyword, d, self.separator))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Merge `new` into `current`: existing declarations first, then unseen ones.
pub fn merge_dependencies(current: &str, new: &str, rule: &MergeRule) -> Result<String, DependencyError> {
    let mut merged = rule.declarations(current)?;

    for declaration in rule.declarations(new)? {
        if !merged.contains(&declaration) {
            merged.push(declaration);
        }
    }

    Ok(rule.render(&merged))
}

/// `Alias = Target` becomes `Alias=Target`.
pub fn normalize_alias(declaration: &str) -> String {
    match declaration.split_once('=') {
        Some((left, right)) => format!("{}={}", left.trim(), right.trim()),
        None => declaration.to_string(),
    }
}
