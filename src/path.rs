//! Path Normalizer - include path canonicalization
//!
//! Include paths are collapsed into a canonical relative path beneath the
//! include root. Walking above the root is refused.

use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::{ParseError, PathError};
use crate::loader::TemplateLoader;
use crate::reader::Location;
use crate::template::TemplateSettings;

/// Collapse `.` and `..` segments of a `/` or `\` separated path.
///
/// With `allow_escape`, `..` segments that walk above the start are kept as
/// leading `..`; otherwise they are a [`PathError::Underflow`].
pub fn refine(path: &str, allow_escape: bool) -> Result<String, PathError> {
    let mut stack: Vec<&str> = vec![];

    for (i, segment) in path.split(['/', '\\']).enumerate() {
        match segment {
            ".." => match stack.last() {
                None | Some(&"..") => {
                    if !allow_escape {
                        return Err(PathError::Underflow(path.to_string()));
                    }
                    stack.push("..");
                }
                // leading empty segment is the root marker
                Some(&"") => {
                    if !allow_escape {
                        return Err(PathError::Underflow(path.to_string()));
                    }
                    stack.pop();
                    stack.push("..");
                }
                Some(_) => {
                    stack.pop();
                }
            },
            "" => {
                if i == 0 {
                    stack.push("");
                }
            }
            s if s.trim() == "." => {}
            s => stack.push(s),
        }
    }

    if stack == [""] {
        return Ok("/".to_string());
    }

    Ok(stack.join("/"))
}

/// Collapse a path that must stay inside its root.
pub fn normalize(path: &str) -> Result<String, PathError> {
    refine(path, false)
}

/// Directory part of a `/` separated relative path, `""` at the top level.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(i) => &path[..i],
        None => "",
    }
}

fn is_rooted(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || path.contains(':')
        || Path::new(path).is_absolute()
}

/// Where an include directive points to.
#[derive(Debug, Clone)]
pub struct IncludeTarget {
    /// Settings the included template is parsed with.
    pub settings: TemplateSettings,
    /// File on disk (or loader key) holding the template text.
    pub file: PathBuf,
}

/// Resolve the quoted path of an include directive.
///
/// `~/x` is relative to the configured library root, anything else to the
/// including template's directory. The resolved path never leaves its root.
pub fn resolve_include(
    including: &TemplateSettings,
    config: &EngineConfig,
    raw: &str,
    loader: &dyn TemplateLoader,
    location: Location,
) -> Result<IncludeTarget, ParseError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ParseError::IncludePathEmpty { location });
    }

    let (root, relative, is_local) = if let Some(rest) = raw.strip_prefix('~') {
        let root = config
            .library_root
            .clone()
            .ok_or_else(|| ParseError::LibraryRootMissing {
                path: raw.to_string(),
                location,
            })?;
        let rest = rest.trim_start_matches(['/', '\\']);
        (root, rest.to_string(), false)
    } else {
        if is_rooted(raw) {
            return Err(ParseError::RootedIncludePrevented {
                path: raw.to_string(),
                location,
            });
        }
        let dir = parent_dir(&including.path);
        let joined = if dir.is_empty() || dir == "." {
            raw.to_string()
        } else {
            format!("{}/{}", dir, raw)
        };
        (including.absolute_dir.clone(), joined, including.is_local)
    };

    let relative = normalize(&relative).map_err(|_| ParseError::IncludePathUnderflow {
        path: raw.to_string(),
        location,
    })?;

    if relative.is_empty() {
        return Err(ParseError::IncludePathEmpty { location });
    }

    let relative = default_file(loader, &root, &relative, config).ok_or_else(|| {
        ParseError::IncludeNotFound {
            path: root.join(&relative).display().to_string(),
            location,
        }
    })?;

    let file = root.join(&relative);

    Ok(IncludeTarget {
        settings: TemplateSettings {
            path: relative,
            absolute_dir: root,
            is_local,
            is_include: true,
        },
        file,
    })
}

/// Literal file, then `<path><ext>`, then `<path>/<index>`.
fn default_file(
    loader: &dyn TemplateLoader,
    root: &Path,
    relative: &str,
    config: &EngineConfig,
) -> Option<String> {
    if loader.is_file(&root.join(relative)) {
        return Some(relative.to_string());
    }

    let with_extension = format!("{}{}", relative, config.template_extension);
    if loader.is_file(&root.join(&with_extension)) {
        return Some(with_extension);
    }

    if loader.is_dir(&root.join(relative)) {
        let index = format!("{}/{}", relative, config.index_file);
        if loader.is_file(&root.join(&index)) {
            return Some(index);
        }
    }

    None
}
