//! Include Composer - folds included templates into their parent

use tracing::debug;

use crate::emitter::Emitter;
use crate::error::ParseError;
use crate::loader::TemplateLoader;
use crate::parser::parse_template;
use crate::path::resolve_include;
use crate::reader::Location;
use crate::template::{Identity, Template};

/// Resolve, parse and absorb `<%# "raw" %>` into `parent`.
///
/// `ancestors` are the templates including `parent`, outermost first. No
/// identity in the child's subtree may already be an ancestor or part of
/// `parent`'s tree.
pub(crate) fn include_template(
    emitter: &dyn Emitter,
    loader: &dyn TemplateLoader,
    parent: &mut Template,
    raw: &str,
    ancestors: &[Identity],
    location: Location,
) -> Result<(), ParseError> {
    let config = emitter.config();
    let depth = ancestors.len();
    let target = resolve_include(parent.settings(), config, raw, loader, location)?;
    let path = target.settings.path.clone();

    if depth >= config.max_include_depth {
        return Err(ParseError::IncludeDepthExceeded {
            path,
            limit: config.max_include_depth,
            location,
        });
    }

    debug!(path = %path, file = %target.file.display(), depth = depth + 1, "including template");

    let content = loader
        .read(&target.file)
        .map_err(|source| ParseError::IncludeRead {
            path: path.clone(),
            location,
            source,
        })?;

    let mut lineage = ancestors.to_vec();
    lineage.push(parent.identity());

    let child = parse_template(emitter, loader, &content, target.settings, &lineage).map_err(|e| {
        ParseError::IncludeParse {
            path: path.clone(),
            location,
            source: Box::new(e),
        }
    })?;

    let taken = parent.identities();
    if let Some(identity) = child
        .identities()
        .into_iter()
        .find(|identity| taken.contains(identity) || ancestors.contains(identity))
    {
        return Err(ParseError::ClassAlreadyIncluded {
            identity: identity.to_string(),
            location,
        });
    }

    emitter
        .absorb_include(parent, &child)
        .map_err(|source| ParseError::MergeDependencies {
            path,
            location,
            source,
        })?;

    parent.add_inner_template(child);
    Ok(())
}
