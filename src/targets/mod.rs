//! Target Emitters - the languages templates compile to

mod csharp;
mod java;
mod javascript;
mod visual_basic;

pub use csharp::CSharp;
pub use java::Java;
pub use javascript::JavaScript;
pub use visual_basic::VisualBasic;

use crate::config::{ConfigError, EngineConfig};
use crate::emitter::Emitter;

/// Engine names accepted by [`by_name`], canonical spelling first.
pub const ENGINE_NAMES: [&str; 4] = [CSharp::NAME, JavaScript::NAME, VisualBasic::NAME, Java::NAME];

/// Emitter for an engine name (ASCII case-insensitive, `cs`/`js`/`vb` aliases).
pub fn by_name(name: &str, config: EngineConfig) -> Result<Box<dyn Emitter>, ConfigError> {
    let lowered = name.trim().to_ascii_lowercase();

    match lowered.as_str() {
        "csharp" | "cs" | "c#" => Ok(Box::new(CSharp::with_config(config)?)),
        "javascript" | "js" => Ok(Box::new(JavaScript::with_config(config)?)),
        "visualbasic" | "vb" => Ok(Box::new(VisualBasic::with_config(config)?)),
        "java" => Ok(Box::new(Java::with_config(config)?)),
        _ => Err(ConfigError::UnknownEngine(name.to_string())),
    }
}

/// `"` doubled, as both C# verbatim strings and VB strings quote it.
pub(crate) fn double_quotes(text: &str) -> String {
    text.replace('"', "\"\"")
}

/// Signature parameter of the generated render method.
pub(crate) fn model_parameter(config: &EngineConfig, dynamic: &str) -> String {
    match config.model_type.as_deref().map(str::trim) {
        Some(model) if !model.is_empty() => format!("{} model = default", model),
        _ => dynamic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_aliases() {
        for (name, expected) in [
            ("CSharp", "CSharp"),
            ("cs", "CSharp"),
            ("javascript", "Javascript"),
            ("JS", "Javascript"),
            ("VisualBasic", "VisualBasic"),
            ("vb", "VisualBasic"),
            ("Java", "Java"),
        ] {
            let emitter = by_name(name, EngineConfig::default()).unwrap();
            assert_eq!(emitter.name(), expected);
        }
    }

    #[test]
    fn test_by_name_unknown() {
        assert!(matches!(
            by_name("Cobol", EngineConfig::default()),
            Err(ConfigError::UnknownEngine(name)) if name == "Cobol"
        ));
    }

    #[test]
    fn test_model_parameter() {
        let mut config = EngineConfig::default();
        assert_eq!(model_parameter(&config, "dynamic model"), "dynamic model");
        config.model_type = Some("PageModel".to_string());
        assert_eq!(model_parameter(&config, "dynamic model"), "PageModel model = default");
    }
}
