//! Include composition against real template trees on disk

use std::fs;
use std::path::{Path, PathBuf};

use blade_core::{CSharp, Engine, EngineConfig, Java, JavaScript, ParseError, VisualBasic};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn csharp(config: EngineConfig) -> Engine {
    Engine::new(CSharp::with_config(config).unwrap())
}

#[test]
fn test_sibling_include_merges_dependencies() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "home.blade",
        "<%@ using System; %><%@`Home`%><h1><%# \"header\" %></h1>",
    );
    write(
        dir.path(),
        "header.blade",
        "<%@ using System.IO; using System; %><%@`Header`%>Title",
    );

    let template = csharp(EngineConfig::default()).parse_file(&main).unwrap();

    assert_eq!(template.dependencies, "using System;\nusing System.IO;");
    assert_eq!(template.inner_templates().len(), 1);
    assert_eq!(template.inner_templates()[0].class_name(), "Header");
    assert!(template.inner_templates()[0].settings().is_include);
    assert_eq!(template.included_paths(), vec!["header.blade"]);
    assert!(template.external_code.contains("public class Header"));
}

#[test]
fn test_default_file_resolution() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "page.blade",
        "<%# \"exact.txt\" %><%# 'widgets' %><%# \"parts/footer\" %>",
    );
    write(dir.path(), "exact.txt", "exact");
    write(dir.path(), "widgets/index.blade", "widgets");
    write(dir.path(), "parts/footer.blade", "footer");

    let template = csharp(EngineConfig::default()).parse_file(&main).unwrap();
    assert_eq!(
        template.included_paths(),
        vec!["exact.txt", "widgets/index.blade", "parts/footer.blade"]
    );
}

#[test]
fn test_custom_extension_and_index() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "page.tpl", "<%# \"menu\" %><%# \"nav/\" %>");
    write(dir.path(), "menu.tpl", "<%@`Menu`%>");
    write(dir.path(), "nav/main.tpl", "<%@`NavMain`%>");

    let config = EngineConfig {
        template_extension: ".tpl".to_string(),
        index_file: "main.tpl".to_string(),
        ..EngineConfig::default()
    };
    let template = csharp(config).parse_file(&main).unwrap();
    assert_eq!(template.included_paths(), vec!["menu.tpl", "nav/main.tpl"]);
}

#[test]
fn test_nested_include_is_relative_to_its_own_file() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"blog/post\" %>");
    write(dir.path(), "blog/post.blade", "post <%# \"../shared/./nav\" %>");
    write(dir.path(), "shared/nav.blade", "nav");

    let template = csharp(EngineConfig::default()).parse_file(&main).unwrap();
    assert_eq!(template.included_paths(), vec!["blog/post.blade", "shared/nav.blade"]);
}

#[test]
fn test_include_cannot_leave_the_root() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "site/index.blade", "<%# \"../secret\" %>");
    write(dir.path(), "secret.blade", "secret");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::IncludePathUnderflow { ref path, .. } if path == "../secret"));
}

#[test]
fn test_rooted_include_is_prevented() {
    let dir = TempDir::new().unwrap();
    let target = write(dir.path(), "abs.blade", "x");
    let main = write(
        dir.path(),
        "index.blade",
        &format!("<%# \"{}\" %>", target.display()),
    );

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::RootedIncludePrevented { .. }));
}

#[test]
fn test_missing_include() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "line\n  <%# \"nope\" %>");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    match err {
        ParseError::IncludeNotFound { location, .. } => assert_eq!(location.row, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_duplicate_identity_rejected_on_second_occurrence() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "index.blade",
        "<%# \"a\" %>\n<%# \"b\" %>\n<%# \"c\" %>",
    );
    write(dir.path(), "a.blade", "<%$`Parts`%><%@`Card`%>a");
    write(dir.path(), "b.blade", "<%$`Parts`%><%@`Other`%>b");
    write(dir.path(), "c.blade", "<%$`Parts`%><%@`Card`%>c");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    match err {
        ParseError::ClassAlreadyIncluded { identity, location } => {
            assert_eq!(identity, "Parts.Card");
            assert_eq!(location.row, 3);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_same_file_through_two_paths_is_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"part\" %><%# \"./x/../part.blade\" %>");
    write(dir.path(), "part.blade", "<%$`Parts`%><%@`Part`%>");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::ClassAlreadyIncluded { .. }));
}

#[test]
fn test_duplicate_deep_in_the_tree() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"outer\" %><%# \"leaf\" %>");
    write(dir.path(), "outer.blade", "<%# \"leaf\" %>");
    write(dir.path(), "leaf.blade", "<%$`Parts`%><%@`Leaf`%>");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::ClassAlreadyIncluded { ref identity, .. } if identity == "Parts.Leaf"));
}

#[test]
fn test_duplicate_arriving_through_a_later_include() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"leaf\" %><%# \"outer\" %>");
    write(dir.path(), "outer.blade", "<%$`Parts`%><%@`Outer`%><%# \"leaf\" %>");
    write(dir.path(), "leaf.blade", "<%$`Parts`%><%@`Leaf`%>");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::ClassAlreadyIncluded { ref identity, .. } if identity == "Parts.Leaf"));
}

#[test]
fn test_grandchild_cannot_redeclare_the_root() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "root.blade", "<%$`Parts`%><%@`Root`%><%# \"a\" %>");
    write(dir.path(), "a.blade", "<%$`Parts`%><%@`A`%><%# \"b\" %>");
    write(dir.path(), "b.blade", "<%$`Parts`%><%@`Root`%>b");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert_eq!(err.include_chain(), vec!["a.blade", "b.blade"]);
    assert!(matches!(
        err.root_cause(),
        ParseError::ClassAlreadyIncluded { identity, .. } if identity == "Parts.Root"
    ));
}

#[test]
fn test_name_declared_after_include_is_checked() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"card\" %>\n<%$`Parts`%><%@`Card`%>");
    write(dir.path(), "card.blade", "<%$`Parts`%><%@`Card`%>");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    match err {
        ParseError::ClassAlreadyIncluded { identity, location } => {
            assert_eq!(identity, "Parts.Card");
            assert_eq!(location.row, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_generated_names_never_collide() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"p\" %><%# \"p\" %>");
    write(dir.path(), "p.blade", "no declared names");

    let template = csharp(EngineConfig::default()).parse_file(&main).unwrap();
    assert_eq!(template.inner_templates().len(), 2);
}

#[test]
fn test_errors_inside_includes_are_wrapped() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "index.blade", "<%# \"a\" %>");
    write(dir.path(), "a.blade", "\n\n<%# \"b\" %>");
    write(dir.path(), "b.blade", "<% never closed");

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert_eq!(err.include_chain(), vec!["a.blade", "b.blade"]);
    assert!(matches!(err.root_cause(), ParseError::UnterminatedTag { .. }));

    match &err {
        ParseError::IncludeParse { source, .. } => assert_eq!(source.location().map(|l| l.row), Some(3)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_include_depth_is_bounded() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "loop.blade", "<%# \"loop\" %>");

    let config = EngineConfig {
        max_include_depth: 3,
        ..EngineConfig::default()
    };
    let err = csharp(config).parse_file(&main).unwrap_err();
    assert_eq!(err.include_chain().len(), 3);
    assert!(matches!(
        err.root_cause(),
        ParseError::IncludeDepthExceeded { limit: 3, .. }
    ));
}

#[test]
fn test_library_includes() {
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    let library = dir.path().join("library");
    let main = write(&site, "index.blade", "<%# \"~/layout/base\" %>");
    write(&library, "layout/base.blade", "<%# \"../common\" %>");
    write(&library, "common.blade", "common");

    let config = EngineConfig {
        library_root: Some(library.clone()),
        ..EngineConfig::default()
    };
    let template = csharp(config).parse_file(&main).unwrap();

    let base = &template.inner_templates()[0];
    assert!(!base.settings().is_local);
    assert_eq!(base.settings().absolute_dir, library);
    assert_eq!(template.included_paths(), vec!["layout/base.blade", "common.blade"]);

    let err = csharp(EngineConfig::default()).parse_file(&main).unwrap_err();
    assert!(matches!(err, ParseError::LibraryRootMissing { .. }));
}

#[test]
fn test_csharp_unit() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "home.blade",
        "<%@ using System; %><%@`Home`%>\n<p><%#= title %></p>\n<%~ string Twice(string s) => s + s; ~%>",
    );

    let config = EngineConfig {
        namespace: Some("Site".to_string()),
        ..EngineConfig::default()
    };
    let engine = csharp(config);
    let template = engine.parse_file(&main).unwrap();
    let source = engine.render(&template);

    assert!(source.starts_with("using System;\n"));
    assert!(source.contains("namespace Site"));
    assert!(source.contains("public class Home"));
    assert!(source.contains("_buffer.Append(@\"\n<p>\");"));
    assert!(source.contains("_buffer.Append(HtmlEncode(title));"));
    assert!(source.contains("string Twice(string s) => s + s;"));
}

#[test]
fn test_javascript_unit_imports_includes() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "home.blade", "<%@`Home`%><%# \"nav\" %><%?= url %>");
    write(dir.path(), "nav.blade", "<%$`Parts`%><%@`Nav`%><%@ import './menu'; %>");

    let engine = Engine::new(JavaScript::new());
    let template = engine.parse_file(&main).unwrap();
    let source = engine.render(&template);

    assert!(source.starts_with(
        "import './BladeTemplateJavascriptBase';\nimport './menu';\nimport './Parts.Nav';\n"
    ));
    assert!(source.contains("export class Home extends BladeTemplateJavascriptBase"));
    assert!(source.contains("this._buffer.push(this.urlEncode(url));"));
    assert!(!source.contains("class Nav"));
}

#[test]
fn test_visual_basic_unit_inlines_includes() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "home.blade", "<%@`Home`%><%# \"nav\" %>hi");
    write(dir.path(), "nav.blade", "<%$`Parts`%><%@`Nav`%>nav");

    let engine = Engine::new(VisualBasic::new());
    let template = engine.parse_file(&main).unwrap();
    let source = engine.render(&template);

    assert!(source.starts_with("Imports Blade\n"));
    assert!(template.dependency_lines().contains(&"Imports Parts"));
    assert!(source.contains("' ------ include: nav.blade"));
    assert!(source.contains("Namespace Parts\n    Public Class Nav"));
    assert!(source.contains("Public Class Home"));
    assert_eq!(source.matches("Class BladeTemplateVisualBasicBase").count(), 1);
}

#[test]
fn test_java_unit_inlines_includes() {
    let dir = TempDir::new().unwrap();
    let main = write(
        dir.path(),
        "home.blade",
        "<%@ import java.util.List; %><%@`Home`%><%# \"nav\" %><p><%#= title %></p>",
    );
    write(dir.path(), "nav.blade", "<%@`Nav`%><%@ import java.util.Map; %>nav");

    let config = EngineConfig {
        namespace: Some("com.site".to_string()),
        ..EngineConfig::default()
    };
    let engine = Engine::new(Java::with_config(config).unwrap());
    let template = engine.parse_file(&main).unwrap();
    let source = engine.render(&template);

    assert!(source.starts_with("package com.site;\n\nimport org.apache.commons.text.StringEscapeUtils;\n"));
    assert!(source.contains("import java.util.List;\nimport java.util.Map;"));
    assert_eq!(source.matches("import java.util.Base64;").count(), 1);
    assert!(source.contains("\nclass Nav {"));
    assert!(source.contains("public class Home {"));
    assert!(source.contains("_buffer.append(\"<p>\");"));
    assert!(source.contains("_buffer.append(htmlEncode(title));"));
}
