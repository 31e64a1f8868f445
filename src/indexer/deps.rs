//! Dependency detection by language.
//!
//! Regex heuristics over raw source text, not a parser. Comments and string
//! literals that look like imports will be picked up too.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::graph::EdgeKind;
use crate::scanner::{Language, ResourceFormat};

/// A dependency declared by a file.
///
/// `path` is the resolved root-relative path when the specifier matches a
/// scanned file, otherwise the specifier exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// A specifier as written in the source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub text: String,
    pub kind: EdgeKind,
    /// Tried when `text` matches no scanned file.
    pub fallback: Option<String>,
}

impl Specifier {
    fn new(text: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            fallback: None,
        }
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// Raw specifiers in order of appearance, first occurrence only.
pub fn detect_specifiers(
    language: Language,
    format: ResourceFormat,
    content: &str,
) -> Vec<Specifier> {
    let mut found: Vec<(usize, Specifier)> = Vec::new();

    if language.is_js_family() {
        detect_js(content, &mut found);
    } else if language == Language::Python {
        detect_python(content, &mut found);
    } else if matches!(language, Language::C | Language::Cpp) {
        detect_c_includes(content, &mut found);
    } else if format == ResourceFormat::Markdown {
        detect_markdown_links(content, &mut found);
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|(_, spec)| seen.insert(spec.text.clone()))
        .map(|(_, spec)| spec)
        .collect()
}

fn detect_js(content: &str, found: &mut Vec<(usize, Specifier)>) {
    static REQUIRE_RE: OnceLock<Regex> = OnceLock::new();
    static FROM_RE: OnceLock<Regex> = OnceLock::new();
    static BARE_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
    static DYNAMIC_IMPORT_RE: OnceLock<Regex> = OnceLock::new();

    let patterns = [
        (
            regex(&REQUIRE_RE, r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#),
            EdgeKind::Dependency,
        ),
        (
            regex(
                &FROM_RE,
                r#"(?m)^\s*(?:import|export)\b[^;'"]*?\bfrom\s*['"]([^'"]+)['"]"#,
            ),
            EdgeKind::Import,
        ),
        (
            regex(&BARE_IMPORT_RE, r#"(?m)^\s*import\s*['"]([^'"]+)['"]"#),
            EdgeKind::Import,
        ),
        (
            regex(
                &DYNAMIC_IMPORT_RE,
                r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
            ),
            EdgeKind::Import,
        ),
    ];

    for (re, kind) in patterns {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), Specifier::new(m.as_str(), kind)));
            }
        }
    }
}

fn detect_python(content: &str, found: &mut Vec<(usize, Specifier)>) {
    static FROM_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
    static IMPORT_RE: OnceLock<Regex> = OnceLock::new();

    let from_re = regex(
        &FROM_IMPORT_RE,
        r"(?m)^[ \t]*from[ \t]+([.\w]+)[ \t]+import\b[ \t]*(\([^)]*\)|[^\n#]*)",
    );
    for caps in from_re.captures_iter(content) {
        let Some(m) = caps.get(1) else { continue };
        let module = m.as_str();
        if !module.chars().all(|c| c == '.') {
            found.push((m.start(), Specifier::new(module, EdgeKind::Import)));
            continue;
        }
        // `from . import a, b as c` names sibling modules, or attributes of
        // the package itself when no such module exists
        let Some(names) = caps.get(2) else { continue };
        let list = names.as_str().trim_start_matches('(').trim_end_matches(')');
        for (offset, part) in split_with_offsets(list, ',') {
            let Some(name) = part.split_whitespace().next() else {
                continue;
            };
            if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                let spec = Specifier {
                    text: format!("{module}{name}"),
                    kind: EdgeKind::Import,
                    fallback: Some(module.to_string()),
                };
                found.push((names.start() + offset, spec));
            }
        }
    }

    let import_re = regex(&IMPORT_RE, r"(?m)^[ \t]*import[ \t]+([^\n#]+)");
    for caps in import_re.captures_iter(content) {
        let Some(m) = caps.get(1) else { continue };
        // `import a.b as c, d` -> a.b, d
        for (offset, part) in split_with_offsets(m.as_str(), ',') {
            let Some(module) = part.split_whitespace().next() else {
                continue;
            };
            if is_python_module(module) {
                found.push((m.start() + offset, Specifier::new(module, EdgeKind::Import)));
            }
        }
    }
}

fn is_python_module(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !s.starts_with('.')
}

fn split_with_offsets(s: &str, sep: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == sep {
            parts.push((start, &s[start..i]));
            start = i + c.len_utf8();
        }
    }
    parts.push((start, &s[start..]));
    parts
}

fn detect_c_includes(content: &str, found: &mut Vec<(usize, Specifier)>) {
    static INCLUDE_RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&INCLUDE_RE, r#"(?m)^[ \t]*#[ \t]*include[ \t]*"([^"]+)""#);
    for caps in re.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), Specifier::new(m.as_str(), EdgeKind::Include)));
        }
    }
}

fn detect_markdown_links(content: &str, found: &mut Vec<(usize, Specifier)>) {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&LINK_RE, r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#);
    for caps in re.captures_iter(content) {
        let Some(m) = caps.get(1) else { continue };
        let target = m.as_str();
        if target.contains("://") || target.starts_with('#') || target.starts_with("mailto:") {
            continue;
        }
        let target = target.split('#').next().unwrap_or(target);
        if !target.is_empty() {
            found.push((m.start(), Specifier::new(target, EdgeKind::Reference)));
        }
    }
}

/// Resolve a detected specifier, trying its fallback when the text itself
/// matches nothing. Unresolved specifiers keep their text.
pub fn resolve(
    from_path: &str,
    specifier: &Specifier,
    language: Language,
    known: &HashSet<String>,
) -> String {
    if let Some(path) = lookup_specifier(from_path, &specifier.text, language, known) {
        return path;
    }
    specifier
        .fallback
        .as_deref()
        .and_then(|fallback| lookup_specifier(from_path, fallback, language, known))
        .unwrap_or_else(|| specifier.text.clone())
}

/// Resolve a specifier against the set of scanned paths.
///
/// Returns the matching root-relative path, or the specifier unchanged when
/// nothing in `known` matches.
pub fn resolve_specifier(
    from_path: &str,
    specifier: &str,
    language: Language,
    known: &HashSet<String>,
) -> String {
    lookup_specifier(from_path, specifier, language, known)
        .unwrap_or_else(|| specifier.to_string())
}

fn lookup_specifier(
    from_path: &str,
    specifier: &str,
    language: Language,
    known: &HashSet<String>,
) -> Option<String> {
    let from_dir = parent_dir(from_path);
    let candidates: Vec<String> = if language == Language::Python {
        python_candidates(from_dir, specifier)
    } else if language.is_js_family() {
        if is_relative(specifier) {
            js_candidates(&join(from_dir, specifier), language)
        } else if let Some(stripped) = specifier.strip_prefix('/') {
            js_candidates(&join("", stripped), language)
        } else {
            Vec::new()
        }
    } else if matches!(language, Language::C | Language::Cpp) {
        [join(from_dir, specifier), join("", specifier)]
            .into_iter()
            .flatten()
            .collect()
    } else {
        match specifier.strip_prefix('/') {
            Some(stripped) => join("", stripped).into_iter().collect(),
            None => join(from_dir, specifier).into_iter().collect(),
        }
    };

    candidates.into_iter().find(|c| known.contains(c))
}

fn is_relative(specifier: &str) -> bool {
    matches!(specifier, "." | "..")
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn js_candidates(base: &Option<String>, language: Language) -> Vec<String> {
    let Some(base) = base else {
        return Vec::new();
    };
    let mut candidates = vec![base.clone()];
    for ext in language.resolution_extensions() {
        candidates.push(format!("{base}.{ext}"));
    }
    for ext in language.resolution_extensions() {
        if base.is_empty() {
            candidates.push(format!("index.{ext}"));
        } else {
            candidates.push(format!("{base}/index.{ext}"));
        }
    }
    candidates
}

fn python_candidates(from_dir: &str, module: &str) -> Vec<String> {
    let dots = module.chars().take_while(|&c| c == '.').count();
    let rest = module[dots..].replace('.', "/");

    // Absolute modules are rooted at the scan root only
    let base = if dots > 0 {
        // `.x` is the importing package, each further dot goes one level up
        let mut dir = Some(from_dir.to_string());
        for _ in 1..dots {
            dir = dir.and_then(|d| join(&d, ".."));
        }
        dir.and_then(|d| join(&d, &rest))
    } else {
        join("", &rest)
    };

    match base {
        None => Vec::new(),
        Some(base) if base.is_empty() => vec!["__init__.py".to_string()],
        // A bare `.` or `..` names a package, never a module file
        Some(base) if rest.is_empty() => vec![format!("{base}/__init__.py")],
        Some(base) => vec![format!("{base}.py"), format!("{base}/__init__.py")],
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Join `rel` onto `base` and normalise `.`/`..`. `None` if it escapes the root.
fn join(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn specs(language: Language, format: ResourceFormat, content: &str) -> Vec<String> {
        detect_specifiers(language, format, content)
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    #[test]
    fn test_js_patterns() {
        let content = r#"
import { a, b } from './lib/a';
import React from "react";
import './styles.css';
const fs = require('fs');
const util = require("./util");
export { thing } from '../shared/thing';
const lazy = await import('./lazy');
import {
    multi,
    line,
} from './multi';
"#;
        let found = detect_specifiers(Language::TypeScript, ResourceFormat::Text, content);
        let names: Vec<&str> = found.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "./lib/a",
                "react",
                "./styles.css",
                "fs",
                "./util",
                "../shared/thing",
                "./lazy",
                "./multi"
            ]
        );
        let util = found.iter().find(|s| s.text == "./util").unwrap();
        assert_eq!(util.kind, EdgeKind::Dependency);
        let lib = found.iter().find(|s| s.text == "./lib/a").unwrap();
        assert_eq!(lib.kind, EdgeKind::Import);
        assert!(found.iter().all(|s| s.fallback.is_none()));
    }

    #[test]
    fn test_js_duplicates_recorded_once() {
        let content = "const a = require('./a');\nconst b = require('./a');\n";
        assert_eq!(
            specs(Language::JavaScript, ResourceFormat::Text, content),
            vec!["./a"]
        );
    }

    #[test]
    fn test_python_patterns() {
        let content = "import os\nimport pkg.mod as m, other\nfrom .sibling import x\nfrom app.core import y\n  import nested\n";
        assert_eq!(
            specs(Language::Python, ResourceFormat::Text, content),
            vec!["os", "pkg.mod", "other", ".sibling", "app.core", "nested"]
        );
    }

    #[test]
    fn test_python_package_relative_imports() {
        let content = "from . import helpers, models as m\nfrom .. import (\n    shared,\n    util,\n)\nfrom . import *\n";
        let found = detect_specifiers(Language::Python, ResourceFormat::Text, content);
        let names: Vec<&str> = found.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(names, vec![".helpers", ".models", "..shared", "..util"]);
        assert_eq!(found[0].fallback.as_deref(), Some("."));
        assert_eq!(found[2].fallback.as_deref(), Some(".."));
    }

    #[test]
    fn test_resolve_from_package_import() {
        let set = known(&["pkg/mod.py", "pkg/helpers.py", "pkg/__init__.py"]);
        let found = detect_specifiers(
            Language::Python,
            ResourceFormat::Text,
            "from . import helpers, VERSION\n",
        );
        let resolved: Vec<String> = found
            .iter()
            .map(|s| resolve("pkg/mod.py", s, Language::Python, &set))
            .collect();
        // Sibling module first, the package itself for plain attributes
        assert_eq!(resolved, vec!["pkg/helpers.py", "pkg/__init__.py"]);

        // No module and no package file: the name stays unresolved
        let bare = known(&["pkg/mod.py"]);
        assert_eq!(
            resolve("pkg/mod.py", &found[1], Language::Python, &bare),
            ".VERSION"
        );
    }

    #[test]
    fn test_python_absolute_modules_ignore_importer_dir() {
        let set = known(&["app/main.py", "app/util.py"]);
        assert_eq!(
            resolve_specifier("app/main.py", "util", Language::Python, &set),
            "util"
        );
        assert_eq!(
            resolve_specifier("app/main.py", "app.util", Language::Python, &set),
            "app/util.py"
        );
    }

    #[test]
    fn test_c_includes_only_quoted() {
        let content = "#include <stdio.h>\n#include \"util.h\"\n#  include \"../common/types.h\"\n";
        assert_eq!(
            specs(Language::C, ResourceFormat::Text, content),
            vec!["util.h", "../common/types.h"]
        );
    }

    #[test]
    fn test_markdown_links() {
        let content = "See [guide](./guide.md#setup), [site](https://example.com), [top](#top) and [api](../api/README.md \"API\").";
        let found = detect_specifiers(Language::Unspecified, ResourceFormat::Markdown, content);
        let names: Vec<&str> = found.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(names, vec!["./guide.md", "../api/README.md"]);
        assert!(found.iter().all(|s| s.kind == EdgeKind::Reference));
    }

    #[test]
    fn test_other_languages_have_no_dependencies() {
        assert!(specs(Language::Rust, ResourceFormat::Text, "use crate::x;").is_empty());
        assert!(specs(Language::Unspecified, ResourceFormat::Yaml, "import: x").is_empty());
    }

    #[test]
    fn test_resolve_js_relative() {
        let set = known(&["src/lib/a.ts", "src/util/index.js", "shared/thing.ts"]);
        assert_eq!(
            resolve_specifier("src/main.ts", "./lib/a", Language::TypeScript, &set),
            "src/lib/a.ts"
        );
        assert_eq!(
            resolve_specifier("src/main.ts", "./util", Language::TypeScript, &set),
            "src/util/index.js"
        );
        assert_eq!(
            resolve_specifier("src/main.ts", "../shared/thing", Language::TypeScript, &set),
            "shared/thing.ts"
        );
    }

    #[test]
    fn test_resolve_keeps_unresolved_specifier() {
        let set = known(&["src/a.ts"]);
        assert_eq!(
            resolve_specifier("src/main.ts", "./missing", Language::TypeScript, &set),
            "./missing"
        );
        assert_eq!(
            resolve_specifier("src/main.ts", "react", Language::TypeScript, &set),
            "react"
        );
        assert_eq!(
            resolve_specifier("main.ts", "../../outside", Language::TypeScript, &set),
            "../../outside"
        );
    }

    #[test]
    fn test_resolve_python_modules() {
        let set = known(&["app/core.py", "app/models/__init__.py", "app/views.py"]);
        assert_eq!(
            resolve_specifier("main.py", "app.core", Language::Python, &set),
            "app/core.py"
        );
        assert_eq!(
            resolve_specifier("main.py", "app.models", Language::Python, &set),
            "app/models/__init__.py"
        );
        assert_eq!(
            resolve_specifier("app/core.py", ".views", Language::Python, &set),
            "app/views.py"
        );
        assert_eq!(
            resolve_specifier("app/models/__init__.py", "..core", Language::Python, &set),
            "app/core.py"
        );
        assert_eq!(
            resolve_specifier("main.py", "os", Language::Python, &set),
            "os"
        );
    }

    #[test]
    fn test_resolve_c_and_markdown() {
        let set = known(&["src/util.h", "include/types.h", "docs/guide.md"]);
        assert_eq!(
            resolve_specifier("src/main.c", "util.h", Language::C, &set),
            "src/util.h"
        );
        assert_eq!(
            resolve_specifier("src/main.c", "include/types.h", Language::C, &set),
            "include/types.h"
        );
        assert_eq!(
            resolve_specifier("README.md", "./docs/guide.md", Language::Unspecified, &set),
            "docs/guide.md"
        );
    }

    #[test]
    fn test_join_normalises() {
        assert_eq!(join("a/b", "../c/./d").as_deref(), Some("a/c/d"));
        assert_eq!(join("", "x").as_deref(), Some("x"));
        assert_eq!(join("a", "../.."), None);
    }
}
