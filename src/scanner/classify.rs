//! Extension-driven classification of scanned files.
//!
//! Three independent lookup tables: resource type, on-disk format and
//! programming language. Unknown extensions fall back to `unknown`,
//! `binary` and `none` respectively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Broad category of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Code,
    Script,
    Config,
    Data,
    Schema,
    Documentation,
    Style,
    Markup,
    Unknown,
}

/// Serialization format of a resource's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFormat {
    Text,
    Json,
    Yaml,
    Toml,
    Markdown,
    Html,
    Xml,
    Css,
    Sql,
    Binary,
}

/// Programming language of a resource, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
    Java,
    Shell,
    Sql,
    C,
    Cpp,
    /// No programming language (documents, config, unknown files).
    #[serde(rename = "none")]
    Unspecified,
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl ResourceType {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = extension(path) else {
            return ResourceType::Unknown;
        };
        match ext.as_str() {
            "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs" | "py" | "pyw" | "pyi"
            | "rs" | "go" | "java" | "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" | "hh" => {
                ResourceType::Code
            }
            "sh" | "bash" | "zsh" | "ps1" => ResourceType::Script,
            "json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "conf" | "env" => {
                ResourceType::Config
            }
            "csv" | "tsv" | "jsonl" | "ndjson" => ResourceType::Data,
            "sql" | "graphql" | "gql" | "proto" | "avsc" => ResourceType::Schema,
            "md" | "mdx" | "rst" | "txt" | "adoc" => ResourceType::Documentation,
            "css" | "scss" | "sass" | "less" => ResourceType::Style,
            "html" | "htm" | "xml" | "svg" => ResourceType::Markup,
            _ => ResourceType::Unknown,
        }
    }
}

impl ResourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = extension(path) else {
            return ResourceFormat::Binary;
        };
        match ext.as_str() {
            "json" | "jsonl" | "ndjson" | "avsc" => ResourceFormat::Json,
            "yaml" | "yml" => ResourceFormat::Yaml,
            "toml" => ResourceFormat::Toml,
            "md" | "mdx" => ResourceFormat::Markdown,
            "html" | "htm" => ResourceFormat::Html,
            "xml" | "svg" => ResourceFormat::Xml,
            "css" | "scss" | "sass" | "less" => ResourceFormat::Css,
            "sql" => ResourceFormat::Sql,
            "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs" | "py" | "pyw" | "pyi"
            | "rs" | "go" | "java" | "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" | "hh" | "sh"
            | "bash" | "zsh" | "ps1" | "ini" | "cfg" | "conf" | "env" | "csv" | "tsv"
            | "graphql" | "gql" | "proto" | "rst" | "txt" | "adoc" => ResourceFormat::Text,
            _ => ResourceFormat::Binary,
        }
    }
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = extension(path) else {
            return Language::Unspecified;
        };
        match ext.as_str() {
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "py" | "pyw" | "pyi" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "sh" | "bash" | "zsh" => Language::Shell,
            "sql" => Language::Sql,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            _ => Language::Unspecified,
        }
    }

    /// JavaScript and TypeScript share module syntax and resolution rules.
    pub fn is_js_family(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }

    /// Extensions tried when resolving an extensionless import specifier.
    pub fn resolution_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::TypeScript | Language::JavaScript => {
                &["ts", "tsx", "js", "jsx", "mjs", "cjs", "json"]
            }
            Language::Python => &["py"],
            Language::C | Language::Cpp => &["h", "hpp", "c", "cpp"],
            _ => &[],
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Code => write!(f, "code"),
            ResourceType::Script => write!(f, "script"),
            ResourceType::Config => write!(f, "config"),
            ResourceType::Data => write!(f, "data"),
            ResourceType::Schema => write!(f, "schema"),
            ResourceType::Documentation => write!(f, "documentation"),
            ResourceType::Style => write!(f, "style"),
            ResourceType::Markup => write!(f, "markup"),
            ResourceType::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFormat::Text => write!(f, "text"),
            ResourceFormat::Json => write!(f, "json"),
            ResourceFormat::Yaml => write!(f, "yaml"),
            ResourceFormat::Toml => write!(f, "toml"),
            ResourceFormat::Markdown => write!(f, "markdown"),
            ResourceFormat::Html => write!(f, "html"),
            ResourceFormat::Xml => write!(f, "xml"),
            ResourceFormat::Css => write!(f, "css"),
            ResourceFormat::Sql => write!(f, "sql"),
            ResourceFormat::Binary => write!(f, "binary"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::TypeScript => write!(f, "typescript"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Python => write!(f, "python"),
            Language::Rust => write!(f, "rust"),
            Language::Go => write!(f, "go"),
            Language::Java => write!(f, "java"),
            Language::Shell => write!(f, "shell"),
            Language::Sql => write!(f, "sql"),
            Language::C => write!(f, "c"),
            Language::Cpp => write!(f, "cpp"),
            Language::Unspecified => write!(f, "none"),
        }
    }
}
