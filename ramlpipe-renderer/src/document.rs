//! Loading a RAML 0.8 document into a validated YAML mapping.
//!
//! RAML text is decoded as UTF-8 YAML; JSON input is lifted into the same
//! value model. `!include` tags are resolved recursively before validation:
//! `.raml`/`.yaml`/`.yml` files are parsed as YAML (their own includes resolve
//! against their own directory), `.json` files as JSON, anything else is
//! inlined as text.

use std::path::Path;

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use ramlpipe_core::SourceBody;

use crate::error::{Mark, ParseError};

const MAX_INCLUDE_DEPTH: usize = 32;

const INCLUDES: &str = "while resolving includes";
const ROOT: &str = "while validating root";

/// A validated document: the root mapping plus the source text (RAML input
/// only), kept for locating problems.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Mapping,
    pub text: Option<String>,
}

impl Document {
    /// Mark of the line defining the nested key `path`, if the source text
    /// is available.
    pub fn mark_of(&self, path: &[&str]) -> Option<Mark> {
        self.text.as_deref().and_then(|text| path_mark(text, path))
    }
}

/// Parse, resolve includes against `base_dir`, and validate the root.
pub fn load(source: &SourceBody, base_dir: &Path) -> Result<Document, ParseError> {
    let (value, text) = match source {
        SourceBody::Raml(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                ParseError::new(format!("document is not valid UTF-8 ({e})"))
                    .with_context("while reading document")
            })?;
            (parse_yaml(text)?, Some(text.to_string()))
        }
        SourceBody::Json(json) => {
            let value = serde_yaml::to_value(json).map_err(|e| {
                ParseError::new(e.to_string()).with_context("while reading document")
            })?;
            (value, None)
        }
    };

    let value = resolve_includes(value, base_dir, 0)?;
    let root = validate_root(value, text.as_deref())?;
    Ok(Document { root, text })
}

fn parse_yaml(text: &str) -> Result<Value, ParseError> {
    serde_yaml::from_str::<Value>(text).map_err(|e| {
        let mark = e
            .location()
            .map(|loc| Mark::new(loc.line().saturating_sub(1), loc.column().saturating_sub(1)));
        ParseError::new(e.to_string())
            .with_context("while parsing YAML")
            .at(mark)
    })
}

// ---------------------------------------------------------------------------
// Includes
// ---------------------------------------------------------------------------

fn resolve_includes(value: Value, base_dir: &Path, depth: usize) -> Result<Value, ParseError> {
    match value {
        Value::Tagged(tagged) if tagged.tag == "!include" => {
            include(tagged.value, base_dir, depth)
        }
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let value = resolve_includes(value, base_dir, depth)?;
            Ok(Value::Tagged(Box::new(TaggedValue { tag, value })))
        }
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k, resolve_includes(v, base_dir, depth)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|v| resolve_includes(v, base_dir, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        other => Ok(other),
    }
}

fn include(target: Value, base_dir: &Path, depth: usize) -> Result<Value, ParseError> {
    let Value::String(rel) = target else {
        return Err(ParseError::new("!include expects a file path").with_context(INCLUDES));
    };
    if depth >= MAX_INCLUDE_DEPTH {
        return Err(
            ParseError::new(format!("include depth limit exceeded at {rel}")).with_context(INCLUDES)
        );
    }

    let path = base_dir.join(rel.trim());
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        ParseError::new(format!("cannot read {} ({e})", path.display())).with_context(INCLUDES)
    })?;
    tracing::debug!(include = %path.display(), "resolved include");

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("raml" | "yaml" | "yml") => {
            let nested_base = path.parent().unwrap_or(base_dir);
            let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
                ParseError::new(format!("{}: {e}", path.display())).with_context(INCLUDES)
            })?;
            resolve_includes(value, nested_base, depth + 1)
        }
        Some("json") => serde_json::from_str::<Value>(&contents).map_err(|e| {
            ParseError::new(format!("{}: {e}", path.display())).with_context(INCLUDES)
        }),
        _ => Ok(Value::String(contents)),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_root(value: Value, text: Option<&str>) -> Result<Mapping, ParseError> {
    let root_mark = text.and_then(first_content_mark);
    let Value::Mapping(root) = value else {
        return Err(ParseError::new("document must be a map")
            .with_context(ROOT)
            .at(root_mark));
    };

    match root.get("title") {
        None | Some(Value::Null) => {
            Err(ParseError::new("missing title").with_context(ROOT).at(root_mark))
        }
        Some(title) if scalar_string(title).is_none() => Err(ParseError::new(
            "title must be a string",
        )
        .with_context("while validating title")
        .at(text.and_then(|t| path_mark(t, &["title"])))),
        Some(_) => Ok(root),
    }
}

/// String form of a scalar value; `None` for null, sequences and mappings.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Source positions
// ---------------------------------------------------------------------------

/// First line holding document content (not blank, not a comment, not a
/// document marker).
pub fn first_content_mark(text: &str) -> Option<Mark> {
    text.lines().enumerate().find_map(|(i, line)| {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.trim_end() == "---" {
            return None;
        }
        Some(Mark::new(i, line.len() - trimmed.len()))
    })
}

/// Line defining the nested mapping key `path`, outermost key first.
///
/// Each key is looked up only inside its parent's block and only at the
/// indentation of that block's direct children.
pub fn path_mark(text: &str, path: &[&str]) -> Option<Mark> {
    let lines: Vec<&str> = text.lines().collect();
    let mut start = 0;
    let mut parent_indent: Option<usize> = None;
    let mut found = None;

    for key in path {
        let needle = format!("{key}:");
        let mut child_indent = None;
        let mut hit = None;
        for (i, line) in lines.iter().enumerate().skip(start) {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - trimmed.len();
            if parent_indent.is_some_and(|p| indent <= p) {
                break;
            }
            let level = *child_indent.get_or_insert(indent);
            if indent == level && trimmed.starts_with(&needle) {
                hit = Some((i, indent));
                break;
            }
        }
        let (line, indent) = hit?;
        start = line + 1;
        parent_indent = Some(indent);
        found = Some(Mark::new(line, indent));
    }
    found
}
