//! Template context: serializable rendering payload built from a validated
//! [`Document`].
//!
//! Resources are flattened depth-first into one list, each entry carrying its
//! nesting depth and full path, so templates never need recursion.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::adapter::RenderConfig;
use crate::document::{scalar_string, Document};
use crate::error::{ParseError, TemplateError};

/// HTTP methods recognized as resource members.
pub const METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "options", "trace", "connect",
];

/// Top-level rendering payload.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentContext {
    pub title: String,
    pub version: Option<String>,
    pub base_uri: Option<String>,
    /// `https` or `http`, used for external asset links.
    pub asset_scheme: String,
    pub documentation: Vec<DocSection>,
    pub resources: Vec<ResourceCtx>,
    pub meta: MetaCtx,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceCtx {
    /// HTML id derived from the full path.
    pub id: String,
    pub full_path: String,
    pub relative_uri: String,
    pub display_name: String,
    pub description: Option<String>,
    pub depth: usize,
    pub uri_parameters: Vec<ParamCtx>,
    pub methods: Vec<MethodCtx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodCtx {
    /// Upper-case verb.
    pub verb: String,
    pub description: Option<String>,
    pub query_parameters: Vec<ParamCtx>,
    /// Media types declared under `body`.
    pub bodies: Vec<String>,
    pub responses: Vec<ResponseCtx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamCtx {
    pub name: String,
    pub type_name: String,
    pub description: Option<String>,
    pub required: bool,
    pub example: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseCtx {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetaCtx {
    pub generator: String,
}

impl DocumentContext {
    /// Build the context for `doc`. Fails on structurally invalid resources,
    /// methods or documentation.
    pub fn build(doc: &Document, config: &RenderConfig) -> Result<Self, ParseError> {
        let root = &doc.root;
        let title = root.get("title").and_then(scalar_string).unwrap_or_default();

        let mut resources = Vec::new();
        collect_resources(doc, root, "", &[], 0, &mut resources)?;

        Ok(DocumentContext {
            title,
            version: root.get("version").and_then(scalar_string),
            base_uri: root.get("baseUri").and_then(scalar_string),
            asset_scheme: if config.https { "https" } else { "http" }.to_string(),
            documentation: documentation(doc)?,
            resources,
            meta: MetaCtx {
                generator: format!("ramlpipe {}", env!("CARGO_PKG_VERSION")),
            },
        })
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, TemplateError> {
        tera::Context::from_serialize(self).map_err(TemplateError::from)
    }
}

fn documentation(doc: &Document) -> Result<Vec<DocSection>, ParseError> {
    let invalid = |message: &str| {
        ParseError::new(message)
            .with_context("while validating documentation")
            .at(doc.mark_of(&["documentation"]))
    };

    match doc.root.get("documentation") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                let title = item.get("title").and_then(scalar_string);
                let content = item.get("content").and_then(scalar_string);
                match (title, content) {
                    (Some(title), Some(content)) => Ok(DocSection { title, content }),
                    _ => Err(invalid("documentation entries need a title and content")),
                }
            })
            .collect(),
        Some(_) => Err(invalid("documentation must be an array")),
    }
}

fn as_mapping<'a>(
    doc: &Document,
    at: &[&str],
    value: &'a Value,
    what: &str,
    context: &str,
) -> Result<Option<&'a Mapping>, ParseError> {
    match value {
        Value::Mapping(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        _ => Err(ParseError::new(format!("{what} must be a map"))
            .with_context(context)
            .at(doc.mark_of(at))),
    }
}

fn collect_resources(
    doc: &Document,
    map: &Mapping,
    parent: &str,
    trail: &[&str],
    depth: usize,
    out: &mut Vec<ResourceCtx>,
) -> Result<(), ParseError> {
    for (key, value) in map {
        let Some(relative) = key.as_str().filter(|k| k.starts_with('/')) else {
            continue;
        };
        let mut at = trail.to_vec();
        at.push(relative);
        let body = as_mapping(doc, &at, value, "resource", "while validating resources")?;
        let full_path = format!("{parent}{relative}");

        let get = |k: &str| body.and_then(|b| b.get(k));
        let mut methods = Vec::new();
        for &verb in METHODS {
            if let Some(method) = get(verb) {
                methods.push(method_ctx(doc, &at, verb, method)?);
            }
        }

        out.push(ResourceCtx {
            id: html_id(&full_path),
            display_name: get("displayName")
                .and_then(scalar_string)
                .unwrap_or_else(|| relative.to_string()),
            description: get("description").and_then(scalar_string),
            relative_uri: relative.to_string(),
            depth,
            uri_parameters: params(get("uriParameters"), true),
            methods,
            full_path: full_path.clone(),
        });

        if let Some(body) = body {
            collect_resources(doc, body, &full_path, &at, depth + 1, out)?;
        }
    }
    Ok(())
}

fn method_ctx(
    doc: &Document,
    resource: &[&str],
    verb: &str,
    value: &Value,
) -> Result<MethodCtx, ParseError> {
    let mut at = resource.to_vec();
    at.push(verb);
    let body = as_mapping(doc, &at, value, "method", "while validating methods")?;
    let get = |k: &str| body.and_then(|b| b.get(k));

    let bodies = match get("body") {
        Some(Value::Mapping(types)) => types.keys().filter_map(scalar_string).collect(),
        _ => Vec::new(),
    };
    let responses = match get("responses") {
        Some(Value::Mapping(codes)) => codes
            .iter()
            .filter_map(|(code, response)| {
                Some(ResponseCtx {
                    code: scalar_string(code)?,
                    description: response.get("description").and_then(scalar_string),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(MethodCtx {
        verb: verb.to_ascii_uppercase(),
        description: get("description").and_then(scalar_string),
        query_parameters: params(get("queryParameters"), false),
        bodies,
        responses,
    })
}

fn params(value: Option<&Value>, required_by_default: bool) -> Vec<ParamCtx> {
    let Some(Value::Mapping(map)) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(name, spec)| {
            let field = |k: &str| spec.get(k).and_then(scalar_string);
            Some(ParamCtx {
                name: scalar_string(name)?,
                type_name: field("type").unwrap_or_else(|| "string".to_string()),
                description: field("description"),
                required: spec
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(required_by_default),
                example: field("example"),
            })
        })
        .collect()
}

fn html_id(path: &str) -> String {
    let id: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let id = id.trim_matches('_');
    if id.is_empty() {
        "root".to_string()
    } else {
        id.to_string()
    }
}
