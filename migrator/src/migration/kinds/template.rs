//! Data-described request shapes for kind listings and mutations.
//!
//! Placeholders are written `{name}` with an alphabetic name. In paths they
//! render as text. In JSON bodies a string holding exactly one placeholder is
//! replaced by the typed value, while longer strings are interpolated.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::migration::paginator::Cursor;
use crate::migration::types::{scalar_json, KindTag, ResourceRef, TransferContext};
use crate::services::client::{HttpMethod, RequestBody, Transport};
use crate::services::errors::{MigrationError, MigrationResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub method: HttpMethod,
    pub path: &'static str,
    pub body: Option<Value>,
}

/// A template with every placeholder substituted
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<RequestBody>,
}

/// Values available to a template while rendering
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<&'static str, Value>,
}

impl RequestTemplate {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            body: None,
        }
    }

    pub fn delete(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Delete,
            path,
            body: None,
        }
    }

    pub fn post(path: &'static str, body: Value) -> Self {
        Self::with_body(HttpMethod::Post, path, body)
    }

    pub fn put(path: &'static str, body: Value) -> Self {
        Self::with_body(HttpMethod::Put, path, body)
    }

    pub fn patch(path: &'static str, body: Value) -> Self {
        Self::with_body(HttpMethod::Patch, path, body)
    }

    fn with_body(method: HttpMethod, path: &'static str, body: Value) -> Self {
        Self {
            method,
            path,
            body: Some(body),
        }
    }

    pub fn render(&self, vars: &TemplateVars) -> MigrationResult<RenderedRequest> {
        let path = self.interpolate(self.path, vars)?;
        let body = match &self.body {
            Some(body) => Some(RequestBody::Json(self.render_value(body, vars)?)),
            None => None,
        };

        Ok(RenderedRequest {
            method: self.method,
            path,
            body,
        })
    }

    /// Render and issue the request
    pub async fn send(&self, transport: &dyn Transport, vars: &TemplateVars) -> MigrationResult<Value> {
        let request = self.render(vars)?;
        let response = transport
            .request(request.method, &request.path, request.body.as_ref())
            .await?;
        Ok(response)
    }

    fn render_value(&self, value: &Value, vars: &TemplateVars) -> MigrationResult<Value> {
        match value {
            Value::String(text) => match whole_placeholder(text) {
                Some(name) => vars.get(name).cloned().ok_or_else(|| self.unknown(name)),
                None => Ok(Value::String(self.interpolate(text, vars)?)),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, vars))
                .collect::<MigrationResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(fields) => {
                let mut rendered = Map::with_capacity(fields.len());
                for (key, field) in fields {
                    rendered.insert(key.clone(), self.render_value(field, vars)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }

    fn interpolate(&self, text: &str, vars: &TemplateVars) -> MigrationResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match placeholder_name(after) {
                Some(name) => {
                    let value = vars.get(name).ok_or_else(|| self.unknown(name))?;
                    out.push_str(&value_text(value));
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn unknown(&self, placeholder: &str) -> MigrationError {
        MigrationError::Template {
            template: self.to_string(),
            placeholder: placeholder.to_string(),
        }
    }
}

impl fmt::Display for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Name of a placeholder starting right after an opening brace
fn placeholder_name(text: &str) -> Option<&str> {
    let end = text.find('}')?;
    let name = &text[..end];
    (!name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic())).then_some(name)
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    (!inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphabetic())).then_some(inner)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: Value) -> Self {
        self.values.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn for_run(ctx: &TransferContext) -> Self {
        Self::new()
            .with("sourceUserId", ctx.source_user_id.to_json())
            .with("newOwnerId", ctx.new_owner_id.to_json())
            .with("sourceDisplayName", Value::String(ctx.source_display_name.clone()))
            .with(
                "scheduledReportsDatasetId",
                Value::String(ctx.scheduled_reports_dataset_id.clone()),
            )
    }

    /// Variables for one listing page
    pub fn for_listing(ctx: &TransferContext, cursor: Cursor) -> Self {
        Self::for_run(ctx)
            .with("offset", Value::from(cursor.offset))
            .with("limit", Value::from(cursor.page_size))
    }

    /// Variables for a mutation of one resource
    pub fn for_item(ctx: &TransferContext, item: &ResourceRef) -> Self {
        let vars = Self::for_run(ctx).with("id", scalar_json(&item.id));
        match &item.parent_id {
            Some(parent) => vars.with("parentId", scalar_json(parent)),
            None => vars,
        }
    }

    /// Variables for a bulk mutation of a batch of resources
    pub fn for_batch(ctx: &TransferContext, items: &[&ResourceRef]) -> Self {
        let ids = items.iter().map(|item| scalar_json(&item.id)).collect();
        Self::for_run(ctx).with("ids", Value::Array(ids))
    }
}

/// How resource references are read out of a listing response
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsSelector {
    /// JSON pointer to the items array; empty for a root array
    pub items: &'static str,
    pub id: IdSelector,
    pub parent: Option<&'static str>,
    pub state: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdSelector {
    /// JSON pointer inside each item object
    Field(&'static str),
    /// Column of a query result row
    Column(usize),
}

impl ItemsSelector {
    pub fn field(items: &'static str, id: &'static str) -> Self {
        Self {
            items,
            id: IdSelector::Field(id),
            parent: None,
            state: None,
        }
    }

    pub fn rows(items: &'static str, column: usize) -> Self {
        Self {
            items,
            id: IdSelector::Column(column),
            parent: None,
            state: None,
        }
    }

    pub fn with_parent(mut self, pointer: &'static str) -> Self {
        self.parent = Some(pointer);
        self
    }

    pub fn with_state(mut self, pointer: &'static str) -> Self {
        self.state = Some(pointer);
        self
    }

    /// Extract the page's resources in backend order.
    ///
    /// Items without an id fail the page: dropping them would shorten the
    /// page and end enumeration early.
    pub fn select(&self, kind: KindTag, response: &Value) -> MigrationResult<Vec<ResourceRef>> {
        let items = match response.pointer(self.items) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(MigrationError::InvalidResponse {
                    kind,
                    message: format!("expected an array at '{}', got {}", self.items, json_type(other)),
                })
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| -> MigrationResult<ResourceRef> {
                let id = match &self.id {
                    IdSelector::Field(pointer) => item.pointer(pointer),
                    IdSelector::Column(column) => item.get(*column),
                }
                .and_then(scalar_text)
                .ok_or_else(|| MigrationError::InvalidResponse {
                    kind,
                    message: format!("item {} has no usable id", index),
                })?;

                let mut resource = ResourceRef::new(kind, id);
                resource.parent_id = self
                    .parent
                    .and_then(|pointer| item.pointer(pointer))
                    .and_then(scalar_text);
                resource.state = self
                    .state
                    .and_then(|pointer| item.pointer(pointer))
                    .and_then(scalar_text);
                Ok(resource)
            })
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
