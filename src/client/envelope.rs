//! Response envelope decoding
//!
//! Collection endpoints answer in one of two shapes:
//!
//! ```text
//! { "success": true, "data": { "items": [...], "pagination": { "page", "limit", "total", "pages" } } }
//! { "success": true, "<resource>": [...] }
//! ```
//!
//! Both are normalized into a [`FetchedPage`] here, so nothing past the
//! fetch boundary branches on the response shape. A body with
//! `"success": false` is a failure even under a 2xx status.

use crate::config::EnvelopeShape;
use crate::core::error::ViewError;
use crate::core::query::PaginationMeta;
use crate::core::record::Item;
use crate::core::service::{FetchedPage, MutationOutcome};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct PaginatedData {
    items: Vec<Value>,
    #[serde(default)]
    pagination: Option<PaginationMeta>,
}

/// Decoded form of a collection body
#[derive(Debug)]
enum Envelope {
    Paginated(PaginatedData),
    Named(Vec<Value>),
    Bare(Vec<Value>),
}

/// Reject bodies that report `success: false`
///
/// The message is read from `message`, then `error`.
pub fn check_success(body: &Value, status: Option<u16>) -> Result<(), ViewError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ViewError::server(status, failure_message(body)));
    }
    Ok(())
}

/// Best-effort failure message from an error body
pub fn failure_message(body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("request failed")
        .to_string()
}

fn decode_envelope(body: Value, shape: &EnvelopeShape, resource: &str) -> Result<Envelope, ViewError> {
    match shape {
        EnvelopeShape::Paginated => paginated(body).ok_or_else(|| missing(resource, "data.items")),
        EnvelopeShape::Named(key) => named(body, key).ok_or_else(|| missing(resource, key)),
        EnvelopeShape::Auto => {
            if let Value::Array(items) = body {
                return Ok(Envelope::Bare(items));
            }
            if body.pointer("/data/items").is_some() {
                return paginated(body).ok_or_else(|| missing(resource, "data.items"));
            }
            if body.get(resource).is_some_and(Value::is_array) {
                return named(body, resource).ok_or_else(|| missing(resource, resource));
            }
            if body.get("data").is_some_and(Value::is_array) {
                return named(body, "data").ok_or_else(|| missing(resource, "data"));
            }
            Err(missing(resource, "any collection field"))
        }
    }
}

fn paginated(body: Value) -> Option<Envelope> {
    let data = body.get("data")?.clone();
    serde_json::from_value::<PaginatedData>(data)
        .ok()
        .map(Envelope::Paginated)
}

fn named(mut body: Value, key: &str) -> Option<Envelope> {
    match body.get_mut(key)?.take() {
        Value::Array(items) => Some(Envelope::Named(items)),
        _ => None,
    }
}

fn missing(resource: &str, field: &str) -> ViewError {
    ViewError::server(
        None,
        format!("unexpected response shape for '{}': missing {}", resource, field),
    )
}

/// Normalize a collection body into a page of items
pub fn decode_page(
    body: Value,
    shape: &EnvelopeShape,
    resource: &str,
    id_field: &str,
) -> Result<FetchedPage, ViewError> {
    check_success(&body, None)?;

    let (raw, pagination) = match decode_envelope(body, shape, resource)? {
        Envelope::Paginated(data) => (data.items, data.pagination),
        Envelope::Named(items) | Envelope::Bare(items) => (items, None),
    };

    let items = raw
        .into_iter()
        .map(|v| Item::from_json(v, id_field))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match pagination {
        Some(meta) => FetchedPage {
            total_count: meta.total.max(items.len()),
            page_count: Some(meta.pages),
            items,
        },
        None => FetchedPage::complete(items),
    })
}

/// Normalize a mutation body
///
/// An item is looked up at the top level, under `data`, or under the
/// singular resource key. Anything else is returned as a plain value.
pub fn decode_mutation(body: Value, id_field: &str, singular: &str) -> Result<MutationOutcome, ViewError> {
    check_success(&body, None)?;

    if body.is_null() {
        return Ok(MutationOutcome::Done);
    }

    let candidates = [Some(&body), body.get("data"), body.get(singular)];
    for candidate in candidates.into_iter().flatten() {
        if candidate.is_object() {
            if let Ok(item) = Item::from_json(candidate.clone(), id_field) {
                return Ok(MutationOutcome::Item(item));
            }
        }
    }

    let is_bare_ack = body
        .as_object()
        .is_some_and(|obj| obj.keys().all(|k| k == "success" || k == "message"));
    if is_bare_ack {
        return Ok(MutationOutcome::Done);
    }

    Ok(MutationOutcome::Value(body))
}
