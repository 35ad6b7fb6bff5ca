//! Which document identifiers an operation touched, one rule per action.
//!
//! Every rule is total: a missing field shrinks the result instead of failing,
//! and a rule that finds nothing returns `None`.

use {
    crate::domain::audit::AuditAction,
    crate::domain::exchange::{CapturedRequest, CapturedResponse},
    serde_json::Value,
};

pub const ID_FIELD: &str = "_id";
pub const OWNER_ID_PARAM: &str = "ownerId";
pub const CHILD_ID_PARAM: &str = "childId";

pub type DocumentIds = Option<Vec<Value>>;

fn non_empty(ids: Vec<Value>) -> DocumentIds {
    if ids.is_empty() { None } else { Some(ids) }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

/// Dispatch to the rule for `action`.
pub fn extract(
    action: AuditAction,
    request: &CapturedRequest,
    response: &CapturedResponse,
) -> DocumentIds {
    match action {
        AuditAction::Create => created_ids(response),
        AuditAction::Update => updated_ids(request),
        AuditAction::Delete => deleted_ids(request),
        AuditAction::Add => added_ids(request),
        AuditAction::Remove => removed_ids(request),
    }
}

/// Ids of the records in the response body.
pub fn created_ids(response: &CapturedResponse) -> DocumentIds {
    match response.body()? {
        Value::Array(docs) => non_empty(
            docs.iter()
                .filter_map(|doc| field(doc, ID_FIELD))
                .cloned()
                .collect(),
        ),
        doc => field(doc, ID_FIELD).map(|id| vec![id.clone()]),
    }
}

/// The `_id` path parameter, whatever the payload says.
pub fn updated_ids(request: &CapturedRequest) -> DocumentIds {
    request.param(ID_FIELD).map(|id| vec![id.clone()])
}

/// Single delete uses the `_id` parameter, bulk delete the payload.
///
/// A payload array is read as records when its *first* element has an `_id`,
/// and as bare ids otherwise. Mixed arrays keep whatever the first element
/// decides.
pub fn deleted_ids(request: &CapturedRequest) -> DocumentIds {
    let source = request
        .param(ID_FIELD)
        .or(request.payload.as_ref().filter(|p| !p.is_null()))?;

    match source {
        Value::Array(items) => {
            let as_records = items.first().and_then(|f| field(f, ID_FIELD)).is_some();
            if as_records {
                non_empty(
                    items
                        .iter()
                        .filter_map(|doc| field(doc, ID_FIELD))
                        .cloned()
                        .collect(),
                )
            } else {
                non_empty(items.clone())
            }
        }
        single => Some(vec![single.clone()]),
    }
}

/// Owner first, then the child parameter or every child in the payload.
pub fn added_ids(request: &CapturedRequest) -> DocumentIds {
    let mut ids: Vec<Value> = request.param(OWNER_ID_PARAM).cloned().into_iter().collect();

    if let Some(child) = request.param(CHILD_ID_PARAM) {
        ids.push(child.clone());
    } else {
        for child in payload_items(request) {
            let id = field(child, CHILD_ID_PARAM).unwrap_or(child);
            ids.push(id.clone());
        }
    }

    non_empty(ids)
}

/// Owner first, then the child parameter or the payload taken as child ids.
pub fn removed_ids(request: &CapturedRequest) -> DocumentIds {
    let mut ids: Vec<Value> = request.param(OWNER_ID_PARAM).cloned().into_iter().collect();

    if let Some(child) = request.param(CHILD_ID_PARAM) {
        ids.push(child.clone());
    } else {
        ids.extend(payload_items(request).cloned());
    }

    non_empty(ids)
}

/// A payload array yields its elements; any other non-null payload is one item.
fn payload_items(request: &CapturedRequest) -> impl Iterator<Item = &Value> {
    let items: &[Value] = match request.payload.as_ref() {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(single) => std::slice::from_ref(single),
    };
    items.iter()
}
