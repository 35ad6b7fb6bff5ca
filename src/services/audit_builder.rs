use {
    super::client_ip::resolve_client_ip,
    super::documents::DocumentIds,
    super::field_path::lookup_id,
    crate::domain::audit::{AuditAction, AuditPolicy, AuditRecord, HttpMethod, NewAuditRecordParams},
    crate::domain::exchange::{CapturedRequest, CapturedResponse},
    axum::http::Method,
    serde_json::Value,
};

/// `null`, `{}`, `[]` and `""` are stored as absent.
fn non_empty(value: Option<&Value>) -> Option<Value> {
    let empty = match value? {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };
    if empty { None } else { value.cloned() }
}

/// Recorded verb for an action. Adds follow the request: PUT stays PUT,
/// anything else is recorded as POST.
pub fn method_for(action: AuditAction, request_method: &Method) -> HttpMethod {
    match action {
        AuditAction::Create => HttpMethod::Post,
        AuditAction::Update => HttpMethod::Put,
        AuditAction::Delete | AuditAction::Remove => HttpMethod::Delete,
        AuditAction::Add if *request_method == Method::PUT => HttpMethod::Put,
        AuditAction::Add => HttpMethod::Post,
    }
}

/// Assemble the record for one completed operation. Pure.
pub fn build_record(
    policy: &AuditPolicy,
    user_id_key: &str,
    documents: DocumentIds,
    request: &CapturedRequest,
    response: &CapturedResponse,
) -> AuditRecord {
    let action = policy.action();
    let relationship = action.is_relationship();

    let user = request
        .credentials
        .as_ref()
        .and_then(|c| lookup_id(&c.0, user_id_key));

    let params = if request.params.is_empty() {
        None
    } else {
        Some(Value::Object(request.params.clone()))
    };

    AuditRecord::new(NewAuditRecordParams {
        method: method_for(action, &request.method),
        action,
        endpoint: request.path.clone(),
        user,
        collection_name: policy.owner().name().to_string(),
        child_collection_name: policy
            .child()
            .filter(|_| relationship)
            .map(|c| c.name().to_string()),
        association_type: policy.association_type().filter(|_| relationship),
        documents,
        payload: non_empty(request.payload.as_ref()),
        params,
        result: response.body().cloned(),
        is_error: response.is_error(),
        status_code: response.status_code(),
        response_message: response.error_message().map(str::to_string),
        ip_address: resolve_client_ip(&request.headers, request.remote_addr.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::audit::{AssociationType, CollectionMeta},
        crate::domain::exchange::{ErrorOutput, ErrorPayload},
        axum::http::HeaderValue,
        serde_json::json,
    };

    const USER_KEY: &str = "user._id";

    fn create_policy() -> AuditPolicy {
        AuditPolicy::new(AuditAction::Create, CollectionMeta::new("user"), None, None)
    }

    fn ok(body: Value) -> CapturedResponse {
        CapturedResponse::success(200, Some(body))
    }

    #[test]
    fn empty_payload_and_params_become_null() {
        let req = CapturedRequest::new(Method::POST, "/user").with_payload(json!({}));
        let record = build_record(&create_policy(), USER_KEY, None, &req, &ok(json!({})));
        assert_eq!(record.payload(), None);
        assert_eq!(record.params(), None);
        assert_eq!(record.result(), Some(&json!({})));
    }

    #[test]
    fn payload_and_params_kept_when_present() {
        let req = CapturedRequest::new(Method::PUT, "/user/u1")
            .with_param("_id", "u1")
            .with_payload(json!({"name": "n"}));
        let policy = AuditPolicy::new(AuditAction::Update, CollectionMeta::new("user"), None, None);
        let record = build_record(&policy, USER_KEY, None, &req, &ok(json!({})));
        assert_eq!(record.payload(), Some(&json!({"name": "n"})));
        assert_eq!(record.params(), Some(&json!({"_id": "u1"})));
        assert_eq!(record.method(), HttpMethod::Put);
        assert_eq!(record.endpoint(), "/user/u1");
    }

    #[test]
    fn user_resolved_from_credentials_path() {
        let req = CapturedRequest::new(Method::POST, "/user")
            .with_credentials(json!({"user": {"_id": "actor-1"}}));
        let record = build_record(&create_policy(), USER_KEY, None, &req, &ok(json!({})));
        assert_eq!(record.user(), Some("actor-1"));

        let anon = CapturedRequest::new(Method::POST, "/user").with_credentials(json!({}));
        let record = build_record(&create_policy(), USER_KEY, None, &anon, &ok(json!({})));
        assert_eq!(record.user(), None);
    }

    #[test]
    fn failure_sets_error_fields() {
        let req = CapturedRequest::new(Method::POST, "/user");
        let resp = CapturedResponse::failure(409, "duplicate key");
        let record = build_record(&create_policy(), USER_KEY, None, &req, &resp);
        assert!(record.is_error());
        assert_eq!(record.status_code(), 409);
        assert_eq!(record.response_message(), Some("duplicate key"));
        assert_eq!(record.result(), None);
    }

    #[test]
    fn status_falls_back_to_output_status() {
        let req = CapturedRequest::new(Method::POST, "/user");
        let resp = CapturedResponse::Failure {
            status_code: None,
            output: ErrorOutput {
                status_code: 503,
                payload: ErrorPayload {
                    message: "unavailable".into(),
                },
            },
        };
        let record = build_record(&create_policy(), USER_KEY, None, &req, &resp);
        assert_eq!(record.status_code(), 503);
    }

    #[test]
    fn success_has_no_message() {
        let req = CapturedRequest::new(Method::POST, "/user");
        let record = build_record(&create_policy(), USER_KEY, None, &req, &ok(json!({"_id": "x"})));
        assert!(!record.is_error());
        assert_eq!(record.status_code(), 200);
        assert_eq!(record.response_message(), None);
    }

    #[test]
    fn relationship_metadata_and_ip() {
        let policy = AuditPolicy::new(
            AuditAction::Add,
            CollectionMeta::new("user"),
            Some(CollectionMeta::new("group")),
            Some(AssociationType::ManyMany),
        );
        let mut req = CapturedRequest::new(Method::PUT, "/user/o1/group/c1")
            .with_remote_addr("2.2.2.2");
        req.headers
            .insert("x-real-ip", HeaderValue::from_static("1.1.1.1"));
        let record = build_record(
            &policy,
            USER_KEY,
            Some(vec![json!("o1"), json!("c1")]),
            &req,
            &ok(json!(null)),
        );
        assert_eq!(record.method(), HttpMethod::Put);
        assert_eq!(record.child_collection_name(), Some("group"));
        assert_eq!(record.association_type(), Some(AssociationType::ManyMany));
        assert_eq!(record.ip_address(), Some("1.1.1.1"));
        assert_eq!(record.result(), None);
        assert_eq!(record.documents(), Some(&[json!("o1"), json!("c1")][..]));
    }

    #[test]
    fn add_verb_defaults_to_post() {
        assert_eq!(method_for(AuditAction::Add, &Method::POST), HttpMethod::Post);
        assert_eq!(method_for(AuditAction::Add, &Method::PATCH), HttpMethod::Post);
        assert_eq!(method_for(AuditAction::Remove, &Method::POST), HttpMethod::Delete);
    }
}
