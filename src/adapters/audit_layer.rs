use {
    crate::domain::exchange::{CapturedRequest, CapturedResponse, Credentials},
    crate::services::capture::CaptureHook,
    axum::{
        body::{Body, Bytes},
        extract::{
            ConnectInfo, FromRequest, FromRequestParts, OriginalUri, RawPathParams, Request, State,
        },
        http::{StatusCode, request},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    serde_json::{Map, Value},
    std::{net::SocketAddr, sync::Arc},
};

/// Empty bodies are absent; anything that is not JSON is kept as text.
fn body_value(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

async fn path_params(parts: &mut request::Parts) -> Map<String, Value> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
        Err(_) => Map::new(),
    }
}

fn captured_response(status: StatusCode, bytes: &Bytes) -> CapturedResponse {
    let body = body_value(bytes);
    if !(status.is_client_error() || status.is_server_error()) {
        return CapturedResponse::success(status.as_u16(), body);
    }

    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match &body {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    CapturedResponse::failure(status.as_u16(), message)
}

/// Buffer the response, hand both sides to the hook and rebuild the response
/// from the same parts and bytes.
async fn finish(hook: &CaptureHook, request: &CapturedRequest, response: Response) -> Response {
    let (parts, body) = response.into_parts();
    let response_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // The handler's body stream broke; nothing left to audit or forward.
            tracing::error!(error = %e, path = %request.path, "response body unreadable");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let captured = captured_response(parts.status, &response_bytes);
    hook.capture(request, &captured).await;

    Response::from_parts(parts, Body::from(response_bytes))
}

/// Route layer that audits the wrapped handler with `hook`.
///
/// Install with `route_layer`/`MethodRouter::layer` so path parameters are
/// visible. The request body is buffered under the router's own
/// `DefaultBodyLimit`; a body the handler could not have read gets the same
/// rejection the handler's extractor would produce, and that rejection is
/// audited like any other error response. The response leaves with the same
/// status, headers and body the handler produced.
pub async fn audit_layer(
    State(hook): State<Arc<CaptureHook>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let mut captured_request = CapturedRequest {
        method: parts.method.clone(),
        path: parts
            .extensions
            .get::<OriginalUri>()
            .map_or(parts.uri.path(), |OriginalUri(uri)| uri.path())
            .to_string(),
        params: path_params(&mut parts).await,
        payload: None,
        headers: parts.headers.clone(),
        remote_addr: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
        credentials: parts.extensions.get::<Credentials>().cloned(),
    };

    let mut body_request = Request::new(body);
    *body_request.extensions_mut() = parts.extensions.clone();
    let request_bytes = match Bytes::from_request(body_request, &()).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(error = %rejection, path = %captured_request.path, "request body rejected");
            return finish(&hook, &captured_request, rejection.into_response()).await;
        }
    };
    captured_request.payload = body_value(&request_bytes);

    let response = next
        .run(Request::from_parts(parts, Body::from(request_bytes)))
        .await;

    finish(&hook, &captured_request, response).await
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn error_message_from_json_body() {
        let bytes = Bytes::from_static(br#"{"error_code":"not_found","message":"gone"}"#);
        let resp = captured_response(StatusCode::NOT_FOUND, &bytes);
        assert_eq!(resp, CapturedResponse::failure(404, "gone"));
    }

    #[test]
    fn error_message_falls_back_to_reason() {
        let resp = captured_response(StatusCode::INTERNAL_SERVER_ERROR, &Bytes::new());
        assert_eq!(resp.error_message(), Some("Internal Server Error"));
        assert_eq!(resp.status_code(), 500);
    }

    #[test]
    fn plain_text_error_body_is_the_message() {
        let bytes = Bytes::from_static(b"Failed to parse the request body as JSON");
        let resp = captured_response(StatusCode::BAD_REQUEST, &bytes);
        assert_eq!(
            resp.error_message(),
            Some("Failed to parse the request body as JSON")
        );
    }

    #[test]
    fn success_keeps_json_body() {
        let bytes = Bytes::from_static(br#"[{"_id":"a"}]"#);
        let resp = captured_response(StatusCode::CREATED, &bytes);
        assert_eq!(resp, CapturedResponse::success(201, Some(json!([{"_id": "a"}]))));
        assert_eq!(
            captured_response(StatusCode::NO_CONTENT, &Bytes::new()),
            CapturedResponse::success(204, None)
        );
    }
}
