use crate::errors::ClientError;
use http::StatusCode;

/// Map a failed HTTP response to a typed error, draining the body for the
/// backend's `detail` field. Never called for 2xx responses.
pub async fn classify_failure(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify(status, &body)
}

/// Classification rules, in priority order: 422 validation, 404 not found,
/// 401 authentication challenge, anything else a server error.
pub fn classify(status: StatusCode, body: &str) -> ClientError {
    match status {
        StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(
            detail_from_body(body).unwrap_or_else(|| "request failed validation".to_string()),
        ),
        StatusCode::NOT_FOUND => ClientError::NotFound(
            detail_from_body(body).unwrap_or_else(|| "resource not found".to_string()),
        ),
        StatusCode::UNAUTHORIZED => ClientError::AuthRequired,
        status => ClientError::ServerError {
            status: status.as_u16(),
            detail: detail_from_body(body)
                .unwrap_or_else(|| "unexpected backend response".to_string()),
        },
    }
}

/// Backend errors carry a human-readable `detail` field when available.
fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_detail_comes_from_the_body() {
        assert_eq!(
            classify(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":"bad field"}"#
            ),
            ClientError::Validation("bad field".to_string())
        );
    }

    #[test]
    fn validation_without_detail_uses_generic_message() {
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, "not json"),
            ClientError::Validation("request failed validation".to_string())
        );
    }

    #[test]
    fn not_found_is_classified() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, r#"{"detail":"no such document"}"#),
            ClientError::NotFound("no such document".to_string())
        );
    }

    #[test]
    fn unauthorized_becomes_auth_required() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, ""),
            ClientError::AuthRequired
        );
    }

    #[test]
    fn other_failures_become_server_errors() {
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            ClientError::ServerError {
                status: 500,
                detail: "unexpected backend response".to_string(),
            }
        );
    }

    #[test]
    fn detail_must_be_a_string_to_count() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, r#"{"detail":{"nested":true}}"#),
            ClientError::NotFound("resource not found".to_string())
        );
    }
}
