use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(Uuid),
    #[error("comment not found: {0}")]
    CommentNotFound(Uuid),
    #[error("invalid input")]
    InvalidInput(Vec<String>),
    #[error("post already liked")]
    AlreadyLiked,
    #[error("post has not yet been liked")]
    NotYetLiked,
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("conflicting concurrent updates")]
    Conflict,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::CommentNotFound(_) => StatusCode::NOT_FOUND,
            // Forbidden maps to 401, matching the "User not authorised"
            // responses this API has always produced.
            DomainError::Unauthorized | DomainError::Forbidden => StatusCode::UNAUTHORIZED,
            DomainError::InvalidInput(_) | DomainError::AlreadyLiked | DomainError::NotYetLiked => {
                StatusCode::BAD_REQUEST
            }
            DomainError::UserAlreadyExists(_) | DomainError::Conflict => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal detail stays in the logs, never in the response body.
        if let DomainError::Internal(_) = self {
            return HttpResponse::build(self.status_code()).json(ErrorBody {
                error: "server error",
                details: None,
            });
        }

        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(resource)
            | DomainError::CommentNotFound(resource)
            | DomainError::UserNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::InvalidInput(errors) => Some(json!({ "errors": errors })),
            DomainError::Forbidden => {
                Some(json!({ "message": "you do not have permission to modify this resource" }))
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_api_contract() {
        let id = Uuid::new_v4();
        let cases = [
            (DomainError::PostNotFound(id), StatusCode::NOT_FOUND),
            (DomainError::CommentNotFound(id), StatusCode::NOT_FOUND),
            (DomainError::UserNotFound(id), StatusCode::NOT_FOUND),
            (DomainError::Unauthorized, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden, StatusCode::UNAUTHORIZED),
            (
                DomainError::InvalidInput(vec!["text is required".into()]),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::AlreadyLiked, StatusCode::BAD_REQUEST),
            (DomainError::NotYetLiked, StatusCode::BAD_REQUEST),
            (DomainError::Conflict, StatusCode::CONFLICT),
            (
                DomainError::UserAlreadyExists("x".into()),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error:?}");
        }
    }

    #[test]
    fn internal_detail_never_reaches_the_body() {
        let response = DomainError::Internal("connection refused to 10.0.0.5".into())
            .error_response();
        let body = actix_web::body::to_bytes(response.into_body());
        // error_response builds an eager JSON body, so this resolves
        // without an executor.
        let bytes = futures_util::FutureExt::now_or_never(body)
            .expect("body is eager")
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.5"));
        assert!(text.contains("server error"));
    }
}
