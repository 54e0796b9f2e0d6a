// Copyright 2023 Remi Bernotavicius

use crate::relation::RelationError;
use crate::validation::ValidationError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use derive_more::Display;
use serde_json::json;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Entity {
    #[display("recipe")]
    Recipe,
    #[display("user")]
    User,
    #[display("tag")]
    Tag,
    #[display("ingredient")]
    Ingredient,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Relation(#[from] RelationError),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("migration error: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),

    #[error("pool error: {0}")]
    Pool(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn malformed(field: &'static str, message: String) -> Error {
    Error::Validation(ValidationError::Malformed { field, message })
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        malformed("non_field_errors", rejection.body_text())
    }
}

// Every routed path parameter is a numeric id.
impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        malformed("id", rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        malformed("non_field_errors", rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ e.field(): [e.to_string()] }),
            ),
            Self::Relation(e) => (StatusCode::BAD_REQUEST, json!({ "errors": e.to_string() })),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "detail": self.to_string() })),
            Self::PermissionDenied => (StatusCode::FORBIDDEN, json!({ "detail": self.to_string() })),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": self.to_string() }),
            ),
            _ => {
                log::error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": "internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[test]
fn status_codes() {
    use crate::database::models::TagId;

    let cases = [
        (
            Error::from(ValidationError::DuplicateTag(TagId::from(3))),
            StatusCode::BAD_REQUEST,
        ),
        (
            Error::from(RelationError::SelfReferenceNotAllowed),
            StatusCode::BAD_REQUEST,
        ),
        (
            malformed("id", "Invalid URL".into()),
            StatusCode::BAD_REQUEST,
        ),
        (Error::NotFound(Entity::Recipe), StatusCode::NOT_FOUND),
        (Error::PermissionDenied, StatusCode::FORBIDDEN),
        (Error::Unauthorized, StatusCode::UNAUTHORIZED),
        (
            Error::from(diesel::result::Error::NotFound),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (error, status) in cases {
        assert_eq!(error.into_response().status(), status);
    }
}
