//! OAuth response helpers shared by the HTTP handlers.

use axum::{
    Json,
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA},
    },
    response::{IntoResponse, Response},
};

use crate::errors::{ClientRegistrationError, InitialAccessTokenError};
use crate::oauth::types::{
    Client, ERROR_INVALID_REQUEST, ERROR_SERVER_ERROR, OAuthErrorResponse,
};

const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Mark a response as uncacheable and force the JSON content type
fn no_store(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

impl IntoResponse for OAuthErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        no_store((status, Json(self)).into_response())
    }
}

impl From<ClientRegistrationError> for OAuthErrorResponse {
    fn from(error: ClientRegistrationError) -> Self {
        let status = match error {
            ClientRegistrationError::UnsupportedMethod => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        };
        OAuthErrorResponse::new(status, ERROR_INVALID_REQUEST, error.description())
    }
}

impl From<InitialAccessTokenError> for OAuthErrorResponse {
    fn from(error: InitialAccessTokenError) -> Self {
        match error {
            InitialAccessTokenError::LookupFailed(_) => OAuthErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_SERVER_ERROR,
                error.description(),
            ),
            _ => OAuthErrorResponse::invalid_request(StatusCode::BAD_REQUEST, error.description()),
        }
    }
}

/// Build the `201 Created` response for a newly registered client
pub fn registration_response(client: &Client) -> Response {
    no_store((StatusCode::CREATED, Json(client.all())).into_response())
}
