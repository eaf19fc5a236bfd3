//! Handles POST /oauth/clients/register - Dynamic OAuth client registration per RFC 7591

use axum::{
    extract::{Request, State},
    http::Method,
    response::Response,
};

use crate::{
    errors::ClientRegistrationError,
    http::{context::AppState, utils_oauth::registration_response},
    oauth::{clients::parse_registration_body, types::OAuthErrorResponse},
};

/// Largest registration body read into memory
pub(crate) const MAX_REGISTRATION_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Client registration handler
///
/// Mounted for every method so that anything other than POST is answered
/// with an OAuth error instead of an empty 405. The body is read only after
/// the method and token checks.
pub async fn app_register_client_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, OAuthErrorResponse> {
    let (parts, body) = request.into_parts();

    if parts.method != Method::POST {
        tracing::debug!(method = %parts.method, "rejecting registration request method");
        return Err(ClientRegistrationError::UnsupportedMethod.into());
    }

    let auth_context = state
        .initial_access_token_gate
        .authorize(&parts.headers)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "registration refused by token gate"))?;

    let body = axum::body::to_bytes(body, MAX_REGISTRATION_BODY_BYTES)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "registration body could not be read");
            ClientRegistrationError::MalformedBody(format!(
                "Unable to read the request body (limit {} bytes).",
                MAX_REGISTRATION_BODY_BYTES
            ))
        })?;

    let parameters = parse_registration_body(&parts.headers, &body)
        .inspect_err(|e| tracing::debug!(error = %e, "registration body rejected"))?;

    let client = state
        .client_registration_service
        .register_client(&auth_context, parameters)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "client registration failed"))?;

    Ok(registration_response(&client))
}
