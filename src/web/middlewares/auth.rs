use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    Config, auth,
    web::{
        AppState, RequestContext,
        context::{AuthenticatedUser, UserRole},
        error::WebError,
    },
};

pub static AUTH_TOKEN: &str = "SID";

/// Builds the request context from the SID cookie. Identity lives entirely in
/// the token claims; there is no user table behind this service.
pub async fn extract_context_fn(
    State(_state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) => token,
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let claims = auth::process_token(token.value(), Config::get_or_init(false).await.app().jwt())
        .map_err(|e| WebError::auth_cookie_invalid(AUTH_TOKEN, e))?;
    let claims = claims.claims;

    let Ok(id) = claims.sub.parse::<uuid::Uuid>() else {
        tracing::warn!("token `sub` is not a uuid, treating request as anonymous");
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let user = AuthenticatedUser::new(
        id,
        UserRole::from(claims.role.as_str()),
        claims.name,
        claims.email,
    );
    req.extensions_mut()
        .insert(RequestContext::new(Some(user)));

    Ok(next.run(req).await)
}
