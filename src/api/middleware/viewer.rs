use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    domain::User,
    error::AppError,
};

/// The user a request is made on behalf of.
#[derive(Clone)]
pub struct CurrentViewer {
    pub user: User,
}

/// Resolves the viewer from the identity header set by the upstream
/// gateway. Session handling happens before requests reach this service.
pub async fn require_viewer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = state.settings.feed.viewer_header.as_str();

    let user_id = request
        .headers()
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .service_context
        .directory_repo
        .find_user(&user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Rejecting request for unknown user {}", user_id);
            AppError::Unauthorized
        })?;

    request.extensions_mut().insert(CurrentViewer { user });

    Ok(next.run(request).await)
}
