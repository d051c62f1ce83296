use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{middleware::viewer::CurrentViewer, state::AppState},
    domain::{CreateNoticeRequest, Notice, ReactionType, UpdateNoticeRequest},
    error::Result,
    feed::{Feed, FeedItem, RecipientGroup},
};

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: String,
}

pub async fn feed(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
) -> Result<Json<Feed>> {
    let feed = state.service_context.notice_service
        .feed_for(&viewer.user)
        .await;

    Ok(Json(feed))
}

pub async fn targets(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
) -> Result<Json<Vec<RecipientGroup>>> {
    let groups = state.service_context.notice_service
        .recipient_options(&viewer.user)
        .await;

    Ok(Json(groups))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(viewer): Extension<CurrentViewer>,
) -> Result<Json<FeedItem>> {
    let item = state.service_context.notice_service
        .get_for(&id, &viewer.user)
        .await?;

    Ok(Json(item))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(viewer): Extension<CurrentViewer>,
    payload: std::result::Result<Json<CreateNoticeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Notice>)> {
    let Json(mut request) = payload?;

    // Notices are published as the viewer unless the payload says otherwise,
    // in which case the service rejects the mismatch.
    request.author_id.get_or_insert_with(|| viewer.user.id.clone());

    let notice = state.service_context.notice_service
        .create_notice(&viewer.user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(notice)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(viewer): Extension<CurrentViewer>,
    payload: std::result::Result<Json<UpdateNoticeRequest>, JsonRejection>,
) -> Result<Json<Notice>> {
    let Json(request) = payload?;

    let notice = state.service_context.notice_service
        .update_notice(&viewer.user, &id, request)
        .await?;

    Ok(Json(notice))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(viewer): Extension<CurrentViewer>,
) -> Result<Json<DeleteResponse>> {
    let removed = state.service_context.notice_service
        .delete_notice(&viewer.user, &id)
        .await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Notice removed",
        id: removed.id,
    }))
}

pub async fn react(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(viewer): Extension<CurrentViewer>,
    payload: std::result::Result<Json<ReactRequest>, JsonRejection>,
) -> Result<Json<FeedItem>> {
    let Json(request) = payload?;

    let item = state.service_context.notice_service
        .react_to_notice(&viewer.user, &id, request.reaction_type)
        .await?;

    Ok(Json(item))
}
