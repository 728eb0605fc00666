use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::handlers::multipart::{read_event_form, read_image_form};
use crate::models::EventPatch;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    pub event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

pub async fn create_event(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    caller.organizer()?;
    let (input, image) = read_event_form(multipart?).await?;
    let event = state
        .events
        .create_event(caller.identity(), input, image)
        .await?;

    Ok(created(event, "Event created successfully"))
}

pub async fn upload_image(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    caller.organizer()?;
    let image = read_image_form(multipart?).await?;
    let url = state.events.upload_image(caller.identity(), image).await?;

    Ok(success(UploadedImage { url }, "Image uploaded successfully"))
}

pub async fn update_event(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    patch: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    caller.organizer()?;
    let Json(patch) = patch?;
    let event = state
        .events
        .update_event(caller.identity(), &id, patch)
        .await?;

    Ok(success(event, "Event updated successfully"))
}

pub async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Response, AppError> {
    caller.organizer()?;
    let Json(body) = body?;
    let event = state
        .events
        .update_status(caller.identity(), &id, body.status)
        .await?;

    Ok(success(event, "Event status updated successfully"))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Response, AppError> {
    let events = state.events.list_events(query.event_type).await?;
    Ok(success(events, "Events retrieved successfully"))
}

pub async fn my_events(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, AppError> {
    let events = state.events.my_events(caller.identity()).await?;
    Ok(success(events, "Events retrieved successfully"))
}

pub async fn event_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let detail = state.events.event_detail(&id).await?;
    Ok(success(detail, "Event retrieved successfully"))
}
