use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use tracing::debug;

use crate::models::{ImageUpload, Location, NewEvent};
use crate::utils::error::AppError;

/// Multipart field carrying the cover image.
pub const IMAGE_FIELD: &str = "image";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "upload";

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::ValidationError(format!("Invalid multipart body: {}", err.body_text()))
}

/// Reads the event fields and optional image from a create form. Location
/// may arrive as a JSON `location` field or as `location[houseNumber]` style
/// fields.
pub async fn read_event_form(
    mut multipart: Multipart,
) -> Result<(NewEvent, Option<ImageUpload>), AppError> {
    let mut input = NewEvent::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            image = read_image(field).await?;
            continue;
        }

        let value = field.text().await.map_err(bad_multipart)?;
        apply_text_field(&mut input, &name, value)?;
    }

    Ok((input, image))
}

/// Reads only the image field, ignoring anything else in the form.
pub async fn read_image_form(mut multipart: Multipart) -> Result<Option<ImageUpload>, AppError> {
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some(IMAGE_FIELD) {
            image = read_image(field).await?;
        }
    }
    Ok(image)
}

/// An empty file part counts as no image.
async fn read_image(field: Field<'_>) -> Result<Option<ImageUpload>, AppError> {
    let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let bytes = field.bytes().await.map_err(bad_multipart)?;

    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        bytes,
    }))
}

fn apply_text_field(input: &mut NewEvent, name: &str, value: String) -> Result<(), AppError> {
    match name {
        "title" => input.title = value,
        "description" => input.description = value,
        "event_type" => input.event_type = value,
        "location" => {
            input.location = serde_json::from_str::<Location>(&value).map_err(|err| {
                AppError::ValidationError(format!("location must be a JSON object: {}", err))
            })?;
        }
        other => match location_key(other) {
            Some(key) => set_location_field(&mut input.location, key, value),
            // organizer_id is always taken from the credential
            None => debug!(field = other, "Ignoring multipart field"),
        },
    }
    Ok(())
}

fn location_key(name: &str) -> Option<&str> {
    name.strip_prefix("location[")
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| name.strip_prefix("location."))
}

fn set_location_field(location: &mut Location, key: &str, value: String) {
    match key {
        "houseNumber" | "house_number" => location.house_number = value,
        "ward" => location.ward = value,
        "district" => location.district = value,
        "province" => location.province = value,
        other => debug!(field = other, "Ignoring location field"),
    }
}
