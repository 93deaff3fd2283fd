//! Creator routes — list/search, fetch, create, update, delete.
//!
//! Create and update accept multipart form data: a `data` part carrying the
//! record JSON plus optional `profile_image` / `cover_image` file parts.
//! Both image blobs are stored concurrently before the record is written,
//! and their URLs are stamped onto the record.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::auth::{AuthUser, MaybeAuthUser};
use crate::routes::error_json;
use crate::services::creator::{self, CreatorError, CreatorUpdate, NewCreator};
use crate::services::query::{self, SortKey};
use crate::services::upload::{self, UploadError};
use crate::state::{AppState, Creator};

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn creator_error_to_response(err: &CreatorError) -> ErrorResponse {
    let status = match err {
        CreatorError::Invalid(_) => StatusCode::BAD_REQUEST,
        CreatorError::NotFound(_) => StatusCode::NOT_FOUND,
        CreatorError::NotOwner(_) => StatusCode::FORBIDDEN,
        CreatorError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_json(status, err.to_string())
}

pub(crate) fn upload_error_to_response(err: &UploadError) -> ErrorResponse {
    let status = match err {
        UploadError::UnknownFolder(_) | UploadError::EmptyFile => StatusCode::BAD_REQUEST,
        UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_json(status, err.to_string())
}

// =============================================================================
// LIST / GET
// =============================================================================

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    /// `me` or a user UUID; omits the filter when absent.
    pub owner: Option<String>,
}

/// `GET /api/creators` — list creators, publicly readable.
/// Search and sort are applied server-side from the query string.
pub async fn list_creators(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Creator>>, ErrorResponse> {
    let sort = match params.sort.as_deref() {
        Some(raw) => Some(
            SortKey::parse(raw).ok_or_else(|| error_json(StatusCode::BAD_REQUEST, format!("unknown sort key: {raw}")))?,
        ),
        None => None,
    };

    let owner_filter = match params.owner.as_deref() {
        None => None,
        Some("me") => {
            let user = viewer
                .0
                .ok_or_else(|| error_json(StatusCode::UNAUTHORIZED, "you need to be logged in to perform this action"))?;
            Some(user.id)
        }
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| error_json(StatusCode::BAD_REQUEST, format!("invalid owner id: {raw}")))?,
        ),
    };

    let mut records = creator::list_creators(&state).await;
    if let Some(owner_id) = owner_filter {
        records.retain(|c| c.created_by == owner_id);
    }

    Ok(Json(query::apply(records, params.search.as_deref(), sort)))
}

/// `GET /api/creators/:id` — fetch one creator.
pub async fn get_creator(
    State(state): State<AppState>,
    Path(creator_id): Path<Uuid>,
) -> Result<Json<Creator>, ErrorResponse> {
    creator::get_creator(&state, creator_id)
        .await
        .map(Json)
        .ok_or_else(|| creator_error_to_response(&CreatorError::NotFound(creator_id)))
}

// =============================================================================
// MULTIPART FORM
// =============================================================================

#[derive(Default)]
struct CreatorForm {
    data: Option<Vec<u8>>,
    profile_image: Option<(String, Vec<u8>)>,
    cover_image: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> Result<CreatorForm, ErrorResponse> {
    let mut form = CreatorForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().unwrap_or("image").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("malformed form data: {e}")))?;

        match name.as_str() {
            "data" => form.data = Some(bytes.to_vec()),
            "profile_image" => form.profile_image = Some((file_name, bytes.to_vec())),
            "cover_image" => form.cover_image = Some((file_name, bytes.to_vec())),
            _ => {}
        }
    }
    Ok(form)
}

/// Store both optional image blobs concurrently, returning their URLs.
async fn store_images(
    state: &AppState,
    profile: Option<(String, Vec<u8>)>,
    cover: Option<(String, Vec<u8>)>,
) -> Result<(Option<String>, Option<String>), ErrorResponse> {
    let profile_fut = async {
        match &profile {
            Some((name, bytes)) => state.uploads.save(upload::PROFILES_FOLDER, name, bytes).await.map(Some),
            None => Ok(None),
        }
    };
    let cover_fut = async {
        match &cover {
            Some((name, bytes)) => state.uploads.save(upload::COVERS_FOLDER, name, bytes).await.map(Some),
            None => Ok(None),
        }
    };

    futures::future::try_join(profile_fut, cover_fut)
        .await
        .map_err(|e| upload_error_to_response(&e))
}

// =============================================================================
// CREATE / UPDATE / DELETE
// =============================================================================

/// `POST /api/creators` — create a creator owned by the caller.
pub async fn create_creator(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Creator>), ErrorResponse> {
    let form = read_form(multipart).await?;
    let data = form
        .data
        .ok_or_else(|| error_json(StatusCode::BAD_REQUEST, "missing data field"))?;
    let mut input: NewCreator = serde_json::from_slice(&data)
        .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("invalid creator payload: {e}")))?;

    // Validate before storing blobs so a rejected create leaves no orphaned
    // files. The service validates again when it writes.
    input.validate().map_err(|e| creator_error_to_response(&e))?;

    let (profile_url, cover_url) = store_images(&state, form.profile_image, form.cover_image).await?;
    if profile_url.is_some() {
        input.profile_image = profile_url;
    }
    if cover_url.is_some() {
        input.cover_image = cover_url;
    }

    let record = creator::create_creator(&state, input, &auth.user)
        .await
        .map_err(|e| creator_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /api/creators/:id` — update a creator the caller owns.
pub async fn update_creator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(creator_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Creator>, ErrorResponse> {
    let form = read_form(multipart).await?;
    let mut update: CreatorUpdate = match form.data {
        Some(data) => serde_json::from_slice(&data)
            .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("invalid creator payload: {e}")))?,
        None => CreatorUpdate::default(),
    };

    // Field validation and ownership are re-checked by the service, but
    // blobs should not be stored for a write that is going to be rejected.
    update.validate().map_err(|e| creator_error_to_response(&e))?;
    match creator::get_creator(&state, creator_id).await {
        Some(current) if current.created_by == auth.user.id => {}
        Some(_) => return Err(creator_error_to_response(&CreatorError::NotOwner(creator_id))),
        None => return Err(creator_error_to_response(&CreatorError::NotFound(creator_id))),
    }

    let (profile_url, cover_url) = store_images(&state, form.profile_image, form.cover_image).await?;
    if profile_url.is_some() {
        update.profile_image = profile_url;
    }
    if cover_url.is_some() {
        update.cover_image = cover_url;
    }

    let record = creator::update_creator(&state, creator_id, update, auth.user.id)
        .await
        .map_err(|e| creator_error_to_response(&e))?;
    Ok(Json(record))
}

/// `DELETE /api/creators/:id` — delete a creator the caller owns.
pub async fn delete_creator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(creator_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    creator::delete_creator(&state, creator_id, auth.user.id)
        .await
        .map_err(|e| creator_error_to_response(&e))?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
#[path = "creators_test.rs"]
mod tests;
