//! Standalone upload route.
//!
//! Clients that stage images before submitting the creator form use this
//! endpoint; the returned URL goes into the record payload as-is.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::routes::auth::AuthUser;
use crate::routes::error_json;
use crate::state::AppState;

/// `POST /api/uploads/:folder` — store one file, return its URL.
pub async fn upload_file(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(folder): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("malformed form data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_json(StatusCode::BAD_REQUEST, format!("malformed form data: {e}")))?;

        let url = state
            .uploads
            .save(&folder, &file_name, &bytes)
            .await
            .map_err(|e| super::creators::upload_error_to_response(&e))?;
        return Ok(Json(serde_json::json!({ "url": url })));
    }

    Err(error_json(StatusCode::BAD_REQUEST, "missing file field"))
}
