//! Creator service — CRUD with ownership enforcement.
//!
//! DESIGN
//! ======
//! The catalog lives in memory and is hydrated from Postgres at startup.
//! Create and update land in the store immediately and mark the record dirty
//! for the background flush, so list reads reflect a confirmed write without
//! a reload. Delete removes from memory and from Postgres in the same call,
//! leaving a tombstone for the flush task in case an in-flight flush
//! snapshotted the record before it was removed.
//!
//! Ownership is checked against the in-memory record before any database
//! write: a caller who does not own the record gets `NotOwner` and no I/O
//! happens.

use std::collections::BTreeMap;

use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::services::session::SessionUser;
use crate::state::{AppState, Creator, now_ms};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CreatorError {
    #[error("creator not found: {0}")]
    NotFound(Uuid),
    #[error("you can only modify your own creators")]
    NotOwner(Uuid),
    #[error("{0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields for a new creator record. Image URLs are filled in by the route
/// after the blobs are stored.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewCreator {
    pub name: String,
    pub designation: String,
    pub about: String,
    pub price: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

/// Partial update. `None` fields are left untouched; ownership fields and
/// `created_at` cannot be changed through this type at all.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CreatorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub specialties: Option<Vec<String>>,
    #[serde(default)]
    pub social_links: Option<BTreeMap<String, String>>,
}

const DEFAULT_RATING: f64 = 4.5;

fn validate_text(field: &str, value: &str) -> Result<(), CreatorError> {
    if value.trim().is_empty() {
        return Err(CreatorError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), CreatorError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CreatorError::Invalid("valid price is required".into()));
    }
    Ok(())
}

impl NewCreator {
    /// Field validation, shared with the route so bad input is rejected
    /// before any image blob is stored.
    pub(crate) fn validate(&self) -> Result<(), CreatorError> {
        validate_text("name", &self.name)?;
        validate_text("designation", &self.designation)?;
        validate_text("about", &self.about)?;
        validate_price(self.price)
    }
}

impl CreatorUpdate {
    /// Validate the fields present in a partial update.
    pub(crate) fn validate(&self) -> Result<(), CreatorError> {
        if let Some(name) = self.name.as_deref() {
            validate_text("name", name)?;
        }
        if let Some(designation) = self.designation.as_deref() {
            validate_text("designation", designation)?;
        }
        if let Some(about) = self.about.as_deref() {
            validate_text("about", about)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

// =============================================================================
// READ
// =============================================================================

/// Snapshot of every creator, unordered. Callers apply search/sort.
pub async fn list_creators(state: &AppState) -> Vec<Creator> {
    let store = state.creators.read().await;
    store.creators.values().cloned().collect()
}

/// Fetch one creator by id.
pub async fn get_creator(state: &AppState, creator_id: Uuid) -> Option<Creator> {
    let store = state.creators.read().await;
    store.creators.get(&creator_id).cloned()
}

// =============================================================================
// CREATE
// =============================================================================

/// Create a new creator record owned by `owner`.
///
/// # Errors
///
/// Returns `Invalid` when a required field is missing or the price is not
/// strictly positive.
pub async fn create_creator(state: &AppState, input: NewCreator, owner: &SessionUser) -> Result<Creator, CreatorError> {
    input.validate()?;

    let ts = now_ms();
    let creator = Creator {
        id: Uuid::new_v4(),
        name: input.name.trim().to_owned(),
        designation: input.designation.trim().to_owned(),
        about: input.about.trim().to_owned(),
        price: input.price,
        rating: input.rating.unwrap_or(DEFAULT_RATING),
        profile_image: input.profile_image.unwrap_or_default(),
        cover_image: input.cover_image.unwrap_or_default(),
        specialties: input.specialties,
        social_links: input.social_links,
        created_by: owner.id,
        author_name: owner.name.clone(),
        created_at: ts,
        updated_at: ts,
    };

    let result = creator.clone();
    let mut store = state.creators.write().await;
    store.dirty.insert(creator.id);
    store.creators.insert(creator.id, creator);

    info!(creator_id = %result.id, owner = %owner.id, "creator created");
    Ok(result)
}

// =============================================================================
// UPDATE
// =============================================================================

/// Apply a partial update to a creator owned by `user_id`.
///
/// # Errors
///
/// Returns `NotOwner` when the record belongs to someone else; no database
/// write occurs in that case.
pub async fn update_creator(
    state: &AppState,
    creator_id: Uuid,
    update: CreatorUpdate,
    user_id: Uuid,
) -> Result<Creator, CreatorError> {
    update.validate()?;

    let mut store = state.creators.write().await;
    let creator = store
        .creators
        .get_mut(&creator_id)
        .ok_or(CreatorError::NotFound(creator_id))?;

    if creator.created_by != user_id {
        return Err(CreatorError::NotOwner(creator_id));
    }

    if let Some(name) = update.name {
        creator.name = name.trim().to_owned();
    }
    if let Some(designation) = update.designation {
        creator.designation = designation.trim().to_owned();
    }
    if let Some(about) = update.about {
        creator.about = about.trim().to_owned();
    }
    if let Some(price) = update.price {
        creator.price = price;
    }
    if let Some(rating) = update.rating {
        creator.rating = rating;
    }
    if let Some(profile_image) = update.profile_image {
        creator.profile_image = profile_image;
    }
    if let Some(cover_image) = update.cover_image {
        creator.cover_image = cover_image;
    }
    if let Some(specialties) = update.specialties {
        creator.specialties = specialties;
    }
    if let Some(social_links) = update.social_links {
        creator.social_links = social_links;
    }
    creator.updated_at = now_ms();

    let result = creator.clone();
    store.dirty.insert(creator_id);

    info!(%creator_id, owner = %user_id, "creator updated");
    Ok(result)
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete a creator owned by `user_id`. Removes from memory and Postgres
/// immediately. A tombstone is left in the store until the flush task
/// confirms the row is gone: a flush that snapshotted the record before this
/// call would otherwise re-insert it with its upsert.
///
/// # Errors
///
/// Returns `NotOwner` without touching the database when the caller does not
/// own the record.
pub async fn delete_creator(state: &AppState, creator_id: Uuid, user_id: Uuid) -> Result<(), CreatorError> {
    let mut store = state.creators.write().await;
    let creator = store
        .creators
        .get(&creator_id)
        .ok_or(CreatorError::NotFound(creator_id))?;

    if creator.created_by != user_id {
        return Err(CreatorError::NotOwner(creator_id));
    }

    store.creators.remove(&creator_id);
    store.dirty.remove(&creator_id);
    store.deleted.insert(creator_id);
    drop(store);

    sqlx::query("DELETE FROM creators WHERE id = $1")
        .bind(creator_id)
        .execute(&state.pool)
        .await?;

    info!(%creator_id, owner = %user_id, "creator deleted");
    Ok(())
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Hydrate the in-memory store from Postgres. Called once at startup.
///
/// # Errors
///
/// Returns a database error if the catalog query fails.
pub async fn hydrate(state: &AppState) -> Result<(), sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, name, designation, about, price, rating, profile_image, cover_image,
                specialties, social_links, created_by, author_name, created_at, updated_at
         FROM creators",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut store = state.creators.write().await;
    store.creators.clear();
    for row in rows {
        let creator = row_to_creator(&row);
        store.creators.insert(creator.id, creator);
    }
    info!(count = store.creators.len(), "hydrated creator catalog from database");
    Ok(())
}

fn row_to_creator(row: &sqlx::postgres::PgRow) -> Creator {
    let specialties: serde_json::Value = row.get("specialties");
    let social_links: serde_json::Value = row.get("social_links");
    Creator {
        id: row.get("id"),
        name: row.get("name"),
        designation: row.get("designation"),
        about: row.get("about"),
        price: row.get("price"),
        rating: row.get("rating"),
        profile_image: row.get("profile_image"),
        cover_image: row.get("cover_image"),
        specialties: serde_json::from_value(specialties).unwrap_or_default(),
        social_links: serde_json::from_value(social_links).unwrap_or_default(),
        created_by: row.get("created_by"),
        author_name: row.get("author_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Batch upsert creators to Postgres.
pub async fn flush_creators(pool: &PgPool, creators: &[Creator]) -> Result<(), sqlx::Error> {
    for creator in creators {
        sqlx::query(
            "INSERT INTO creators (id, name, designation, about, price, rating, profile_image, cover_image,
                                   specialties, social_links, created_by, author_name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name, designation = EXCLUDED.designation, about = EXCLUDED.about,
                 price = EXCLUDED.price, rating = EXCLUDED.rating,
                 profile_image = EXCLUDED.profile_image, cover_image = EXCLUDED.cover_image,
                 specialties = EXCLUDED.specialties, social_links = EXCLUDED.social_links,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(creator.id)
        .bind(&creator.name)
        .bind(&creator.designation)
        .bind(&creator.about)
        .bind(creator.price)
        .bind(creator.rating)
        .bind(&creator.profile_image)
        .bind(&creator.cover_image)
        .bind(serde_json::to_value(&creator.specialties).unwrap_or_default())
        .bind(serde_json::to_value(&creator.social_links).unwrap_or_default())
        .bind(creator.created_by)
        .bind(&creator.author_name)
        .bind(creator.created_at)
        .bind(creator.updated_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Batch delete creator rows. Used by the flush task to reap tombstones.
pub async fn delete_creators(pool: &PgPool, ids: &[Uuid]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM creators WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "creator_test.rs"]
mod tests;
