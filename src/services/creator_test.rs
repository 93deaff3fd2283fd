use super::*;
use crate::state::test_helpers;

fn owner() -> SessionUser {
    SessionUser { id: Uuid::new_v4(), email: "ann@example.com".into(), name: "Ann".into() }
}

fn new_creator(name: &str) -> NewCreator {
    NewCreator {
        name: name.into(),
        designation: "Video Editor".into(),
        about: "Edits videos.".into(),
        price: 25.0,
        rating: None,
        profile_image: None,
        cover_image: None,
        specialties: vec!["editing".into()],
        social_links: BTreeMap::new(),
    }
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn create_creator_succeeds() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();
    assert_eq!(creator.name, "Ann");
    assert_eq!(creator.created_by, user.id);
    assert_eq!(creator.author_name, "Ann");
    assert!((creator.rating - 4.5).abs() < f64::EPSILON);
    assert_eq!(creator.created_at, creator.updated_at);

    // Verify in-memory state
    let store = state.creators.read().await;
    assert!(store.creators.contains_key(&creator.id));
    assert!(store.dirty.contains(&creator.id));
}

#[tokio::test]
async fn create_creator_trims_text_fields() {
    let state = test_helpers::test_app_state();
    let mut input = new_creator("  Ann  ");
    input.designation = " Editor ".into();
    let creator = create_creator(&state, input, &owner()).await.unwrap();
    assert_eq!(creator.name, "Ann");
    assert_eq!(creator.designation, "Editor");
}

#[tokio::test]
async fn create_creator_rejects_blank_name() {
    let state = test_helpers::test_app_state();
    let result = create_creator(&state, new_creator("   "), &owner()).await;
    assert!(matches!(result.unwrap_err(), CreatorError::Invalid(_)));
}

#[tokio::test]
async fn create_creator_rejects_non_positive_price() {
    let state = test_helpers::test_app_state();
    for price in [0.0, -5.0, f64::NAN] {
        let mut input = new_creator("Ann");
        input.price = price;
        let result = create_creator(&state, input, &owner()).await;
        assert!(matches!(result.unwrap_err(), CreatorError::Invalid(_)));
    }
}

#[tokio::test]
async fn create_creator_is_visible_in_list_without_reload() {
    let state = test_helpers::test_app_state();
    let creator = create_creator(&state, new_creator("Ann"), &owner()).await.unwrap();
    let list = list_creators(&state).await;
    assert!(list.iter().any(|c| c.id == creator.id));
}

// =============================================================================
// UPDATE
// =============================================================================

#[tokio::test]
async fn update_creator_applies_partial_fields() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();

    let update = CreatorUpdate { price: Some(40.0), ..CreatorUpdate::default() };
    let updated = update_creator(&state, creator.id, update, user.id).await.unwrap();
    assert!((updated.price - 40.0).abs() < f64::EPSILON);
    assert_eq!(updated.name, "Ann"); // unchanged
    assert!(updated.updated_at >= creator.updated_at);
}

#[tokio::test]
async fn update_creator_never_changes_owner_or_created_at() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();

    let update = CreatorUpdate { name: Some("Annie".into()), ..CreatorUpdate::default() };
    let updated = update_creator(&state, creator.id, update, user.id).await.unwrap();
    assert_eq!(updated.created_by, creator.created_by);
    assert_eq!(updated.author_name, creator.author_name);
    assert_eq!(updated.created_at, creator.created_at);
}

#[tokio::test]
async fn update_creator_rejects_non_owner() {
    let state = test_helpers::test_app_state();
    let user_a = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user_a).await.unwrap();

    let user_b = Uuid::new_v4();
    let update = CreatorUpdate { name: Some("Hijacked".into()), ..CreatorUpdate::default() };
    let result = update_creator(&state, creator.id, update, user_b).await;
    assert!(matches!(result.unwrap_err(), CreatorError::NotOwner(_)));

    // Record is untouched.
    let current = get_creator(&state, creator.id).await.unwrap();
    assert_eq!(current.name, "Ann");
}

#[tokio::test]
async fn update_creator_not_found() {
    let state = test_helpers::test_app_state();
    let result = update_creator(&state, Uuid::new_v4(), CreatorUpdate::default(), Uuid::new_v4()).await;
    assert!(matches!(result.unwrap_err(), CreatorError::NotFound(_)));
}

#[tokio::test]
async fn update_creator_marks_dirty() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();
    {
        let mut store = state.creators.write().await;
        store.dirty.clear();
    }

    let update = CreatorUpdate { about: Some("New bio.".into()), ..CreatorUpdate::default() };
    update_creator(&state, creator.id, update, user.id).await.unwrap();

    let store = state.creators.read().await;
    assert!(store.dirty.contains(&creator.id));
}

#[tokio::test]
async fn update_creator_validates_blank_fields() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();

    let update = CreatorUpdate { designation: Some("  ".into()), ..CreatorUpdate::default() };
    let result = update_creator(&state, creator.id, update, user.id).await;
    assert!(matches!(result.unwrap_err(), CreatorError::Invalid(_)));
}

// =============================================================================
// DELETE
// =============================================================================

#[tokio::test]
async fn delete_creator_rejects_non_owner_before_database() {
    let state = test_helpers::test_app_state();
    let user_a = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user_a).await.unwrap();

    // The dummy pool has no live database, so reaching the DELETE query would
    // error with `Database`; `NotOwner` proves the call stopped before I/O.
    let result = delete_creator(&state, creator.id, Uuid::new_v4()).await;
    assert!(matches!(result.unwrap_err(), CreatorError::NotOwner(_)));
    assert!(get_creator(&state, creator.id).await.is_some());

    // No tombstone either: the record was never removed.
    let store = state.creators.read().await;
    assert!(!store.deleted.contains(&creator.id));
}

#[tokio::test]
async fn delete_creator_leaves_tombstone_for_flush_reap() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();

    // The dummy pool makes the immediate DELETE fail, but memory is already
    // cleaned up and the tombstone stays so the flush task can retry. The
    // tombstone also covers a delete racing an in-flight flush snapshot,
    // whose upsert would otherwise re-insert the row.
    let result = delete_creator(&state, creator.id, user.id).await;
    assert!(matches!(result.unwrap_err(), CreatorError::Database(_)));

    let store = state.creators.read().await;
    assert!(!store.creators.contains_key(&creator.id));
    assert!(!store.dirty.contains(&creator.id));
    assert!(store.deleted.contains(&creator.id));
}

#[tokio::test]
async fn delete_creator_not_found() {
    let state = test_helpers::test_app_state();
    let result = delete_creator(&state, Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result.unwrap_err(), CreatorError::NotFound(_)));
}

#[tokio::test]
#[ignore = "delete_creator hits Postgres via sqlx::query"]
async fn delete_creator_removes_from_memory() {
    let state = test_helpers::test_app_state();
    let user = owner();
    let creator = create_creator(&state, new_creator("Ann"), &user).await.unwrap();
    let _ = delete_creator(&state, creator.id, user.id).await;
}

// =============================================================================
// READ
// =============================================================================

#[tokio::test]
async fn get_creator_returns_none_for_unknown_id() {
    let state = test_helpers::test_app_state();
    assert!(get_creator(&state, Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn list_creators_returns_all_seeded_records() {
    let state = test_helpers::test_app_state();
    let records = vec![
        test_helpers::dummy_creator("Ann", Uuid::new_v4()),
        test_helpers::dummy_creator("Zoe", Uuid::new_v4()),
    ];
    test_helpers::seed_creators(&state, records).await;
    assert_eq!(list_creators(&state).await.len(), 2);
}
