//! Integration tests for the albums and tracks vertical slices
//!
//! Covers:
//! - CRUD round trips
//! - Version tags changing only when a field changes
//! - Track ordering inside an album
//! - Deleting an album together with its tracks


use encore_core::types::*;
use encore_storage::{albums, tracks, StorageError};
use test_helpers::*;

// ============================================================================
// Album Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_get_album() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "OK Computer", 1997).await;
    assert_eq!(album.title, "OK Computer");
    assert_eq!(album.genre, "Rock");
    assert_eq!(album.release_year, 1997);
    assert_eq!(album.etag.len(), 16);
    assert!(!album.created_at.is_empty());

    let retrieved = albums::get_by_id(db, album.id)
        .await
        .expect("Failed to get album")
        .expect("Album not found");
    assert_eq!(retrieved, album);
}

#[tokio::test]
async fn test_get_missing_album() {
    let test_db = TestDb::new().await;

    let missing = albums::get_by_id(test_db.db(), 999).await.unwrap();
    assert!(missing.is_none());
    assert!(!albums::exists(test_db.db(), 999).await.unwrap());
}

#[tokio::test]
async fn test_get_all_albums_in_id_order() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    create_test_album(db, "Pablo Honey", 1993).await;
    create_test_album(db, "The Bends", 1995).await;

    let all = albums::get_all(db).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Pablo Honey", "The Bends"]);
}

#[tokio::test]
async fn test_update_album_changes_etag() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "Kid A", 2000).await;

    let updated = albums::update(
        db,
        album.id,
        &CreateAlbum {
            title: "Kid A".to_string(),
            genre: "Electronic".to_string(),
            release_year: 2000,
        },
        Some(&album.etag),
    )
    .await
    .unwrap()
    .expect("Album should exist");

    assert_eq!(updated.genre, "Electronic");
    assert_ne!(updated.etag, album.etag);
}

#[tokio::test]
async fn test_unchanged_update_keeps_etag() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "Amnesiac", 2001).await;

    let same = albums::update(
        db,
        album.id,
        &CreateAlbum {
            title: album.title.clone(),
            genre: album.genre.clone(),
            release_year: album.release_year,
        },
        None,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(same.etag, album.etag);
}

#[tokio::test]
async fn test_update_missing_album() {
    let test_db = TestDb::new().await;

    let result = albums::update(
        test_db.db(),
        42,
        &CreateAlbum {
            title: "Ghost".to_string(),
            genre: "None".to_string(),
            release_year: 2000,
        },
        None,
    )
    .await
    .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_update_with_stale_etag_writes_nothing() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "Hail to the Thief", 2003).await;

    let result = albums::update(
        db,
        album.id,
        &CreateAlbum {
            title: "The Gloaming".to_string(),
            genre: "Rock".to_string(),
            release_year: 2003,
        },
        Some("0000000000000000"),
    )
    .await
    .unwrap();
    assert!(result.is_none());

    let unchanged = albums::get_by_id(db, album.id).await.unwrap().unwrap();
    assert_eq!(unchanged, album);
}

// ============================================================================
// Track Tests
// ============================================================================

#[tokio::test]
async fn test_tracks_ordered_by_track_number() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "OK Computer", 1997).await;
    let artist = create_test_artist(db, "Radiohead").await;

    create_test_track(db, "Paranoid Android", 2, album.id, artist.id).await;
    create_test_track(db, "Airbag", 1, album.id, artist.id).await;
    create_test_track(db, "Subterranean Homesick Alien", 3, album.id, artist.id).await;

    let listed = tracks::get_by_album(db, album.id).await.unwrap();
    let numbers: Vec<i64> = listed.iter().map(|t| t.track_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(listed[0].title, "Airbag");
}

#[tokio::test]
async fn test_tracks_by_artist() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "Split", 2005).await;
    let first = create_test_artist(db, "First").await;
    let second = create_test_artist(db, "Second").await;

    create_test_track(db, "One", 1, album.id, first.id).await;
    create_test_track(db, "Two", 2, album.id, second.id).await;
    create_test_track(db, "Three", 3, album.id, first.id).await;

    let listed = tracks::get_by_artist(db, first.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|t| t.artist_id == first.id));
}

#[tokio::test]
async fn test_track_requires_existing_album() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let artist = create_test_artist(db, "Radiohead").await;

    let result = tracks::create(
        db,
        &CreateTrack {
            title: "Orphan".to_string(),
            track_number: 1,
            duration_seconds: 100,
            album_id: 999,
            artist_id: artist.id,
        },
    )
    .await;

    match result {
        Err(StorageError::InvalidReference(missing)) => {
            assert_eq!(missing, vec!["Album not found".to_string()]);
        }
        other => panic!("expected a dangling reference error, got {other:?}"),
    }
    assert!(tracks::get_all(db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_track_moves_album() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let first = create_test_album(db, "First", 2001).await;
    let second = create_test_album(db, "Second", 2002).await;
    let artist = create_test_artist(db, "Band").await;
    let track = create_test_track(db, "Song", 1, first.id, artist.id).await;

    let moved = tracks::update(
        db,
        track.id,
        &CreateTrack {
            title: track.title.clone(),
            track_number: 4,
            duration_seconds: track.duration_seconds,
            album_id: second.id,
            artist_id: artist.id,
        },
        None,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(moved.album_id, second.id);
    assert_eq!(moved.track_number, 4);
    assert_ne!(moved.etag, track.etag);
}

// ============================================================================
// Cascading Delete
// ============================================================================

#[tokio::test]
async fn test_delete_album_removes_tracks() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "OK Computer", 1997).await;
    let other = create_test_album(db, "Kid A", 2000).await;
    let artist = create_test_artist(db, "Radiohead").await;

    create_test_track(db, "Airbag", 1, album.id, artist.id).await;
    create_test_track(db, "Lucky", 11, album.id, artist.id).await;
    let kept = create_test_track(db, "Idioteque", 8, other.id, artist.id).await;

    assert!(albums::delete_with_tracks(db, album.id, None).await.unwrap());

    assert!(albums::get_by_id(db, album.id).await.unwrap().is_none());
    assert!(tracks::get_by_album(db, album.id).await.unwrap().is_empty());

    let remaining = tracks::get_all(db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

#[tokio::test]
async fn test_delete_missing_album() {
    let test_db = TestDb::new().await;

    assert!(!albums::delete_with_tracks(test_db.db(), 7, None).await.unwrap());
}

#[tokio::test]
async fn test_delete_with_stale_etag_keeps_everything() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "Pablo Honey", 1993).await;
    let artist = create_test_artist(db, "Radiohead").await;
    create_test_track(db, "Creep", 2, album.id, artist.id).await;

    assert!(!albums::delete_with_tracks(db, album.id, Some("0000000000000000"))
        .await
        .unwrap());

    assert!(albums::exists(db, album.id).await.unwrap());
    assert_eq!(tracks::get_by_album(db, album.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_album_delete_keeps_tracks() {
    let test_db = TestDb::new().await;
    let db = test_db.db();

    let album = create_test_album(db, "The Bends", 1995).await;
    let artist = create_test_artist(db, "Radiohead").await;
    create_test_track(db, "Planet Telex", 1, album.id, artist.id).await;
    create_test_track(db, "Fake Plastic Trees", 4, album.id, artist.id).await;

    // Album rows can no longer be deleted, so the cascade fails after the
    // tracks statement has already run
    db.execute(
        "CREATE TRIGGER block_album_delete BEFORE DELETE ON albums
         BEGIN
             SELECT RAISE(ABORT, 'album deletes are blocked');
         END",
        &[],
    )
    .await
    .unwrap();

    let result = albums::delete_with_tracks(db, album.id, None).await;
    assert!(result.is_err());

    assert!(albums::exists(db, album.id).await.unwrap());
    let titles: Vec<String> = tracks::get_by_album(db, album.id)
        .await
        .unwrap()
        .into_iter()
        .map(|track| track.title)
        .collect();
    assert_eq!(titles, vec!["Planet Telex", "Fake Plastic Trees"]);
}
