//! Like/dislike workflows against a real database and a mocked Spotify.

mod common;

use common::{playing, TestApp};
use curator_core::ActionKind;
use curator_server::{services::guard, ServerError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mock_playback(app: &TestApp, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&app.spotify)
        .await;
}

async fn mock_skip(app: &TestApp, times: u64) {
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(&app.spotify)
        .await;
}

// =============================================================================
// Like
// =============================================================================

mod like {
    use super::*;

    #[tokio::test]
    async fn test_partial_target_failure_still_records() {
        let app = TestApp::new().await;
        app.add_target("A").await;
        app.add_target("B").await;

        mock_playback(&app, playing("T1", "playlist", "spotify:playlist:P1")).await;
        Mock::given(method("POST"))
            .and(path("/playlists/A/tracks"))
            .and(body_json(json!({"uris": ["spotify:track:T1"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s1"})))
            .expect(1)
            .mount(&app.spotify)
            .await;
        Mock::given(method("POST"))
            .and(path("/playlists/B/tracks"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&app.spotify)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/P1/tracks"))
            .and(body_json(json!({"tracks": [{"uri": "spotify:track:T1"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s2"})))
            .expect(1)
            .mount(&app.spotify)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/P1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Inbox"})))
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.like(app.user_id()).await.unwrap();

        assert!(report.success);
        assert_eq!(report.added_to_targets, 1);
        assert_eq!(report.target_playlists_count, 2);
        assert_eq!(report.add_errors.as_ref().map(Vec::len), Some(1));
        assert!(report.removed_from_source);
        assert!(!report.guard_enabled);
        assert!(!report.guard_blocked);
        assert_eq!(report.current_playlist_id.as_deref(), Some("P1"));

        let records = app
            .repos
            .actions
            .list_recent_actions(app.user_id(), 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.action, ActionKind::Like);
        assert!(!record.guard_blocked);
        assert_eq!(record.track_id, "T1");
        assert_eq!(record.artist_name, "Artist A, Artist B");
        assert_eq!(record.album_art.as_deref(), Some("https://img/cover.jpg"));
        assert_eq!(record.source_playlist_id.as_deref(), Some("P1"));
        assert_eq!(record.source_playlist_name.as_deref(), Some("Inbox"));
    }

    #[tokio::test]
    async fn test_guard_blocks_mutations_but_skips() {
        let app = TestApp::new().await;
        app.add_target("A").await;
        app.approve("P9").await;

        mock_playback(&app, playing("T1", "playlist", "spotify:playlist:P1")).await;
        Mock::given(method("POST"))
            .and(path("/playlists/A/tracks"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&app.spotify)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/P1/tracks"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.like(app.user_id()).await.unwrap();

        assert!(report.success);
        assert!(report.guard_enabled);
        assert!(report.guard_blocked);
        assert_eq!(report.guard_message, Some(guard::PLAYLIST_NOT_APPROVED));
        assert_eq!(report.added_to_targets, 0);
        assert!(!report.removed_from_source);

        let records = app
            .repos
            .actions
            .list_recent_actions(app.user_id(), 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].guard_blocked);
        assert_eq!(records[0].source_playlist_id.as_deref(), Some("P1"));
        assert_eq!(records[0].source_playlist_name, None);
    }

    #[tokio::test]
    async fn test_approved_source_is_mutated() {
        let app = TestApp::new().await;
        app.add_target("A").await;
        app.approve("P1").await;

        mock_playback(&app, playing("T1", "playlist", "spotify:playlist:P1")).await;
        Mock::given(method("POST"))
            .and(path("/playlists/A/tracks"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s"})))
            .expect(1)
            .mount(&app.spotify)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/P1/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s"})))
            .expect(1)
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.like(app.user_id()).await.unwrap();
        assert!(report.guard_enabled);
        assert!(!report.guard_blocked);
        assert_eq!(report.added_to_targets, 1);
        assert!(report.removed_from_source);
    }

    #[tokio::test]
    async fn test_nothing_playing() {
        let app = TestApp::new().await;

        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&app.spotify)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/player/currently-playing"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 0).await;

        let err = app.state.actions.like(app.user_id()).await.unwrap_err();
        assert!(matches!(err, ServerError::NothingPlaying));

        let records = app
            .repos
            .actions
            .list_recent_actions(app.user_id(), 10)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_like_is_not_deduplicated() {
        let app = TestApp::new().await;
        app.add_target("A").await;

        mock_playback(&app, playing("T1", "album", "spotify:album:AL1")).await;
        Mock::given(method("POST"))
            .and(path("/playlists/A/tracks"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s"})))
            .expect(2)
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 2).await;

        app.state.actions.like(app.user_id()).await.unwrap();
        let report = app.state.actions.like(app.user_id()).await.unwrap();
        assert_eq!(report.added_to_targets, 1);
        assert!(!report.removed_from_source);

        let stats = app.repos.actions.action_stats(app.user_id()).await.unwrap();
        assert_eq!(stats.likes, 2);
    }
}

// =============================================================================
// Dislike
// =============================================================================

mod dislike {
    use super::*;

    #[tokio::test]
    async fn test_removes_from_source_playlist() {
        let app = TestApp::new().await;

        mock_playback(&app, playing("T2", "playlist", "spotify:playlist:P1")).await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/P1/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s"})))
            .expect(1)
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.dislike(app.user_id()).await.unwrap();
        assert!(report.removed_from_source);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["removalTarget"], "playlist");
        assert_eq!(json["sourceContext"]["type"], "playlist");
    }

    #[tokio::test]
    async fn test_collection_removes_from_library() {
        let app = TestApp::new().await;

        mock_playback(&app, playing("T3", "collection", "spotify:user:alice:collection")).await;
        Mock::given(method("DELETE"))
            .and(path("/me/tracks"))
            .and(query_param("ids", "T3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&app.spotify)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/collection/tracks"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.dislike(app.user_id()).await.unwrap();
        assert!(report.removed_from_source);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["removalTarget"], "library");
        assert_eq!(json["currentPlaylistId"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_removal_failure_is_reported_not_fatal() {
        let app = TestApp::new().await;

        mock_playback(&app, playing("T4", "playlist", "spotify:playlist:P1")).await;
        Mock::given(method("DELETE"))
            .and(path("/playlists/P1/tracks"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&app.spotify)
            .await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.dislike(app.user_id()).await.unwrap();
        assert!(report.success);
        assert!(!report.removed_from_source);
        assert!(report.removal_error.is_some());

        let stats = app.repos.actions.action_stats(app.user_id()).await.unwrap();
        assert_eq!(stats.dislikes, 1);
    }

    #[tokio::test]
    async fn test_guard_blocks_non_playlist_context() {
        let app = TestApp::new().await;
        app.approve("P1").await;

        mock_playback(&app, playing("T5", "album", "spotify:album:AL1")).await;
        mock_skip(&app, 1).await;

        let report = app.state.actions.dislike(app.user_id()).await.unwrap();
        assert!(report.guard_blocked);
        assert_eq!(report.guard_message, Some(guard::NOT_FROM_PLAYLIST));
        assert_eq!(report.removal_target, None);

        let records = app
            .repos
            .actions
            .list_recent_actions(app.user_id(), 10)
            .await
            .unwrap();
        assert!(records[0].guard_blocked);
        assert_eq!(records[0].source_playlist_id, None);
    }
}

// =============================================================================
// Guard storage degrade
// =============================================================================

mod guard_storage {
    use super::*;
    use curator_spotify::PlaybackContext;

    fn context(id: &str) -> PlaybackContext {
        PlaybackContext {
            kind: "playlist".to_string(),
            uri: format!("spotify:playlist:{id}"),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_missing_allow_list_table_disables_guard() {
        let app = TestApp::new().await;
        app.approve("P9").await;

        sqlx::query("DROP TABLE approved_source_playlists")
            .execute(app.db.pool())
            .await
            .unwrap();

        let guard = curator_server::GuardService::new(app.repos.approved_playlists.clone());
        let decision = guard
            .decide(app.user_id(), Some(&context("P1")))
            .await
            .unwrap();
        assert!(!decision.enabled);
        assert!(!decision.blocked);
    }

    #[tokio::test]
    async fn test_missing_action_table_is_fatal() {
        let app = TestApp::new().await;

        mock_playback(&app, playing("T1", "album", "spotify:album:AL1")).await;
        mock_skip(&app, 1).await;

        sqlx::query("DROP TABLE song_actions")
            .execute(app.db.pool())
            .await
            .unwrap();

        let err = app.state.actions.like(app.user_id()).await.unwrap_err();
        assert!(matches!(err, ServerError::Store(_)));
    }
}
