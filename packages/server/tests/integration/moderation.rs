use serde_json::Value;

use crate::common::{TestApp, routes};

mod flagging {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn user_can_flag_a_video_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;

        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &bob)
            .await;
        assert_eq!(res.status, 200, "flag failed: {}", res.text);
        assert_eq!(res.body["video_id"], id.as_str());
        assert_eq!(res.body["flag_count"], 1);
        assert_eq!(res.body["visible"], true);

        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &bob)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "ALREADY_FLAGGED");

        let meta = app.get_without_token(&routes::metadata(&id)).await;
        assert_eq!(meta.body["flag_count"], 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flagging_requires_authentication() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;

        let res = app.post_without_token(&routes::flag(&id), &Value::Null).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flagging_a_missing_video_is_not_found() {
        let app = TestApp::spawn().await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        let id = uuid::Uuid::now_v7().to_string();

        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &bob)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn video_is_hidden_once_flags_exceed_the_threshold() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;

        app.flag_from_new_users(&id, 3).await;
        let res = app.get_without_token(&routes::metadata(&id)).await;
        assert_eq!(res.status, 200, "three flags should stay visible");

        let dave = app.create_authenticated_user("dave", "password123").await;
        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &dave)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["flag_count"], 4);
        assert_eq!(res.body["visible"], false);

        assert_eq!(app.get_without_token(&routes::metadata(&id)).await.status, 404);
        assert_eq!(app.get_without_token(&routes::video(&id)).await.status, 404);
        assert_eq!(app.get_without_token(routes::VIDEOS).await.status, 404);
        assert_eq!(
            app.get_without_token(&routes::search("Beach day")).await.status,
            404
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_flags_from_one_user_count_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;

        let path = routes::flag(&id);
        let requests = (0..8).map(|_| app.post_with_token(&path, &Value::Null, &bob));
        let statuses: Vec<u16> = futures::future::join_all(requests)
            .await
            .into_iter()
            .map(|res| res.status)
            .collect();

        assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1);
        assert_eq!(statuses.iter().filter(|s| **s == 409).count(), 7);

        let meta = app.get_without_token(&routes::metadata(&id)).await;
        assert_eq!(meta.body["flag_count"], 1);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_flag_and_delete_scenario() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        let carol = app.create_authenticated_user("carol", "password123").await;

        let id = app.upload_video(&alice, "Beach day", b"data").await;

        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &bob)
            .await;
        assert_eq!(res.body["flag_count"], 1);

        let res = app.delete_with_token(&routes::video(&id), &carol).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::video(&id), &alice).await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(&routes::video(&id)).await;
        assert_eq!(res.status, 404);
        assert!(app.blobs.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn uploader_can_delete_a_hidden_video() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;
        app.flag_from_new_users(&id, 4).await;

        let res = app.delete_with_token(&routes::video(&id), &alice).await;

        assert_eq!(res.status, 204);
    }
}

mod moderation_queue {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn queue_is_admin_only() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;

        let res = app.get_with_token(routes::FLAGGED, &alice).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.get_without_token(routes::FLAGGED).await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_queue_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        app.upload_video(&alice, "Beach day", b"data").await;

        let res = app.get_with_token(routes::FLAGGED, &admin).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queue_contains_only_hidden_videos() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let hidden = app.upload_video(&alice, "hidden", b"bad").await;
        app.upload_video(&alice, "fine", b"good").await;
        app.flag_from_new_users(&hidden, 4).await;

        let res = app.get_with_token(routes::FLAGGED, &admin).await;

        assert_eq!(res.status, 200, "queue failed: {}", res.text);
        assert!(res.content_disposition().contains("flagged_videos.zip"));
        assert_eq!(
            res.zip_entries(),
            vec!["hidden_1.mp4", "hidden_1_metadata.txt"]
        );
        let meta = String::from_utf8(res.zip_entry("hidden_1_metadata.txt")).unwrap();
        assert!(meta.contains("Flagged Count: 4"));
    }
}

mod reset {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn admin_reset_restores_visibility() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;
        app.flag_from_new_users(&id, 4).await;

        let res = app
            .post_with_token(&routes::reset_flags(&id), &Value::Null, &admin)
            .await;
        assert_eq!(res.status, 200, "reset failed: {}", res.text);
        assert_eq!(res.body["flag_count"], 0);
        assert_eq!(res.body["visible"], true);

        let res = app.get_without_token(&routes::metadata(&id)).await;
        assert_eq!(res.status, 200);

        // Previous flaggers may flag again.
        let again = app.login("flagger_0", "flagger-pass").await;
        let res = app
            .post_with_token(&routes::flag(&id), &Value::Null, &again)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["flag_count"], 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_admin_cannot_reset() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let id = app.upload_video(&alice, "Beach day", b"data").await;
        app.flag_from_new_users(&id, 1).await;

        let res = app
            .post_with_token(&routes::reset_flags(&id), &Value::Null, &alice)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.get_without_token(&routes::metadata(&id)).await;
        assert_eq!(res.body["flag_count"], 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resetting_a_missing_video_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = uuid::Uuid::now_v7().to_string();

        let res = app
            .post_with_token(&routes::reset_flags(&id), &Value::Null, &admin)
            .await;

        assert_eq!(res.status, 404);
    }
}
