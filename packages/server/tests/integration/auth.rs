use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USERNAME, TestApp, routes};

#[tokio::test]
async fn registered_uploader_logs_in_and_sees_own_account() {
    let app = TestApp::spawn().await;

    let created = app
        .post_without_token(
            routes::REGISTER,
            &json!({"username": "beach_cam", "password": "waves-at-dawn"}),
        )
        .await;
    assert_eq!(created.status, 201, "register: {}", created.text);
    assert_eq!(created.body["username"], "beach_cam");

    let token = app.login("beach_cam", "waves-at-dawn").await;
    let me = app.get_with_token(routes::ME, &token).await;

    assert_eq!(me.status, 200, "me: {}", me.text);
    assert_eq!(me.body["id"], created.body["id"]);
    assert_eq!(me.body["is_admin"], false);
}

#[tokio::test]
async fn configured_admin_exists_at_startup() {
    let app = TestApp::spawn().await;

    let login = app
        .post_without_token(
            routes::LOGIN,
            &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
        )
        .await;
    assert_eq!(login.status, 200, "admin login: {}", login.text);
    assert_eq!(login.body["is_admin"], true);

    let token = login.body["token"].as_str().unwrap();
    let me = app.get_with_token(routes::ME, token).await;
    assert_eq!(me.body["username"], ADMIN_USERNAME);
    assert_eq!(me.body["is_admin"], true);
}

#[tokio::test]
async fn admin_username_cannot_be_registered_again() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::REGISTER,
            &json!({"username": ADMIN_USERNAME, "password": "another-password"}),
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let app = TestApp::spawn().await;
    app.create_authenticated_user("beach_cam", "waves-at-dawn")
        .await;

    for body in [
        json!({"username": "beach_cam", "password": "wrong-guess"}),
        json!({"username": "nobody_here", "password": "waves-at-dawn"}),
    ] {
        let res = app.post_without_token(routes::LOGIN, &body).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn me_rejects_missing_and_forged_tokens() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ME).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");

    let res = app.get_with_token(routes::ME, "header.payload.sig").await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}
