mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn login_returns_bearer_token() -> Result<()> {
    let server = common::start_server().await?;
    server.register("alice", "s3cret").await?;

    let res = server.login("alice", "s3cret").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_bad_request() -> Result<()> {
    let server = common::start_server().await?;
    server.register("alice", "s3cret").await?;

    let res = server.login("alice", "wrong").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid credentials");
    Ok(())
}

#[tokio::test]
async fn login_with_unknown_user_is_bad_request() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.login("nobody", "whatever").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid credentials");
    Ok(())
}
