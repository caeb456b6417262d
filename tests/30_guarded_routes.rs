mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

const CLIENT_ID: &str = "0b6a3c9e-2f4d-4e8a-9c1b-7d5e3f2a1b0c";

#[tokio::test]
async fn malformed_ids_are_rejected_before_auth() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/clients/not-a-uuid/athletes")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;

    for path in ["/tournaments", "/enrollments", "/payments"] {
        let res = reqwest::get(server.url(path)).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }

    let res = reqwest::get(server.url(&format!("/clients/{}/athletes", CLIENT_ID))).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/tournaments"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "invalid token");
    Ok(())
}
