mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn only_the_author_may_edit_or_delete() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let staff = server.user("staff", true).await?;
    let owner = server.user("owner", false).await?;
    let other = server.user("other", false).await?;
    let chat = server.chat_for(&staff, &owner).await?;
    let message = server.message_in(&owner, chat, "original").await?;
    let path = format!("/messages/{message}/");

    let (status, _) = server.patch(&path, &other.access, json!({ "content": "hijacked" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.delete(&path, &other.access).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff get no override either
    let (status, _) = server.patch(&path, &staff.access, json!({ "content": "hijacked" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.delete(&path, &staff.access).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = server.get(&path, &owner.access).await?;
    assert_eq!(body["content"], "original");

    let (status, body) = server.patch(&path, &owner.access, json!({ "content": "edited" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "edited");

    let (status, _) = server.delete(&path, &owner.access).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.get(&path, &owner.access).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn author_is_always_the_caller() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let staff = server.user("staff", true).await?;
    let owner = server.user("owner", false).await?;
    let chat = server.chat_for(&staff, &owner).await?;

    let (status, body) = server
        .post(
            "/messages/create/",
            Some(&owner.access),
            json!({ "chat": chat, "user": staff.id, "content": "spoof" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"], owner.id);
    assert_eq!(body["chat"], chat);
    assert_eq!(body["archived"], false);
    Ok(())
}

#[tokio::test]
async fn posting_into_a_foreign_chat_is_forbidden() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let staff = server.user("staff", true).await?;
    let owner = server.user("owner", false).await?;
    let intruder = server.user("intruder", false).await?;
    let chat = server.chat_for(&staff, &owner).await?;

    let (status, _) = server
        .post("/messages/create/", Some(&intruder.access), json!({ "chat": chat, "content": "hi" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .post("/messages/create/", Some(&intruder.access), json!({ "chat": 999999999, "content": "hi" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Staff may post anywhere
    server.message_in(&staff, chat, "moderator here").await?;
    Ok(())
}

#[tokio::test]
async fn message_chat_cannot_be_moved() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let staff = server.user("staff", true).await?;
    let owner = server.user("owner", false).await?;
    let chat = server.chat_for(&staff, &owner).await?;
    let other_chat = server.chat_for(&staff, &owner).await?;
    let message = server.message_in(&owner, chat, "stay").await?;

    let (status, body) = server
        .patch(&format!("/messages/{message}/"), &owner.access, json!({ "chat": other_chat }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["chat"].is_string());
    Ok(())
}

#[tokio::test]
async fn message_list_is_scoped_to_author() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let staff = server.user("staff", true).await?;
    let owner = server.user("owner", false).await?;
    let chat = server.chat_for(&staff, &owner).await?;
    server.message_in(&staff, chat, "from staff").await?;
    let mine = server.message_in(&owner, chat, "from owner").await?;

    let (status, body) = server.get("/messages/", &owner.access).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], mine);
    Ok(())
}
