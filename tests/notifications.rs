mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{id_of, message_of};

fn entries(body: &Value) -> Vec<Value> {
    body.as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn follows_and_comments_notify_the_recipient_only() -> Result<()> {
    let app = common::spawn().await?;
    let alice = app.user("alice", Some("Member")).await?;
    let bob = app.user("bob", Some("Member")).await?;

    let (_, post) = app
        .post("/posts", Some(&alice.token), json!({ "title": "Hello", "content": "World" }))
        .await?;
    let post_id = id_of(&post);

    app.send(Method::POST, &format!("/users/{}/follow", alice.id), Some(&bob.token), None)
        .await?;
    // A repeated follow records nothing new.
    app.send(Method::POST, &format!("/users/{}/follow", alice.id), Some(&bob.token), None)
        .await?;
    let (status, _) = app
        .post("/comments", Some(&bob.token), json!({ "post_id": post_id, "content": "Nice" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    // Commenting on one's own post notifies nobody.
    app.post("/comments", Some(&alice.token), json!({ "post_id": post_id, "content": "Thanks" }))
        .await?;

    let (status, inbox) = app.get("/notifications", Some(&alice.token)).await?;
    assert_eq!(status, StatusCode::OK);
    let inbox = entries(&inbox);
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0]["verb"], "commented on your post");
    assert_eq!(inbox[0]["target_type"], "post");
    assert_eq!(inbox[1]["verb"], "started following you");
    for entry in &inbox {
        assert_eq!(entry["recipient_id"], alice.id.to_string());
        assert_eq!(entry["actor_id"], bob.id.to_string());
        assert_eq!(entry["read"], false);
    }

    let (status, own) = app.get("/notifications", Some(&bob.token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(entries(&own).is_empty());

    Ok(())
}

#[tokio::test]
async fn notifications_are_private_even_from_admins() -> Result<()> {
    let app = common::spawn().await?;
    let alice = app.user("alice", Some("Member")).await?;
    let bob = app.user("bob", Some("Member")).await?;
    let admin = app.user("root", Some("Admin")).await?;

    app.send(Method::POST, &format!("/users/{}/follow", alice.id), Some(&bob.token), None)
        .await?;
    let (_, inbox) = app.get("/notifications", Some(&alice.token)).await?;
    let uri = format!("/notifications/{}", id_of(&entries(&inbox)[0]));

    let (status, _) = app.get(&uri, Some(&alice.token)).await?;
    assert_eq!(status, StatusCode::OK);

    for token in [&bob.token, &admin.token] {
        let (status, body) = app.get(&uri, Some(token)).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message_of(&body), "forbidden: not the owner");
        let (status, _) = app.post(&format!("{uri}/read"), Some(token), json!({})).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = app.get("/notifications", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get(&uri, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get(&format!("/notifications/{}", uuid::Uuid::new_v4()), Some(&alice.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn marking_read_hides_from_the_unread_filter() -> Result<()> {
    let app = common::spawn().await?;
    let alice = app.user("alice", Some("Member")).await?;
    let bob = app.user("bob", Some("Member")).await?;

    app.send(Method::POST, &format!("/users/{}/follow", alice.id), Some(&bob.token), None)
        .await?;
    let (_, inbox) = app.get("/notifications?unread=true", Some(&alice.token)).await?;
    let id = id_of(&entries(&inbox)[0]);

    let (status, marked) = app
        .post(&format!("/notifications/{id}/read"), Some(&alice.token), json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["read"], true);

    let (_, unread) = app.get("/notifications?unread=true", Some(&alice.token)).await?;
    assert!(entries(&unread).is_empty());
    let (_, all) = app.get("/notifications", Some(&alice.token)).await?;
    assert_eq!(entries(&all).len(), 1);

    Ok(())
}
