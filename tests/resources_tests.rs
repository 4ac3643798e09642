mod common;

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{access_token, document_json, harness_with_storage, post_json, seed_session, user_json};
use torum_client::auth::{MemoryStorage, Role};
use torum_client::documents::DocumentUpload;
use torum_client::error::Error;
use torum_client::posts::{Post, PostDraft};
use torum_client::users::UserUpdate;
use torum_client::Torum;

fn logged_in(mock_server: &MockServer, role: &str) -> (Torum, String) {
    let token = access_token("alice@example.com", 900);
    let storage = Arc::new(MemoryStorage::new());
    seed_session(&storage, &token, "r1", role);
    let h = harness_with_storage(&mock_server.uri(), storage);
    (h.torum, format!("Bearer {}", token))
}

#[tokio::test]
async fn test_post_lifecycle() {
    let mock_server = MockServer::start().await;
    let (torum, bearer) = logged_in(&mock_server, "user");

    Mock::given(method("POST"))
        .and(path("/create-post"))
        .and(header("Authorization", bearer.as_str()))
        .and(body_json(json!({
            "post_title": "Gold breakout",
            "post_content": "Watching the 200-day moving average."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("p1", "Gold breakout")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/update-post/p1"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Post updated successfully !"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/delete-post/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Post deleted successfully !"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/view-post/p1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Post not found"})))
        .mount(&mock_server)
        .await;

    let posts = torum.posts();
    let created = posts
        .create(&PostDraft::new(
            "Gold breakout",
            "Watching the 200-day moving average.",
        ))
        .await
        .unwrap();
    assert_eq!(created.post_id, "p1");

    let updated = posts
        .update("p1", &PostDraft::new("Gold breakout (update)", "Confirmed."))
        .await
        .unwrap();
    assert_eq!(updated.message, "Post updated successfully !");

    posts.delete("p1").await.unwrap();

    let err = posts.view("p1").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.detail(), "Post not found");
}

#[tokio::test]
async fn test_document_upload_is_multipart() {
    let mock_server = MockServer::start().await;
    let (torum, bearer) = logged_in(&mock_server, "user");

    Mock::given(method("POST"))
        .and(path("/upload-reading-documents"))
        .and(header("Authorization", bearer.as_str()))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("Rates outlook"))
        .and(body_string_contains("filename=\"outlook.pdf\""))
        .and(body_string_contains("application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d1", "Rates outlook")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let upload = DocumentUpload::new("Rates outlook", "outlook.pdf", b"%PDF-1.4".to_vec())
        .with_description("Quarterly notes")
        .with_tags("macro,rates");
    torum.documents().upload(upload).await.unwrap();
}

#[tokio::test]
async fn test_invalid_upload_is_never_sent() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    Mock::given(method("POST"))
        .and(path("/upload-reading-documents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let upload = DocumentUpload::new("Notes", "notes.exe", vec![0]);
    let err = torum.documents().upload(upload).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_document_listing_and_download() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    Mock::given(method("GET"))
        .and(path("/my-reading-documents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([document_json("d1", "Rates outlook")])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/download-document/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/objects/outlook.pdf?signature=abc", mock_server.uri())
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/objects/outlook.pdf"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(400))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/objects/outlook.pdf"))
        .and(query_param("signature", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/delete-reading-document/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let documents = torum.documents();
    let mine = documents.mine().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].docs_tags.as_deref(), Some("macro,rates"));

    let bytes = documents.download("d1").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4".to_vec());

    documents.delete("d1").await.unwrap();
}

#[tokio::test]
async fn test_search_combines_posts_and_documents() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "rates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post_result": [post_json("p1", "Rates and gold")],
            "document_result": [document_json("d1", "Rates outlook")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results = torum.search().query("  rates ").await.unwrap();
    assert_eq!(results.post_result.len(), 1);
    assert_eq!(results.document_result[0].docs_id, "d1");

    let err = torum.search().query("   ").await.unwrap_err();
    assert_eq!(err.detail(), "Please enter a search query.");
}

#[tokio::test]
async fn test_admin_only_calls_are_refused_locally() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    assert!(matches!(
        torum.users().list().await.unwrap_err(),
        Error::Forbidden(_)
    ));
    assert!(matches!(
        torum.users().update_role("u2", Role::Moderator).await.unwrap_err(),
        Error::Forbidden(_)
    ));
}

#[tokio::test]
async fn test_admin_manages_roles() {
    let mock_server = MockServer::start().await;
    let (torum, bearer) = logged_in(&mock_server, "admin");

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_json("admin"), user_json("user")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/update-user-role/u2"))
        .and(query_param("new_role", "moderator"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = torum.users().list().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].user_role, Role::User);

    torum.users().update_role("u2", Role::Moderator).await.unwrap();
}

#[tokio::test]
async fn test_profile_update() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    Mock::given(method("PUT"))
        .and(path("/update-user"))
        .and(body_json(json!({"username": "alice_t"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "updated"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    torum
        .users()
        .update(&UserUpdate::new().with_username("alice_t"))
        .await
        .unwrap();

    let err = torum.users().update(&UserUpdate::new()).await.unwrap_err();
    assert_eq!(err.detail(), "No changes to update");
}

#[tokio::test]
async fn test_unedited_post_and_bare_document_decode() {
    let mock_server = MockServer::start().await;
    let (torum, _) = logged_in(&mock_server, "user");

    let mut unedited = post_json("p1", "Gold breakout");
    unedited["updated_at"] = json!(null);
    unedited["post_content"] = json!(null);

    let mut bare = document_json("d1", "Rates outlook");
    bare["docs_description"] = json!(null);
    bare["docs_tags"] = json!(null);

    Mock::given(method("GET"))
        .and(path("/view-post/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unedited.clone()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post_result": [unedited],
            "document_result": [bare]
        })))
        .mount(&mock_server)
        .await;

    let post = torum.posts().view("p1").await.unwrap();
    assert!(!post.is_edited());
    assert_eq!(post.post_content, None);

    let results = torum.search().query("gold").await.unwrap();
    assert_eq!(results.post_result[0].updated_at, None);
    assert_eq!(results.document_result[0].docs_description, None);
    assert_eq!(results.document_result[0].docs_tags, None);
}

fn post_by(owner: &str, owner_role: &str) -> Post {
    let mut post = post_json("p1", "Gold breakout");
    post["post_owner"] = json!(owner);
    post["owner_role"] = json!(owner_role);
    serde_json::from_value(post).unwrap()
}

#[tokio::test]
async fn test_moderator_edits_plain_user_posts_only() {
    let mock_server = MockServer::start().await;
    let (torum, bearer) = logged_in(&mock_server, "moderator");

    Mock::given(method("PUT"))
        .and(path("/update-post/p1"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/delete-post/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let draft = PostDraft::new("Gold breakout", "Edited by moderation.");
    torum
        .posts()
        .edit(&post_by("u2", "user"), &draft)
        .await
        .unwrap();

    let err = torum
        .posts()
        .remove(&post_by("u3", "moderator"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn test_author_and_admin_may_remove_posts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/delete-post/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let (author, _) = logged_in(&mock_server, "user");
    let own = post_by("5f0c8a2e-1b7e-4c59-9d0a-2f4b1c3d4e5f", "user");
    author.posts().remove(&own).await.unwrap();

    let err = author
        .posts()
        .remove(&post_by("u2", "user"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let (admin, _) = logged_in(&mock_server, "admin");
    admin.posts().remove(&post_by("u2", "moderator")).await.unwrap();
}
