//! Integration tests for HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn book_body(shelf_ids: &[&str]) -> Value {
    json!({
        "title": "Hyperion",
        "author_name": "Dan Simmons",
        "book_image": "https://covers.example/hyperion.jpg",
        "rating": 5,
        "source": "open_library",
        "reading_status": "read",
        "shelf_ids": shelf_ids,
    })
}

fn shelf_ids_of(book: &Value) -> Vec<String> {
    book["shelf_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Auth and health
// =============================================================================

#[tokio::test]
async fn test_health_is_unauthenticated() {
    let server = TestServer::new().await;
    let (status, body) = server.request("GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthenticated() {
    let server = TestServer::new().await;

    let (status, body) = server.request("GET", "/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "X"})), Some("bogus"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let server = TestServer::new().await;
    let user = server.create_user("revoked").await;

    let (status, _) = server.request("GET", "/v1/me", None, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);

    let hash = common::fixtures::sha256_hash(user.token.as_bytes());
    let token = server
        .metadata()
        .get_token_by_hash(&hash)
        .await
        .unwrap()
        .unwrap();
    server
        .metadata()
        .revoke_token(token.token_id, shelfwise_metadata::models::db_now())
        .await
        .unwrap();

    let (status, _) = server.request("GET", "/v1/me", None, Some(&user.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let server = TestServer::new().await;

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/health")
                .header("x-trace-id", "client-trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-trace-id"], "client-trace-42");

    // Unauthenticated rejections still carry a generated id
    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri("/v1/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let generated = response.headers()["x-trace-id"].to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_me_and_public_profile() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;

    let (status, me) = server.request("GET", "/v1/me", None, Some(&alice.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user_id"], alice.user_id);
    assert!(me["email"].as_str().unwrap().contains('@'));

    let uri = format!("/v1/users/{}", alice.user_id);
    let (status, profile) = server.request("GET", &uri, None, Some(&bob.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user_id"], alice.user_id);
    assert!(profile.get("email").is_none());

    let (status, body) = server
        .request("GET", "/v1/users/nobody", None, Some(&bob.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_profile_create_update_delete() {
    let server = TestServer::new().await;
    let token = server.create_token("newcomer").await;
    let token = Some(token.as_str());

    let (status, body) = server.request("GET", "/v1/me", None, token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    // No profile yet, so nothing to shelve into
    let (status, _) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "Early"})), token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, me) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({
                "username": " newcomer ",
                "first_name": "New",
                "last_name": "Comer",
                "email": "newcomer@example.com",
            })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(me["user_id"], "newcomer");
    assert_eq!(me["username"], "newcomer");

    let (status, list) = server
        .request("GET", "/v1/users/newcomer/shelves", None, token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["shelves"].as_array().unwrap().len(), 1);
    assert_eq!(list["shelves"][0]["is_default"], true);

    let (status, body) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({"username": "again", "email": "again@example.com"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, me) = server
        .request(
            "PATCH",
            "/v1/me",
            Some(json!({"first_name": "Renamed", "profile_photo_url": "https://img.example/n.png"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["first_name"], "Renamed");
    assert_eq!(me["last_name"], "Comer");
    assert_eq!(me["profile_photo_url"], "https://img.example/n.png");

    let (status, me) = server
        .request("PATCH", "/v1/me", Some(json!({"profile_photo_url": ""})), token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(me["profile_photo_url"].is_null());

    let (status, _) = server.request("DELETE", "/v1/me", None, token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = server.request("GET", "/v1/me", None, token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.request("DELETE", "/v1/me", None, token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server
        .request("PATCH", "/v1/me", Some(json!({"first_name": "Ghost"})), token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The token outlives the profile, so it can start over
    let (status, _) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({"username": "newcomer", "email": "newcomer@example.com"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_profile_validation_and_conflicts() {
    let server = TestServer::new().await;
    let taken = server.create_user("taken").await;
    let (_, taken_me) = server.request("GET", "/v1/me", None, Some(&taken.token)).await;
    let token = server.create_token("hopeful").await;
    let token = Some(token.as_str());

    for body in [
        json!({"username": "ab", "email": "ok@example.com"}),
        json!({"username": "hopeful", "email": "not-an-email"}),
        json!({"username": "hopeful"}),
    ] {
        let (status, resp) = server.request("POST", "/v1/me", Some(body.clone()), token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(resp["code"], "bad_request");
    }

    let (status, body) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({"username": taken_me["username"], "email": "hopeful@example.com"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("username"));

    let (status, body) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({"username": "hopeful", "email": taken_me["email"]})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("email"));

    let (status, _) = server
        .request(
            "POST",
            "/v1/me",
            Some(json!({"username": "hopeful", "email": "hopeful@example.com"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = server
        .request("PATCH", "/v1/me", Some(json!({})), token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .request(
            "PATCH",
            "/v1/me",
            Some(json!({"email": taken_me["email"]})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

// =============================================================================
// Shelves
// =============================================================================

#[tokio::test]
async fn test_shelf_lifecycle() {
    let server = TestServer::new().await;
    let user = server.create_user("shelver").await;
    let token = Some(user.token.as_str());

    let (status, shelf) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "  Sci-Fi  "})), token)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shelf["name"], "Sci-Fi");
    assert_eq!(shelf["is_default"], false);
    assert_eq!(shelf["owner_id"], user.user_id);
    let shelf_id = shelf["shelf_id"].as_str().unwrap().to_string();

    let (status, body) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "Sci-Fi"})), token)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_name");

    let (status, renamed) = server
        .request(
            "PUT",
            &format!("/v1/shelves/{shelf_id}"),
            Some(json!({"name": "Space Opera"})),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Space Opera");

    let list_uri = format!("/v1/users/{}/shelves", user.user_id);
    let (status, list) = server.request("GET", &list_uri, None, token).await;
    assert_eq!(status, StatusCode::OK);
    let shelves = list["shelves"].as_array().unwrap();
    assert_eq!(shelves.len(), 2);
    assert_eq!(shelves[0]["is_default"], true);
    assert_eq!(shelves[0]["name"], "Library");
    assert_eq!(shelves[1]["name"], "Space Opera");

    let (status, _) = server
        .request("DELETE", &format!("/v1/shelves/{shelf_id}"), None, token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = server
        .request("DELETE", &format!("/v1/shelves/{shelf_id}"), None, token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_shelf_name_validation() {
    let server = TestServer::new().await;
    let user = server.create_user("namer").await;
    let token = Some(user.token.as_str());

    for body in [json!({"name": "   "}), json!({}), json!({"name": "x".repeat(101)})] {
        let (status, resp) = server.request("POST", "/v1/shelves", Some(body), token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["code"], "bad_request");
    }

    let (status, _) = server
        .request("PUT", "/v1/shelves/not-a-uuid", Some(json!({"name": "X"})), token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_default_shelf_is_protected() {
    let server = TestServer::new().await;
    let user = server.create_user("protector").await;
    let token = Some(user.token.as_str());
    let uri = format!("/v1/shelves/{}", user.default_shelf_id);

    let (status, body) = server
        .request("PUT", &uri, Some(json!({"name": "Renamed"})), token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "default_shelf_protected");

    let (status, body) = server.request("DELETE", &uri, None, token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "default_shelf_protected");
}

#[tokio::test]
async fn test_other_users_shelves_are_hidden() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;

    let (_, shelf) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "Mine"})), Some(&alice.token))
        .await;
    let uri = format!("/v1/shelves/{}", shelf["shelf_id"].as_str().unwrap());

    let (status, _) = server
        .request("PUT", &uri, Some(json!({"name": "Stolen"})), Some(&bob.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .request("GET", &format!("{uri}/books"), None, Some(&bob.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let list_uri = format!("/v1/users/{}/shelves", alice.user_id);
    let (status, body) = server.request("GET", &list_uri, None, Some(&bob.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");
}

// =============================================================================
// Library
// =============================================================================

#[tokio::test]
async fn test_upsert_library_book() {
    let server = TestServer::new().await;
    let user = server.create_user("librarian").await;
    let token = Some(user.token.as_str());
    let default_id = user.default_shelf_id.to_string();

    let (status, book) = server
        .request(
            "PUT",
            "/v1/library/books/OL123M",
            Some(book_body(&[&default_id])),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["book_id"], "OL123M");
    assert_eq!(book["title"], "Hyperion");
    assert_eq!(book["rating"], 5);
    assert_eq!(book["source"], "open_library");
    assert_eq!(book["reading_status"], "read");
    assert_eq!(shelf_ids_of(&book), vec![default_id.clone()]);
    let added_at = book["added_at"].clone();

    // Replace the shelf set with nothing
    let mut body = book_body(&[]);
    body["reading_status"] = json!("dnf");
    let (status, book) = server
        .request("PUT", "/v1/library/books/OL123M", Some(body), token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(shelf_ids_of(&book).is_empty());
    assert_eq!(book["reading_status"], "dnf");
    assert_eq!(book["added_at"], added_at);
}

#[tokio::test]
async fn test_padded_book_id_is_stored_trimmed() {
    let server = TestServer::new().await;
    let user = server.create_user("padder").await;
    let token = Some(user.token.as_str());

    let (status, book) = server
        .request("PUT", "/v1/library/books/%20OL9M%20", Some(book_body(&[])), token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["book_id"], "OL9M");

    // Addressable by the trimmed id, padded or not
    let shelf = user.default_shelf_id;
    let (status, _) = server
        .request("PUT", &format!("/v1/library/books/OL9M%20/shelves/{shelf}"), None, token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server
        .request("DELETE", "/v1/library/books/OL9M", None, token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_upsert_validation() {
    let server = TestServer::new().await;
    let user = server.create_user("validator").await;
    let token = Some(user.token.as_str());
    let uri = "/v1/library/books/b1";

    let mut cases = Vec::new();
    for (field, value) in [
        ("title", json!("  ")),
        ("author_name", json!("")),
        ("rating", json!(6)),
        ("rating", json!(-1)),
        ("source", json!("library_of_alexandria")),
        ("reading_status", json!("unspecified")),
        ("reading_status", json!(null)),
        ("shelf_ids", json!(["not-a-uuid"])),
    ] {
        let mut body = book_body(&[]);
        body[field] = value;
        cases.push(body);
    }
    cases.push(json!("not an object"));

    for body in cases {
        let (status, resp) = server.request("PUT", uri, Some(body.clone()), token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
        assert_eq!(resp["code"], "bad_request");
    }

    let (status, resp) = server
        .request("GET", &format!("/v1/users/{}/library", user.user_id), None, token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_upsert_with_unknown_shelf_is_shelf_not_found() {
    let server = TestServer::new().await;
    let user = server.create_user("stray").await;
    let token = Some(user.token.as_str());
    let missing = Uuid::new_v4().to_string();

    let (status, body) = server
        .request("PUT", "/v1/library/books/b1", Some(book_body(&[&missing])), token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "shelf_not_found");

    let book = server
        .metadata()
        .get_library_book(&user.user_id, "b1")
        .await
        .unwrap();
    assert!(book.is_none());
}

#[tokio::test]
async fn test_shelf_assignment_endpoints() {
    let server = TestServer::new().await;
    let user = server.create_user("assigner").await;
    let token = Some(user.token.as_str());

    let (_, shelf) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "Sci-Fi"})), token)
        .await;
    let shelf_id = shelf["shelf_id"].as_str().unwrap().to_string();

    let (status, body) = server
        .request(
            "PUT",
            &format!("/v1/library/books/nonexistent-book/shelves/{shelf_id}"),
            None,
            token,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "book_not_found");

    server
        .request("PUT", "/v1/library/books/b1", Some(book_body(&[])), token)
        .await;

    let assign_uri = format!("/v1/library/books/b1/shelves/{shelf_id}");
    for _ in 0..2 {
        let (status, _) = server.request("PUT", &assign_uri, None, token).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, body) = server
        .request(
            "PUT",
            &format!("/v1/library/books/b1/shelves/{}", Uuid::new_v4()),
            None,
            token,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "shelf_not_found");

    let (status, listing) = server
        .request("GET", &format!("/v1/shelves/{shelf_id}/books"), None, token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["shelf"]["shelf_id"], shelf_id);
    assert_eq!(listing["books"].as_array().unwrap().len(), 1);
    assert_eq!(listing["pagination"]["total"], 1);

    for _ in 0..2 {
        let (status, _) = server.request("DELETE", &assign_uri, None, token).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, listing) = server
        .request("GET", &format!("/v1/shelves/{shelf_id}/books"), None, token)
        .await;
    assert!(listing["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_library_book() {
    let server = TestServer::new().await;
    let user = server.create_user("remover").await;
    let token = Some(user.token.as_str());

    server
        .request("PUT", "/v1/library/books/b1", Some(book_body(&[])), token)
        .await;

    let (status, _) = server
        .request("DELETE", "/v1/library/books/b1", None, token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = server
        .request("DELETE", "/v1/library/books/b1", None, token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_user_library_grouping() {
    let server = TestServer::new().await;
    let user = server.create_user("u1").await;
    let token = Some(user.token.as_str());

    let (_, shelf) = server
        .request("POST", "/v1/shelves", Some(json!({"name": "Sci-Fi"})), token)
        .await;
    let s1 = shelf["shelf_id"].as_str().unwrap().to_string();

    server
        .request("PUT", "/v1/library/books/b1", Some(book_body(&[&s1])), token)
        .await;

    let library_uri = format!("/v1/users/{}/library?page=1&limit=10", user.user_id);
    let (status, library) = server.request("GET", &library_uri, None, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        library["pagination"],
        json!({"total": 1, "page": 1, "limit": 10})
    );
    assert!(library["unshelved"].as_array().unwrap().is_empty());

    let shelves = library["shelves"].as_array().unwrap();
    assert_eq!(shelves.len(), 2);
    assert_eq!(shelves[0]["shelf"]["is_default"], true);
    assert!(shelves[0]["books"].as_array().unwrap().is_empty());
    assert_eq!(shelves[1]["shelf"]["shelf_id"], s1);
    assert_eq!(shelves[1]["books"][0]["book_id"], "b1");

    let (status, _) = server
        .request(
            "DELETE",
            &format!("/v1/library/books/b1/shelves/{s1}"),
            None,
            token,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, library) = server.request("GET", &library_uri, None, token).await;
    assert_eq!(library["unshelved"][0]["book_id"], "b1");
    assert!(library["shelves"][1]["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_library_access_and_pagination_errors() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;

    let uri = format!("/v1/users/{}/library", alice.user_id);
    let (status, body) = server.request("GET", &uri, None, Some(&bob.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    for query in ["page=0", "limit=0", "limit=101", "page=abc", "limit=-5"] {
        let (status, body) = server
            .request("GET", &format!("{uri}?{query}"), None, Some(&alice.token))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["code"], "bad_request");
    }

    let (status, body) = server.request("GET", &uri, None, Some(&alice.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({"total": 0, "page": 1, "limit": 20}));
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    let user = server.create_user("metered").await;
    server
        .request(
            "POST",
            "/v1/shelves",
            Some(json!({"name": "Counted"})),
            Some(&user.token),
        )
        .await;

    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("shelfwise_shelves_created_total"));
}

#[tokio::test]
async fn test_metrics_can_be_disabled() {
    let server = TestServer::with_config(|config| config.server.metrics_enabled = false).await;
    let (status, _) = server.request("GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
