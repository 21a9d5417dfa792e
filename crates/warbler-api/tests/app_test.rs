use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use serde_json::Value;

use warbler_api::error::NOTICE_HEADER;
use warbler_api::{AppState, AppStateInner, router};
use warbler_db::Database;
use warbler_types::api::{EditProfileForm, LikeForm, LoginForm, MessageForm, SignupForm};

const PASSWORD: &str = "secret123";

fn setup() -> AppState {
    Arc::new(AppStateInner::new(Database::open_in_memory().unwrap()))
}

/// A browser-like client: keeps whatever cookies the server sets.
fn client(state: &AppState) -> TestServer {
    TestServer::builder()
        .save_cookies()
        .build(router(state.clone()))
        .unwrap()
}

fn signup_form(name: &str) -> SignupForm {
    SignupForm {
        username: name.to_string(),
        password: PASSWORD.to_string(),
        email: format!("{name}@example.com"),
        image_url: String::new(),
    }
}

async fn signup(server: &TestServer, name: &str) {
    let response = server.post("/signup").form(&signup_form(name)).await;
    assert_redirect(&response, "/");
}

fn user_id(state: &AppState, name: &str) -> i64 {
    state.db.get_user_by_username(name).unwrap().unwrap().id
}

async fn post_message(server: &TestServer, text: &str) -> TestResponse {
    server
        .post("/messages/new")
        .form(&MessageForm {
            text: text.to_string(),
        })
        .await
}

fn location(response: &TestResponse) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

fn assert_redirect(response: &TestResponse, to: &str) {
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

fn assert_rejected_home(response: &TestResponse) {
    assert_redirect(response, "/");
    assert_eq!(response.headers()[NOTICE_HEADER], "Access unauthorized.");
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = client(&setup());

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_responses_are_not_cached() {
    let server = client(&setup());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn test_signup_starts_session() {
    let state = setup();
    let server = client(&state);

    signup(&server, "alice").await;

    let home: Value = server.get("/").await.json();
    assert_eq!(home["kind"], "feed");
    assert_eq!(home["messages"].as_array().unwrap().len(), 0);

    let user = state.db.get_user_by_username("alice").unwrap().unwrap();
    assert_ne!(user.password, PASSWORD);
    assert_eq!(user.image_url, "/static/images/default-pic.png");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let state = setup();
    signup(&client(&state), "alice").await;

    let server = client(&state);
    let form = SignupForm {
        email: "other@example.com".into(),
        ..signup_form("alice")
    };
    let response = server.post("/signup").form(&form).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["form"], "signup");
    assert_eq!(body["errors"][0]["message"], "Username already taken");

    // No session was issued.
    let home: Value = server.get("/").await.json();
    assert_eq!(home["kind"], "anonymous");
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let server = client(&setup());

    let response = server
        .post("/signup")
        .form(&SignupForm {
            username: String::new(),
            password: "abc".into(),
            email: "not-an-email".into(),
            image_url: String::new(),
        })
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"email"));
}

#[tokio::test]
async fn test_login_logout() {
    let state = setup();
    let server = client(&state);
    signup(&server, "alice").await;

    let response = server.post("/logout").await;
    assert_redirect(&response, "/login");
    let home: Value = server.get("/").await.json();
    assert_eq!(home["kind"], "anonymous");

    let response = server
        .post("/login")
        .form(&LoginForm {
            username: "alice".into(),
            password: "wrong-password".into(),
        })
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["message"], "Invalid credentials.");
    let home: Value = server.get("/").await.json();
    assert_eq!(home["kind"], "anonymous");

    let response = server
        .post("/login")
        .form(&LoginForm {
            username: "alice".into(),
            password: PASSWORD.into(),
        })
        .await;
    assert_redirect(&response, "/");
    let home: Value = server.get("/").await.json();
    assert_eq!(home["kind"], "feed");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let server = client(&setup());

    let response = server
        .post("/login")
        .form(&LoginForm {
            username: "nobody".into(),
            password: PASSWORD.into(),
        })
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_is_turned_away() {
    let state = setup();
    let alice = client(&state);
    signup(&alice, "alice").await;
    let alice_id = user_id(&state, "alice");

    let anon = client(&state);
    for path in [
        "/users".to_string(),
        format!("/users/{alice_id}"),
        format!("/users/{alice_id}/following"),
        "/messages/new".to_string(),
        "/users/profile".to_string(),
    ] {
        assert_rejected_home(&anon.get(&path).await);
    }

    assert_rejected_home(&anon.post(&format!("/users/follow/{alice_id}")).await);
    assert_rejected_home(&anon.post("/users/delete").await);
    assert_rejected_home(&post_message(&anon, "hi").await);

    // The JSON endpoint answers with a status instead.
    let response = anon.post("/api/messages/1/likes").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_follows_the_graph() {
    let state = setup();
    let alice = client(&state);
    let bob = client(&state);
    signup(&alice, "alice").await;
    signup(&bob, "bob").await;
    let alice_id = user_id(&state, "alice");
    let bob_id = user_id(&state, "bob");

    let response = post_message(&alice, "hello").await;
    assert_redirect(&response, &format!("/users/{alice_id}"));

    let home: Value = bob.get("/").await.json();
    assert_eq!(home["messages"].as_array().unwrap().len(), 0);

    let response = bob.post(&format!("/users/follow/{alice_id}")).await;
    assert_redirect(&response, &format!("/users/{bob_id}/following"));

    let home: Value = bob.get("/").await.json();
    let messages = home["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "hello");
    assert_eq!(messages[0]["author_username"], "alice");
    assert_eq!(messages[0]["liked"], false);

    let message_id = messages[0]["id"].as_i64().unwrap();
    bob.post(&format!("/api/messages/{message_id}/likes"))
        .await
        .assert_status(StatusCode::CREATED);
    let home: Value = bob.get("/").await.json();
    assert_eq!(home["messages"][0]["liked"], true);
    // Likes are per viewer.
    let own: Value = alice.get("/").await.json();
    assert_eq!(own["messages"][0]["liked"], false);

    let anon: Value = client(&state).get("/").await.json();
    assert_eq!(anon["kind"], "anonymous");
    assert!(anon.get("messages").is_none());

    // Unfollowing removes her from the feed again.
    let response = bob.post(&format!("/users/stop-following/{alice_id}")).await;
    assert_redirect(&response, &format!("/users/{bob_id}/following"));
    let home: Value = bob.get("/").await.json();
    assert_eq!(home["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_follow_rules() {
    let state = setup();
    let alice = client(&state);
    let bob = client(&state);
    signup(&alice, "alice").await;
    signup(&bob, "bob").await;
    let alice_id = user_id(&state, "alice");
    let bob_id = user_id(&state, "bob");

    bob.post(&format!("/users/follow/{alice_id}"))
        .await
        .assert_status(StatusCode::SEE_OTHER);
    bob.post(&format!("/users/follow/{alice_id}"))
        .await
        .assert_status(StatusCode::CONFLICT);
    bob.post(&format!("/users/follow/{bob_id}"))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    bob.post("/users/follow/9999")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let followers: Value = bob.get(&format!("/users/{alice_id}/followers")).await.json();
    assert_eq!(followers["users"][0]["username"], "bob");

    let profile: Value = alice.get(&format!("/users/{bob_id}")).await.json();
    assert_eq!(profile["is_following"], false);
    assert_eq!(profile["is_followed_by"], true);
    assert_eq!(profile["counts"]["following"], 1);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let state = setup();
    let alice = client(&state);
    signup(&alice, "alice").await;
    let alice_id = user_id(&state, "alice");

    let response = post_message(&alice, "   ").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_message(&alice, &"x".repeat(141)).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(state.db.user_stats(alice_id).unwrap().messages, 0);
}

#[tokio::test]
async fn test_only_author_deletes_message() {
    let state = setup();
    let alice = client(&state);
    let bob = client(&state);
    signup(&alice, "alice").await;
    signup(&bob, "bob").await;
    let alice_id = user_id(&state, "alice");

    post_message(&alice, "mine").await;
    let message_id = state.db.messages_by_user(alice_id, 10).unwrap()[0].id;

    let response = bob.post(&format!("/messages/{message_id}/delete")).await;
    assert_rejected_home(&response);
    assert!(state.db.get_message(message_id).unwrap().is_some());

    let response = alice.post(&format!("/messages/{message_id}/delete")).await;
    assert_redirect(&response, &format!("/users/{alice_id}"));
    assert!(state.db.get_message(message_id).unwrap().is_none());

    alice
        .post(&format!("/messages/{message_id}/delete"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_entry_points_agree() {
    let state = setup();
    let alice = client(&state);
    let bob = client(&state);
    signup(&alice, "alice").await;
    signup(&bob, "bob").await;
    let alice_id = user_id(&state, "alice");
    let bob_id = user_id(&state, "bob");

    post_message(&alice, "like me").await;
    let message_id = state.db.messages_by_user(alice_id, 10).unwrap()[0].id;

    let response = bob.post(&format!("/api/messages/{message_id}/likes")).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"]["id"], message_id);
    assert_eq!(body["message"]["liked"], true);

    let shown: Value = bob.get(&format!("/messages/{message_id}")).await.json();
    assert_eq!(shown["liked"], true);

    // The form endpoint toggles the same edge back off.
    let response = bob
        .post("/messages/likes")
        .form(&LikeForm {
            message_id,
            redirect_loc: "/".into(),
        })
        .await;
    assert_redirect(&response, "/");
    assert!(!state.db.has_liked(bob_id, message_id).unwrap());

    let response = bob
        .post("/messages/likes")
        .form(&LikeForm {
            message_id,
            redirect_loc: "https://evil.example/".into(),
        })
        .await;
    assert_redirect(&response, "/");
    assert!(state.db.has_liked(bob_id, message_id).unwrap());

    // A location that cannot be a header still lands home, with the like applied.
    let response = bob
        .post("/messages/likes")
        .form(&LikeForm {
            message_id,
            redirect_loc: "/a\r\nx".into(),
        })
        .await;
    assert_redirect(&response, "/");
    assert!(!state.db.has_liked(bob_id, message_id).unwrap());
    bob.post(&format!("/api/messages/{message_id}/likes"))
        .await
        .assert_status(StatusCode::CREATED);

    let liked: Value = bob.get(&format!("/users/{alice_id}/liked_messages")).await.json();
    assert_eq!(liked["user"]["username"], "bob");
    assert_eq!(liked["messages"][0]["text"], "like me");

    bob.post("/api/messages/9999/likes")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_search() {
    let state = setup();
    let alice = client(&state);
    signup(&alice, "alice").await;
    signup(&client(&state), "bob").await;
    signup(&client(&state), "malice").await;

    let all: Value = alice.get("/users").await.json();
    assert_eq!(all["users"].as_array().unwrap().len(), 3);

    let found: Value = alice.get("/users").add_query_param("q", "lic").await.json();
    assert_eq!(found["query"], "lic");
    let names: Vec<&str> = found["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "malice"]);
}

fn profile_edit(password: &str) -> EditProfileForm {
    EditProfileForm {
        username: "alice2".into(),
        email: "alice2@example.com".into(),
        bio: "hello there".into(),
        location: "Lisbon".into(),
        password: password.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_profile_edit_checks_password() {
    let state = setup();
    let alice = client(&state);
    signup(&alice, "alice").await;
    let alice_id = user_id(&state, "alice");

    let response = alice.post("/users/profile").form(&profile_edit("nope-nope")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["form"], "edit_profile");
    assert!(state.db.get_user_by_username("alice").unwrap().is_some());

    let response = alice.post("/users/profile").form(&profile_edit(PASSWORD)).await;
    assert_redirect(&response, &format!("/users/{alice_id}"));

    let user = state.db.get_user_by_id(alice_id).unwrap().unwrap();
    assert_eq!(user.username, "alice2");
    assert_eq!(user.bio.as_deref(), Some("hello there"));
    assert_eq!(user.location.as_deref(), Some("Lisbon"));
}

#[tokio::test]
async fn test_profile_edit_conflict() {
    let state = setup();
    let alice = client(&state);
    signup(&alice, "alice").await;
    signup(&client(&state), "alice2").await;

    let username_clash = EditProfileForm {
        email: "fresh@example.com".into(),
        ..profile_edit(PASSWORD)
    };
    let response = alice.post("/users/profile").form(&username_clash).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["form"], "edit_profile");
    assert_eq!(body["errors"][0]["message"], "Username already taken");

    let email_clash = EditProfileForm {
        username: "alice".into(),
        ..profile_edit(PASSWORD)
    };
    let response = alice.post("/users/profile").form(&email_clash).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["message"], "Email already taken");
    let unchanged = state.db.get_user_by_username("alice").unwrap().unwrap();
    assert_eq!(unchanged.email, "alice@example.com");
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let state = setup();
    let alice = client(&state);
    let bob = client(&state);
    signup(&alice, "alice").await;
    signup(&bob, "bob").await;
    let alice_id = user_id(&state, "alice");
    let bob_id = user_id(&state, "bob");

    post_message(&alice, "going away").await;
    let message_id = state.db.messages_by_user(alice_id, 10).unwrap()[0].id;
    bob.post(&format!("/users/follow/{alice_id}")).await;
    bob.post(&format!("/api/messages/{message_id}/likes")).await;

    let response = alice.post("/users/delete").await;
    assert_redirect(&response, "/signup");

    assert!(state.db.get_user_by_id(alice_id).unwrap().is_none());
    assert!(state.db.get_message(message_id).unwrap().is_none());
    assert_eq!(state.db.user_stats(bob_id).unwrap().following, 0);
    assert_eq!(state.db.user_stats(bob_id).unwrap().likes, 0);

    let home: Value = alice.get("/").await.json();
    assert_eq!(home["kind"], "anonymous");
    bob.get(&format!("/users/{alice_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
