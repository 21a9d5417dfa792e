use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, feed, likes, messages, users};

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", get(auth::signup_form).post(auth::signup_submit))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::edit_profile_form).post(users::edit_profile_submit))
        .route("/users/delete", post(users::delete_user))
        .route("/users/follow/{id}", post(users::start_following))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route("/users/{id}", get(users::show_user))
        .route("/users/{id}/following", get(users::show_following))
        .route("/users/{id}/followers", get(users::show_followers))
        .route("/users/{id}/liked_messages", get(users::liked_messages));

    let message_routes = Router::new()
        .route("/messages/new", get(messages::new_message_form).post(messages::create_message))
        .route("/messages/likes", post(likes::toggle_like_form))
        .route("/messages/{id}", get(messages::show_message))
        .route("/messages/{id}/delete", post(messages::delete_message))
        .route("/api/messages/{id}/likes", post(likes::toggle_like_api));

    Router::new()
        .route("/", get(feed::homepage))
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(message_routes)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
