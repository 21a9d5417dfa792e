use axum::{Json, extract::State, response::IntoResponse};

use warbler_db::DbError;
use warbler_db::queries::FEED_LIMIT;
use warbler_types::models::HomeView;

use crate::error::AppError;
use crate::session::MaybeUser;
use crate::state::{AppState, db_call};
use crate::views::message_views;

/// GET /. Anonymous visitors get the landing view; users get the latest
/// messages from themselves and the people they follow.
pub async fn homepage(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let Some(user) = user else {
        return Ok(Json(HomeView::Anonymous));
    };

    let viewer = user.id;
    let messages = db_call(&state, move |db| {
        let rows = db.feed(viewer, FEED_LIMIT)?;
        let liked = db.liked_message_ids(viewer)?;
        Ok::<_, DbError>(message_views(rows, &liked))
    })
    .await?;

    Ok(Json(HomeView::Feed { messages }))
}
