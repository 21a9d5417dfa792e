use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::info;

use warbler_db::DbError;
use warbler_db::models::DeleteOutcome;
use warbler_types::api::{FormKind, FormView, MessageForm};

use crate::error::AppError;
use crate::forms::validate_message;
use crate::session::CurrentUser;
use crate::state::{AppState, db_call};
use crate::views::message_view;

pub async fn new_message_form(CurrentUser(_me): CurrentUser) -> impl IntoResponse {
    Json(FormView::blank(FormKind::NewMessage))
}

pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Form(form): Form<MessageForm>,
) -> Result<impl IntoResponse, AppError> {
    let text = validate_message(&form)?;

    let author = me.id;
    let message = db_call(&state, move |db| db.insert_message(author, &text)).await?;
    info!("user {} posted message {}", author, message.id);

    Ok(Redirect::to(&format!("/users/{}", me.id)))
}

pub async fn show_message(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = me.id;
    let view = db_call(&state, move |db| {
        let row = db.get_message(message_id)?.ok_or(DbError::NotFound)?;
        let liked = db.has_liked(viewer, message_id)?;
        Ok::<_, DbError>(message_view(row, liked))
    })
    .await?;

    Ok(Json(view))
}

/// Only the author may delete a message.
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = me.id;
    match db_call(&state, move |db| db.delete_message_owned(message_id, user_id)).await? {
        DeleteOutcome::Deleted => {
            info!("user {} deleted message {}", user_id, message_id);
            Ok(Redirect::to(&format!("/users/{}", user_id)))
        }
        DeleteOutcome::NotFound => Err(AppError::NotFound),
        DeleteOutcome::NotOwner => Err(AppError::Forbidden),
    }
}
