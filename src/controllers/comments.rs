use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::show_path;
use crate::flash;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events/{id}/comment", get(comment_redirect).post(post_comment))
}

#[derive(Debug, Deserialize, Validate)]
struct CommentForm {
    #[validate(length(min = 1, message = "Comment text is required"))]
    text: String,
}

// GET just bounces back to the detail view; the comment form lives there
async fn comment_redirect(Path(id): Path<i64>) -> Redirect {
    Redirect::to(&show_path(id))
}

// POST /events/{id}/comment
async fn post_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Option<AuthUser>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, (StatusCode, String)> {
    let Some(user) = user else {
        return Ok(
            flash::warning(&show_path(id), "You must be signed in to comment").into_response(),
        );
    };

    let Ok(Form(form)) = form else {
        return Ok(flash::error(&show_path(id), "Invalid comment").into_response());
    };
    if form.validate().is_err() {
        return Ok(flash::error(&show_path(id), "Comment text is required").into_response());
    }

    let event_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)",
    )
    .bind(id)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("post_comment sql error: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
    })?;

    if !event_exists {
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    }

    // posted_at is assigned by the database
    sqlx::query("INSERT INTO comments (text, user_id, event_id) VALUES ($1, $2, $3)")
        .bind(&form.text)
        .bind(user.user_id)
        .bind(id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| {
            tracing::error!("post_comment sql error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
        })?;

    Ok(flash::success(&show_path(id), "Comment successfully posted").into_response())
}
