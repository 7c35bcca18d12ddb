use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

// Comment joined with the commenter's name, for the event detail view
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub user_name: String,
    pub posted_at: NaiveDateTime,
}
