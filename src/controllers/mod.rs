pub mod bookings;
pub mod comments;
pub mod events;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(comments::routes())
        .merge(bookings::routes())
}

// Detail-view path, the redirect target for most flash messages
pub(crate) fn show_path(event_id: i64) -> String {
    format!("/events/{}", event_id)
}
