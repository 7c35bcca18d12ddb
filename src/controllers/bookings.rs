//! bookings.rs
//!
//! The booking transaction: the one read-modify-write in the system that has
//! to hold up under concurrency. The event row is locked with
//! `SELECT … FOR UPDATE` so two simultaneous bookings on the same event
//! serialize at the database; the availability check, decrement and Booking
//! insert then commit as a single transaction. On any failure nothing is
//! written and the user is redirected back with an error notice.

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
use crate::models::booking::{evaluate, Booking, BookingDecision};
use crate::models::event::{Event, EventStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events/{id}/booking", get(booking_redirect).post(book))
}

#[derive(Debug, Deserialize, Validate)]
struct BookingForm {
    #[validate(range(min = 1, message = "At least one ticket must be booked"))]
    num_tickets: i32,
}

// GET just bounces back to the detail view; the booking form lives there
async fn booking_redirect(Path(id): Path<i64>) -> Redirect {
    Redirect::to(&show_path(id))
}

// POST /events/{id}/booking
async fn book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Option<AuthUser>,
    form: Result<Form<BookingForm>, FormRejection>,
) -> Result<Response, (StatusCode, String)> {
    let Some(user) = user else {
        return Ok(
            flash::warning(&show_path(id), "You must be signed in to book tickets")
                .into_response(),
        );
    };

    let Ok(Form(form)) = form else {
        return Ok(flash::error(&show_path(id), "Invalid amount of tickets").into_response());
    };
    if form.validate().is_err() {
        return Ok(flash::error(&show_path(id), "Invalid amount of tickets").into_response());
    }

    let mut tx = state.db.pool.begin().await.map_err(|e| {
        tracing::error!("book: failed to begin transaction: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
    })?;

    // Row lock: concurrent bookings on the same event queue up here, so the
    // availability check below cannot race another decrement
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("book sql error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
        })?;

    let Some(event) = event else {
        let _ = tx.rollback().await;
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    };

    let (remaining, sold_out) = match evaluate(event.num_tickets, form.num_tickets) {
        BookingDecision::Oversell => {
            let _ = tx.rollback().await;
            return Ok(flash::error(&show_path(id), "Too many tickets booked").into_response());
        }
        BookingDecision::Accepted { remaining, sold_out } => (remaining, sold_out),
    };

    // Status flips to Booked exactly when the last ticket goes
    let status = if sold_out {
        EventStatus::Booked
    } else {
        event.status
    };

    sqlx::query("UPDATE events SET num_tickets = $1, status = $2 WHERE id = $3")
        .bind(remaining)
        .bind(status.to_string())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("book: failed to update inventory for event {}: {:?}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
        })?;

    let booking = sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (num_tickets, user_id, event_id)
         VALUES ($1, $2, $3)
         RETURNING id, num_tickets, user_id, event_id",
    )
    .bind(form.num_tickets)
    .bind(user.user_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("book: failed to insert booking for event {}: {:?}", id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!("book: failed to commit booking {}: {:?}", booking.id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
    })?;

    tracing::info!(
        "booking {}: {} tickets on event {} by user {}",
        booking.id,
        booking.num_tickets,
        booking.event_id,
        booking.user_id
    );

    Ok(flash::success(
        &show_path(id),
        &format!(
            "{} tickets have been booked! Booking ID: {}",
            booking.num_tickets, booking.id
        ),
    )
    .into_response())
}
