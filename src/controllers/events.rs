//! events.rs
//!
//! Event CRUD: listing, detail view, create, partial edit, delete.
//!
//! Mutations answer with a redirect plus a flash message; detail and listing
//! GETs return JSON view payloads. Create and edit take multipart forms
//! because they carry the event image. Edit is a partial update: a field
//! absent from the submission leaves the stored value untouched.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use std::sync::Arc;

use super::show_path;
use crate::flash::{self, FlashQuery};
use crate::middleware::{is_event_creator, AuthUser};
use crate::models::event::{Event, EventChanges, EventStatus, ParseStatusError};
use crate::AppState;

pub const EVENT_GENRES: [&str; 9] = [
    "Country", "Electronic", "Funk", "Hip Hop", "Jazz", "House", "Pop", "Rap", "Rock",
];

// Choices an organizer may submit; Booked is only ever derived from inventory
const STATUS_CHOICES: [&str; 3] = ["Active", "Upcoming", "Inactive"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(index))
        .route("/events/create", get(new_event).post(create))
        .route("/events/{id}", get(show))
        .route("/events/{id}/edit", get(edit_view).post(edit))
        .route("/events/{id}/delete", get(delete))
}

/* ---------- helpers ---------- */

async fn load_event(pool: &sqlx::PgPool, id: i64) -> sqlx::Result<Option<Event>> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn db_error<E: std::fmt::Debug>(context: &str, e: E) -> (StatusCode, String) {
    tracing::error!("{} sql error: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
}

fn form_choices() -> serde_json::Value {
    json!({ "genres": EVENT_GENRES, "statuses": STATUS_CHOICES })
}

/* ---------- views ---------- */

// GET /events
async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FlashQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY date, time")
        .fetch_all(&state.db.pool)
        .await
        .map_err(|e| db_error("index", e))?;

    Ok(Json(json!({
        "events": events,
        "flash": params.into_flash(),
    })))
}

// GET /events/{id}
async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<FlashQuery>,
    user: Option<AuthUser>,
) -> Result<Response, (StatusCode, String)> {
    let event = load_event(&state.db.pool, id)
        .await
        .map_err(|e| db_error("show", e))?;

    let Some(event) = event else {
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    };

    let comments = sqlx::query_as::<_, crate::models::comment::CommentView>(
        "SELECT c.id, c.text, u.user_name, c.posted_at
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.event_id = $1
         ORDER BY c.posted_at",
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| db_error("show comments", e))?;

    let can_edit = is_event_creator(user.as_ref(), event.created_by);

    Ok(Json(json!({
        "event": event,
        "comments": comments,
        "can_edit": can_edit,
        "flash": params.into_flash(),
    }))
    .into_response())
}

// GET /events/create
async fn new_event(user: Option<AuthUser>) -> Response {
    if user.is_none() {
        return flash::warning("/events", "You must be signed in to create an event")
            .into_response();
    }
    Json(form_choices()).into_response()
}

// GET /events/{id}/edit
async fn edit_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Option<AuthUser>,
) -> Result<Response, (StatusCode, String)> {
    let event = load_event(&state.db.pool, id)
        .await
        .map_err(|e| db_error("edit_view", e))?;

    let Some(event) = event else {
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    };

    if !is_event_creator(user.as_ref(), event.created_by) {
        return Ok(flash::warning(
            &show_path(id),
            "You must be the creator of the event to edit the details",
        )
        .into_response());
    }

    Ok(Json(json!({ "event": event, "choices": form_choices() })).into_response())
}

/* ---------- mutations ---------- */

// POST /events/create
async fn create(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let Some(user) = user else {
        return Ok(
            flash::warning("/events", "You must be signed in to create an event").into_response(),
        );
    };

    let form = match EventFormData::read(multipart).await {
        Ok(form) => form,
        Err(msg) => return Ok(flash::error("/events/create", &msg).into_response()),
    };

    let new_event = match form.into_new_event() {
        Ok(new_event) => new_event,
        Err(msg) => return Ok(flash::error("/events/create", &msg).into_response()),
    };

    // Store the upload; the persisted value is the relative path, not the file
    let image_path = match state
        .images
        .save(&new_event.image_name, &new_event.image_data)
        .await
    {
        Ok(path) => path,
        Err(e) => return Ok(flash::error("/events/create", &e.to_string()).into_response()),
    };

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO events
            (event_name, artist_name, status, genre, date, time,
             location, description, image, price, num_tickets, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING id",
    )
    .bind(&new_event.event_name)
    .bind(&new_event.artist_name)
    .bind(new_event.status.to_string())
    .bind(&new_event.genre)
    .bind(new_event.date)
    .bind(new_event.time)
    .bind(&new_event.location)
    .bind(&new_event.description)
    .bind(&image_path)
    .bind(new_event.price)
    .bind(new_event.num_tickets)
    .bind(user.user_id)
    .fetch_one(&state.db.pool)
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            // the row never landed, so the stored image must not linger
            if let Err(io_err) = state.images.remove(&image_path).await {
                tracing::warn!("failed to remove orphaned image {}: {:?}", image_path, io_err);
            }
            return Err(db_error("create", e));
        }
    };

    tracing::info!("event {} created by user {}", id, user.user_id);
    Ok(flash::success(&show_path(id), "Successfully created new event").into_response())
}

// POST /events/{id}/edit
async fn edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Option<AuthUser>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let event = load_event(&state.db.pool, id)
        .await
        .map_err(|e| db_error("edit", e))?;

    let Some(mut event) = event else {
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    };

    if !is_event_creator(user.as_ref(), event.created_by) {
        return Ok(flash::warning(
            &show_path(id),
            "You must be the creator of the event to edit the details",
        )
        .into_response());
    }

    let edit_path = format!("/events/{}/edit", id);

    let form = match EventFormData::read(multipart).await {
        Ok(form) => form,
        Err(msg) => return Ok(flash::error(&edit_path, &msg).into_response()),
    };

    let (mut changes, image) = match form.into_changes() {
        Ok(parsed) => parsed,
        Err(msg) => return Ok(flash::error(&edit_path, &msg).into_response()),
    };

    let mut uploaded_image: Option<String> = None;
    if let Some((name, data)) = image {
        match state.images.save(&name, &data).await {
            Ok(path) => {
                uploaded_image = Some(path.clone());
                changes.image = Some(path);
            }
            Err(e) => return Ok(flash::error(&edit_path, &e.to_string()).into_response()),
        }
    }

    event.apply_changes(changes);

    let updated = sqlx::query(
        "UPDATE events
         SET event_name = $1, artist_name = $2, status = $3, genre = $4,
             date = $5, time = $6, location = $7, description = $8,
             image = $9, price = $10, num_tickets = $11
         WHERE id = $12",
    )
    .bind(&event.event_name)
    .bind(&event.artist_name)
    .bind(event.status.to_string())
    .bind(&event.genre)
    .bind(event.date)
    .bind(event.time)
    .bind(&event.location)
    .bind(&event.description)
    .bind(&event.image)
    .bind(event.price)
    .bind(event.num_tickets)
    .bind(id)
    .execute(&state.db.pool)
    .await;

    if let Err(e) = updated {
        // the update never landed, so a freshly stored image must not linger
        if let Some(path) = uploaded_image {
            if let Err(io_err) = state.images.remove(&path).await {
                tracing::warn!("failed to remove orphaned image {}: {:?}", path, io_err);
            }
        }
        return Err(db_error("edit", e));
    }

    Ok(flash::success(&show_path(id), "Successfully updated event details").into_response())
}

// GET /events/{id}/delete
async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Option<AuthUser>,
) -> Result<Response, (StatusCode, String)> {
    let event = load_event(&state.db.pool, id)
        .await
        .map_err(|e| db_error("delete", e))?;

    let Some(event) = event else {
        return Ok(flash::warning("/events", "Could not find an event").into_response());
    };

    if !is_event_creator(user.as_ref(), event.created_by) {
        return Ok(flash::warning(
            &show_path(id),
            "You must be the creator of the event to delete the event",
        )
        .into_response());
    }

    // Comments and bookings cascade at the database layer
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await
        .map_err(|e| db_error("delete", e))?;

    tracing::info!("event {} deleted by user {}", id, event.created_by);
    Ok(flash::success("/events", "Successfully deleted event").into_response())
}

/* ---------- form parsing ---------- */

/// Raw multipart fields. `None` means the part was absent from the
/// submission; edits skip absent fields, creation requires them.
#[derive(Debug, Default)]
struct EventFormData {
    event_name: Option<String>,
    artist_name: Option<String>,
    status: Option<String>,
    genre: Option<String>,
    date: Option<String>,
    time: Option<String>,
    location: Option<String>,
    description: Option<String>,
    price: Option<String>,
    num_tickets: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

/// A fully validated creation payload.
#[derive(Debug)]
struct NewEvent {
    event_name: String,
    artist_name: String,
    status: EventStatus,
    genre: String,
    date: NaiveDate,
    time: NaiveTime,
    location: String,
    description: String,
    price: i32,
    num_tickets: i32,
    image_name: String,
    image_data: Vec<u8>,
}

impl EventFormData {
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = EventFormData::default();

        loop {
            let field = multipart
                .next_field()
                .await
                .map_err(|e| format!("Malformed form submission: {}", e))?;
            let Some(field) = field else { break };

            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read image upload: {}", e))?;
                if !file_name.is_empty() && !data.is_empty() {
                    form.image = Some((file_name, data.to_vec()));
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| format!("Malformed form submission: {}", e))?;

            match name.as_str() {
                "event_name" => form.event_name = Some(value),
                "artist_name" => form.artist_name = Some(value),
                "status" => form.status = Some(value),
                "genre" => form.genre = Some(value),
                "date" => form.date = Some(value),
                "time" => form.time = Some(value),
                "location" => form.location = Some(value),
                "description" => form.description = Some(value),
                "price" => form.price = Some(value),
                "num_tickets" => form.num_tickets = Some(value),
                _ => {} // unknown fields ignored
            }
        }

        Ok(form)
    }

    /// Parse submitted fields into a partial update plus the raw image
    /// upload, if one was sent. Absent fields stay `None`.
    fn into_changes(self) -> Result<(EventChanges, Option<(String, Vec<u8>)>), String> {
        let changes = EventChanges {
            event_name: self
                .event_name
                .map(|v| non_empty(v, "event_name"))
                .transpose()?,
            artist_name: self
                .artist_name
                .map(|v| non_empty(v, "artist_name"))
                .transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            genre: self.genre.as_deref().map(parse_genre).transpose()?,
            date: self.date.as_deref().map(parse_date).transpose()?,
            time: self.time.as_deref().map(parse_time).transpose()?,
            location: self.location.map(|v| non_empty(v, "location")).transpose()?,
            description: self
                .description
                .map(|v| non_empty(v, "description"))
                .transpose()?,
            image: None,
            price: self
                .price
                .as_deref()
                .map(|v| parse_count(v, "price"))
                .transpose()?,
            num_tickets: self
                .num_tickets
                .as_deref()
                .map(|v| parse_count(v, "num_tickets"))
                .transpose()?,
        };
        Ok((changes, self.image))
    }

    /// Creation requires every field, image included. Zero tickets force the
    /// status to Booked regardless of what was submitted: the ticket count
    /// is authoritative at creation time.
    fn into_new_event(mut self) -> Result<NewEvent, String> {
        let (image_name, image_data) = require(self.image.take(), "image")?;
        let (changes, _) = self.into_changes()?;

        let num_tickets = require(changes.num_tickets, "num_tickets")?;
        let submitted_status = require(changes.status, "status")?;
        let status = if num_tickets == 0 {
            EventStatus::Booked
        } else {
            submitted_status
        };

        Ok(NewEvent {
            event_name: require(changes.event_name, "event_name")?,
            artist_name: require(changes.artist_name, "artist_name")?,
            status,
            genre: require(changes.genre, "genre")?,
            date: require(changes.date, "date")?,
            time: require(changes.time, "time")?,
            location: require(changes.location, "location")?,
            description: require(changes.description, "description")?,
            price: require(changes.price, "price")?,
            num_tickets,
            image_name,
            image_data,
        })
    }
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{} is required", field))
}

fn non_empty(value: String, field: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err(format!("{} must not be empty", field))
    } else {
        Ok(value)
    }
}

fn parse_status(value: &str) -> Result<EventStatus, String> {
    // Booked is derived from inventory, never submitted directly
    if STATUS_CHOICES.contains(&value) {
        value.parse().map_err(|e: ParseStatusError| e.to_string())
    } else {
        Err(format!(
            "status must be one of: {}",
            STATUS_CHOICES.join(", ")
        ))
    }
}

fn parse_genre(value: &str) -> Result<String, String> {
    if EVENT_GENRES.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(format!("genre must be one of: {}", EVENT_GENRES.join(", ")))
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "date must be in YYYY-MM-DD format".to_string())
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| "time must be in HH:MM format".to_string())
}

fn parse_count(value: &str, field: &str) -> Result<i32, String> {
    let n: i32 = value
        .parse()
        .map_err(|_| format!("{} must be a whole number", field))?;
    if n < 0 {
        return Err(format!("{} must not be negative", field));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> EventFormData {
        EventFormData {
            event_name: Some("Midnight Sessions".to_string()),
            artist_name: Some("The Wrens".to_string()),
            status: Some("Upcoming".to_string()),
            genre: Some("Rock".to_string()),
            date: Some("2026-10-03".to_string()),
            time: Some("20:30".to_string()),
            location: Some("Corner Hotel".to_string()),
            description: Some("Album launch".to_string()),
            price: Some("45".to_string()),
            num_tickets: Some("120".to_string()),
            image: Some(("wrens.jpg".to_string(), vec![0xFF, 0xD8])),
        }
    }

    #[test]
    fn full_form_creates_event() {
        let new_event = full_form().into_new_event().unwrap();
        assert_eq!(new_event.event_name, "Midnight Sessions");
        assert_eq!(new_event.status, EventStatus::Upcoming);
        assert_eq!(new_event.num_tickets, 120);
        assert_eq!(new_event.image_name, "wrens.jpg");
    }

    #[test]
    fn creation_with_zero_tickets_is_booked() {
        let mut form = full_form();
        form.num_tickets = Some("0".to_string());
        form.status = Some("Active".to_string());

        let new_event = form.into_new_event().unwrap();
        assert_eq!(new_event.status, EventStatus::Booked);
    }

    #[test]
    fn creation_requires_every_field() {
        let mut form = full_form();
        form.location = None;
        assert_eq!(
            form.into_new_event().unwrap_err(),
            "location is required".to_string()
        );

        let mut form = full_form();
        form.image = None;
        assert_eq!(
            form.into_new_event().unwrap_err(),
            "image is required".to_string()
        );
    }

    #[test]
    fn booked_status_cannot_be_submitted() {
        let mut form = full_form();
        form.status = Some("Booked".to_string());
        assert!(form.into_new_event().is_err());
    }

    #[test]
    fn unknown_genre_is_rejected() {
        let mut form = full_form();
        form.genre = Some("Polka".to_string());
        assert!(form.into_new_event().is_err());
    }

    #[test]
    fn negative_tickets_are_rejected() {
        let mut form = full_form();
        form.num_tickets = Some("-3".to_string());
        assert!(form.into_new_event().is_err());
    }

    #[test]
    fn empty_form_yields_empty_changes() {
        let (changes, image) = EventFormData::default().into_changes().unwrap();
        assert!(changes.event_name.is_none());
        assert!(changes.num_tickets.is_none());
        assert!(changes.status.is_none());
        assert!(image.is_none());
    }

    #[test]
    fn partial_form_parses_only_submitted_fields() {
        let form = EventFormData {
            num_tickets: Some("0".to_string()),
            location: Some("Forum Theatre".to_string()),
            ..Default::default()
        };

        let (changes, _) = form.into_changes().unwrap();
        assert_eq!(changes.num_tickets, Some(0));
        assert_eq!(changes.location.as_deref(), Some("Forum Theatre"));
        assert!(changes.date.is_none());
    }

    #[test]
    fn present_but_empty_text_is_a_validation_error() {
        let form = EventFormData {
            event_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(form.into_changes().is_err());
    }

    #[test]
    fn bad_date_and_time_are_rejected() {
        let form = EventFormData {
            date: Some("03/10/2026".to_string()),
            ..Default::default()
        };
        assert!(form.into_changes().is_err());

        let form = EventFormData {
            time: Some("8pm".to_string()),
            ..Default::default()
        };
        assert!(form.into_changes().is_err());
    }
}
