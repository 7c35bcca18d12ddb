use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Event lifecycle label. Stored as plain TEXT, variant names verbatim:
/// handlers bind `status.to_string()` and rows decode through
/// `TryFrom<String>` on the column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Active,
    Upcoming,
    Inactive,
    Booked,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Active => "Active",
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Inactive => "Inactive",
            EventStatus::Booked => "Booked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("unknown event status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for EventStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(EventStatus::Active),
            "Upcoming" => Ok(EventStatus::Upcoming),
            "Inactive" => Ok(EventStatus::Inactive),
            "Booked" => Ok(EventStatus::Booked),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl EventStatus {
    /// Status implied by an inventory level. Zero tickets means the event
    /// is booked out; any positive count means it is on sale.
    pub fn for_inventory(num_tickets: i32) -> EventStatus {
        if num_tickets == 0 {
            EventStatus::Booked
        } else {
            EventStatus::Active
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_name: String,
    pub artist_name: String,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub genre: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub description: String,
    pub image: String,
    pub price: i32,
    pub num_tickets: i32,
    pub created_by: i64,
}

/// Partial update for an event. `None` means the field was absent from the
/// submission and stays untouched; `Some` overwrites.
#[derive(Debug, Default)]
pub struct EventChanges {
    pub event_name: Option<String>,
    pub artist_name: Option<String>,
    pub status: Option<EventStatus>,
    pub genre: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<i32>,
    pub num_tickets: Option<i32>,
}

impl Event {
    /// Apply a partial edit. A submitted ticket count recomputes the status
    /// last, so it wins over a status submitted in the same request: 0 forces
    /// Booked, any positive count forces Active. Documented policy, not a bug.
    pub fn apply_changes(&mut self, changes: EventChanges) {
        if let Some(v) = changes.event_name {
            self.event_name = v;
        }
        if let Some(v) = changes.artist_name {
            self.artist_name = v;
        }
        if let Some(v) = changes.status {
            self.status = v;
        }
        if let Some(v) = changes.genre {
            self.genre = v;
        }
        if let Some(v) = changes.date {
            self.date = v;
        }
        if let Some(v) = changes.time {
            self.time = v;
        }
        if let Some(v) = changes.location {
            self.location = v;
        }
        if let Some(v) = changes.description {
            self.description = v;
        }
        if let Some(v) = changes.image {
            self.image = v;
        }
        if let Some(v) = changes.price {
            self.price = v;
        }
        if let Some(v) = changes.num_tickets {
            self.num_tickets = v;
            self.status = EventStatus::for_inventory(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: 1,
            event_name: "Midnight Sessions".to_string(),
            artist_name: "The Wrens".to_string(),
            status: EventStatus::Upcoming,
            genre: "Rock".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
            time: NaiveTime::from_hms_opt(20, 30, 0).unwrap(),
            location: "Corner Hotel".to_string(),
            description: "Album launch".to_string(),
            image: "static/img/events/wrens.jpg".to_string(),
            price: 45,
            num_tickets: 120,
            created_by: 7,
        }
    }

    #[test]
    fn absent_fields_stay_untouched() {
        let mut event = sample_event();
        let before = event.clone();

        event.apply_changes(EventChanges::default());

        assert_eq!(event.event_name, before.event_name);
        assert_eq!(event.status, before.status);
        assert_eq!(event.num_tickets, before.num_tickets);
        assert_eq!(event.price, before.price);
    }

    #[test]
    fn submitted_fields_overwrite() {
        let mut event = sample_event();

        event.apply_changes(EventChanges {
            location: Some("Forum Theatre".to_string()),
            price: Some(60),
            ..Default::default()
        });

        assert_eq!(event.location, "Forum Theatre");
        assert_eq!(event.price, 60);
        assert_eq!(event.event_name, "Midnight Sessions");
    }

    #[test]
    fn zero_tickets_forces_booked() {
        let mut event = sample_event();

        event.apply_changes(EventChanges {
            num_tickets: Some(0),
            ..Default::default()
        });

        assert_eq!(event.num_tickets, 0);
        assert_eq!(event.status, EventStatus::Booked);
    }

    #[test]
    fn positive_tickets_force_active_over_submitted_status() {
        let mut event = sample_event();

        // Inactive submitted alongside a ticket count: the count wins.
        event.apply_changes(EventChanges {
            status: Some(EventStatus::Inactive),
            num_tickets: Some(10),
            ..Default::default()
        });

        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.num_tickets, 10);
    }

    #[test]
    fn status_alone_is_respected() {
        let mut event = sample_event();

        event.apply_changes(EventChanges {
            status: Some(EventStatus::Inactive),
            ..Default::default()
        });

        assert_eq!(event.status, EventStatus::Inactive);
    }

    #[test]
    fn status_is_stored_as_plain_text() {
        // The status column is TEXT: binds send Display output and rows
        // decode through TryFrom<String>. The two must agree per variant.
        for status in [
            EventStatus::Active,
            EventStatus::Upcoming,
            EventStatus::Inactive,
            EventStatus::Booked,
        ] {
            let stored = status.to_string();
            assert_eq!(EventStatus::try_from(stored), Ok(status));
        }
        assert!(EventStatus::try_from("SOLD".to_string()).is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            EventStatus::Active,
            EventStatus::Upcoming,
            EventStatus::Inactive,
            EventStatus::Booked,
        ] {
            assert_eq!(status.to_string().parse::<EventStatus>(), Ok(status));
        }
        assert!("Cancelled".parse::<EventStatus>().is_err());
    }
}
