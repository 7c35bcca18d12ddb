//! Flash messages for the redirect-heavy mutation surface.
//!
//! Every mutating handler answers with a redirect to a related view plus a
//! human-readable notice. The notice rides along as `?flash=…&level=…` query
//! parameters on the redirect target, and the target GET echoes it into its
//! view payload for the frontend to render.

use axum::response::Redirect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub flash: String,
    pub level: Level,
}

/// Redirect to `path` carrying a flash message in the query string.
pub fn redirect_with_flash(path: &str, level: Level, message: &str) -> Redirect {
    let flash = Flash {
        flash: message.to_string(),
        level,
    };
    match serde_urlencoded::to_string(&flash) {
        Ok(query) => Redirect::to(&format!("{}?{}", path, query)),
        // Unencodable message: still land the user somewhere sensible
        Err(_) => Redirect::to(path),
    }
}

pub fn success(path: &str, message: &str) -> Redirect {
    redirect_with_flash(path, Level::Success, message)
}

pub fn warning(path: &str, message: &str) -> Redirect {
    redirect_with_flash(path, Level::Warning, message)
}

pub fn error(path: &str, message: &str) -> Redirect {
    redirect_with_flash(path, Level::Error, message)
}

/// Query-side view of a flash message, extracted on GET views so the notice
/// survives the redirect. The level is kept as a raw string: a mangled
/// `level` parameter must not reject the whole query and 400 the view.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FlashQuery {
    pub flash: Option<String>,
    pub level: Option<String>,
}

impl FlashQuery {
    pub fn into_flash(self) -> Option<Flash> {
        let level = match self.level.as_deref() {
            Some("warning") => Level::Warning,
            Some("error") => Level::Error,
            _ => Level::Success,
        };
        Some(Flash {
            flash: self.flash?,
            level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_round_trips_through_query_string() {
        let flash = Flash {
            flash: "Too many tickets booked".to_string(),
            level: Level::Error,
        };
        let query = serde_urlencoded::to_string(&flash).unwrap();

        let parsed: FlashQuery = serde_urlencoded::from_str(&query).unwrap();
        assert_eq!(parsed.into_flash(), Some(flash));
    }

    #[test]
    fn empty_query_yields_no_flash() {
        let parsed: FlashQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(parsed.into_flash(), None);
    }

    #[test]
    fn level_defaults_to_success() {
        let parsed: FlashQuery = serde_urlencoded::from_str("flash=Done").unwrap();
        let flash = parsed.into_flash().unwrap();
        assert_eq!(flash.level, Level::Success);
    }

    #[test]
    fn unknown_level_still_parses_and_keeps_the_message() {
        let parsed: FlashQuery = serde_urlencoded::from_str("flash=Saved&level=fancy").unwrap();
        let flash = parsed.into_flash().unwrap();
        assert_eq!(flash.flash, "Saved");
        assert_eq!(flash.level, Level::Success);
    }
}
