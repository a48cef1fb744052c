use thiserror::Error;

use crate::models::{Entry, SCORE_MAX};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid entry field {field}: {value}")]
    InvalidEntry { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Checks an entry before it is appended to storage.
///
/// Stored entries are never re-validated; the engine reads them defensively.
pub fn validate_entry(entry: &Entry) -> Result<(), EngineError> {
    match entry.mood {
        None => {
            return Err(EngineError::InvalidEntry {
                field: "mood",
                value: "missing".to_string(),
            })
        }
        Some(mood) => check_score("mood", mood)?,
    }
    if let Some(anxiety) = entry.anxiety {
        check_score("anxiety", anxiety)?;
    }
    if let Some(stress) = entry.stress {
        check_score("stress", stress)?;
    }
    if let Some(sleep) = entry.sleep {
        if !(0.0..=24.0).contains(&sleep) {
            return Err(EngineError::InvalidEntry {
                field: "sleep",
                value: sleep.to_string(),
            });
        }
    }
    Ok(())
}

fn check_score(field: &'static str, value: i32) -> Result<(), EngineError> {
    if (0..=SCORE_MAX).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidEntry {
            field,
            value: value.to_string(),
        })
    }
}
