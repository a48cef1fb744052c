//! Patient risk monitoring and weekly progress aggregation.
//!
//! Everything here is a pure function over entries already fetched from
//! storage: write-time classification, the practitioner risk dashboard and
//! per-patient weekly reports.

pub mod classify;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod risk;
pub mod signals;
pub mod weeks;

pub use classify::classify;
pub use config::EngineConfig;
pub use error::{validate_entry, EngineError};
pub use models::{
    Alert, AlertFlag, AlertType, Entry, Patient, RiskDashboard, Severity, WeeklyReport,
    WeeklySummary,
};
pub use report::build_weekly_reports;
pub use risk::aggregate_risk;
pub use signals::RiskPhrases;
