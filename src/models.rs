use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest value accepted for mood, anxiety and stress scores.
pub const SCORE_MAX: i32 = 10;

/// One patient self-report for a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub mood: Option<i32>,
    #[serde(default)]
    pub anxiety: Option<i32>,
    #[serde(default)]
    pub stress: Option<i32>,
    #[serde(default)]
    pub sleep: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Mood when present and inside the 0..=10 scale.
    pub fn valid_mood(&self) -> Option<i32> {
        in_scale(self.mood)
    }

    pub fn valid_anxiety(&self) -> Option<i32> {
        in_scale(self.anxiety)
    }

    pub fn valid_stress(&self) -> Option<i32> {
        in_scale(self.stress)
    }
}

fn in_scale(value: Option<i32>) -> Option<i32> {
    value.filter(|v| (0..=SCORE_MAX).contains(v))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
}

/// Write-time flag returned alongside a freshly recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFlag {
    Critical,
    High,
    None,
}

impl AlertFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertFlag::Critical => "critical",
            AlertFlag::High => "high",
            AlertFlag::None => "none",
        }
    }
}

/// Severity tier of a dashboard alert. Ordering follows `rank()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    RiskSuicide,
    Deterioration,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::RiskSuicide => "risk_suicide",
            AlertType::Deterioration => "deterioration",
        }
    }
}

/// Derived on every dashboard read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub severity: Severity,
    pub alert_type: AlertType,
    pub reasons: Vec<String>,
    pub recent_low_mood_count: usize,
    pub last_entry: Entry,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub total_entries: usize,
    pub avg_mood: f64,
    pub patients_with_entries: usize,
    pub entries_by_day: BTreeMap<NaiveDate, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDashboard {
    pub practitioner_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<Alert>,
    pub weekly_summary: WeeklySummary,
}

/// Aggregates for one patient over one Monday-to-Sunday week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub year: i32,
    pub week: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entries_count: usize,
    pub avg_mood: Option<f64>,
    pub avg_anxiety: Option<f64>,
    pub avg_sleep: Option<f64>,
    pub avg_stress: Option<f64>,
    pub min_mood: Option<i32>,
    pub max_mood: Option<i32>,
    pub entries: Vec<Entry>,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
