use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{round2, Alert, AlertType, Entry, Patient, RiskDashboard, Severity, WeeklySummary};
use crate::signals::{
    is_low_mood, is_very_low_mood, EntrySignals, RiskPhrases, CONSECUTIVE_LOW_MOOD,
    HIGH_LOW_MOOD_COUNT, MEDIUM_LOW_MOOD_COUNT, MOOD_DECLINE_POINTS, RISK_WINDOW_DAYS,
};

/// Re-evaluates every patient's trailing week and builds the practice summary.
///
/// Patients without entries in the window are skipped, as are patients whose
/// pattern only reaches `low`. Alerts come back ordered critical, high, medium,
/// keeping the input patient order within a tier.
pub fn aggregate_risk(
    practitioner_id: Uuid,
    patients: &[Patient],
    entries_by_patient: &HashMap<Uuid, Vec<Entry>>,
    phrases: &RiskPhrases,
    as_of: DateTime<Utc>,
) -> RiskDashboard {
    let cutoff = cutoff_date(as_of, RISK_WINDOW_DAYS);
    let mut alerts = Vec::new();

    for patient in patients {
        let Some(entries) = entries_by_patient.get(&patient.id) else {
            continue;
        };
        let recent = recent_entries(entries, cutoff);
        if let Some(alert) = evaluate_patient(patient, &recent, phrases, as_of) {
            tracing::debug!(
                patient_id = %patient.id,
                severity = alert.severity.as_str(),
                "patient flagged"
            );
            alerts.push(alert);
        }
    }

    alerts.sort_by_key(|a| a.severity.rank());

    let weekly_summary = weekly_summary(patients, entries_by_patient, cutoff);
    tracing::info!(
        practitioner_id = %practitioner_id,
        alerts = alerts.len(),
        entries = weekly_summary.total_entries,
        "risk dashboard computed"
    );

    RiskDashboard {
        practitioner_id,
        generated_at: as_of,
        alerts,
        weekly_summary,
    }
}

/// Entries dated on or after `cutoff`, newest first.
pub fn recent_entries(entries: &[Entry], cutoff: NaiveDate) -> Vec<&Entry> {
    let mut recent: Vec<&Entry> = entries.iter().filter(|e| e.date >= cutoff).collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    recent
}

/// Window-level signals over a patient's recent entries (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSignals {
    pub low_mood_count: usize,
    pub consecutive_low_mood: bool,
    pub mood_decline: Option<i32>,
}

impl WindowSignals {
    pub fn evaluate(recent: &[&Entry]) -> Self {
        let low_mood_count = recent
            .iter()
            .filter(|e| e.valid_mood().is_some_and(is_low_mood))
            .count();

        let consecutive_low_mood = recent.len() >= CONSECUTIVE_LOW_MOOD
            && recent[..CONSECUTIVE_LOW_MOOD]
                .iter()
                .all(|e| e.valid_mood().is_some_and(is_low_mood));

        // Only the two latest entries are compared, whatever the gap between them.
        let mood_decline = match recent {
            [latest, previous, ..] => match (latest.valid_mood(), previous.valid_mood()) {
                (Some(now), Some(before)) if now < before - MOOD_DECLINE_POINTS => {
                    Some(before - now)
                }
                _ => None,
            },
            _ => None,
        };

        Self {
            low_mood_count,
            consecutive_low_mood,
            mood_decline,
        }
    }
}

fn evaluate_patient(
    patient: &Patient,
    recent: &[&Entry],
    phrases: &RiskPhrases,
    as_of: DateTime<Utc>,
) -> Option<Alert> {
    let last_entry = *recent.first()?;

    for entry in recent.iter().filter(|e| e.valid_mood().is_none()) {
        tracing::warn!(
            patient_id = %patient.id,
            entry_id = %entry.id,
            mood = ?entry.mood,
            "entry without a valid mood skipped in mood metrics"
        );
    }

    let last = EntrySignals::evaluate(last_entry, phrases);
    let window = WindowSignals::evaluate(recent);
    let very_low_last = last_entry.valid_mood().is_some_and(is_very_low_mood);
    let low_mood_streak =
        window.low_mood_count >= HIGH_LOW_MOOD_COUNT && window.consecutive_low_mood;
    let mut reasons = Vec::new();

    let (severity, alert_type) = if last.is_critical() {
        if last.has_risk_phrase {
            reasons.push("Risk phrase found in latest entry text".to_string());
        }
        if last.very_low_mood {
            reasons.push(format!(
                "Very low mood on latest entry ({})",
                last_entry.mood.unwrap_or_default()
            ));
        }
        if last.extreme_anxiety {
            reasons.push(format!(
                "Extreme anxiety ({})",
                last_entry.anxiety.unwrap_or_default()
            ));
        }
        if last.extreme_stress {
            reasons.push(format!(
                "Extreme stress ({})",
                last_entry.stress.unwrap_or_default()
            ));
        }
        (Severity::Critical, AlertType::RiskSuicide)
    } else if very_low_last
        || low_mood_streak
        || window.mood_decline.is_some()
    {
        if very_low_last {
            reasons.push(format!(
                "Very low mood on latest entry ({})",
                last_entry.mood.unwrap_or_default()
            ));
        }
        if low_mood_streak {
            reasons.push(format!(
                "{CONSECUTIVE_LOW_MOOD} consecutive low-mood entries"
            ));
        }
        if let Some(drop) = window.mood_decline {
            reasons.push(format!("Mood dropped by {drop} points since previous entry"));
        }
        reasons.push(low_mood_reason(window.low_mood_count));
        (Severity::High, AlertType::Deterioration)
    } else if window.low_mood_count >= MEDIUM_LOW_MOOD_COUNT {
        reasons.push(low_mood_reason(window.low_mood_count));
        (Severity::Medium, AlertType::Deterioration)
    } else {
        return None;
    };

    Some(Alert {
        patient_id: patient.id,
        patient_name: patient.name.clone(),
        severity,
        alert_type,
        reasons,
        recent_low_mood_count: window.low_mood_count,
        last_entry: last_entry.clone(),
        generated_at: as_of,
    })
}

fn low_mood_reason(count: usize) -> String {
    format!("{count} low-mood entries in the last {RISK_WINDOW_DAYS} days")
}

/// Practice-wide counts over the trailing window.
pub fn weekly_summary(
    patients: &[Patient],
    entries_by_patient: &HashMap<Uuid, Vec<Entry>>,
    cutoff: NaiveDate,
) -> WeeklySummary {
    let mut total_entries = 0usize;
    let mut mood_sum = 0i64;
    let mut mood_count = 0usize;
    let mut entries_by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut contributors: HashSet<Uuid> = HashSet::new();

    for patient in patients {
        let Some(entries) = entries_by_patient.get(&patient.id) else {
            continue;
        };
        for entry in entries.iter().filter(|e| e.date >= cutoff) {
            total_entries += 1;
            if let Some(mood) = entry.valid_mood() {
                mood_sum += i64::from(mood);
                mood_count += 1;
            }
            *entries_by_day.entry(entry.date).or_insert(0) += 1;
            contributors.insert(patient.id);
        }
    }

    WeeklySummary {
        total_entries,
        avg_mood: if mood_count == 0 {
            0.0
        } else {
            round2(mood_sum as f64 / mood_count as f64)
        },
        patients_with_entries: contributors.len(),
        entries_by_day,
    }
}

pub fn cutoff_date(as_of: DateTime<Utc>, days: i64) -> NaiveDate {
    as_of.date_naive() - Duration::days(days.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 12, 15, 0, 0).unwrap()
    }

    fn patient(name: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn entry(patient: &Patient, days_ago: i64, mood: i32) -> Entry {
        let date = as_of().date_naive() - Duration::days(days_ago);
        Entry {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            date,
            mood: Some(mood),
            anxiety: None,
            stress: None,
            sleep: None,
            text: None,
            created_at: as_of() - Duration::days(days_ago),
        }
    }

    fn run(patients: &[Patient], entries: Vec<Entry>) -> RiskDashboard {
        let mut by_patient: HashMap<Uuid, Vec<Entry>> = HashMap::new();
        for e in entries {
            by_patient.entry(e.patient_id).or_default().push(e);
        }
        aggregate_risk(
            Uuid::nil(),
            patients,
            &by_patient,
            &RiskPhrases::default(),
            as_of(),
        )
    }

    #[test]
    fn cutoff_date_respects_days() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(cutoff_date(as_of(), 7), expected);
    }

    #[test]
    fn patient_without_recent_entries_never_alerts() {
        let p = patient("Sam Ortiz");
        let mut old = entry(&p, 20, 0);
        old.text = Some("I want to end my life".to_string());
        let dashboard = run(&[p.clone()], vec![old, entry(&p, 8, 0)]);
        assert!(dashboard.alerts.is_empty());
        assert_eq!(dashboard.weekly_summary.total_entries, 0);
    }

    #[test]
    fn consecutive_low_mood_is_high() {
        let p = patient("Rin Takeda");
        let dashboard = run(
            &[p.clone()],
            vec![entry(&p, 0, 2), entry(&p, 1, 3), entry(&p, 2, 3), entry(&p, 3, 7)],
        );
        assert_eq!(dashboard.alerts.len(), 1);
        let alert = &dashboard.alerts[0];
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, AlertType::Deterioration);
        assert_eq!(alert.recent_low_mood_count, 3);
        assert!(alert.reasons.iter().any(|r| r.contains("consecutive")));
        assert!(alert
            .reasons
            .iter()
            .any(|r| r.starts_with("3 low-mood entries")));
    }

    #[test]
    fn mood_drop_above_three_is_high() {
        let p = patient("Noor Haddad");
        let dashboard = run(&[p.clone()], vec![entry(&p, 2, 8), entry(&p, 0, 4)]);
        assert_eq!(dashboard.alerts.len(), 1);
        let alert = &dashboard.alerts[0];
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.reasons.iter().any(|r| r.contains("dropped by 4")));
    }

    #[test]
    fn mood_drop_of_exactly_three_is_not_a_decline() {
        let p = patient("Noor Haddad");
        let dashboard = run(&[p.clone()], vec![entry(&p, 1, 8), entry(&p, 0, 5)]);
        assert!(dashboard.alerts.is_empty());
    }

    #[test]
    fn two_low_entries_are_medium() {
        let p = patient("Ada Lind");
        let dashboard = run(
            &[p.clone()],
            vec![entry(&p, 0, 6), entry(&p, 1, 3), entry(&p, 4, 2)],
        );
        assert_eq!(dashboard.alerts.len(), 1);
        assert_eq!(dashboard.alerts[0].severity, Severity::Medium);
        assert_eq!(
            dashboard.alerts[0].reasons,
            vec!["2 low-mood entries in the last 7 days".to_string()]
        );
    }

    #[test]
    fn critical_reasons_name_each_fired_condition() {
        let p = patient("Jo Park");
        let mut latest = entry(&p, 0, 1);
        latest.anxiety = Some(9);
        latest.stress = Some(10);
        let dashboard = run(&[p.clone()], vec![latest, entry(&p, 1, 6)]);
        let alert = &dashboard.alerts[0];
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.alert_type, AlertType::RiskSuicide);
        assert_eq!(alert.reasons.len(), 3);
    }

    #[test]
    fn only_latest_entry_drives_critical() {
        let p = patient("Jo Park");
        let mut earlier = entry(&p, 1, 5);
        earlier.text = Some("thinking about suicide".to_string());
        let dashboard = run(&[p.clone()], vec![earlier, entry(&p, 0, 6)]);
        assert!(dashboard.alerts.is_empty());
    }

    #[test]
    fn alerts_sorted_by_severity_then_input_order() {
        let medium = patient("Medium One");
        let high_a = patient("High A");
        let critical = patient("Critical");
        let high_b = patient("High B");

        let mut crisis = entry(&critical, 0, 5);
        crisis.text = Some("I want to hurt myself".to_string());

        let dashboard = run(
            &[medium.clone(), high_a.clone(), critical.clone(), high_b.clone()],
            vec![
                entry(&medium, 0, 3),
                entry(&medium, 1, 3),
                entry(&high_a, 0, 1),
                crisis,
                entry(&high_b, 0, 0),
            ],
        );

        let names: Vec<&str> = dashboard
            .alerts
            .iter()
            .map(|a| a.patient_name.as_str())
            .collect();
        assert_eq!(names, vec!["Critical", "High A", "High B", "Medium One"]);
    }

    #[test]
    fn malformed_entries_do_not_break_aggregation() {
        let p = patient("Lee Moreau");
        let mut broken = entry(&p, 0, 0);
        broken.mood = None;
        let mut out_of_range = entry(&p, 1, 0);
        out_of_range.mood = Some(42);
        let dashboard = run(
            &[p.clone()],
            vec![broken, out_of_range, entry(&p, 2, 2), entry(&p, 3, 3)],
        );

        assert_eq!(dashboard.alerts.len(), 1);
        assert_eq!(dashboard.alerts[0].severity, Severity::Medium);
        assert_eq!(dashboard.weekly_summary.total_entries, 4);
        assert_eq!(dashboard.weekly_summary.avg_mood, 2.5);
    }

    #[test]
    fn summary_counts_days_and_contributors() {
        let a = patient("A");
        let b = patient("B");
        let c = patient("C");
        let dashboard = run(
            &[a.clone(), b.clone(), c.clone()],
            vec![
                entry(&a, 0, 5),
                entry(&a, 1, 6),
                entry(&b, 0, 8),
                entry(&c, 30, 1),
            ],
        );

        let summary = &dashboard.weekly_summary;
        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.patients_with_entries, 2);
        assert_eq!(summary.avg_mood, 6.33);
        assert_eq!(summary.entries_by_day.get(&as_of().date_naive()), Some(&2));
        assert_eq!(summary.entries_by_day.len(), 2);
    }

    #[test]
    fn empty_practice_yields_empty_dashboard() {
        let dashboard = run(&[], vec![]);
        assert!(dashboard.alerts.is_empty());
        assert_eq!(dashboard.weekly_summary.total_entries, 0);
        assert_eq!(dashboard.weekly_summary.avg_mood, 0.0);
    }

    #[test]
    fn same_input_same_dashboard() {
        let p = patient("Kai");
        let entries = vec![entry(&p, 0, 1), entry(&p, 1, 3), entry(&p, 2, 2)];
        assert_eq!(run(&[p.clone()], entries.clone()), run(&[p], entries));
    }

    #[test]
    fn entry_on_window_start_is_included() {
        let p = patient("Tove Berg");
        let dashboard = run(&[p.clone()], vec![entry(&p, 7, 0)]);
        assert_eq!(dashboard.alerts.len(), 1);
        assert_eq!(dashboard.alerts[0].severity, Severity::High);
        assert_eq!(dashboard.weekly_summary.total_entries, 1);
    }

    #[test]
    fn same_day_entries_use_latest_created_at() {
        let p = patient("Tove Berg");
        let mut morning = entry(&p, 0, 6);
        morning.created_at = as_of() - Duration::hours(6);
        let mut evening = entry(&p, 0, 0);
        evening.created_at = as_of() - Duration::hours(1);
        let evening_id = evening.id;

        let dashboard = run(&[p.clone()], vec![morning, evening]);
        let alert = &dashboard.alerts[0];
        assert_eq!(alert.last_entry.id, evening_id);
        assert_eq!(alert.last_entry.mood, Some(0));
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.reasons.iter().any(|r| r.contains("dropped by 6")));
    }

    #[test]
    fn low_mood_count_tiers_follow_shared_thresholds() {
        use crate::signals::{HIGH_LOW_MOOD_COUNT, MEDIUM_LOW_MOOD_COUNT};

        let p = patient("Idris Okafor");
        let mut entries = vec![entry(&p, 0, 7)];
        for day in 1..=MEDIUM_LOW_MOOD_COUNT as i64 {
            entries.push(entry(&p, day, 3));
        }
        let dashboard = run(&[p.clone()], entries);
        assert_eq!(dashboard.alerts[0].severity, Severity::Medium);
        assert_eq!(dashboard.alerts[0].recent_low_mood_count, MEDIUM_LOW_MOOD_COUNT);

        let q = patient("Lena Vogt");
        let streak: Vec<Entry> = (0..HIGH_LOW_MOOD_COUNT as i64).map(|d| entry(&q, d, 3)).collect();
        let dashboard = run(&[q.clone()], streak);
        assert_eq!(dashboard.alerts[0].severity, Severity::High);
        assert_eq!(dashboard.alerts[0].recent_low_mood_count, HIGH_LOW_MOOD_COUNT);
    }
}
