use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{round2, Entry, RiskDashboard, WeeklyReport};
use crate::weeks::{iso_week, WeekKey};

/// Buckets a patient's full history into ISO-style weeks, newest week first.
pub fn build_weekly_reports(entries: &[Entry]) -> Vec<WeeklyReport> {
    let mut buckets: BTreeMap<WeekKey, Vec<&Entry>> = BTreeMap::new();

    for entry in entries {
        buckets.entry(iso_week(entry.date)).or_default().push(entry);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, bucket)| summarize_week(key, bucket))
        .collect()
}

fn summarize_week(key: WeekKey, mut bucket: Vec<&Entry>) -> WeeklyReport {
    bucket.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    let moods: Vec<i32> = bucket.iter().filter_map(|e| e.valid_mood()).collect();
    let anxieties: Vec<i32> = bucket.iter().filter_map(|e| e.valid_anxiety()).collect();
    let stresses: Vec<i32> = bucket.iter().filter_map(|e| e.valid_stress()).collect();
    let sleeps: Vec<f64> = bucket
        .iter()
        .filter_map(|e| e.sleep.filter(|h| h.is_finite()))
        .collect();

    WeeklyReport {
        year: key.year,
        week: key.week,
        start_date: key.start,
        end_date: key.end,
        entries_count: bucket.len(),
        avg_mood: mean(moods.iter().map(|&m| f64::from(m))),
        avg_anxiety: mean(anxieties.iter().map(|&a| f64::from(a))),
        avg_sleep: mean(sleeps.iter().copied()),
        avg_stress: mean(stresses.iter().map(|&s| f64::from(s))),
        min_mood: moods.iter().copied().min(),
        max_mood: moods.iter().copied().max(),
        entries: bucket.into_iter().cloned().collect(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(round2(sum / count as f64))
    }
}

/// Week-over-week change in average mood, aligned with `reports`.
///
/// The oldest week, and any week where either side has no average, gets `None`.
pub fn mood_deltas(reports: &[WeeklyReport]) -> Vec<Option<f64>> {
    reports
        .iter()
        .enumerate()
        .map(|(idx, current)| {
            let previous = reports.get(idx + 1)?;
            Some(round2(current.avg_mood? - previous.avg_mood?))
        })
        .collect()
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn render_markdown(patient_name: &str, reports: &[WeeklyReport]) -> String {
    let deltas = mood_deltas(reports);
    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Progress Report");
    let _ = writeln!(output, "Patient: {patient_name}");
    let _ = writeln!(output);

    if reports.is_empty() {
        let _ = writeln!(output, "No journal entries recorded yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Week | Dates | Entries | Mood | Min | Max | Anxiety | Stress | Sleep | Mood change |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|---|");

    for (report, delta) in reports.iter().zip(deltas.iter()) {
        let change = match delta {
            Some(d) if *d > 0.0 => format!("+{d:.2}"),
            Some(d) => format!("{d:.2}"),
            None => "-".to_string(),
        };
        let _ = writeln!(
            output,
            "| {}-W{:02} | {} to {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            report.year,
            report.week,
            report.start_date,
            report.end_date,
            report.entries_count,
            fmt_opt(report.avg_mood),
            report.min_mood.map_or_else(|| "-".to_string(), |m| m.to_string()),
            report.max_mood.map_or_else(|| "-".to_string(), |m| m.to_string()),
            fmt_opt(report.avg_anxiety),
            fmt_opt(report.avg_stress),
            fmt_opt(report.avg_sleep),
            change
        );
    }

    let notes: Vec<&Entry> = reports
        .iter()
        .flat_map(|r| r.entries.iter().rev())
        .filter(|e| e.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .take(5)
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Journal Notes");
    if notes.is_empty() {
        let _ = writeln!(output, "No written notes in these weeks.");
    } else {
        for entry in notes {
            let _ = writeln!(
                output,
                "- {}: {}",
                entry.date,
                entry.text.as_deref().unwrap_or_default().trim()
            );
        }
    }

    output
}

pub fn render_dashboard(dashboard: &RiskDashboard) -> String {
    let summary = &dashboard.weekly_summary;
    let mut output = String::new();

    let _ = writeln!(output, "# Practice Risk Dashboard");
    let _ = writeln!(output, "Generated at {}", dashboard.generated_at.to_rfc3339());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Patients Needing Attention");

    if dashboard.alerts.is_empty() {
        let _ = writeln!(output, "No patients flagged in the last 7 days.");
    } else {
        for alert in dashboard.alerts.iter() {
            let _ = writeln!(
                output,
                "- [{}] {} ({}), last entry {}: {}",
                alert.severity.as_str(),
                alert.patient_name,
                alert.alert_type.as_str(),
                alert.last_entry.date,
                alert.reasons.join("; ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## This Week");
    let _ = writeln!(
        output,
        "{} entries from {} patients, average mood {:.2}",
        summary.total_entries, summary.patients_with_entries, summary.avg_mood
    );
    for (day, count) in summary.entries_by_day.iter() {
        let _ = writeln!(output, "- {day}: {count}");
    }

    output
}
