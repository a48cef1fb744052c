use crate::models::{AlertFlag, Entry};
use crate::signals::{EntrySignals, RiskPhrases, HIGH_RISK_MOOD};

/// Write-time risk flag for a newly submitted entry.
///
/// The flag is advisory; the entry is stored as submitted whatever the result.
pub fn classify(entry: &Entry, phrases: &RiskPhrases) -> AlertFlag {
    let signals = EntrySignals::evaluate(entry, phrases);

    if signals.is_critical() {
        AlertFlag::Critical
    } else if entry.valid_mood().is_some_and(|m| m <= HIGH_RISK_MOOD) {
        AlertFlag::High
    } else {
        AlertFlag::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn entry(mood: i32, anxiety: Option<i32>, stress: Option<i32>, text: Option<&str>) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            mood: Some(mood),
            anxiety,
            stress,
            sleep: Some(6.5),
            text: text.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn risk_phrase_is_critical_regardless_of_scores() {
        let phrases = RiskPhrases::default();
        let e = entry(0, Some(0), Some(0), Some("I keep thinking about suicide"));
        assert_eq!(classify(&e, &phrases), AlertFlag::Critical);

        let e = entry(9, None, None, Some("Better off dead, honestly"));
        assert_eq!(classify(&e, &phrases), AlertFlag::Critical);
    }

    #[test]
    fn anxiety_boundary_at_nine() {
        let phrases = RiskPhrases::default();
        assert_eq!(classify(&entry(1, Some(9), None, None), &phrases), AlertFlag::Critical);
        assert_eq!(classify(&entry(1, Some(8), None, None), &phrases), AlertFlag::High);
    }

    #[test]
    fn extreme_stress_with_very_low_mood_is_critical() {
        let phrases = RiskPhrases::default();
        assert_eq!(classify(&entry(0, None, Some(9), None), &phrases), AlertFlag::Critical);
    }

    #[test]
    fn mood_two_is_high_and_three_is_none() {
        let phrases = RiskPhrases::default();
        assert_eq!(classify(&entry(2, None, None, None), &phrases), AlertFlag::High);
        assert_eq!(classify(&entry(3, None, None, None), &phrases), AlertFlag::None);
    }

    #[test]
    fn classification_is_repeatable() {
        let phrases = RiskPhrases::default();
        let e = entry(1, Some(9), Some(2), Some("rough week"));
        let first = classify(&e, &phrases);
        for _ in 0..5 {
            assert_eq!(classify(&e, &phrases), first);
        }
    }

    #[test]
    fn malformed_mood_falls_through_to_none() {
        let phrases = RiskPhrases::default();
        let mut e = entry(0, Some(10), None, None);
        e.mood = Some(-4);
        assert_eq!(classify(&e, &phrases), AlertFlag::None);
        e.mood = None;
        assert_eq!(classify(&e, &phrases), AlertFlag::None);
    }

    #[test]
    fn custom_phrase_set_is_honoured() {
        let phrases = RiskPhrases::new(["en finir"]);
        assert_eq!(
            classify(&entry(7, None, None, Some("Je veux en finir")), &phrases),
            AlertFlag::Critical
        );
        assert_eq!(
            classify(&entry(7, None, None, Some("suicide")), &phrases),
            AlertFlag::None
        );
    }
}
