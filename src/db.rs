use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use practice_risk_engine::{validate_entry, Entry, Patient};

const ENTRY_COLUMNS: &str =
    "id, patient_id, entry_date, mood, anxiety, stress, sleep_hours, note, created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let practitioner_id = Uuid::parse_str("6b1f0c5e-8a43-4d2e-9a37-1f0e5b7c2d91")?;
    sqlx::query(
        r#"
        INSERT INTO practice_risk.practitioners (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        "#,
    )
    .bind(practitioner_id)
    .bind("Dr. Mira Castell")
    .bind("mira.castell@practice.example")
    .execute(pool)
    .await?;

    // Mood series run oldest to newest, ending today.
    let patients = vec![
        (
            Uuid::parse_str("9e2c4a71-5b3d-4f08-a6c1-7d84e2f0b913")?,
            "Tove Berg",
            "tove.berg@patients.example",
            vec![7, 6, 6, 5, 3, 2, 2],
            Some("Hard to get out of bed again."),
        ),
        (
            Uuid::parse_str("41b7d0e5-c962-4a1f-8e3b-05f9a7c6d224")?,
            "Idris Okafor",
            "idris.okafor@patients.example",
            vec![6, 7, 7, 6, 8, 7, 7],
            Some("Good session on Tuesday."),
        ),
        (
            Uuid::parse_str("c8f35e2a-7d19-46b0-b4e7-9a1c03d6f58e")?,
            "Lena Vogt",
            "lena.vogt@patients.example",
            vec![5, 6, 5, 4, 8, 8, 3],
            None,
        ),
    ];

    let today = Utc::now().date_naive();
    for (patient_id, name, email, moods, note) in patients {
        sqlx::query(
            r#"
            INSERT INTO practice_risk.patients (id, full_name, email, practitioner_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, practitioner_id = EXCLUDED.practitioner_id
            "#,
        )
        .bind(patient_id)
        .bind(name)
        .bind(email)
        .bind(practitioner_id)
        .execute(pool)
        .await?;

        let days = moods.len() as i64;
        for (idx, mood) in moods.into_iter().enumerate() {
            let date = today - Duration::days(days - 1 - idx as i64);
            let is_last = idx as i64 == days - 1;
            sqlx::query(
                r#"
                INSERT INTO practice_risk.entries
                (id, patient_id, entry_date, mood, anxiety, stress, sleep_hours, note, source_key)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(patient_id)
            .bind(date)
            .bind(mood)
            .bind(10 - mood)
            .bind(Option::<i32>::None)
            .bind(7.0_f64)
            .bind(if is_last { note } else { None })
            .bind(format!("seed-{email}-{date}"))
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

fn entry_from_row(row: &PgRow) -> Entry {
    Entry {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        date: row.get("entry_date"),
        mood: row.get("mood"),
        anxiety: row.get("anxiety"),
        stress: row.get("stress"),
        sleep: row.get("sleep_hours"),
        text: row.get("note"),
        created_at: row.get("created_at"),
    }
}

pub async fn list_patients_for_practitioner(
    pool: &PgPool,
    practitioner_id: Uuid,
) -> anyhow::Result<Vec<Patient>> {
    let rows = sqlx::query(
        "SELECT id, full_name FROM practice_risk.patients \
         WHERE practitioner_id = $1 ORDER BY full_name",
    )
    .bind(practitioner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Patient {
            id: row.get("id"),
            name: row.get("full_name"),
        })
        .collect())
}

pub async fn find_patient(pool: &PgPool, patient_id: Uuid) -> anyhow::Result<Patient> {
    let row = sqlx::query("SELECT id, full_name FROM practice_risk.patients WHERE id = $1")
        .bind(patient_id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("patient {patient_id} not found"))?;

    Ok(Patient {
        id: row.get("id"),
        name: row.get("full_name"),
    })
}

pub async fn list_entries_for_patient(
    pool: &PgPool,
    patient_id: Uuid,
) -> anyhow::Result<Vec<Entry>> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM practice_risk.entries \
         WHERE patient_id = $1 ORDER BY entry_date, created_at"
    );
    let rows = sqlx::query(&query).bind(patient_id).fetch_all(pool).await?;
    Ok(rows.iter().map(entry_from_row).collect())
}

/// Entries for several patients in one round trip, keyed by patient.
pub async fn list_entries_for_patients(
    pool: &PgPool,
    patient_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<Entry>>> {
    let query = format!(
        "SELECT {ENTRY_COLUMNS} FROM practice_risk.entries \
         WHERE patient_id = ANY($1) ORDER BY entry_date, created_at"
    );
    let rows = sqlx::query(&query)
        .bind(patient_ids)
        .fetch_all(pool)
        .await?;

    let mut by_patient: HashMap<Uuid, Vec<Entry>> = HashMap::new();
    for row in rows.iter() {
        let entry = entry_from_row(row);
        by_patient.entry(entry.patient_id).or_default().push(entry);
    }
    Ok(by_patient)
}

pub async fn append_entry(pool: &PgPool, entry: &Entry) -> anyhow::Result<Entry> {
    validate_entry(entry)?;

    let query = format!(
        r#"
        INSERT INTO practice_risk.entries
        (id, patient_id, entry_date, mood, anxiety, stress, sleep_hours, note, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let row = sqlx::query(&query)
        .bind(entry.id)
        .bind(entry.patient_id)
        .bind(entry.date)
        .bind(entry.mood)
        .bind(entry.anxiety)
        .bind(entry.stress)
        .bind(entry.sleep)
        .bind(&entry.text)
        .bind(entry.created_at)
        .fetch_one(pool)
        .await
        .context("failed to insert entry")?;

    Ok(entry_from_row(&row))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        patient_email: String,
        date: NaiveDate,
        mood: i32,
        anxiety: Option<i32>,
        stress: Option<i32>,
        sleep: Option<f64>,
        note: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let patient_id: Uuid = sqlx::query("SELECT id FROM practice_risk.patients WHERE email = $1")
            .bind(&row.patient_email)
            .fetch_optional(pool)
            .await?
            .with_context(|| format!("unknown patient email {}", row.patient_email))?
            .get("id");

        let created_at: DateTime<Utc> = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4(),
            patient_id,
            date: row.date,
            mood: Some(row.mood),
            anxiety: row.anxiety,
            stress: row.stress,
            sleep: row.sleep,
            text: row.note.filter(|n| !n.trim().is_empty()),
            created_at,
        };
        if let Err(err) = validate_entry(&entry) {
            tracing::warn!(patient = %row.patient_email, date = %row.date, "skipping row: {err}");
            continue;
        }

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO practice_risk.entries
            (id, patient_id, entry_date, mood, anxiety, stress, sleep_hours, note, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(entry.patient_id)
        .bind(entry.date)
        .bind(entry.mood)
        .bind(entry.anxiety)
        .bind(entry.stress)
        .bind(entry.sleep)
        .bind(&entry.text)
        .bind(entry.created_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
