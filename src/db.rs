use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{GradeRecord, ScoreEntry, ScoreKind};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_grade(pool: &PgPool, learner_id: i64, class_id: i32) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO gradebook.grades (id, learner_id, class_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (learner_id, class_id) DO UPDATE
        SET learner_id = EXCLUDED.learner_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(learner_id)
    .bind(class_id)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn append_score(
    pool: &PgPool,
    grade_id: Uuid,
    score_type: &str,
    score: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO gradebook.scores (grade_id, score_type, score)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(grade_id)
    .bind(score_type)
    .bind(score)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let rows: Vec<(i64, i32, &str, f64)> = vec![
        (0, 39, "exam", 74.5),
        (0, 39, "quiz", 68.0),
        (0, 39, "homework", 91.2),
        (1, 39, "exam", 92.0),
        (1, 39, "quiz", 88.5),
        (1, 39, "homework", 79.0),
        (1, 122, "exam", 58.0),
        (1, 122, "homework", 64.5),
        (2, 122, "exam", 81.0),
        (2, 122, "quiz", 77.0),
        (2, 122, "homework", 85.5),
        (3, 39, "extra_credit", 100.0),
        (3, 39, "exam", 45.0),
    ];

    for (learner_id, class_id, score_type, score) in rows {
        let grade_id = upsert_grade(pool, learner_id, class_id).await?;
        append_score(pool, grade_id, score_type, score).await?;
    }

    Ok(())
}

/// Runs the match-selection query: the full collection, or only the grades
/// for one class when a scope is supplied. Everything downstream trusts
/// this filter and never re-checks class membership. Scores come back in
/// insertion order.
pub async fn fetch_grades(
    pool: &PgPool,
    class_id: Option<i32>,
) -> anyhow::Result<Vec<GradeRecord>> {
    let mut query = String::from(
        "SELECT g.id, g.learner_id, g.class_id, s.score_type, s.score \
         FROM gradebook.grades g \
         LEFT JOIN gradebook.scores s ON s.grade_id = g.id",
    );

    if class_id.is_some() {
        query.push_str(" WHERE g.class_id = $1");
    }
    query.push_str(" ORDER BY g.id, s.seq");

    let mut rows = sqlx::query(&query);
    if let Some(value) = class_id {
        rows = rows.bind(value);
    }

    let rows = rows.fetch_all(pool).await?;
    let mut records: Vec<GradeRecord> = Vec::new();

    for row in rows {
        let id: Uuid = row.get("id");
        if records.last().map(|r| r.id) != Some(id) {
            records.push(GradeRecord {
                id,
                learner_id: row.get("learner_id"),
                class_id: row.get("class_id"),
                scores: Vec::new(),
            });
        }

        // NULL score columns come from grades with no scores yet.
        if let Some(score_type) = row.get::<Option<String>, _>("score_type") {
            let score: f64 = row.get("score");
            if let Some(record) = records.last_mut() {
                record.scores.push(ScoreEntry {
                    kind: ScoreKind::parse(&score_type),
                    score,
                });
            }
        }
    }

    debug!(
        records = records.len(),
        class_id = ?class_id,
        "fetched grade records"
    );
    Ok(records)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        // legacy exports still carry the student_id header
        #[serde(alias = "student_id")]
        learner_id: i64,
        class_id: i32,
        score_type: String,
        score: f64,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let grade_id = upsert_grade(pool, row.learner_id, row.class_id).await?;
        append_score(pool, grade_id, &row.score_type, row.score).await?;
        inserted += 1;
    }

    info!(inserted, "imported score rows");
    Ok(inserted)
}
