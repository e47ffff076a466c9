use std::fmt::Write;

use chrono::Utc;

use crate::models::{GradeRecord, ScoreKind, ScoreKindSummary};
use crate::stats::{self, StatsConfig};

/// Counts and averages the raw score entries by category, including the
/// unrecognized ones, so a report shows what the classifier is discarding.
pub fn summarize_score_mix(records: &[GradeRecord]) -> Vec<ScoreKindSummary> {
    let mut map: std::collections::HashMap<ScoreKind, (usize, f64)> =
        std::collections::HashMap::new();

    for record in records {
        for entry in &record.scores {
            let slot = map.entry(entry.kind).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += entry.score;
        }
    }

    let mut summaries: Vec<ScoreKindSummary> = map
        .into_iter()
        .map(|(kind, (count, total))| ScoreKindSummary {
            kind,
            count,
            avg_score: total / count as f64,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    class_id: Option<i32>,
    records: &[GradeRecord],
    config: &StatsConfig,
    limit: usize,
) -> String {
    let class_scores = stats::weighted_class_scores(records, config);
    let mut averages = stats::learner_averages(&class_scores);
    averages.sort_by(|a, b| {
        b.avg_score
            .partial_cmp(&a.avg_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let population = stats::population_stats(&averages, config);
    let summaries = summarize_score_mix(records);

    let mut output = String::new();
    let scope_label = match class_id {
        Some(id) => format!("class {id}"),
        None => "all classes".to_string(),
    };

    let _ = writeln!(output, "# Gradebook Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label,
        Utc::now().date_naive()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No scores recorded for this scope.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} scores (avg {:.1})",
                summary.kind.label(),
                summary.count,
                summary.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Learners");

    if averages.is_empty() {
        let _ = writeln!(output, "No learners with classified scores in this scope.");
    } else {
        for learner in averages.iter().take(limit) {
            let classes: Vec<String> = class_scores
                .iter()
                .filter(|s| s.learner_id == learner.learner_id)
                .map(|s| s.class_id.to_string())
                .collect();
            let _ = writeln!(
                output,
                "- learner {} averages {:.2} (classes: {})",
                learner.learner_id,
                learner.avg_score,
                classes.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Population");

    match population {
        None => {
            let _ = writeln!(output, "No grade data for this scope.");
        }
        Some(stats) => {
            let _ = writeln!(output, "- total learners: {}", stats.total_learners);
            let _ = writeln!(
                output,
                "- above {:.0}: {} ({:.2}%)",
                config.pass_threshold, stats.above_threshold, stats.percentage_above_threshold
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreEntry;
    use uuid::Uuid;

    fn record(learner_id: i64, class_id: i32, scores: Vec<(ScoreKind, f64)>) -> GradeRecord {
        GradeRecord {
            id: Uuid::new_v4(),
            learner_id,
            class_id,
            scores: scores
                .into_iter()
                .map(|(kind, score)| ScoreEntry { kind, score })
                .collect(),
        }
    }

    #[test]
    fn score_mix_counts_every_category() {
        let records = vec![
            record(1, 5, vec![(ScoreKind::Exam, 80.0), (ScoreKind::Exam, 90.0)]),
            record(2, 5, vec![(ScoreKind::Other, 10.0)]),
        ];

        let summaries = summarize_score_mix(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].kind, ScoreKind::Exam);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_score - 85.0).abs() < 1e-9);
        assert_eq!(summaries[1].kind, ScoreKind::Other);
    }

    #[test]
    fn report_includes_population_facet() {
        let records = vec![record(
            1,
            5,
            vec![
                (ScoreKind::Exam, 100.0),
                (ScoreKind::Quiz, 100.0),
                (ScoreKind::Homework, 100.0),
            ],
        )];

        let report = build_report(Some(5), &records, &StatsConfig::default(), 10);
        assert!(report.contains("Generated for class 5"));
        assert!(report.contains("- learner 1 averages 100.00 (classes: 5)"));
        assert!(report.contains("- total learners: 1"));
        assert!(report.contains("- above 70: 1 (100.00%)"));
    }

    #[test]
    fn empty_scope_reports_no_data() {
        let report = build_report(None, &[], &StatsConfig::default(), 10);
        assert!(report.contains("No scores recorded for this scope."));
        assert!(report.contains("No grade data for this scope."));
    }
}
