use std::collections::BTreeMap;

use crate::models::{
    GradeRecord, LearnerAverage, PopulationStats, ScoreEntry, ScoreKind, WeightedClassScore,
};

/// Weights and pass threshold for the statistics pipeline. Injected once at
/// construction rather than re-derived per call.
#[derive(Debug, Clone, Copy)]
pub struct StatsConfig {
    pub exam_weight: f64,
    pub quiz_weight: f64,
    pub homework_weight: f64,
    pub pass_threshold: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            exam_weight: 0.5,
            quiz_weight: 0.3,
            homework_weight: 0.2,
            pass_threshold: 70.0,
        }
    }
}

/// Scores of one (learner, class) group split by assessment category.
/// Insertion order of the source score list is preserved per bucket.
#[derive(Debug, Clone, Default)]
pub struct ScoreBuckets {
    pub exam: Vec<f64>,
    pub quiz: Vec<f64>,
    pub homework: Vec<f64>,
}

impl ScoreBuckets {
    fn merge(&mut self, other: ScoreBuckets) {
        self.exam.extend(other.exam);
        self.quiz.extend(other.quiz);
        self.homework.extend(other.homework);
    }
}

/// Stage 1: partition a score list into the three category buckets,
/// dropping `Other` entries. Pure function of its input.
pub fn classify_scores(entries: &[ScoreEntry]) -> ScoreBuckets {
    let mut buckets = ScoreBuckets::default();
    for entry in entries {
        match entry.kind {
            ScoreKind::Exam => buckets.exam.push(entry.score),
            ScoreKind::Quiz => buckets.quiz.push(entry.score),
            ScoreKind::Homework => buckets.homework.push(entry.score),
            ScoreKind::Other => {}
        }
    }
    buckets
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Combines the bucket means with the configured weights. Empty buckets get
/// weight zero and the remaining weights are renormalized, so a group that
/// recorded no homework is not penalized for it. Returns `None` when every
/// bucket is empty, so such a group carries no weighted score at all rather
/// than a NaN one.
pub fn weighted_average(buckets: &ScoreBuckets, config: &StatsConfig) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    if let Some(avg) = mean(&buckets.exam) {
        weighted_sum += avg * config.exam_weight;
        weight_total += config.exam_weight;
    }
    if let Some(avg) = mean(&buckets.quiz) {
        weighted_sum += avg * config.quiz_weight;
        weight_total += config.quiz_weight;
    }
    if let Some(avg) = mean(&buckets.homework) {
        weighted_sum += avg * config.homework_weight;
        weight_total += config.homework_weight;
    }

    if weight_total == 0.0 {
        None
    } else {
        Some(weighted_sum / weight_total)
    }
}

/// Stage 2a: group records by (learner, class) and compute the weighted
/// score per group. Duplicate records for the same pair merge their score
/// lists before classification. The records are expected to be pre-scoped
/// by the record store query; no class filtering happens here.
pub fn weighted_class_scores(
    records: &[GradeRecord],
    config: &StatsConfig,
) -> Vec<WeightedClassScore> {
    let mut groups: BTreeMap<(i64, i32), ScoreBuckets> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.learner_id, record.class_id))
            .or_default()
            .merge(classify_scores(&record.scores));
    }

    groups
        .into_iter()
        .filter_map(|((learner_id, class_id), buckets)| {
            weighted_average(&buckets, config).map(|weighted_avg| WeightedClassScore {
                learner_id,
                class_id,
                weighted_avg,
            })
        })
        .collect()
}

/// Stage 2b: group the class scores by learner and take the arithmetic mean
/// across each learner's classes.
pub fn learner_averages(class_scores: &[WeightedClassScore]) -> Vec<LearnerAverage> {
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();

    for score in class_scores {
        let entry = groups.entry(score.learner_id).or_insert((0.0, 0));
        entry.0 += score.weighted_avg;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(learner_id, (total, count))| LearnerAverage {
            learner_id,
            avg_score: total / count as f64,
        })
        .collect()
}

/// Stage 3: facet the learner averages into total count, count strictly
/// above the threshold, and the percentage above. An empty set yields
/// `None` so callers can distinguish "no learners" from "all learners
/// scored zero"; the percentage is never computed over a zero total.
pub fn population_stats(
    averages: &[LearnerAverage],
    config: &StatsConfig,
) -> Option<PopulationStats> {
    if averages.is_empty() {
        return None;
    }

    let total_learners = averages.len();
    let above_threshold = averages
        .iter()
        .filter(|learner| learner.avg_score > config.pass_threshold)
        .count();

    Some(PopulationStats {
        total_learners,
        above_threshold,
        percentage_above_threshold: above_threshold as f64 / total_learners as f64 * 100.0,
    })
}

/// Runs the full pipeline over one snapshot of matched records.
pub fn compute_stats(records: &[GradeRecord], config: &StatsConfig) -> Option<PopulationStats> {
    let class_scores = weighted_class_scores(records, config);
    let averages = learner_averages(&class_scores);
    population_stats(&averages, config)
}
