use serde::Serialize;
use uuid::Uuid;

/// One grade document per (learner, class) enrollment. The record store
/// assigns the id; the engine never writes these back.
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub id: Uuid,
    pub learner_id: i64,
    pub class_id: i32,
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub kind: ScoreKind,
    pub score: f64,
}

/// Assessment category. Stored tags are open strings; anything other than
/// the three known categories parses to `Other` and is skipped by the
/// classifier rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Exam,
    Quiz,
    Homework,
    Other,
}

impl ScoreKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "exam" => ScoreKind::Exam,
            "quiz" => ScoreKind::Quiz,
            "homework" => ScoreKind::Homework,
            _ => ScoreKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreKind::Exam => "exam",
            ScoreKind::Quiz => "quiz",
            ScoreKind::Homework => "homework",
            ScoreKind::Other => "other",
        }
    }
}

/// Weighted score for one (learner, class) group. Derived per request,
/// never persisted.
#[derive(Debug, Clone)]
pub struct WeightedClassScore {
    pub learner_id: i64,
    pub class_id: i32,
    pub weighted_avg: f64,
}

/// A learner's mean weighted score across their matched classes.
#[derive(Debug, Clone)]
pub struct LearnerAverage {
    pub learner_id: i64,
    pub avg_score: f64,
}

/// Population facet over the learner averages. Wire names match the legacy
/// API response, which baked the 70-point threshold into the field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationStats {
    #[serde(rename = "totalLearners")]
    pub total_learners: usize,
    #[serde(rename = "above70")]
    pub above_threshold: usize,
    #[serde(rename = "percentageAbove70")]
    pub percentage_above_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreKindSummary {
    pub kind: ScoreKind,
    pub count: usize,
    pub avg_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_to_their_kind() {
        assert_eq!(ScoreKind::parse("exam"), ScoreKind::Exam);
        assert_eq!(ScoreKind::parse("quiz"), ScoreKind::Quiz);
        assert_eq!(ScoreKind::parse("homework"), ScoreKind::Homework);
    }

    #[test]
    fn unknown_tags_parse_to_other() {
        assert_eq!(ScoreKind::parse("extra_credit"), ScoreKind::Other);
        assert_eq!(ScoreKind::parse("Exam"), ScoreKind::Other);
        assert_eq!(ScoreKind::parse(""), ScoreKind::Other);
    }

    #[test]
    fn stats_serialize_with_legacy_field_names() {
        let stats = PopulationStats {
            total_learners: 2,
            above_threshold: 1,
            percentage_above_threshold: 50.0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalLearners"], 2);
        assert_eq!(json["above70"], 1);
        assert_eq!(json["percentageAbove70"], 50.0);
    }
}
