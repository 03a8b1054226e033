//! Scoring and topic analysis for a finished session.
//!
//! Everything here is pure and integer-only so boundary cases (7/10, 2/3,
//! exactly 70% on a topic) come out the same on every platform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Question, QuestionId, TestSession};

/// Topics at or above this accuracy (in percent) are not considered weak.
pub const WEAK_TOPIC_THRESHOLD_PERCENT: u32 = 70;

/// Percentage of `score` over `total`, rounded half-up to an integer.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── PERFORMANCE TIER ──────────────────────────────────────────────────────────
//

/// Overall performance label for a percentage score.
///
/// Thresholds, highest first: 80 Excellent, 65 Good, 50 Fair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceTier {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => Self::Excellent,
            65..=79 => Self::Good,
            50..=64 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── TOPICS ────────────────────────────────────────────────────────────────────
//

/// Accuracy on one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

impl TopicStats {
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.total)
    }

    /// Strictly below 70% accuracy. Compared on the exact ratio, not the
    /// rounded percentage.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        u64::from(self.correct) * 100
            < u64::from(self.total) * u64::from(WEAK_TOPIC_THRESHOLD_PERCENT)
    }
}

/// Group answers by their question's topic, in first-seen order.
///
/// Answers whose question is not in `questions` are ignored.
#[must_use]
pub fn topic_breakdown(answers: &[Answer], questions: &[Question]) -> Vec<TopicStats> {
    let lookup: HashMap<&QuestionId, &Question> = questions.iter().map(|q| (q.id(), q)).collect();

    let mut stats: Vec<TopicStats> = Vec::new();
    let mut slot_by_topic: HashMap<&str, usize> = HashMap::new();

    for answer in answers {
        let Some(question) = lookup.get(answer.question_id()) else {
            continue;
        };
        let slot = *slot_by_topic.entry(question.topic()).or_insert_with(|| {
            stats.push(TopicStats {
                topic: question.topic().to_owned(),
                correct: 0,
                total: 0,
            });
            stats.len() - 1
        });
        let entry = &mut stats[slot];
        entry.total += 1;
        if answer.correct() {
            entry.correct += 1;
        }
    }

    stats
}

/// Topics strictly below the weak-topic threshold.
#[must_use]
pub fn weak_topics(breakdown: &[TopicStats]) -> Vec<String> {
    breakdown
        .iter()
        .filter(|t| t.is_weak())
        .map(|t| t.topic.clone())
        .collect()
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Everything the results view needs, derived from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsReport {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub tier: PerformanceTier,
    pub topics: Vec<TopicStats>,
    pub weak_topics: Vec<String>,
}

impl ResultsReport {
    /// Build the report once every question has been answered.
    ///
    /// Returns `None` while questions remain. A session waiting on the
    /// post-test gate already has a report (the gate shows the score).
    #[must_use]
    pub fn from_session(session: &TestSession) -> Option<Self> {
        if !session.all_answered() {
            return None;
        }
        Some(Self::from_answers(session.answers(), session.questions()))
    }

    #[must_use]
    pub fn from_answers(answers: &[Answer], questions: &[Question]) -> Self {
        let score = u32::try_from(answers.iter().filter(|a| a.correct()).count())
            .unwrap_or(u32::MAX);
        let total_questions = u32::try_from(answers.len()).unwrap_or(u32::MAX);
        let percentage = percentage(score, total_questions);
        let topics = topic_breakdown(answers, questions);
        let weak_topics = weak_topics(&topics);

        Self {
            score,
            total_questions,
            percentage,
            tier: PerformanceTier::from_percentage(percentage),
            topics,
            weak_topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseId;

    fn question(id: &str, topic: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            "Prompt",
            vec!["A".into(), "B".into(), "C".into()],
            0,
            "",
            topic,
        )
        .unwrap()
    }

    fn stats(correct: u32, total: u32) -> TopicStats {
        TopicStats {
            topic: "T".into(),
            correct,
            total,
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(5, 8), 63); // 62.5
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(PerformanceTier::from_percentage(100), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(80), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(79), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(65), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(64), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(50), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(49), PerformanceTier::NeedsImprovement);
        assert_eq!(PerformanceTier::NeedsImprovement.label(), "Needs Improvement");
    }

    #[test]
    fn weak_topic_boundary_is_strict() {
        assert!(!stats(7, 10).is_weak());
        assert!(stats(6, 9).is_weak());
        assert!(stats(0, 1).is_weak());
        assert!(!stats(1, 1).is_weak());
    }

    #[test]
    fn breakdown_keeps_first_seen_order() {
        let questions = vec![
            question("q1", "Pharmacology"),
            question("q2", "Anatomy"),
            question("q3", "Pharmacology"),
        ];
        let answers = vec![
            Answer::grade(&questions[0], Some(0)),
            Answer::grade(&questions[1], Some(1)),
            Answer::grade(&questions[2], None),
        ];

        let breakdown = topic_breakdown(&answers, &questions);
        assert_eq!(
            breakdown,
            vec![
                TopicStats {
                    topic: "Pharmacology".into(),
                    correct: 1,
                    total: 2
                },
                TopicStats {
                    topic: "Anatomy".into(),
                    correct: 0,
                    total: 1
                },
            ]
        );
        assert_eq!(weak_topics(&breakdown), vec!["Pharmacology", "Anatomy"]);
    }

    #[test]
    fn report_requires_all_answers() {
        let questions = vec![question("q1", "A"), question("q2", "B")];
        let mut session =
            TestSession::initialize(CourseId::new("acca"), questions.clone()).unwrap();
        assert!(ResultsReport::from_session(&session).is_none());

        session
            .submit_answer(Answer::grade(&questions[0], Some(0)))
            .unwrap();
        session
            .submit_answer(Answer::grade(&questions[1], Some(2)))
            .unwrap();

        let report = ResultsReport::from_session(&session).unwrap();
        assert_eq!(report.score, 1);
        assert_eq!(report.percentage, 50);
        assert_eq!(report.tier, PerformanceTier::Fair);
        assert_eq!(report.weak_topics, vec!["B"]);
    }
}
