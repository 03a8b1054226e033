use quiz_core::model::{Course, QuestionId, ShareId, TestSession};
use quiz_core::{PerformanceTier, ResultsReport, TopicStats};

/// One row of the per-question review on the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    /// `None` when the question timed out unanswered.
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub correct: bool,
    pub explanation: String,
    pub topic: String,
}

/// Presentation-agnostic results screen.
///
/// No pre-formatted strings beyond what the catalog provides; the caller
/// decides how to render tiers and percentages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub course_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub tier: PerformanceTier,
    pub topics: Vec<TopicStats>,
    pub weak_topics: Vec<String>,
    pub study_plan_url: String,
    pub share_id: Option<ShareId>,
    pub review: Vec<QuestionReview>,
}

impl ResultsView {
    /// Build the view for a session whose answers are all in. `None` while
    /// questions remain.
    #[must_use]
    pub fn build(course: &Course, session: &TestSession, share_id: Option<ShareId>) -> Option<Self> {
        let report = ResultsReport::from_session(session)?;
        let review = session
            .answers()
            .iter()
            .filter_map(|answer| {
                let question = session.question(answer.question_id())?;
                Some(QuestionReview {
                    question_id: question.id().clone(),
                    prompt: question.prompt().to_owned(),
                    options: question.options().to_vec(),
                    selected: answer.selected(),
                    correct_index: question.correct_answer_index(),
                    correct: answer.correct(),
                    explanation: question.explanation().to_owned(),
                    topic: question.topic().to_owned(),
                })
            })
            .collect();

        Some(Self {
            course_name: course.name().to_owned(),
            score: report.score,
            total_questions: report.total_questions,
            percentage: report.percentage,
            tier: report.tier,
            topics: report.topics,
            weak_topics: report.weak_topics,
            study_plan_url: course.study_plan_link().to_owned(),
            share_id,
            review,
        })
    }

    #[must_use]
    pub fn has_weak_topics(&self) -> bool {
        !self.weak_topics.is_empty()
    }
}
