use quiz_core::model::TestSession;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based number of the question on screen; equals `total` once all are
    /// answered.
    pub question_number: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn from_session(session: &TestSession) -> Self {
        let total = session.questions().len();
        let answered = session.answers().len();
        Self {
            question_number: (answered + 1).min(total),
            total,
            answered,
            remaining: total - answered,
            is_complete: session.completed(),
        }
    }

    /// "Question k of N".
    #[must_use]
    pub fn label(&self) -> String {
        format!("Question {} of {}", self.question_number, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Answer, CourseId, Question, QuestionId};

    #[test]
    fn progress_tracks_answers() {
        let questions: Vec<Question> = (1..=3)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    "P",
                    vec!["A".into(), "B".into()],
                    0,
                    "",
                    "T",
                )
                .unwrap()
            })
            .collect();
        let mut session = TestSession::initialize(CourseId::new("c"), questions.clone()).unwrap();
        assert_eq!(SessionProgress::from_session(&session).label(), "Question 1 of 3");

        session
            .submit_answer(Answer::grade(&questions[0], Some(1)))
            .unwrap();
        let progress = SessionProgress::from_session(&session);
        assert_eq!(progress.question_number, 2);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete);
    }
}
