//! Terminal rendering for questions, reveals and results.

use crossterm::style::{Attribute, Color, StyledContent, Stylize};
use quiz_core::model::{Course, Question};
use quiz_core::{LOW_TIME_WARNING_SECS, PerformanceTier, Reveal, format_countdown};
use services::{Recovery, ResultsView, SessionProgress, UserFacing};

use crate::context::Theme;

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Good,
    Bad,
    Warn,
    Dim,
}

fn styled(tone: Tone, text: &str) -> StyledContent<&str> {
    match tone {
        Tone::Good => text.with(Color::Green),
        Tone::Bad => text.with(Color::Red),
        Tone::Warn => text.with(Color::Yellow),
        Tone::Dim => text.attribute(Attribute::Dim),
    }
}

#[must_use]
pub fn paint(theme: Theme, tone: Tone, text: &str) -> String {
    match theme {
        Theme::Plain => text.to_owned(),
        Theme::Color => styled(tone, text).to_string(),
    }
}

pub fn course_list(courses: &[Course]) {
    if courses.is_empty() {
        println!("No courses available.");
        return;
    }
    for course in courses {
        println!("{:<12} {}", course.id().as_str(), course.name());
        if !course.description().is_empty() {
            println!("{:<12} {}", "", course.description());
        }
    }
}

pub fn question(progress: &SessionProgress, question: &Question, time_limit_secs: u32) {
    println!();
    println!(
        "{}  [{}] ({})",
        progress.label(),
        question.topic(),
        format_countdown(time_limit_secs)
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    println!("Type a number to choose, Enter to submit, q to quit.");
}

pub fn countdown(theme: Theme, remaining: u32) {
    let text = format!("{} left", format_countdown(remaining));
    if remaining <= LOW_TIME_WARNING_SECS {
        println!("{}", paint(theme, Tone::Warn, &text));
    } else {
        println!("{}", paint(theme, Tone::Dim, &text));
    }
}

pub fn selection(index: usize, option: &str) {
    println!("Selected {}) {option}", index + 1);
}

pub fn reveal(theme: Theme, question: &Question, reveal: &Reveal) {
    if reveal.timed_out {
        println!("{}", paint(theme, Tone::Warn, "Time's up!"));
    }
    if reveal.correct {
        println!("{}", paint(theme, Tone::Good, "Correct."));
    } else {
        let right = &question.options()[reveal.correct_index];
        let line = format!("Incorrect. The answer is {}) {right}", reveal.correct_index + 1);
        println!("{}", paint(theme, Tone::Bad, &line));
    }
    if !question.explanation().is_empty() {
        println!("{}", question.explanation());
    }
}

fn tier_tone(tier: PerformanceTier) -> Tone {
    match tier {
        PerformanceTier::Excellent | PerformanceTier::Good => Tone::Good,
        PerformanceTier::Fair => Tone::Warn,
        PerformanceTier::NeedsImprovement => Tone::Bad,
    }
}

pub fn score_line(theme: Theme, score: u32, total: u32, percentage: u32, tier: PerformanceTier) {
    let line = format!("Score: {score}/{total} ({percentage}%) - {}", tier.label());
    println!("{}", paint(theme, tier_tone(tier), &line));
}

pub fn results(theme: Theme, view: &ResultsView) {
    println!();
    println!("{} results", view.course_name);
    score_line(
        theme,
        view.score,
        view.total_questions,
        view.percentage,
        view.tier,
    );

    println!();
    println!("By topic:");
    for topic in &view.topics {
        let line = format!(
            "  {:<24} {}/{} ({}%)",
            topic.topic,
            topic.correct,
            topic.total,
            topic.percentage()
        );
        let tone = if topic.is_weak() { Tone::Bad } else { Tone::Good };
        println!("{}", paint(theme, tone, &line));
    }
    if view.has_weak_topics() {
        println!("Focus next on: {}", view.weak_topics.join(", "));
    }

    println!();
    println!("Review:");
    for (n, item) in view.review.iter().enumerate() {
        let mark = if item.correct {
            paint(theme, Tone::Good, "ok")
        } else {
            paint(theme, Tone::Bad, "x ")
        };
        println!("{mark} {}. {}", n + 1, item.prompt);
        let yours = item.selected.map_or_else(
            || "no answer".to_owned(),
            |i| format!("{}) {}", i + 1, item.options[i]),
        );
        println!("     yours:   {yours}");
        println!(
            "     correct: {}) {}",
            item.correct_index + 1,
            item.options[item.correct_index]
        );
        if !item.explanation.is_empty() {
            println!("     {}", paint(theme, Tone::Dim, &item.explanation));
        }
    }

    println!();
    println!("Study plan: {}", view.study_plan_url);
    if let Some(share_id) = view.share_id {
        println!("Result id: {share_id}");
    }
}

pub fn user_error(theme: Theme, err: &impl UserFacing) {
    let action = err.recovery();
    eprintln!("{}", paint(theme, Tone::Bad, &err.user_message()));
    if action != Recovery::EditInput {
        eprintln!("-> {}", action.label());
    }
}
