//! Interactive test runner: user input and countdown ticks raced with
//! `tokio::select!`.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quiz_core::model::CourseId;
use quiz_core::{LOW_TIME_WARNING_SECS, Reveal, TickOutcome};
use services::{
    ActiveSession, AnswerOutcome, QuestionRunner, Recovery, SessionError, SessionLoopService,
    UserFacing,
};

use crate::context::AppContext;
use crate::render;

type Input = Lines<BufReader<Stdin>>;

/// Countdown lines are printed this often until the low-time warning kicks in.
const COUNTDOWN_EVERY_SECS: u32 = 30;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Choose(usize),
    Submit,
    Quit,
    Unknown,
}

fn parse_command(line: &str, option_count: usize) -> Command {
    let line = line.trim();
    match line {
        "" | "s" | "submit" => Command::Submit,
        "q" | "quit" => Command::Quit,
        _ => match line.parse::<usize>() {
            Ok(n) if (1..=option_count).contains(&n) => Command::Choose(n - 1),
            _ => Command::Unknown,
        },
    }
}

enum Step {
    Answered(Reveal),
    Quit,
}

async fn ask(ctx: &AppContext, runner: &mut QuestionRunner, input: &mut Input) -> std::io::Result<Step> {
    let theme = ctx.theme();
    loop {
        tokio::select! {
            tick = runner.next_tick() => {
                let Some(tick) = tick else {
                    runner.stop();
                    continue;
                };
                match runner.apply_tick(&tick) {
                    TickOutcome::Running { remaining } => {
                        if remaining <= LOW_TIME_WARNING_SECS || remaining % COUNTDOWN_EVERY_SECS == 0 {
                            render::countdown(theme, remaining);
                        }
                    }
                    TickOutcome::TimedOut(reveal) => return Ok(Step::Answered(reveal)),
                    TickOutcome::Idle => {}
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    runner.stop();
                    return Ok(Step::Quit);
                };
                let question = runner.interaction().question();
                match parse_command(&line, question.option_count()) {
                    Command::Choose(index) => {
                        let option = question.options()[index].clone();
                        if runner.select_option(index).is_ok() {
                            render::selection(index, &option);
                        }
                    }
                    Command::Submit => match runner.submit() {
                        Ok(reveal) => return Ok(Step::Answered(reveal)),
                        Err(err) => println!("{err}"),
                    },
                    Command::Quit => {
                        runner.stop();
                        return Ok(Step::Quit);
                    }
                    Command::Unknown => {
                        println!("Type 1-{}, Enter to submit, q to quit.", question.option_count());
                    }
                }
            }
        }
    }
}

async fn prompt(input: &mut Input, text: &str) -> std::io::Result<Option<String>> {
    println!("{text}");
    Ok(input.next_line().await?.map(|l| l.trim().to_owned()))
}

/// Keep retrying a failed result write while the user asks for it.
async fn retry_result(
    ctx: &AppContext,
    svc: &SessionLoopService,
    active: &mut ActiveSession,
    input: &mut Input,
    mut err: SessionError,
) -> std::io::Result<bool> {
    loop {
        render::user_error(ctx.theme(), &err);
        if err.recovery() != Recovery::Retry {
            return Ok(false);
        }
        match prompt(input, "Press Enter to retry, q to give up.").await?.as_deref() {
            None | Some("q") => return Ok(false),
            _ => {}
        }
        match svc.finalize_result(active).await {
            Ok(_) => return Ok(true),
            Err(next) => err = next,
        }
    }
}

// Once the email is stored a retry only re-sends the result.
fn gate_prompt(email_saved: bool) -> &'static str {
    if email_saved {
        "Your email is saved. Press Enter to retry saving your result, q to give up."
    } else {
        "Enter your email to see the full results (q to quit):"
    }
}

fn gate_quit_note(email_saved: bool) -> &'static str {
    if email_saved {
        "Your email was saved, but this result was not."
    } else {
        "Session discarded."
    }
}

/// Returns `false` when the user walks away from the gate.
async fn email_gate(
    ctx: &AppContext,
    svc: &SessionLoopService,
    active: &mut ActiveSession,
    input: &mut Input,
) -> std::io::Result<bool> {
    if let Some(report) = active.report() {
        println!();
        render::score_line(
            ctx.theme(),
            report.score,
            report.total_questions,
            report.percentage,
            report.tier,
        );
    }
    loop {
        let saved = active.capture_id().is_some();
        let email = match prompt(input, gate_prompt(saved)).await? {
            Some(line) if line != "q" => line,
            _ => {
                println!("{}", gate_quit_note(saved));
                return Ok(false);
            }
        };
        match svc.submit_email(active, &email).await {
            Ok(_) => return Ok(true),
            Err(err) => {
                render::user_error(ctx.theme(), &err);
                if !matches!(err.recovery(), Recovery::Retry | Recovery::EditInput) {
                    println!("{}", gate_quit_note(active.capture_id().is_some()));
                    return Ok(false);
                }
            }
        }
    }
}

/// Run one course interactively until the user quits.
///
/// # Errors
///
/// Returns an error only for terminal I/O failures; session errors are shown
/// to the user.
pub async fn run(ctx: &AppContext, course_id: CourseId) -> Result<(), Box<dyn std::error::Error>> {
    let svc = ctx.session_loop();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut active = match svc.start_session(&course_id).await {
        Ok(active) => active,
        Err(err) => {
            render::user_error(ctx.theme(), &err);
            return Ok(());
        }
    };

    loop {
        println!("{}", active.course().name());

        while let Some(interaction) = active.begin_question() {
            let question = interaction.question().clone();
            render::question(&active.progress(), &question, interaction.time_limit_secs());

            let mut runner = QuestionRunner::start(interaction);
            let reveal = match ask(ctx, &mut runner, &mut input).await? {
                Step::Answered(reveal) => reveal,
                Step::Quit => {
                    println!("Session discarded.");
                    return Ok(());
                }
            };
            render::reveal(ctx.theme(), &question, &reveal);

            let interaction = runner.into_interaction();
            match svc.record_answer(&mut active, &interaction).await {
                Ok(AnswerOutcome::Next { .. } | AnswerOutcome::AwaitingEmail) => {}
                Ok(AnswerOutcome::Completed { result_id }) => {
                    log::debug!("result stored as #{result_id}");
                }
                Err(err) if active.is_complete() => {
                    if !retry_result(ctx, &svc, &mut active, &mut input, err).await? {
                        return Ok(());
                    }
                }
                Err(err) => {
                    render::user_error(ctx.theme(), &err);
                    return Ok(());
                }
            }
        }

        if active.is_awaiting_email() && !email_gate(ctx, &svc, &mut active, &mut input).await? {
            return Ok(());
        }

        if let Some(view) = active.results_view() {
            render::results(ctx.theme(), &view);
        }

        match prompt(&mut input, "Press r to retake, Enter to exit.").await?.as_deref() {
            Some("r") => match svc.retake(&active).await {
                Ok(fresh) => active = fresh,
                Err(err) => {
                    render::user_error(ctx.theme(), &err);
                    return Ok(());
                }
            },
            _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_within_option_range() {
        assert_eq!(parse_command("2", 4), Command::Choose(1));
        assert_eq!(parse_command(" 4 ", 4), Command::Choose(3));
        assert_eq!(parse_command("5", 4), Command::Unknown);
        assert_eq!(parse_command("0", 4), Command::Unknown);
        assert_eq!(parse_command("", 4), Command::Submit);
        assert_eq!(parse_command("q", 4), Command::Quit);
    }

    #[test]
    fn gate_stops_asking_for_email_once_it_is_saved() {
        assert!(gate_prompt(false).contains("Enter your email"));
        assert!(!gate_prompt(true).contains("Enter your email"));
        assert!(gate_prompt(true).contains("Press Enter to retry"));
        assert_eq!(gate_quit_note(false), "Session discarded.");
        assert_ne!(gate_quit_note(true), "Session discarded.");
    }
}
