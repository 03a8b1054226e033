use std::fmt;

use quiz_core::model::CourseId;
use quiz_core::{PostTestGate, SessionConfig};
use services::{AppServices, Clock, ExportFormat};

mod context;
mod render;
mod take;

use context::{AppContext, Theme};

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_RESULTS_LIMIT: u32 = 20;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCourse,
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidTimeLimit { raw: String },
    InvalidGate { raw: String },
    InvalidFormat { raw: String },
    InvalidLimit { raw: String },
    InvalidCourse { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCourse => write!(f, "take requires a course id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimeLimit { raw } => {
                write!(f, "invalid --time-limit value (seconds > 0): {raw}")
            }
            ArgsError::InvalidGate { raw } => {
                write!(f, "invalid --gate value (none|email): {raw}")
            }
            ArgsError::InvalidFormat { raw } => {
                write!(f, "invalid --format value (csv|json): {raw}")
            }
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidCourse { raw } => write!(f, "invalid course id: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz courses [--db <sqlite_url>]");
    eprintln!("  quiz take <course> [--db <url>] [--time-limit <secs>] [--gate none|email] [--shuffle]");
    eprintln!("  quiz results --key <admin_key> [--limit <n>] [--db <url>]");
    eprintln!("  quiz export --key <admin_key> [--format csv|json] [--db <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --time-limit 90");
    eprintln!("  --gate email");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_TIME_LIMIT, QUIZ_GATE, QUIZ_ADMIN_KEY, RUST_LOG, NO_COLOR");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Courses,
    Take { course_id: CourseId },
    Results { limit: u32 },
    Export { format: ExportFormat },
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    config: SessionConfig,
    shuffle: bool,
    key: String,
}

fn parse_time_limit(raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or(ArgsError::InvalidTimeLimit { raw })
}

fn parse_gate(raw: String) -> Result<PostTestGate, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidGate { raw })
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut time_limit = match std::env::var("QUIZ_TIME_LIMIT") {
            Ok(raw) => parse_time_limit(raw)?,
            Err(_) => SessionConfig::default().time_limit_secs(),
        };
        let mut gate = match std::env::var("QUIZ_GATE") {
            Ok(raw) => parse_gate(raw)?,
            Err(_) => PostTestGate::default(),
        };
        let mut shuffle = false;
        let mut key = String::new();
        let mut limit = DEFAULT_RESULTS_LIMIT;
        let mut format = ExportFormat::Csv;
        let mut positional: Vec<String> = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--time-limit" => {
                    time_limit = parse_time_limit(require_value(&mut args, "--time-limit")?)?;
                }
                "--gate" => gate = parse_gate(require_value(&mut args, "--gate")?)?,
                "--shuffle" => shuffle = true,
                "--key" => key = require_value(&mut args, "--key")?,
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--format" => {
                    let value = require_value(&mut args, "--format")?;
                    format = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidFormat { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            None | Some("courses") => Command::Courses,
            Some("take") => {
                let raw = positional.next().ok_or(ArgsError::MissingCourse)?;
                let course_id = raw
                    .parse::<CourseId>()
                    .map_err(|_| ArgsError::InvalidCourse { raw: raw.clone() })?;
                Command::Take { course_id }
            }
            Some("results") => Command::Results { limit },
            Some("export") => Command::Export { format },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        let config = SessionConfig::new(time_limit, gate)
            .map_err(|_| ArgsError::InvalidTimeLimit {
                raw: time_limit.to_string(),
            })?;

        Ok(Self {
            command,
            db_url,
            config,
            shuffle,
            key,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    log::debug!("command: {:?}", args.command);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let admin_key = std::env::var("QUIZ_ADMIN_KEY").ok();
    let services =
        AppServices::new_sqlite(&args.db_url, Clock::default_clock(), args.config, admin_key)
            .await?;
    let ctx = AppContext::new(&services, Theme::detect());

    match args.command {
        Command::Courses => {
            let courses = ctx.session_loop().list_courses().await?;
            render::course_list(&courses);
        }
        Command::Take { course_id } => {
            let ctx = if args.shuffle {
                ctx.with_shuffled_questions()
            } else {
                ctx
            };
            take::run(&ctx, course_id).await?;
        }
        Command::Results { limit } => match ctx.admin().list_results(&args.key, limit).await {
            Ok(rows) => {
                for row in rows {
                    let r = &row.result;
                    println!(
                        "#{:<5} {:<10} {}/{} ({}%)  {}  {}",
                        row.id,
                        r.course_id().as_str(),
                        r.score(),
                        r.total_questions(),
                        r.percentage(),
                        r.completed_at().to_rfc3339(),
                        r.share_id()
                    );
                }
            }
            Err(err) => {
                render::user_error(ctx.theme(), &err);
                std::process::exit(1);
            }
        },
        Command::Export { format } => match ctx.admin().export_captures(&args.key, format).await {
            Ok(out) => print!("{out}"),
            Err(err) => {
                render::user_error(ctx.theme(), &err);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
