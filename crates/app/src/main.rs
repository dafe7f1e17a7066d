use std::fmt;

use roadmap_core::Clock;
use roadmap_core::model::{RoadmapId, RoadmapRequest, StepId, Timeframe};
use services::{AppServices, RoadmapSession, SessionEvent};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingTechnology,
    MissingRoadmapId,
    MissingStepId,
    InvalidTimeframe { raw: String },
    InvalidRoadmapId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingTechnology => write!(f, "generate requires --tech"),
            ArgsError::MissingRoadmapId => write!(f, "this command requires --roadmap"),
            ArgsError::MissingStepId => write!(f, "toggle requires --step"),
            ArgsError::InvalidTimeframe { raw } => write!(f, "invalid --timeframe value: {raw}"),
            ArgsError::InvalidRoadmapId { raw } => write!(f, "invalid --roadmap value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p app -- generate --tech <name> [--timeframe <tf>] [--save]");
    eprintln!("  cargo run -p app -- roadmaps");
    eprintln!("  cargo run -p app -- show --roadmap <id>");
    eprintln!("  cargo run -p app -- toggle --roadmap <id> --step <id>");
    eprintln!("  cargo run -p app -- progress");
    eprintln!("  cargo run -p app -- delete --roadmap <id>");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>   (default sqlite://roadmap.sqlite3)");
    eprintln!();
    eprintln!("Timeframes: 1 month | 3 months | 6 months | 1 year (default: 3 months)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ROADMAP_DB_URL, GEMINI_API_KEY, ROADMAP_AI_BASE_URL, ROADMAP_AI_MODEL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Generate,
    Roadmaps,
    Show,
    Toggle,
    Progress,
    Delete,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "generate" => Some(Self::Generate),
            "roadmaps" => Some(Self::Roadmaps),
            "show" => Some(Self::Show),
            "toggle" => Some(Self::Toggle),
            "progress" => Some(Self::Progress),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    technology: Option<String>,
    timeframe: Timeframe,
    save: bool,
    roadmap_id: Option<RoadmapId>,
    step_id: Option<StepId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ROADMAP_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://roadmap.sqlite3".into(), normalize_sqlite_url);
        let mut technology = None;
        let mut timeframe = Timeframe::ThreeMonths;
        let mut save = false;
        let mut roadmap_id = None;
        let mut step_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--tech" => {
                    technology = Some(require_value(args, "--tech")?);
                }
                "--timeframe" => {
                    let value = require_value(args, "--timeframe")?;
                    timeframe = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTimeframe { raw: value.clone() })?;
                }
                "--save" => save = true,
                "--roadmap" => {
                    let value = require_value(args, "--roadmap")?;
                    roadmap_id = Some(
                        value
                            .parse::<RoadmapId>()
                            .map_err(|_| ArgsError::InvalidRoadmapId { raw: value.clone() })?,
                    );
                }
                "--step" => {
                    step_id = Some(StepId::new(require_value(args, "--step")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            technology,
            timeframe,
            save,
            roadmap_id,
            step_id,
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

fn report_events(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::CompletionToggled { step_id, completed } => {
                let state = if *completed { "complete" } else { "not complete" };
                println!("Step {step_id} marked {state}.");
            }
            SessionEvent::RoadmapCompleted { roadmap_id } => {
                println!("Roadmap {roadmap_id} is fully complete. Congratulations!");
            }
            SessionEvent::GenerationFailed { message } => {
                eprintln!("Roadmap generation failed: {message}");
            }
        }
    }
}

fn print_roadmap(services: &AppServices, session: &RoadmapSession) {
    let Some(roadmap) = session.roadmap() else {
        println!("No roadmap loaded.");
        return;
    };

    let view = session.progress(services.progress());
    println!(
        "{} ({}): {} of {} steps complete",
        roadmap.technology(),
        roadmap.timeframe(),
        view.completed,
        view.total,
    );
    println!("id: {}", roadmap.id());

    for step in roadmap.steps() {
        let mark = if services.progress().contains(&step.id) {
            "x"
        } else {
            " "
        };
        println!();
        println!("[{mark}] {}: {} ({})", step.id, step.title, step.estimated_time);
        println!("    {}", step.description);
        for resource in &step.resources {
            println!(
                "    - [{}] {}: {} ({})",
                resource.kind, resource.title, resource.url, resource.source
            );
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core
    // and services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    tracing::debug!(db_url = %args.db_url, "opening sqlite database");
    let mut services = AppServices::new_sqlite(&args.db_url, Clock::default_clock()).await?;

    match cmd {
        Command::Generate => {
            let technology = args.technology.ok_or(ArgsError::MissingTechnology)?;
            let request = RoadmapRequest::new(technology, args.timeframe)?;

            println!(
                "Generating a {} roadmap for {}...",
                request.timeframe(),
                request.technology()
            );
            let mut session = RoadmapSession::new();
            let generation = services.generation().clone();
            let events = generation
                .generate_into(&mut session, services.progress(), &request)
                .await;
            report_events(&events);

            if session.is_loaded() {
                print_roadmap(&services, &session);
                if args.save {
                    let roadmap = session.roadmap().expect("session is loaded").clone();
                    services.library().save(&roadmap).await?;
                    println!();
                    println!("Saved as {}.", roadmap.id());
                }
            }
        }
        Command::Roadmaps => {
            let saved = services.library().list().await?;
            if saved.is_empty() {
                println!("No saved roadmaps.");
            }
            for summary in saved {
                println!(
                    "{}  {} ({}): {} steps, created {}",
                    summary.id,
                    summary.technology,
                    summary.timeframe,
                    summary.total_steps,
                    summary.created_at.format("%Y-%m-%d"),
                );
            }
        }
        Command::Show => {
            let id = args.roadmap_id.ok_or(ArgsError::MissingRoadmapId)?;
            match services.library().get(id).await? {
                Some(roadmap) => {
                    let mut session = RoadmapSession::new();
                    let events = session.load_roadmap(roadmap, services.progress());
                    print_roadmap(&services, &session);
                    report_events(&events);
                }
                None => println!("No saved roadmap with id {id}."),
            }
        }
        Command::Toggle => {
            let id = args.roadmap_id.ok_or(ArgsError::MissingRoadmapId)?;
            let step_id = args.step_id.ok_or(ArgsError::MissingStepId)?;
            let Some(roadmap) = services.library().get(id).await? else {
                println!("No saved roadmap with id {id}.");
                return Ok(());
            };

            let mut session = RoadmapSession::new();
            session.load_roadmap(roadmap, services.progress());
            let now = services.clock().now();
            let events = session
                .toggle_step_completion(&step_id, services.progress_mut(), now)
                .await?;
            report_events(&events);
        }
        Command::Progress => {
            let stats = services.progress().stats();
            println!("Topics completed: {}", stats.total_completed);
            if let Some(recent) = &stats.most_recent {
                println!(
                    "Most recent: {} ({})",
                    recent.title,
                    recent.completed_at.format("%Y-%m-%d"),
                );
            }
            for item in services.progress().list_completed_items() {
                println!("- {} ({})", item.title, item.id);
            }
        }
        Command::Delete => {
            let id = args.roadmap_id.ok_or(ArgsError::MissingRoadmapId)?;
            services.library().delete(id).await?;
            println!("Deleted roadmap {id}.");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_generate_flags() {
        let args = parse(&["--tech", "Rust", "--timeframe", "6 months", "--save"]).unwrap();
        assert_eq!(args.technology.as_deref(), Some("Rust"));
        assert_eq!(args.timeframe, Timeframe::SixMonths);
        assert!(args.save);
    }

    #[test]
    fn rejects_unknown_timeframe() {
        let err = parse(&["--timeframe", "2 weeks"]).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidTimeframe { .. }));
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = parse(&["--frobnicate"]).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(_)));
    }

    #[test]
    fn normalizes_bare_paths_to_sqlite_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/dev.sqlite3".into()),
            "sqlite:///tmp/dev.sqlite3"
        );
        assert!(normalize_sqlite_url("dev.sqlite3".into()).starts_with("sqlite://"));
    }
}
