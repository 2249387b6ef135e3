use std::fmt;
use std::path::PathBuf;

use memoir_core::model::{PhotoCategory, PhotoContext, PhotoId, StoryId, StoryRecord};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod console;
mod interactive;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidStoryId { raw: String },
    InvalidCategory { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidStoryId { raw } => write!(f, "invalid story id: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
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
    eprintln!("  memoir stories                 [--db <sqlite_url>]");
    eprintln!("  memoir show <story_id>         [--db <sqlite_url>]");
    eprintln!("  memoir delete <story_id>       [--db <sqlite_url>]");
    eprintln!("  memoir rename <story_id> <title> [--db <sqlite_url>]");
    eprintln!("  memoir interview [--photo <description>] [--category <category>]");
    eprintln!("                   [--recordings <dir>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://memoir.sqlite3");
    eprintln!("  --recordings <temp dir>/memoir-recordings");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MEMOIR_DB_URL, MEMOIR_RECORDINGS_DIR");
    eprintln!("  MEMOIR_AI_API_KEY, MEMOIR_AI_BASE_URL, MEMOIR_AI_MODEL");
    eprintln!("  RUST_LOG (default: info)");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Stories,
    Show(StoryId),
    Delete(StoryId),
    Rename { id: StoryId, title: String },
    Interview {
        description: Option<String>,
        category: Option<PhotoCategory>,
    },
}

#[derive(Debug)]
struct Args {
    db_url: String,
    recordings: PathBuf,
    command: Command,
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("MEMOIR_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://memoir.sqlite3".into(), normalize_sqlite_url);
        let mut recordings = std::env::var("MEMOIR_RECORDINGS_DIR").map_or_else(
            |_| std::env::temp_dir().join("memoir-recordings"),
            PathBuf::from,
        );
        let mut description = None;
        let mut category = None;
        let mut positional = Vec::new();

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
                "--recordings" => {
                    recordings = PathBuf::from(require_value(&mut args, "--recordings")?);
                }
                "--photo" => description = Some(require_value(&mut args, "--photo")?),
                "--category" => {
                    let value = require_value(&mut args, "--category")?;
                    let parsed = value
                        .parse::<PhotoCategory>()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    category = Some(parsed);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            None | Some("stories") => Command::Stories,
            Some("show") => Command::Show(story_id(positional.next())?),
            Some("delete") => Command::Delete(story_id(positional.next())?),
            Some("rename") => {
                let id = story_id(positional.next())?;
                let title = positional.by_ref().collect::<Vec<_>>().join(" ");
                if title.trim().is_empty() {
                    return Err(ArgsError::MissingArgument { name: "title" });
                }
                Command::Rename { id, title }
            }
            Some("interview") => Command::Interview {
                description,
                category,
            },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            db_url,
            recordings,
            command,
        })
    }
}

fn story_id(raw: Option<String>) -> Result<StoryId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { name: "story_id" })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidStoryId { raw: raw.clone() })
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
            .unwrap_or_else(|_| PathBuf::from("."))
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

fn print_story_line(story: &StoryRecord) {
    println!(
        "{}  {}  {}",
        story.id(),
        story.created_at().format("%Y-%m-%d"),
        story.title()
    );
}

fn print_story(story: &StoryRecord) {
    println!("{}", story.title());
    println!("{}", story.created_at().format("%B %-d, %Y"));
    if let Some(description) = story.photo().and_then(PhotoContext::description) {
        println!("Photo: {description}");
    }
    let metadata = story.metadata();
    if let Some(words) = metadata.word_count {
        println!("Words: {words}");
    }
    if !metadata.people.is_empty() {
        println!("People: {}", metadata.people.join(", "));
    }
    println!();
    println!("{}", story.narrative());
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h" | "help")) {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::system()).await?;
    let stories = services.stories();

    match args.command {
        Command::Stories => {
            let all = stories.list().await?;
            if all.is_empty() {
                println!("No stories yet. Start one with `memoir interview`.");
            }
            for story in &all {
                print_story_line(story);
            }
        }
        Command::Show(id) => match stories.get(id).await? {
            Some(story) => print_story(&story),
            None => println!("No story with id {id}."),
        },
        Command::Delete(id) => {
            stories.delete(id).await?;
            println!("Deleted {id}.");
        }
        Command::Rename { id, title } => {
            let story = stories.rename(id, &title).await?;
            print_story_line(&story);
        }
        Command::Interview {
            description,
            category,
        } => {
            let photo = (description.is_some() || category.is_some()).then(|| {
                let photo = PhotoContext::new(PhotoId::new("cli"));
                let photo = match description {
                    Some(description) => photo.with_description(description),
                    None => photo,
                };
                match category {
                    Some(category) => photo.with_category(category),
                    None => photo,
                }
            });
            interactive::run_interview(&services, photo, args.recordings).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn defaults_to_listing_stories() {
        assert_eq!(parse(&[]).unwrap().command, Command::Stories);
    }

    #[test]
    fn interview_flags_build_photo_options() {
        let args = parse(&[
            "interview",
            "--photo",
            "Wedding celebration",
            "--category",
            "wedding",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.command,
            Command::Interview {
                description: Some("Wedding celebration".into()),
                category: Some(PhotoCategory::Wedding),
            }
        );
    }

    #[test]
    fn rename_joins_title_words() {
        let id = StoryId::random();
        let args = parse(&["rename", &id.to_string(), "Our", "Wedding", "Day"]).unwrap();
        assert_eq!(
            args.command,
            Command::Rename {
                id,
                title: "Our Wedding Day".into()
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse(&["show"]),
            Err(ArgsError::MissingArgument { name: "story_id" })
        ));
        assert!(matches!(
            parse(&["show", "not-a-uuid"]),
            Err(ArgsError::InvalidStoryId { .. })
        ));
        assert!(matches!(
            parse(&["interview", "--category", "spaceship"]),
            Err(ArgsError::InvalidCategory { .. })
        ));
        assert!(matches!(parse(&["--db"]), Err(ArgsError::MissingValue { .. })));
        assert!(matches!(parse(&["dance"]), Err(ArgsError::UnknownCommand(_))));
        assert!(matches!(
            parse(&["stories", "extra"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/memoir.sqlite3".into());
        assert!(url.starts_with("sqlite:///") || url.starts_with("sqlite://"));
        assert!(url.ends_with("data/memoir.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
    }
}
