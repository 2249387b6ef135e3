use std::fmt;

use chrono::{DateTime, Utc};
use memoir_core::model::{
    AudioRef, PhotoCategory, PhotoContext, PhotoId, StoryId, StoryMetadata, StoryRecord,
};
use storage::repository::Storage;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("MEMOIR_DB_URL").unwrap_or_else(|_| "sqlite://memoir.sqlite3".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = args.next().ok_or(ArgsError::MissingValue { flag: "--db" })?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Inserts the sample stories shown on first launch. Re-running is safe:");
    eprintln!("the samples use fixed ids and are overwritten in place.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MEMOIR_DB_URL");
}

/// Stable ids so seeding twice does not duplicate the samples.
fn seeded_story_id(n: u128) -> StoryId {
    StoryId::new(Uuid::from_u128(0x6d65_6d6f_6972_0000_0000_0000_0000_0000 | n))
}

struct Sample {
    n: u128,
    title: &'static str,
    narrative: &'static str,
    photo_id: &'static str,
    description: &'static str,
    category: PhotoCategory,
    created_at: &'static str,
    word_count: u32,
    duration_secs: u32,
}

const SAMPLES: &[Sample] = &[
    Sample {
        n: 1,
        title: "The Day My Bakery Opened",
        narrative: "It was a beautiful morning in June 1965 when I opened the doors to my first bakery. The smell of fresh bread filled the air...",
        photo_id: "1",
        description: "Vintage bakery storefront",
        category: PhotoCategory::Business,
        created_at: "2024-01-15T10:00:00Z",
        word_count: 250,
        duration_secs: 120,
    },
    Sample {
        n: 2,
        title: "Our Wedding Day",
        narrative: "August 20th, 1962 was the happiest day of my life. The church was decorated with white roses, and I wore my grandmother's pearl necklace...",
        photo_id: "2",
        description: "Wedding celebration",
        category: PhotoCategory::Wedding,
        created_at: "2024-01-10T14:30:00Z",
        word_count: 320,
        duration_secs: 150,
    },
    Sample {
        n: 3,
        title: "Growing Up in the Countryside",
        narrative: "The old farmhouse where I grew up still appears in my dreams. I can still smell the lavender that grew along the fence...",
        photo_id: "4",
        description: "Childhood home in the countryside",
        category: PhotoCategory::Childhood,
        created_at: "2024-01-05T09:15:00Z",
        word_count: 280,
        duration_secs: 135,
    },
];

fn build_sample(sample: &Sample) -> Result<StoryRecord, Box<dyn std::error::Error>> {
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(sample.created_at)?.to_utc();
    let photo = PhotoContext::new(PhotoId::new(sample.photo_id))
        .with_description(sample.description)
        .with_category(sample.category);
    let metadata = StoryMetadata {
        duration_secs: Some(sample.duration_secs),
        word_count: Some(sample.word_count),
        category: Some(sample.category),
        ..StoryMetadata::default()
    };

    Ok(StoryRecord::from_persisted(
        seeded_story_id(sample.n),
        sample.title.to_string(),
        sample.narrative.to_string(),
        Some(photo),
        created_at,
        created_at,
        Some(AudioRef::new(format!("mock-audio-url-{}", sample.n))),
        metadata,
    )?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    for sample in SAMPLES {
        let story = build_sample(sample)?;
        storage.stories.save_story(&story).await?;
    }

    println!("seeded {} sample stories into {}", SAMPLES.len(), args.db_url);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
