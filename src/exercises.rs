//! Sample sources shipped next to the service.
//!
//! Files named `Exercise<digits><title>.elm` in the exercises directory are
//! listed by number and can be fetched by a prefix of that number.

use regex::Regex;
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub filename: String,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Exercise(\d+)(.*)\.elm$").expect("exercise pattern"))
}

impl Exercise {
    fn from_filename(filename: &str) -> Option<Self> {
        let captures = pattern().captures(filename)?;
        Some(Self {
            id: captures[1].to_string(),
            title: captures[2].to_string(),
            filename: filename.to_string(),
        })
    }
}

/// All exercises in `dir`, ordered by file name.
pub async fn list(dir: &Path) -> io::Result<Vec<Exercise>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut exercises = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        if let Some(exercise) = entry.file_name().to_str().and_then(Exercise::from_filename) {
            exercises.push(exercise);
        }
    }
    exercises.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(exercises)
}

/// Raw source of the first exercise whose id starts with `id`.
pub async fn find(dir: &Path, id: &str) -> io::Result<Option<Vec<u8>>> {
    let Some(exercise) = list(dir).await?.into_iter().find(|e| e.id.starts_with(id)) else {
        return Ok(None);
    };
    tokio::fs::read(dir.join(&exercise.filename))
        .await
        .map(Some)
}
