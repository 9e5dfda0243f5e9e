#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loads dungeon content and mod configuration from disk.
//!
//! Dungeons and challenges are read from JSON files whose field names follow
//! the content pack format (`DungeonName`, `MonsterWaves`, ...). The mod
//! configuration is a small TOML file. Content inconsistencies never abort
//! loading; they are reported as [`ContentIssue`] values and logged.

mod config;
mod validation;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use mini_dungeons_core::{ChallengeTable, DungeonDefinition};
use tracing::{info, warn};

pub use config::ModConfig;
pub use validation::{validate, ContentIssue};

/// File holding the dungeon definitions inside a content directory.
pub const DUNGEONS_FILE: &str = "dungeons.json";

/// File holding the challenge table inside a content directory.
pub const CHALLENGES_FILE: &str = "challenges.json";

/// Dungeon definitions together with the challenges they reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Content {
    /// Dungeon definitions in file order.
    pub dungeons: Vec<DungeonDefinition>,
    /// Challenges keyed by name.
    pub challenges: ChallengeTable,
}

impl Content {
    /// Loads `dungeons.json` and `challenges.json` from the provided directory.
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let dungeons = load_dungeons(directory.join(DUNGEONS_FILE))?;
        let challenges = load_challenges(directory.join(CHALLENGES_FILE))?;

        let content = Self::new(dungeons, challenges);
        info!(
            directory = %directory.display(),
            dungeons = content.dungeons.len(),
            challenges = content.challenges.len(),
            "loaded dungeon content"
        );
        Ok(content)
    }

    /// Parses content from in-memory JSON documents.
    pub fn from_json(dungeons: &str, challenges: &str) -> Result<Self> {
        Ok(Self::new(
            parse_dungeons(dungeons)?,
            parse_challenges(challenges)?,
        ))
    }

    /// Bundles definitions, logging every consistency issue found.
    #[must_use]
    pub fn new(dungeons: Vec<DungeonDefinition>, challenges: ChallengeTable) -> Self {
        let content = Self {
            dungeons,
            challenges,
        };
        for issue in content.issues() {
            warn!(%issue, "dungeon content issue");
        }
        content
    }

    /// Consistency issues between the dungeons and challenges.
    #[must_use]
    pub fn issues(&self) -> Vec<ContentIssue> {
        validate(&self.dungeons, &self.challenges)
    }
}

/// Loads dungeon definitions from a JSON file.
pub fn load_dungeons(path: impl AsRef<Path>) -> Result<Vec<DungeonDefinition>> {
    let path = path.as_ref();
    parse_dungeons(&read(path)?)
        .with_context(|| format!("failed to load dungeons from {}", path.display()))
}

/// Loads the challenge table from a JSON file.
pub fn load_challenges(path: impl AsRef<Path>) -> Result<ChallengeTable> {
    let path = path.as_ref();
    parse_challenges(&read(path)?)
        .with_context(|| format!("failed to load challenges from {}", path.display()))
}

/// Parses a JSON array of dungeon definitions.
pub fn parse_dungeons(contents: &str) -> Result<Vec<DungeonDefinition>> {
    serde_json::from_str(contents).context("failed to parse dungeon definitions")
}

/// Parses a JSON object mapping challenge names to definitions.
pub fn parse_challenges(contents: &str) -> Result<ChallengeTable> {
    serde_json::from_str(contents).context("failed to parse challenge definitions")
}

/// Default content directory relative to the repository root.
#[must_use]
pub fn default_content_dir() -> PathBuf {
    PathBuf::from("assets/content")
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
