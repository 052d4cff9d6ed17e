//! Best score per game, optionally persisted as a JSON file.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{config::ScoreConfig, games::GameKind, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "gameId")]
    pub game_id: String,
    pub score: u32,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "date")]
    pub timestamp_millis: u64,
}

#[derive(Debug, Default)]
pub struct ScoreBook {
    path: Option<PathBuf>,
    records: BTreeMap<String, ScoreRecord>,
}

impl ScoreBook {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the book stored at `path`. A missing file is an empty book.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut book = Self {
            path: Some(path.to_path_buf()),
            records: BTreeMap::new(),
        };
        if !path.exists() {
            return Ok(book);
        }

        let stored: Vec<ScoreRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
        for record in stored {
            book.keep_best(record);
        }
        tracing::debug!(path = %path.display(), games = book.records.len(), "score book loaded");
        Ok(book)
    }

    pub fn from_config(config: &ScoreConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::load(path),
            None => Ok(Self::in_memory()),
        }
    }

    /// Records `score` for `game` if it beats the stored best. Returns whether
    /// it did; the file is only rewritten in that case.
    pub fn submit(&mut self, game: GameKind, score: u32, timestamp_millis: u64) -> Result<bool> {
        let improved = self.keep_best(ScoreRecord {
            game_id: game.id().to_string(),
            score,
            timestamp_millis,
        });
        if improved {
            tracing::info!(game = game.id(), score, "new best score");
            self.save()?;
        }
        Ok(improved)
    }

    pub fn best(&self, game: GameKind) -> Option<u32> {
        self.records.get(game.id()).map(|record| record.score)
    }

    /// Sum of the best scores across games.
    pub fn total(&self) -> u64 {
        self.records.values().map(|record| u64::from(record.score)).sum()
    }

    pub fn records(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.records.values()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn keep_best(&mut self, record: ScoreRecord) -> bool {
        match self.records.get(&record.game_id) {
            Some(existing) if existing.score >= record.score => false,
            _ => {
                self.records.insert(record.game_id.clone(), record);
                true
            }
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let records: Vec<&ScoreRecord> = self.records.values().collect();
        fs::write(path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }
}
