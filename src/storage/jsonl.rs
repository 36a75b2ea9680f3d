//! JSONL (JSON Lines) storage.
//!
//! Each table lives in its own file, one JSON object per line. Every commit
//! writes all three files into a fresh `gen-NNNNNN` directory and then
//! swaps the `CURRENT` manifest to point at it, so a crash leaves either the
//! old generation or the new one in place. A league directory without a
//! manifest is read from the flat layout (`<dir>/players.jsonl`, ...).

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Serialize};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::{Durability, Snapshot, StorageError, TableStore, Tables};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Player,
    Match,
    Round,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Player => "players.jsonl",
            EntityType::Match => "matches.jsonl",
            EntityType::Round => "rounds.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities to the staging file without touching the live one.
    pub fn stage(&self, entities: &[T]) -> Result<StagedFile, StorageError> {
        self.ensure_dir()?;

        let tmp = self.tmp_path();
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;

        Ok(StagedFile {
            tmp,
            target: self.path.clone(),
            count: entities.len(),
        })
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.stage(entities)?.commit()
    }
}

/// A fully written staging file waiting to replace its target.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    count: usize,
}

impl StagedFile {
    /// Rename the staging file over the target.
    pub fn commit(self) -> Result<usize, StorageError> {
        fs::rename(&self.tmp, &self.target)?;
        debug!("Wrote {} entities to {:?}", self.count, self.target);
        Ok(self.count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file.
    ///
    /// A missing file reads as empty; blank lines are ignored. A line that
    /// fails to parse fails the whole read with [`StorageError::Corrupt`].
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                line: line_num + 1,
                message: e.to_string(),
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Name of the file holding the live generation number.
pub const MANIFEST_FILE: &str = "CURRENT";

/// Durability layer backed by one JSONL file per table.
#[derive(Debug)]
pub struct JsonlFiles {
    dir: PathBuf,
    /// Live generation; 0 is the flat layout directly under `dir`
    generation: AtomicU64,
}

impl JsonlFiles {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            generation: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        if generation == 0 {
            self.dir.clone()
        } else {
            self.dir.join(format!("gen-{:06}", generation))
        }
    }

    /// Path of `entity`'s file in the live generation.
    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.generation_dir(self.generation()).join(entity.filename())
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<u64, StorageError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(0);
        }
        let contents = fs::read_to_string(&path)?;
        contents
            .trim()
            .parse::<u64>()
            .map_err(|e| StorageError::Corrupt {
                path,
                line: 1,
                message: e.to_string(),
            })
    }

    /// Point the manifest at `generation` with a single rename.
    fn write_manifest(&self, generation: u64) -> Result<(), StorageError> {
        let tmp = self.dir.join(format!("{}.tmp", MANIFEST_FILE));
        let mut file = File::create(&tmp)?;
        writeln!(file, "{}", generation)?;
        file.sync_all()?;
        fs::rename(&tmp, self.manifest_path())?;
        Ok(())
    }

    fn write_generation(&self, dir: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
        JsonlWriter::new(dir.join(EntityType::Player.filename())).write_all(&snapshot.players)?;
        JsonlWriter::new(dir.join(EntityType::Match.filename())).write_all(&snapshot.matches)?;
        JsonlWriter::new(dir.join(EntityType::Round.filename())).write_all(&snapshot.rounds)?;
        Ok(())
    }

    fn remove_generation(&self, generation: u64) {
        let result = if generation == 0 {
            [EntityType::Player, EntityType::Match, EntityType::Round]
                .iter()
                .map(|e| self.dir.join(e.filename()))
                .filter(|p| p.exists())
                .try_for_each(fs::remove_file)
        } else {
            fs::remove_dir_all(self.generation_dir(generation))
        };
        if let Err(e) = result {
            warn!("Failed to remove generation {} in {:?}: {}", generation, self.dir, e);
        }
    }
}

impl Durability for JsonlFiles {
    fn load(&self) -> Result<Tables, StorageError> {
        let generation = self.read_manifest()?;
        self.generation.store(generation, Ordering::SeqCst);

        let snapshot = Snapshot {
            players: JsonlReader::new(self.entity_path(EntityType::Player)).read_all()?,
            matches: JsonlReader::new(self.entity_path(EntityType::Match)).read_all()?,
            rounds: JsonlReader::new(self.entity_path(EntityType::Round)).read_all()?,
        };
        info!(
            "Loaded players={} matches={} rounds={} from {:?} (generation {})",
            snapshot.players.len(),
            snapshot.matches.len(),
            snapshot.rounds.len(),
            self.dir,
            generation
        );
        Tables::from_snapshot(snapshot, Utc::now())
    }

    fn persist(&self, tables: &Tables) -> Result<(), StorageError> {
        let current = self.generation();
        let next = current + 1;
        let next_dir = self.generation_dir(next);

        // Leftover from a commit that never reached the manifest
        if next_dir.exists() {
            fs::remove_dir_all(&next_dir)?;
        }
        fs::create_dir_all(&next_dir)?;

        let written = self
            .write_generation(&next_dir, &tables.to_snapshot())
            .and_then(|()| self.write_manifest(next));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_dir_all(&next_dir) {
                warn!("Failed to remove {:?}: {}", next_dir, cleanup);
            }
            return Err(e);
        }

        self.generation.store(next, Ordering::SeqCst);
        self.remove_generation(current);
        debug!("Committed generation {} in {:?}", next, self.dir);
        Ok(())
    }
}

pub type JsonlStore = TableStore<JsonlFiles>;

impl JsonlStore {
    /// Open (or create) the tables stored under `dir`.
    pub fn open_dir(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)?;
        TableStore::open(JsonlFiles::new(dir))
    }
}
