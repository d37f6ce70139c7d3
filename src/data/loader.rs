//! Background loading of the institution and collaboration tables.
//!
//! Each table is read on its own thread and the results come back over an
//! mpsc channel that the UI polls every frame. Nothing is handed out until
//! both tables have resolved; the first failure fails the whole load.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use super::model::{Entity, Relationship};
use super::table::{read_entities, read_relationships, TableReport};
use super::LoadError;

type EntityTable = Result<(Vec<Entity>, TableReport), LoadError>;
type RelationshipTable = Result<(Vec<Relationship>, TableReport), LoadError>;

/// Where a table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(String),
}

impl DataSource {
    /// Treats `http://` and `https://` values as URLs, anything else as a path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Http(raw.to_string())
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, LoadError> {
        match self {
            DataSource::File(path) => {
                let file = File::open(path).map_err(|error| LoadError::Io {
                    path: path.display().to_string(),
                    error,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            DataSource::Http(url) => {
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|error| LoadError::Http {
                        url: url.clone(),
                        error,
                    })?;
                Ok(Box::new(response))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Http(url) => write!(f, "{}", url),
        }
    }
}

/// Both tables, cleaned.
#[derive(Debug)]
pub struct LoadedData {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub entity_report: TableReport,
    pub relationship_report: TableReport,
}

/// Outcome of a two-table load.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(LoadedData),
    Failed(LoadError),
}

enum Part {
    Entities(EntityTable),
    Relationships(RelationshipTable),
}

struct PendingLoad {
    receiver: Receiver<Part>,
    entities: Option<(Vec<Entity>, TableReport)>,
    relationships: Option<(Vec<Relationship>, TableReport)>,
}

impl PendingLoad {
    fn drain(&mut self, block: bool) -> Option<LoadResult> {
        while self.entities.is_none() || self.relationships.is_none() {
            let part = if block {
                match self.receiver.recv() {
                    Ok(part) => part,
                    Err(_) => return Some(LoadResult::Failed(self.join_error())),
                }
            } else {
                match self.receiver.try_recv() {
                    Ok(part) => part,
                    Err(TryRecvError::Empty) => return None,
                    Err(TryRecvError::Disconnected) => {
                        return Some(LoadResult::Failed(self.join_error()))
                    }
                }
            };

            match part {
                Part::Entities(Ok(table)) => self.entities = Some(table),
                Part::Relationships(Ok(table)) => self.relationships = Some(table),
                Part::Entities(Err(e)) | Part::Relationships(Err(e)) => {
                    return Some(LoadResult::Failed(e))
                }
            }
        }

        let (entities, entity_report) = self.entities.take()?;
        let (relationships, relationship_report) = self.relationships.take()?;
        Some(LoadResult::Loaded(LoadedData {
            entities,
            relationships,
            entity_report,
            relationship_report,
        }))
    }

    fn join_error(&self) -> LoadError {
        if self.entities.is_none() {
            LoadError::Join("entity table")
        } else {
            LoadError::Join("relationship table")
        }
    }
}

/// Channel for loading both tables without blocking the UI.
#[derive(Default)]
pub struct LoadChannel {
    pending: Option<PendingLoad>,
}

impl LoadChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a load has been started and not yet collected.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts loading both tables from their sources.
    ///
    /// Ignored (returns false) while another load is in progress.
    pub fn load(&mut self, entities: DataSource, relationships: DataSource) -> bool {
        log::info!("Loading institutions from {}", entities);
        log::info!("Loading collaborations from {}", relationships);

        self.load_with(
            move || read_entities(entities.open()?),
            move || read_relationships(relationships.open()?),
        )
    }

    /// Starts a load from arbitrary table producers, one thread each.
    pub fn load_with<E, R>(&mut self, entities: E, relationships: R) -> bool
    where
        E: FnOnce() -> EntityTable + Send + 'static,
        R: FnOnce() -> RelationshipTable + Send + 'static,
    {
        if self.pending.is_some() {
            log::debug!("Data load already in progress, ignoring request");
            return false;
        }

        let (sender, receiver) = channel();
        let entity_sender = sender.clone();
        thread::spawn(move || {
            let _ = entity_sender.send(Part::Entities(entities()));
        });
        thread::spawn(move || {
            let _ = sender.send(Part::Relationships(relationships()));
        });

        self.pending = Some(PendingLoad {
            receiver,
            entities: None,
            relationships: None,
        });
        true
    }

    /// Non-blocking receive. Returns `Some` once both tables have resolved
    /// or as soon as one has failed.
    pub fn try_recv(&mut self) -> Option<LoadResult> {
        self.poll(false)
    }

    /// Blocks until the pending load resolves. Returns `None` if no load is
    /// pending.
    pub fn recv(&mut self) -> Option<LoadResult> {
        self.poll(true)
    }

    fn poll(&mut self, block: bool) -> Option<LoadResult> {
        let result = self.pending.as_mut()?.drain(block)?;
        self.pending = None;

        match &result {
            LoadResult::Loaded(data) => log::info!(
                "Loaded {} institutions ({} dropped) and {} collaborations ({} dropped)",
                data.entity_report.kept,
                data.entity_report.dropped,
                data.relationship_report.kept,
                data.relationship_report.dropped,
            ),
            LoadResult::Failed(e) => log::error!("Data load failed: {}", e),
        }
        Some(result)
    }
}
