//! Immutable catalogue of songs, artists and lives
//!
//! Loaded once from the normalized dataset produced by the ingestion
//! pipeline and shared read-only (behind `Arc`) by every game session.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, IdentifierKind, Result};
use crate::resolve::NameResolver;
use crate::{ArtistId, LiveId, SongId};

// ============================================================================
// Dataset schema (on-disk form)
// ============================================================================

/// Song entry as stored in the dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "englishName", default, skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
    #[serde(default)]
    pub artist_ids: Vec<ArtistId>,
}

/// Artist entry as stored in the dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "englishName", default, skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
}

/// Live entry as stored in the dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub song_ids: Vec<SongId>,
    #[serde(default)]
    pub artist_ids: Vec<ArtistId>,
}

/// Normalized `{songs, artists, lives}` dataset
///
/// All three keys are required; serde reports a missing one as an error,
/// which [`Catalogue::from_json_str`] surfaces as [`Error::Data`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub songs: BTreeMap<SongId, SongRecord>,
    pub artists: BTreeMap<ArtistId, ArtistRecord>,
    pub lives: BTreeMap<LiveId, LiveRecord>,
}

impl Dataset {
    /// Parse a dataset from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Data(format!("Malformed dataset: {}", e)))
    }

    /// Read and parse a dataset file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Write the dataset as pretty-printed JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Drop songs and artists that no live references
    ///
    /// An artist survives when it appears in a live roster or in the credits
    /// of a song some live performs.
    pub fn pruned(&self) -> Dataset {
        let mut used_songs: HashSet<&str> = HashSet::new();
        let mut used_artists: HashSet<&str> = HashSet::new();

        for live in self.lives.values() {
            for sid in &live.song_ids {
                used_songs.insert(sid);
                if let Some(song) = self.songs.get(sid) {
                    used_artists.extend(song.artist_ids.iter().map(String::as_str));
                }
            }
            used_artists.extend(live.artist_ids.iter().map(String::as_str));
        }

        let songs: BTreeMap<_, _> = self
            .songs
            .iter()
            .filter(|(sid, _)| used_songs.contains(sid.as_str()))
            .map(|(sid, s)| (sid.clone(), s.clone()))
            .collect();
        let artists: BTreeMap<_, _> = self
            .artists
            .iter()
            .filter(|(aid, _)| used_artists.contains(aid.as_str()))
            .map(|(aid, a)| (aid.clone(), a.clone()))
            .collect();

        info!(
            songs_before = self.songs.len(),
            songs_after = songs.len(),
            artists_before = self.artists.len(),
            artists_after = artists.len(),
            "Pruned dataset"
        );

        Dataset {
            songs,
            artists,
            lives: self.lives.clone(),
        }
    }
}

// ============================================================================
// Runtime records
// ============================================================================

/// A song with its credited performers
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub english_name: Option<String>,
    /// Credited artists, in credit order
    pub artist_ids: Vec<ArtistId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub english_name: Option<String>,
}

/// A concert: its setlist and the roster of artists who performed
#[derive(Debug, Clone, PartialEq)]
pub struct Live {
    pub id: LiveId,
    pub name: String,
    pub song_ids: BTreeSet<SongId>,
    /// Union of performers across the setlist, deduplicated, roster order
    pub artist_ids: Vec<ArtistId>,
}

impl Live {
    pub fn contains_song(&self, song_id: &str) -> bool {
        self.song_ids.contains(song_id)
    }

    pub fn has_artist(&self, artist_id: &str) -> bool {
        self.artist_ids.iter().any(|a| a == artist_id)
    }
}

/// How to treat lives that reference songs missing from the catalogue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Any dangling song reference is a [`Error::Data`]
    #[default]
    Strict,
    /// Drop dangling references; skip lives whose setlist ends up empty
    SkipInvalidLives,
}

/// Exact name → id index plus the sorted key list handed to resolvers
#[derive(Debug, Default)]
struct NameIndex {
    ids: HashMap<String, String>,
    keys: Vec<String>,
}

impl NameIndex {
    /// Display names take precedence over English names; within one pass
    /// the first id (ascending) wins.
    fn build<'a>(entries: impl Iterator<Item = (&'a str, &'a str, Option<&'a str>)> + Clone) -> Self {
        let mut ids = HashMap::new();
        for (id, name, _) in entries.clone() {
            ids.entry(name.to_string()).or_insert_with(|| id.to_string());
        }
        for (id, _, english) in entries {
            if let Some(english) = english {
                ids.entry(english.to_string()).or_insert_with(|| id.to_string());
            }
        }
        let mut keys: Vec<String> = ids.keys().cloned().collect();
        keys.sort();
        Self { ids, keys }
    }

    fn lookup(&self, kind: IdentifierKind, text: &str, resolver: &dyn NameResolver) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::unknown(kind, text));
        }
        if let Some(id) = self.ids.get(text) {
            return Ok(id.clone());
        }
        let names: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        let matched = resolver
            .resolve(text, &names)
            .and_then(|name| self.ids.get(name))
            .cloned();
        match matched {
            Some(id) => {
                debug!(%kind, query = text, id = %id, "Resolved name via resolver");
                Ok(id)
            }
            None => Err(Error::unknown(kind, text)),
        }
    }
}

// ============================================================================
// Catalogue
// ============================================================================

/// Read-only index of songs, artists and lives
#[derive(Debug)]
pub struct Catalogue {
    songs: HashMap<SongId, Song>,
    artists: HashMap<ArtistId, Artist>,
    lives: HashMap<LiveId, Live>,
    live_ids: Vec<LiveId>,
    song_names: NameIndex,
    artist_names: NameIndex,
    live_names: NameIndex,
}

impl Catalogue {
    /// Load a catalogue from a dataset file
    pub fn from_path(path: &Path, policy: LoadPolicy) -> Result<Self> {
        info!("Loading catalogue from {}", path.display());
        let dataset = Dataset::from_path(path)?;
        Self::from_dataset(dataset, policy)
    }

    /// Load a catalogue from dataset JSON text
    pub fn from_json_str(text: &str, policy: LoadPolicy) -> Result<Self> {
        Self::from_dataset(Dataset::from_json_str(text)?, policy)
    }

    /// Build the runtime index from a parsed dataset
    pub fn from_dataset(dataset: Dataset, policy: LoadPolicy) -> Result<Self> {
        let songs: HashMap<SongId, Song> = dataset
            .songs
            .into_iter()
            .map(|(id, rec)| {
                let song = Song {
                    name: rec.name.unwrap_or_else(|| id.clone()),
                    english_name: rec.english_name,
                    artist_ids: dedup_ordered(rec.artist_ids),
                    id: id.clone(),
                };
                (id, song)
            })
            .collect();

        let artists: HashMap<ArtistId, Artist> = dataset
            .artists
            .into_iter()
            .map(|(id, rec)| {
                let artist = Artist {
                    name: rec.name.unwrap_or_else(|| id.clone()),
                    english_name: rec.english_name,
                    id: id.clone(),
                };
                (id, artist)
            })
            .collect();

        let mut lives = HashMap::with_capacity(dataset.lives.len());
        let mut skipped = 0usize;
        for (id, rec) in dataset.lives {
            let mut song_ids = BTreeSet::new();
            for sid in rec.song_ids {
                if songs.contains_key(&sid) {
                    song_ids.insert(sid);
                } else if policy == LoadPolicy::Strict {
                    return Err(Error::Data(format!(
                        "Live {} references unknown song {}",
                        id, sid
                    )));
                }
            }
            if song_ids.is_empty() && policy == LoadPolicy::SkipInvalidLives {
                warn!(live_id = %id, "Skipping live with empty setlist");
                skipped += 1;
                continue;
            }
            let live = Live {
                name: rec.name.unwrap_or_else(|| id.clone()),
                song_ids,
                artist_ids: dedup_ordered(rec.artist_ids),
                id: id.clone(),
            };
            lives.insert(id, live);
        }

        if lives.is_empty() {
            return Err(Error::Data("Dataset contains no playable lives".to_string()));
        }

        let mut live_ids: Vec<LiveId> = lives.keys().cloned().collect();
        live_ids.sort();

        let song_names = NameIndex::build(sorted_entries(
            songs.values().map(|s| (s.id.as_str(), s.name.as_str(), s.english_name.as_deref())),
        ).into_iter());
        let artist_names = NameIndex::build(sorted_entries(
            artists.values().map(|a| (a.id.as_str(), a.name.as_str(), a.english_name.as_deref())),
        ).into_iter());
        let live_names = NameIndex::build(sorted_entries(
            lives.values().map(|l| (l.id.as_str(), l.name.as_str(), None)),
        ).into_iter());

        info!(
            songs = songs.len(),
            artists = artists.len(),
            lives = lives.len(),
            skipped_lives = skipped,
            "Catalogue loaded"
        );

        Ok(Self {
            songs,
            artists,
            lives,
            live_ids,
            song_names,
            artist_names,
            live_names,
        })
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    pub fn artist(&self, id: &str) -> Option<&Artist> {
        self.artists.get(id)
    }

    pub fn live(&self, id: &str) -> Option<&Live> {
        self.lives.get(id)
    }

    pub fn songs(&self) -> &HashMap<SongId, Song> {
        &self.songs
    }

    pub fn artists(&self) -> &HashMap<ArtistId, Artist> {
        &self.artists
    }

    pub fn lives(&self) -> &HashMap<LiveId, Live> {
        &self.lives
    }

    /// All live ids, ascending
    pub fn live_ids(&self) -> &[LiveId] {
        &self.live_ids
    }

    pub fn find_song_id(&self, text: &str, resolver: &dyn NameResolver) -> Result<SongId> {
        self.song_names.lookup(IdentifierKind::Song, text, resolver)
    }

    pub fn find_artist_id(&self, text: &str, resolver: &dyn NameResolver) -> Result<ArtistId> {
        self.artist_names.lookup(IdentifierKind::Artist, text, resolver)
    }

    pub fn find_live_id(&self, text: &str, resolver: &dyn NameResolver) -> Result<LiveId> {
        self.live_names.lookup(IdentifierKind::Live, text, resolver)
    }

    /// Convert back to the on-disk schema
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            songs: self
                .songs
                .values()
                .map(|s| {
                    let rec = SongRecord {
                        name: Some(s.name.clone()),
                        english_name: s.english_name.clone(),
                        artist_ids: s.artist_ids.clone(),
                    };
                    (s.id.clone(), rec)
                })
                .collect(),
            artists: self
                .artists
                .values()
                .map(|a| {
                    let rec = ArtistRecord {
                        name: Some(a.name.clone()),
                        english_name: a.english_name.clone(),
                    };
                    (a.id.clone(), rec)
                })
                .collect(),
            lives: self
                .lives
                .values()
                .map(|l| {
                    let rec = LiveRecord {
                        name: Some(l.name.clone()),
                        song_ids: l.song_ids.iter().cloned().collect(),
                        artist_ids: l.artist_ids.clone(),
                    };
                    (l.id.clone(), rec)
                })
                .collect(),
        }
    }
}

fn dedup_ordered(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn sorted_entries<'a>(
    entries: impl Iterator<Item = (&'a str, &'a str, Option<&'a str>)>,
) -> Vec<(&'a str, &'a str, Option<&'a str>)> {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
