#![cfg(feature = "std")]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::core::MatchStatus;
use crate::domain::{MatchDocument, MatchId, MatchPatch, MatchRecord, ScoreEntry};
use crate::store::{MatchStore, ScoreOrder, ScoreSink, StoreError};

struct StoredMatch {
    version: u64,
    fields: Map<String, Value>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    last_created: u64,
    matches: BTreeMap<MatchId, StoredMatch>,
    scores: Vec<ScoreEntry>,
}

/// Process-local document store shared by cloning the handle.
///
/// Matches are kept as JSON objects so that patches are merged field by
/// field and every read decodes the stored fields from scratch.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
    available: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Make every call fail with `Unavailable` until switched back on.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            warn!("[InMemoryStore] rejecting call, store marked unavailable");
            Err(StoreError::Unavailable("store is offline".into()))
        }
    }

    /// Stored fields of a match exactly as kept.
    pub async fn raw_fields(&self, id: &MatchId) -> Option<Map<String, Value>> {
        let inner = self.inner.lock().await;
        inner.matches.get(id).map(|m| m.fields.clone())
    }

    /// Replace stored fields without any validation, bumping the version.
    pub async fn overwrite_raw_fields(&self, id: &MatchId, fields: Map<String, Value>) {
        let mut inner = self.inner.lock().await;
        if let Some(stored) = inner.matches.get_mut(id) {
            stored.fields = fields;
            stored.version += 1;
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_object<T: serde::Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Malformed(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Malformed(e.to_string())),
    }
}

fn decode(fields: &Map<String, Value>) -> Result<MatchDocument, StoreError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| StoreError::Malformed(e.to_string()))
}

#[async_trait::async_trait]
impl MatchStore for InMemoryStore {
    async fn create_match(&self, mut document: MatchDocument) -> Result<MatchId, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;
        // createdAt doubles as the score key, so no two matches may share one
        document.created_at = document.created_at.max(inner.last_created + 1);
        let fields = to_object(&document)?;
        inner.last_created = document.created_at;
        inner.next_id += 1;
        let id = MatchId::new(format!("match-{:06}", inner.next_id));
        inner
            .matches
            .insert(id.clone(), StoredMatch { version: 1, fields });
        debug!("[InMemoryStore] created {}", id);
        Ok(id)
    }

    async fn get_match(&self, id: &MatchId) -> Result<MatchRecord, StoreError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        let stored = inner
            .matches
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        debug!("[InMemoryStore] read {} at version {}", id, stored.version);
        Ok(MatchRecord {
            id: id.clone(),
            version: stored.version,
            document: decode(&stored.fields)?,
        })
    }

    async fn update_match_fields(
        &self,
        id: &MatchId,
        expected_version: u64,
        patch: MatchPatch,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let changes = to_object(&patch)?;
        let mut inner = self.inner.lock().await;
        let stored = inner
            .matches
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if stored.version != expected_version {
            warn!(
                "[InMemoryStore] version conflict on {}: expected {}, found {}",
                id, expected_version, stored.version
            );
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }
        let mut merged = stored.fields.clone();
        for (key, value) in changes {
            merged.insert(key, value);
        }
        // refuse to persist something that no longer decodes
        decode(&merged)?;
        stored.fields = merged;
        stored.version += 1;
        debug!(
            "[InMemoryStore] updated {} {:?} -> version {}",
            id,
            patch.field_names(),
            stored.version
        );
        Ok(stored.version)
    }

    async fn query_matches_for_player(
        &self,
        player: &str,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        let mut out = Vec::new();
        for (id, stored) in &inner.matches {
            let named = |key: &str| stored.fields.get(key).and_then(Value::as_str) == Some(player);
            if !named("player1Name") && !named("player2Name") {
                continue;
            }
            let document = match decode(&stored.fields) {
                Ok(document) => document,
                Err(e) => {
                    warn!("[InMemoryStore] skipping {} for {}: {}", id, player, e);
                    continue;
                }
            };
            if status.is_some_and(|s| s != document.status) {
                continue;
            }
            out.push(MatchRecord {
                id: id.clone(),
                version: stored.version,
                document,
            });
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl ScoreSink for InMemoryStore {
    async fn append_score(&self, entry: ScoreEntry) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;
        if inner.scores.iter().any(|e| e.key() == entry.key()) {
            debug!(
                "[InMemoryStore] score for {} at {} already recorded",
                entry.player_name, entry.timestamp
            );
            return Ok(false);
        }
        inner.scores.push(entry);
        Ok(true)
    }

    async fn query_top_scores(
        &self,
        limit: usize,
        order: ScoreOrder,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        let mut scores = inner.scores.clone();
        scores.sort_by(|a, b| {
            let by_score = match order {
                ScoreOrder::Ascending => a.score.cmp(&b.score),
                ScoreOrder::Descending => b.score.cmp(&a.score),
            };
            by_score.then(a.timestamp.cmp(&b.timestamp))
        });
        scores.truncate(limit);
        Ok(scores)
    }
}
