//! Fingerprint-keyed memo of read-only turn results.

use std::collections::HashMap;
use std::time::Duration;

use dao_types::{IntentKind, PlayerState, StateDelta};
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;

/// What a cached turn replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTurn {
    /// Narration shown to the player.
    pub narration: String,
    /// The delta that was applied.
    pub delta: StateDelta,
    /// Intent the turn was classified as.
    pub kind: IntentKind,
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedTurn,
    stored_at: Instant,
    hits: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held, expired ones included until swept.
    pub total_entries: usize,
    /// Hits served by entries still held.
    pub total_hits: u64,
    /// Whether lookups and stores are active.
    pub enabled: bool,
}

/// In-memory cache of turn results keyed by [`ActionCache::fingerprint`].
///
/// Entries older than the TTL are never returned; they are evicted on
/// access or by [`ActionCache::sweep_expired`]. A disabled cache stores
/// nothing and always misses.
#[derive(Debug)]
pub struct ActionCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    enabled: bool,
}

impl ActionCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            enabled,
        }
    }

    /// Key for an (input, state) pair.
    ///
    /// Only HP, MP, location, tier, karma, inventory and skills take part,
    /// so unrelated state (experience, tick, attempts) never causes a
    /// miss. Inventory is hashed sorted so acquisition order is ignored.
    pub fn fingerprint(input: &str, state: &PlayerState) -> String {
        let mut inventory: Vec<&str> = state.inventory.iter().map(String::as_str).collect();
        inventory.sort_unstable();
        let snapshot = serde_json::json!({
            "hp": state.hp,
            "mp": state.mp,
            "location_id": state.location_id.as_str(),
            "tier": state.tier,
            "karma": state.karma,
            "inventory": inventory,
            "skills": state.skills,
        });

        let mut hasher = Sha256::new();
        hasher.update(input.trim().as_bytes());
        hasher.update(b"|");
        hasher.update(snapshot.to_string().as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest.get(..16).unwrap_or_default())
    }

    /// Whether `delta` may be stored and replayed.
    ///
    /// Every field a replay could apply must feed the fingerprint, so a
    /// repeated input after the first replay misses. Experience, progress,
    /// relations and the rule-engine fields do not, and would accumulate.
    pub fn replayable(delta: &StateDelta) -> bool {
        delta.experience_gained == 0
            && delta.progress_change == 0
            && delta.npc_relations.is_empty()
            && delta.set_progress.is_none()
            && delta.max_hp_change == 0
            && delta.max_mp_change == 0
            && !delta.restore_vitals
            && !delta.breakthrough_attempted
    }

    /// Look up a fresh entry, evicting it if it has expired.
    pub fn get(&mut self, fingerprint: &str) -> Option<CachedTurn> {
        if !self.enabled {
            return None;
        }
        let ttl = self.ttl;
        let entry = self.entries.get_mut(fingerprint)?;
        if entry.stored_at.elapsed() < ttl {
            entry.hits = entry.hits.saturating_add(1);
            debug!(fingerprint, hits = entry.hits, "action cache hit");
            return Some(entry.value.clone());
        }
        self.entries.remove(fingerprint);
        debug!(fingerprint, "action cache entry expired");
        None
    }

    /// Store a result, replacing any previous entry.
    pub fn set(&mut self, fingerprint: String, value: CachedTurn) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            fingerprint,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                hits: 0,
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            total_hits: self
                .entries
                .values()
                .fold(0_u64, |sum, entry| sum.saturating_add(entry.hits)),
            enabled: self.enabled,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use dao_types::{LocationId, PlayerId, Tier};

    use super::*;

    fn player() -> PlayerState {
        PlayerState {
            id: PlayerId::new(),
            name: "Lin".to_owned(),
            tier: Tier::FLOOR,
            hp: 100,
            max_hp: 100,
            mp: 50,
            max_mp: 50,
            karma: 0,
            location_id: LocationId::new("qingyun_foot"),
            location_name: "Qingyun Foothills".to_owned(),
            inventory: vec!["Cloth Robe".to_owned(), "Dry Rations".to_owned()],
            skills: BTreeSet::from(["Basic Breathing".to_owned()]),
            cultivation_progress: 0,
            breakthrough_attempts: 0,
            experience: 0,
            current_tick: 0,
            created_at: Utc::now(),
        }
    }

    fn turn(narration: &str) -> CachedTurn {
        CachedTurn {
            narration: narration.to_owned(),
            delta: StateDelta::none(),
            kind: IntentKind::Inspect,
        }
    }

    #[test]
    fn fingerprint_is_stable_for_identical_inputs() {
        let state = player();
        let key = ActionCache::fingerprint("look around", &state);
        assert_eq!(key, ActionCache::fingerprint("look around", &state.clone()));
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn fingerprint_ignores_unrelated_fields() {
        let base = player();
        let key = ActionCache::fingerprint("look around", &base);

        let mut other = base.clone();
        other.experience = 999;
        other.current_tick = 4_000;
        other.breakthrough_attempts = 3;
        other.cultivation_progress = 70;
        other.max_hp = 140;
        other.location_name = "Somewhere Else".to_owned();
        other.inventory.reverse();
        assert_eq!(ActionCache::fingerprint("look around", &other), key);
    }

    #[test]
    fn fingerprint_tracks_every_relevant_field() {
        let base = player();
        let key = ActionCache::fingerprint("look around", &base);
        let mutations: [fn(&mut PlayerState); 7] = [
            |p| p.hp = 99,
            |p| p.mp = 49,
            |p| p.location_id = LocationId::new("qingyun_plaza"),
            |p| p.tier = Tier::new(1, 1).unwrap(),
            |p| p.karma = 1,
            |p| p.inventory.push("Spirit Stone".to_owned()),
            |p| {
                p.skills.insert("Cloud Step".to_owned());
            },
        ];
        for mutate in mutations {
            let mut changed = base.clone();
            mutate(&mut changed);
            assert_ne!(ActionCache::fingerprint("look around", &changed), key);
        }
        assert_ne!(ActionCache::fingerprint("look up", &base), key);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let mut cache = ActionCache::new(Duration::from_secs(300), true);
        cache.set("k".to_owned(), turn("The plaza is quiet."));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("k").unwrap().narration, "The plaza is quiet.");
        assert_eq!(cache.stats().total_hits, 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_counts_evictions() {
        let mut cache = ActionCache::new(Duration::from_secs(10), true);
        cache.set("old-1".to_owned(), turn("a"));
        cache.set("old-2".to_owned(), turn("b"));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set("fresh".to_owned(), turn("c"));
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.sweep_expired(), 2);
        assert_eq!(cache.stats().total_entries, 1);
        assert!(cache.get("fresh").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_and_resets_age() {
        let mut cache = ActionCache::new(Duration::from_secs(10), true);
        cache.set("k".to_owned(), turn("first"));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k".to_owned(), turn("second"));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").unwrap().narration, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_cache_never_stores() {
        let mut cache = ActionCache::new(Duration::from_secs(300), false);
        cache.set("k".to_owned(), turn("x"));
        assert!(cache.get("k").is_none());
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 0);
        assert!(!stats.enabled);

        cache.clear();
        assert_eq!(cache.stats().total_hits, 0);
    }

    #[test]
    fn only_deltas_covered_by_the_fingerprint_are_replayable() {
        assert!(ActionCache::replayable(&StateDelta::none()));
        assert!(ActionCache::replayable(&StateDelta {
            karma_change: 1,
            items_gained: vec!["Jade Slip".to_owned()],
            ..StateDelta::default()
        }));
        assert!(!ActionCache::replayable(&StateDelta {
            experience_gained: 5,
            ..StateDelta::default()
        }));
        assert!(!ActionCache::replayable(&StateDelta {
            npc_relations: [(dao_types::NpcId::new("npc_002_elder_chen"), 1)].into(),
            ..StateDelta::default()
        }));
    }
}
