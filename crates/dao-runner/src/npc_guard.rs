//! NPC existence check on Director output.
//!
//! Named characters the narration introduces must be registered or have
//! appeared recently. Anyone else is rewritten to a generic placeholder,
//! and relation changes are kept only for registered NPCs.

use std::collections::BTreeMap;

use dao_types::{LocationId, NpcId, StateDelta};
use dao_world::ContentSource;
use regex::Regex;
use tracing::warn;

use crate::error::RunnerError;

/// Stand-in for an unregistered character.
pub const PLACEHOLDER: &str = "a passing cultivator";

/// Where the narration takes place.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Current location.
    pub location: &'a LocationId,
    /// The player's own name, never treated as an NPC.
    pub player_name: &'a str,
    /// Recent event descriptions; names in them count as seen.
    pub recent: &'a [String],
}

/// Result of sanitizing one Director decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardReport {
    /// Narration with unregistered names replaced.
    pub narration: String,
    /// Delta with relation changes keyed by canonical NPC id only.
    pub delta: StateDelta,
    /// Names that were replaced.
    pub replaced: Vec<String>,
    /// Relation keys that were dropped.
    pub dropped_relations: Vec<String>,
}

/// Detects and rewrites unregistered named characters.
#[derive(Debug, Clone)]
pub struct NpcGuard {
    titled: Regex,
}

impl NpcGuard {
    /// Compile the titled-name pattern.
    pub fn new() -> Result<Self, RunnerError> {
        Ok(Self {
            titled: Regex::new(
                r"\b(?:Sect Master|Young Master|Senior (?:Brother|Sister)|Junior (?:Brother|Sister)|Elder|Master|Patriarch|Brother|Sister|Uncle|Aunt|Lady|Lord|Disciple) (?P<name>[A-Z][a-z]+(?: [A-Z][a-z]+)?)\b",
            )?,
        })
    }

    /// Rewrite unregistered names and filter relation changes.
    pub fn sanitize(
        &self,
        narration: &str,
        delta: &StateDelta,
        characters: &[String],
        scene: &Scene<'_>,
        content: &impl ContentSource,
    ) -> GuardReport {
        let present: Vec<String> = content
            .available_npcs(scene.location)
            .into_iter()
            .map(|npc| npc.name.to_lowercase())
            .collect();
        let recent: Vec<String> = scene.recent.iter().map(|text| text.to_lowercase()).collect();
        let known = |name: &str| {
            let lowered = name.to_lowercase();
            content.resolve_npc(name).is_some()
                || lowered == scene.player_name.to_lowercase()
                || present
                    .iter()
                    .any(|npc| npc == &lowered || npc.split_whitespace().any(|w| w == lowered))
                || recent.iter().any(|text| text.contains(&lowered))
        };

        let mut unknown: Vec<String> = Vec::new();
        for name in characters.iter().map(|c| c.trim()).filter(|c| is_proper_name(c)) {
            if !known(name) && !unknown.iter().any(|u| u == name) {
                unknown.push(name.to_owned());
            }
        }
        for captures in self.titled.captures_iter(narration) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.name("name")) else {
                continue;
            };
            let full = whole.as_str();
            // "Elder Chen Nods": retry with the first word of the name only.
            let short = name.as_str().split_once(' ').and_then(|(first, _)| {
                let end = name.start().checked_add(first.len())?;
                narration.get(whole.start()..end)
            });
            let recognized = known(full) || short.is_some_and(known);
            if !recognized && !unknown.iter().any(|u| u == full) {
                unknown.push(full.to_owned());
            }
        }

        // Longest first so "Senior Sister Hong Lan" is replaced before "Hong Lan".
        unknown.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let mut text = narration.to_owned();
        for name in &unknown {
            text = replace_name(&text, name);
        }
        if !unknown.is_empty() {
            warn!(names = ?unknown, "replaced unregistered characters");
        }

        let (relations, dropped_relations) = canonical_relations(&delta.npc_relations, content);
        if !dropped_relations.is_empty() {
            warn!(keys = ?dropped_relations, "dropped relation changes for unregistered NPCs");
        }
        let mut sanitized = delta.clone();
        sanitized.npc_relations = relations;

        GuardReport {
            narration: text,
            delta: sanitized,
            replaced: unknown,
            dropped_relations,
        }
    }
}

/// Keep relation changes for registered NPCs, rewriting display names to ids.
fn canonical_relations(
    relations: &BTreeMap<NpcId, i32>,
    content: &impl ContentSource,
) -> (BTreeMap<NpcId, i32>, Vec<String>) {
    let mut kept = BTreeMap::new();
    let mut dropped = Vec::new();
    for (key, change) in relations {
        match content.resolve_npc(key.as_str()) {
            Some(npc) => {
                let total = kept.entry(npc.id.clone()).or_insert(0_i32);
                *total = total.saturating_add(*change);
            }
            None => dropped.push(key.to_string()),
        }
    }
    (kept, dropped)
}

/// A character entry that names someone rather than describing them.
fn is_proper_name(entry: &str) -> bool {
    let lowered = entry.to_lowercase();
    entry.chars().next().is_some_and(char::is_uppercase)
        && !["a ", "an ", "the ", "you"].iter().any(|p| lowered.starts_with(p))
}

/// Replace every occurrence of `name`, capitalizing the placeholder at the
/// start of a sentence.
fn replace_name(text: &str, name: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(name) {
        let (before, after) = rest.split_at(pos);
        result.push_str(before);
        let sentence_start = result
            .trim_end_matches([' ', '"', '\u{201c}'])
            .chars()
            .next_back()
            .is_none_or(|c| matches!(c, '.' | '!' | '?' | '\n'));
        if sentence_start {
            result.push_str("A passing cultivator");
        } else {
            result.push_str(PLACEHOLDER);
        }
        rest = after.get(name.len()..).unwrap_or_default();
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use dao_world::{Catalog, starting_npcs, starting_world};

    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(starting_world().unwrap()), starting_npcs().unwrap()).unwrap()
    }

    fn sanitize(narration: &str, delta: &StateDelta, characters: &[&str]) -> GuardReport {
        let location = LocationId::new("qingyun_plaza");
        let recent = vec!["You bowed to Brother Lu at the gate.".to_owned()];
        let scene = Scene {
            location: &location,
            player_name: "Lin",
            recent: &recent,
        };
        let characters: Vec<String> = characters.iter().map(|c| (*c).to_owned()).collect();
        NpcGuard::new()
            .unwrap()
            .sanitize(narration, delta, &characters, &scene, &catalog())
    }

    #[test]
    fn registered_names_pass_through() {
        let report = sanitize(
            "Elder Chen watches you practice.",
            &StateDelta::none(),
            &["Elder Chen"],
        );
        assert_eq!(report.narration, "Elder Chen watches you practice.");
        assert!(report.replaced.is_empty());
    }

    #[test]
    fn invented_titled_names_are_replaced() {
        let report = sanitize(
            "Elder Wu strides in. You bow to Elder Wu.",
            &StateDelta::none(),
            &[],
        );
        assert_eq!(
            report.narration,
            "A passing cultivator strides in. You bow to a passing cultivator."
        );
        assert_eq!(report.replaced, ["Elder Wu"]);
    }

    #[test]
    fn declared_characters_are_checked() {
        let report = sanitize(
            "Moon Blossom smiles at you.",
            &StateDelta::none(),
            &["Moon Blossom", "a wandering merchant", "Lin"],
        );
        assert_eq!(report.narration, "A passing cultivator smiles at you.");
        assert_eq!(report.replaced, ["Moon Blossom"]);
    }

    #[test]
    fn recently_seen_names_are_allowed() {
        let report = sanitize("Brother Lu waves.", &StateDelta::none(), &["Brother Lu"]);
        assert!(report.replaced.is_empty());
    }

    #[test]
    fn relations_are_canonicalized_or_dropped() {
        let mut delta = StateDelta::none();
        delta.npc_relations.insert(NpcId::new("Elder Chen"), 2);
        delta.npc_relations.insert(NpcId::new("npc_002_elder_chen"), 3);
        delta.npc_relations.insert(NpcId::new("Elder Wu"), 5);
        let report = sanitize("Elder Chen nods.", &delta, &[]);
        assert_eq!(
            report.delta.npc_relations.get(&NpcId::new("npc_002_elder_chen")),
            Some(&5)
        );
        assert_eq!(report.delta.npc_relations.len(), 1);
        assert_eq!(report.dropped_relations, ["Elder Wu"]);
    }
}
