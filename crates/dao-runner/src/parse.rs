//! Generative output parsing into typed pipeline values.
//!
//! The service returns raw text that is usually, but not always, a JSON
//! object. [`extract_json_object`] tries several recovery strategies;
//! [`parse_intent`] and [`parse_director`] then map the object onto
//! [`Intent`] and [`StateDelta`], dropping anything they do not know.

use dao_types::{Intent, IntentKind, LocationId, NpcId, StateDelta};
use serde_json::Value;
use tracing::warn;

/// Narration used when the Director's reply cannot be parsed.
pub const FALLBACK_NARRATION: &str =
    "An unnameable force stays your hand. The heavens keep their secrets for now.";

/// Parse an Observer reply. Anything unusable becomes [`Intent::unknown`].
pub fn parse_intent(raw: &str) -> Intent {
    let Some(object) = extract_json_object(raw) else {
        warn!(raw_response = raw, "failed to parse observer reply, intent is UNKNOWN");
        return Intent::unknown();
    };

    let kind = object
        .get("intent")
        .and_then(Value::as_str)
        .map_or(IntentKind::Unknown, IntentKind::parse_label);
    let confidence = object
        .get("confidence")
        .and_then(number)
        .unwrap_or(0.0);

    let mut intent = Intent::new(kind, confidence);
    if let Some(target) = object.get("target").and_then(text) {
        intent = intent.with_target(target);
    }
    if let Some(details) = object.get("details").and_then(text) {
        intent = intent.with_details(details);
    }
    intent
}

/// The Director's decision after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorOutput {
    /// Narration to show the player.
    pub narration: String,
    /// Proposed changes; only generative-facing fields are ever set.
    pub delta: StateDelta,
    /// Names the Director says appear in the narration.
    pub characters: Vec<String>,
    /// State keys that were present but not accepted.
    pub dropped_keys: Vec<String>,
    /// False when the reply was unusable and the fallback was substituted.
    pub parsed: bool,
}

impl DirectorOutput {
    /// The no-op decision used when the Director gives nothing usable.
    pub fn fallback() -> Self {
        Self {
            narration: FALLBACK_NARRATION.to_owned(),
            delta: StateDelta::none(),
            characters: Vec::new(),
            dropped_keys: Vec::new(),
            parsed: false,
        }
    }
}

/// Parse a Director reply.
///
/// `state_update` keys outside the generative vocabulary are reported in
/// [`DirectorOutput::dropped_keys`]; so are known keys whose value has the
/// wrong type. `location_new` and `location_id` are both accepted as the
/// location reference, and `npc_relations_change` as `npc_relations`.
pub fn parse_director(raw: &str) -> DirectorOutput {
    let Some(object) = extract_json_object(raw) else {
        warn!(raw_response = raw, "failed to parse director reply, using fallback");
        return DirectorOutput::fallback();
    };

    let narration = object
        .get("narrative")
        .or_else(|| object.get("narration"))
        .and_then(text);
    let Some(narration) = narration else {
        warn!(raw_response = raw, "director reply has no narrative, using fallback");
        return DirectorOutput::fallback();
    };

    let characters = object
        .get("characters")
        .map(string_list)
        .unwrap_or_default();

    let mut delta = StateDelta::none();
    let mut dropped_keys = Vec::new();
    if let Some(update) = object.get("state_update").and_then(Value::as_object) {
        for (key, value) in update {
            if value.is_null() {
                continue;
            }
            if !apply_field(&mut delta, key, value) {
                dropped_keys.push(key.clone());
            }
        }
    }
    if !dropped_keys.is_empty() {
        warn!(keys = ?dropped_keys, "dropped unknown or malformed state keys");
    }

    DirectorOutput {
        narration,
        delta,
        characters,
        dropped_keys,
        parsed: true,
    }
}

/// Set one delta field from a JSON value. Returns false if the key is
/// unknown or the value is unusable.
fn apply_field(delta: &mut StateDelta, key: &str, value: &Value) -> bool {
    let signed = |slot: &mut i32| integer(value).map(|v| *slot = v).is_some();
    let list = |slot: &mut Vec<String>| {
        let usable = value.is_array();
        if usable {
            *slot = string_list(value);
        }
        usable
    };

    match key {
        "hp_change" => signed(&mut delta.hp_change),
        "mp_change" => signed(&mut delta.mp_change),
        "karma_change" => signed(&mut delta.karma_change),
        "progress_change" | "cultivation_progress_change" => signed(&mut delta.progress_change),
        "experience_gained" => {
            let Some(gained) = integer(value) else {
                return false;
            };
            delta.experience_gained = u32::try_from(gained).unwrap_or_default();
            true
        }
        "items_gained" => list(&mut delta.items_gained),
        "items_lost" => list(&mut delta.items_lost),
        "skills_gained" => list(&mut delta.skills_gained),
        "location_id" | "location_new" => {
            let Some(reference) = text(value) else {
                return false;
            };
            if delta.location_id.is_none() || key == "location_id" {
                delta.location_id = Some(LocationId::new(reference));
            }
            true
        }
        "npc_relations" | "npc_relations_change" => {
            let Some(relations) = value.as_object() else {
                return false;
            };
            for (npc, change) in relations {
                if let Some(change) = integer(change) {
                    delta.npc_relations.insert(NpcId::new(npc.as_str()), change);
                }
            }
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// JSON value helpers
// ---------------------------------------------------------------------------

/// Non-empty trimmed string.
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(ToOwned::to_owned)
}

/// Number, or a string holding one.
fn number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
}

/// Integer, rounding fractional values and saturating at the `i32` range.
fn integer(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return Some(i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX }));
    }
    let n = number(value)?.round();
    #[allow(clippy::cast_possible_truncation)]
    let n = n.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
    Some(n)
}

/// Array of non-empty strings; other elements are skipped.
fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(text).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Recovery strategies
// ---------------------------------------------------------------------------

/// Pull a JSON object out of free text.
///
/// Strategies, in order:
/// 1. Direct parse
/// 2. Markdown code block
/// 3. First balanced `{...}` span
///
/// Each is retried with trailing commas stripped.
pub fn extract_json_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        first_balanced_object(trimmed),
    ];
    candidates.into_iter().flatten().find_map(|candidate| {
        parse_object(candidate).or_else(|| parse_object(&strip_trailing_commas(candidate)))
    })
}

fn parse_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = fence.checked_add(3)?;
    let rest = text.get(after_fence..)?;
    // Skip the info string (`json`, `JSON`, ...) up to the first newline.
    let body_start = rest.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = rest.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The first `{...}` span whose braces balance, ignoring braces in strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text.get(start..)?.char_indices() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth = depth.saturating_add(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start.checked_add(offset)?.checked_add(1)?;
                    return text.get(start..end);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest: String = chars.clone().take_while(|n| n.is_whitespace()).collect();
            let next = chars.clone().nth(rest.chars().count());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_clean_intent() {
        let intent =
            parse_intent(r#"{"intent": "TALK", "target": "Elder Chen", "confidence": 0.92}"#);
        assert_eq!(intent.kind, IntentKind::Talk);
        assert_eq!(intent.target.as_deref(), Some("Elder Chen"));
        assert!((intent.confidence - 0.92).abs() < 1e-9);
    }

    #[test]
    fn parse_intent_from_codeblock_with_trailing_comma() {
        let raw = "Sure:\n```json\n{\"intent\": \"move\", \"target\": null, \"confidence\": \"0.8\",}\n```";
        let intent = parse_intent(raw);
        assert_eq!(intent.kind, IntentKind::Move);
        assert!(intent.target.is_none());
        assert!((intent.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn garbage_intent_is_unknown_with_zero_confidence() {
        let intent = parse_intent("I think the player wants to wander.");
        assert_eq!(intent, Intent::unknown());
        assert_eq!(parse_intent(""), Intent::unknown());
    }

    #[test]
    fn unknown_label_becomes_unknown_kind() {
        let intent = parse_intent(r#"{"intent": "DANCE", "confidence": 0.9}"#);
        assert_eq!(intent.kind, IntentKind::Unknown);
    }

    #[test]
    fn parse_full_director_reply() {
        let raw = r#"The heavens decide:
{
  "narrative": "Elder Chen hands you a Jade Slip. You lose 5 HP to the cold wind.",
  "state_update": {
    "hp_change": -5,
    "items_gained": ["Jade Slip"],
    "npc_relations": {"npc_002_elder_chen": 3},
    "experience_gained": 12.6
  },
  "characters": ["Elder Chen"]
}"#;
        let out = parse_director(raw);
        assert!(out.parsed);
        assert!(out.narration.starts_with("Elder Chen hands you"));
        assert_eq!(out.delta.hp_change, -5);
        assert_eq!(out.delta.items_gained, ["Jade Slip"]);
        assert_eq!(out.delta.experience_gained, 13);
        assert_eq!(
            out.delta.npc_relations.get(&NpcId::new("npc_002_elder_chen")),
            Some(&3)
        );
        assert_eq!(out.characters, ["Elder Chen"]);
        assert!(out.dropped_keys.is_empty());
    }

    #[test]
    fn location_new_is_accepted_and_unknown_keys_dropped() {
        let raw = r#"{"narrative": "You arrive at the plaza.",
            "state_update": {"location_new": "Outer Sect Plaza", "tier": 9.9,
                             "set_tier": 6.0, "hp_change": "lots"}}"#;
        let out = parse_director(raw);
        assert_eq!(
            out.delta.location_id,
            Some(LocationId::new("Outer Sect Plaza"))
        );
        assert!(out.delta.set_tier.is_none());
        assert!(out.dropped_keys.contains(&"tier".to_owned()));
        assert!(out.dropped_keys.contains(&"set_tier".to_owned()));
        assert!(out.dropped_keys.contains(&"hp_change".to_owned()));
    }

    #[test]
    fn location_id_wins_over_location_new() {
        let raw = r#"{"narrative": "n", "state_update":
            {"location_id": "qingyun_plaza", "location_new": "Somewhere"}}"#;
        let out = parse_director(raw);
        assert_eq!(out.delta.location_id, Some(LocationId::new("qingyun_plaza")));
    }

    #[test]
    fn unusable_director_reply_falls_back() {
        let out = parse_director("The story continues...");
        assert!(!out.parsed);
        assert_eq!(out.narration, FALLBACK_NARRATION);
        assert!(out.delta.is_empty());

        let no_narrative = parse_director(r#"{"state_update": {"hp_change": -10}}"#);
        assert!(!no_narrative.parsed);
        assert!(no_narrative.delta.is_empty());
    }

    #[test]
    fn balanced_span_ignores_braces_in_strings() {
        let text = r#"prefix {"narrative": "a } brace", "x": {"y": 1}} suffix"#;
        assert_eq!(
            first_balanced_object(text),
            Some(r#"{"narrative": "a } brace", "x": {"y": 1}}"#)
        );
    }

    #[test]
    fn extract_json_from_plain_codeblock() {
        let text = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": [2, 3 ,] ,}"#), r#"{"a": 1, "b": [2, 3 ] }"#);
    }
}
