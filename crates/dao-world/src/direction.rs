//! Deterministic direction classifier.
//!
//! Single-token movement commands ("n", "北", "go west") are resolved
//! from a fixed alias table before any generative call is made.

use dao_types::Direction;

/// Verb prefixes stripped before alias lookup.
const MOVE_PREFIXES: &[&str] = &[
    "go to the ",
    "go ",
    "head ",
    "walk ",
    "move ",
    "travel ",
    "run ",
    "climb ",
    "往",
    "向",
    "去",
];

/// Alias table: every accepted spelling per direction.
const ALIASES: &[(Direction, &[&str])] = &[
    (
        Direction::North,
        &["n", "north", "northward", "northwards", "北", "北方", "北邊", "北边"],
    ),
    (
        Direction::South,
        &["s", "south", "southward", "southwards", "南", "南方", "南邊", "南边"],
    ),
    (
        Direction::East,
        &["e", "east", "eastward", "eastwards", "東", "东", "東方", "东方", "東邊", "东边"],
    ),
    (
        Direction::West,
        &["w", "west", "westward", "westwards", "西", "西方", "西邊", "西边"],
    ),
    (
        Direction::Up,
        &["u", "up", "upward", "upwards", "upstairs", "上", "上方", "上去"],
    ),
    (
        Direction::Down,
        &["d", "down", "downward", "downwards", "downstairs", "下", "下方", "下去"],
    ),
];

/// Classify raw input as a compass direction, or `None` if it is not one.
///
/// Matching is case-insensitive, ignores surrounding whitespace and
/// trailing punctuation, and accepts one leading movement verb.
pub fn classify_direction(input: &str) -> Option<Direction> {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return None;
    }
    lookup(&normalized).or_else(|| {
        MOVE_PREFIXES
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix))
            .map(str::trim)
            .and_then(lookup)
    })
}

fn lookup(token: &str) -> Option<Direction> {
    ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&token))
        .map(|(direction, _)| *direction)
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .trim_end_matches(['.', '!', '?', '。', '！', '？'])
        .trim()
        .to_lowercase()
}
