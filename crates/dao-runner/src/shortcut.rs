//! Menu shortcuts and direction aliases resolved without the generative
//! service.

use dao_types::Direction;
use dao_world::classify_direction;

/// Phrase sent down the slow path for `m`.
pub const MOVE_PHRASE: &str = "I want to move somewhere else";

/// Phrase sent down the slow path for `l`.
pub const LOOK_PHRASE: &str = "I look around at my surroundings";

/// How many NPCs the `t<n>` shortcuts can address.
pub const MAX_TALK_TARGETS: usize = 3;

/// A recognized shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortcut {
    /// Move through an exit on the fast path.
    Move(Direction),
    /// Show the inventory (no time passes).
    Inventory,
    /// Show the status panel (no time passes).
    Status,
    /// Meditate through the cultivation engine.
    Cultivate,
    /// Attempt a breakthrough through the cultivation engine.
    Breakthrough,
    /// Rest to recover vitals.
    Rest,
    /// Replace the input with a canonical phrase and take the slow path.
    Expand(String),
    /// The shortcut cannot apply here; show the message and skip the turn.
    Invalid(String),
}

/// Classify raw input. `npcs_here` are display names of the NPCs at the
/// player's location, in listing order. Returns `None` for free text.
pub fn classify(input: &str, npcs_here: &[String]) -> Option<Shortcut> {
    let command = input.trim().to_lowercase();
    let shortcut = match command.as_str() {
        "" => return None,
        "i" | "inv" | "inventory" => Shortcut::Inventory,
        "st" | "status" => Shortcut::Status,
        "c" => Shortcut::Cultivate,
        "b" => Shortcut::Breakthrough,
        "r" => Shortcut::Rest,
        "m" => Shortcut::Expand(MOVE_PHRASE.to_owned()),
        "l" => Shortcut::Expand(LOOK_PHRASE.to_owned()),
        "a" => npcs_here.first().map_or_else(
            || Shortcut::Invalid("There is no one here to attack.".to_owned()),
            |name| Shortcut::Expand(format!("I attack {name}")),
        ),
        other => {
            if let Some(index) = talk_index(other) {
                return Some(
                    index
                        .checked_sub(1)
                        .and_then(|i| npcs_here.get(i))
                        .map_or_else(
                            || Shortcut::Invalid(format!("There is no NPC number {index} here.")),
                            |name| Shortcut::Expand(format!("I talk to {name}")),
                        ),
                );
            }
            return classify_direction(input).map(Shortcut::Move);
        }
    };
    Some(shortcut)
}

/// `t1` through `t3`.
fn talk_index(command: &str) -> Option<usize> {
    let digits = command.strip_prefix('t')?;
    let index: usize = digits.parse().ok()?;
    (digits.len() == 1 && (1..=MAX_TALK_TARGETS).contains(&index)).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npcs() -> Vec<String> {
        vec!["Elder Chen".to_owned(), "Brother Lu".to_owned()]
    }

    #[test]
    fn menu_letters() {
        assert_eq!(classify("i", &[]), Some(Shortcut::Inventory));
        assert_eq!(classify(" ST ", &[]), Some(Shortcut::Status));
        assert_eq!(classify("c", &[]), Some(Shortcut::Cultivate));
        assert_eq!(classify("b", &[]), Some(Shortcut::Breakthrough));
        assert_eq!(classify("r", &[]), Some(Shortcut::Rest));
        assert_eq!(
            classify("l", &[]),
            Some(Shortcut::Expand(LOOK_PHRASE.to_owned()))
        );
    }

    #[test]
    fn single_letter_s_is_south() {
        assert_eq!(classify("s", &[]), Some(Shortcut::Move(Direction::South)));
        assert_eq!(classify("n", &[]), Some(Shortcut::Move(Direction::North)));
        assert_eq!(classify("go east", &[]), Some(Shortcut::Move(Direction::East)));
    }

    #[test]
    fn attack_targets_the_first_npc() {
        assert_eq!(
            classify("a", &npcs()),
            Some(Shortcut::Expand("I attack Elder Chen".to_owned()))
        );
        assert!(matches!(classify("a", &[]), Some(Shortcut::Invalid(_))));
    }

    #[test]
    fn talk_shortcuts_check_the_index() {
        assert_eq!(
            classify("t2", &npcs()),
            Some(Shortcut::Expand("I talk to Brother Lu".to_owned()))
        );
        assert!(matches!(classify("t3", &npcs()), Some(Shortcut::Invalid(_))));
        assert_eq!(classify("t4", &npcs()), None);
    }

    #[test]
    fn free_text_is_not_a_shortcut() {
        assert_eq!(classify("ask the elder about the sect", &npcs()), None);
        assert_eq!(classify("   ", &[]), None);
    }
}
