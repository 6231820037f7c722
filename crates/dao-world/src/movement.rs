//! Movement legality.
//!
//! [`validate_movement`] is pure and deterministic: it checks that an
//! exit exists in the requested direction (or toward the named place),
//! then that the player's tier meets the destination's requirement.
//! Failure reasons are written for the player and always enumerate the
//! legal exits.

use dao_types::{Direction, LocationId, Tier};

use crate::direction::classify_direction;
use crate::world_graph::WorldGraph;

/// Result of a movement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementCheck {
    /// The move is legal.
    Valid {
        /// Canonical id of the destination.
        destination_id: LocationId,
        /// Display name of the destination.
        destination_name: String,
        /// Direction of travel.
        direction: Direction,
    },
    /// The move is not legal.
    Invalid {
        /// Human-readable explanation.
        reason: String,
    },
}

impl MovementCheck {
    /// Whether the move is legal.
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Check whether the player may leave `current` toward `direction_or_label`.
///
/// `direction_or_label` is either a direction alias (`"n"`, `"北"`,
/// `"go north"`) or the id/display name of an adjacent location.
pub fn validate_movement(
    graph: &WorldGraph,
    current: &LocationId,
    direction_or_label: &str,
    rank: Tier,
) -> MovementCheck {
    let Some(here) = graph.get(current) else {
        return MovementCheck::Invalid {
            reason: format!("System error: your current location '{current}' is not on the map."),
        };
    };

    let exit = classify_direction(direction_or_label)
        .and_then(|direction| here.exit(direction).map(|target| (direction, target)))
        .or_else(|| {
            let wanted = graph.resolve(direction_or_label)?;
            here.exits
                .iter()
                .find(|(_, target)| **target == wanted.id)
                .map(|(direction, target)| (*direction, target))
        });

    let Some((direction, target)) = exit else {
        let exits = graph.exits_summary(current);
        let reason = if exits.is_empty() {
            format!("There is no way onward from {}; it is a dead end.", here.name)
        } else {
            format!(
                "You cannot go that way from {}. Available exits: {exits}.",
                here.name
            )
        };
        return MovementCheck::Invalid { reason };
    };

    let Some(destination) = graph.get(target) else {
        return MovementCheck::Invalid {
            reason: format!("System error: the exit {direction} leads to an unmapped place."),
        };
    };

    if rank < destination.rank_requirement {
        return MovementCheck::Invalid {
            reason: format!(
                "{} is closed to you: it requires tier {} and you are tier {rank}. Available exits: {}.",
                destination.name,
                destination.rank_requirement,
                graph.exits_summary(current)
            ),
        };
    }

    MovementCheck::Valid {
        destination_id: destination.id.clone(),
        destination_name: destination.name.clone(),
        direction,
    }
}

/// Arrival narration templates, picked by index.
const ARRIVAL_TEMPLATES: &[&str] = &[
    "You head {direction} and arrive at {name}. {description}",
    "Following the path {direction}, you reach {name}. {description}",
    "After a short walk {direction}, {name} opens before you. {description}",
];

/// Number of arrival narration variants.
pub const ARRIVAL_VARIANTS: usize = ARRIVAL_TEMPLATES.len();

/// Narrate a fast-path move. `variant` wraps around the template table.
pub fn arrival_narration(
    graph: &WorldGraph,
    destination: &LocationId,
    direction: Direction,
    variant: usize,
) -> String {
    let (name, description) = graph.get(destination).map_or_else(
        || (destination.to_string(), String::new()),
        |location| (location.name.clone(), location.description.clone()),
    );
    let template = variant
        .checked_rem(ARRIVAL_TEMPLATES.len())
        .and_then(|index| ARRIVAL_TEMPLATES.get(index))
        .copied()
        .unwrap_or("You arrive at {name}. {description}");
    template
        .replace("{direction}", direction.as_str())
        .replace("{name}", &name)
        .replace("{description}", &description)
        .trim_end()
        .to_owned()
}
