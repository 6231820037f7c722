//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A compass direction labelling an exit from a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the mountain summit.
    North,
    /// Toward the foothills.
    South,
    /// Sunrise side.
    East,
    /// Sunset side.
    West,
    /// Climbing (cliffs, stairs, upper gates).
    Up,
    /// Descending.
    Down,
}

impl Direction {
    /// All directions in display order.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Lowercase English label used in narration and exit listings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// One of the four 30-day seasons of the 120-day year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    /// Days 1-30 of the year.
    Spring,
    /// Days 31-60.
    Summer,
    /// Days 61-90.
    Autumn,
    /// Days 91-120.
    Winter,
}

impl Season {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }
}

/// Coarse time-of-day bucket derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
    /// Hours 6-11.
    Morning,
    /// Hours 12-17.
    Afternoon,
    /// Hours 18-23.
    Evening,
    /// Hours 0-5.
    LateNight,
}

impl DayPeriod {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::LateNight => "Late Night",
        }
    }
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// The closed set of purposes a turn's input can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    /// Travel to another location.
    Move,
    /// Start or continue a fight.
    Attack,
    /// Converse with an NPC.
    Talk,
    /// Meditate to gain cultivation progress.
    Cultivate,
    /// Consume or activate an inventory item.
    UseItem,
    /// Recover vitals.
    Rest,
    /// Use a learned technique.
    SkillUse,
    /// Buy, sell, or barter.
    Trade,
    /// Look around or examine something.
    Inspect,
    /// The observer could not tell.
    Unknown,
}

impl IntentKind {
    /// Every intent kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Move,
        Self::Attack,
        Self::Talk,
        Self::Cultivate,
        Self::UseItem,
        Self::Rest,
        Self::SkillUse,
        Self::Trade,
        Self::Inspect,
        Self::Unknown,
    ];

    /// Canonical upper-case label (matches the serde representation).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Attack => "ATTACK",
            Self::Talk => "TALK",
            Self::Cultivate => "CULTIVATE",
            Self::UseItem => "USE_ITEM",
            Self::Rest => "REST",
            Self::SkillUse => "SKILL_USE",
            Self::Trade => "TRADE",
            Self::Inspect => "INSPECT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse a label leniently. Anything unrecognised maps to [`Self::Unknown`].
    pub fn parse_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .unwrap_or(Self::Unknown)
    }

    /// Whether results for this intent may be memoized by the action cache.
    ///
    /// Intents whose effects depend on state that evolves across turns
    /// (movement, combat, consumption, resting, trading, dialogue, skill
    /// use, cultivation) are never cached.
    pub const fn is_cacheable(self) -> bool {
        !matches!(
            self,
            Self::Move
                | Self::Attack
                | Self::Talk
                | Self::Cultivate
                | Self::UseItem
                | Self::Rest
                | Self::SkillUse
                | Self::Trade
        )
    }
}

impl core::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
