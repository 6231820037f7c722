//! Cultivation and breakthrough rules.
//!
//! Pure functions over [`PlayerState`]: nothing here mutates state.
//! Each operation returns a [`StateDelta`] for the turn controller to
//! apply, plus the numbers needed to narrate the outcome. Randomness is
//! confined to [`attempt_breakthrough`]; [`resolve_breakthrough`] takes the
//! roll as an argument so outcomes are reproducible in tests.

use dao_types::{PlayerState, StateDelta, Tier};

/// Mana spent per cultivation session.
pub const CULTIVATE_MP_COST: u32 = 10;

/// Progress gained per session at a neutral location.
pub const BASE_PROGRESS_GAIN: u32 = 10;

/// Sub-ranks gained on a successful breakthrough (`1.0` -> `1.3`).
pub const BREAKTHROUGH_STEP: u8 = 3;

/// Percent of max HP lost when a breakthrough fails.
pub const FAILURE_HP_LOSS_PCT: u32 = 30;

/// Success-rate floor, in percent.
pub const MIN_SUCCESS_RATE: f64 = 5.0;

/// Success-rate ceiling, in percent.
pub const MAX_SUCCESS_RATE: f64 = 95.0;

/// Success-rate points per point of karma.
pub const KARMA_RATE_WEIGHT: f64 = 0.5;

/// One major realm's parameters.
struct Realm {
    name: &'static str,
    required_progress: u32,
    base_rate: u32,
    hp_bonus: u32,
    mp_bonus: u32,
}

/// Realm table indexed by `major - 1`.
const REALMS: [Realm; 6] = [
    Realm {
        name: "Qi Refining",
        required_progress: 100,
        base_rate: 70,
        hp_bonus: 10,
        mp_bonus: 5,
    },
    Realm {
        name: "Foundation Establishment",
        required_progress: 200,
        base_rate: 60,
        hp_bonus: 20,
        mp_bonus: 10,
    },
    Realm {
        name: "Nascent Soul",
        required_progress: 400,
        base_rate: 50,
        hp_bonus: 40,
        mp_bonus: 20,
    },
    Realm {
        name: "Golden Core",
        required_progress: 800,
        base_rate: 40,
        hp_bonus: 60,
        mp_bonus: 30,
    },
    Realm {
        name: "Spirit Transformation",
        required_progress: 1_600,
        base_rate: 30,
        hp_bonus: 100,
        mp_bonus: 50,
    },
    Realm {
        name: "Tribulation Transcendence",
        required_progress: 9_999,
        base_rate: 10,
        hp_bonus: 200,
        mp_bonus: 100,
    },
];

/// Position within a major realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubRank {
    /// Sub-ranks 0-2.
    Early,
    /// Sub-ranks 3-5.
    Middle,
    /// Sub-ranks 6-9.
    Late,
}

impl SubRank {
    /// Classify a sub-rank digit.
    pub const fn of(tier: Tier) -> Self {
        match tier.sub() {
            0..=2 => Self::Early,
            3..=5 => Self::Middle,
            _ => Self::Late,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Early => "Early",
            Self::Middle => "Middle",
            Self::Late => "Late",
        }
    }
}

/// Everything the rules derive from a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierProfile {
    /// Major realm name.
    pub realm: &'static str,
    /// Sub-rank within the realm.
    pub sub_rank: SubRank,
    /// Progress needed before a breakthrough may be attempted.
    pub required_progress: u32,
    /// Breakthrough success rate at zero karma, in percent.
    pub base_rate: u32,
    /// Max HP gained on a successful breakthrough.
    pub hp_bonus: u32,
    /// Max MP gained on a successful breakthrough.
    pub mp_bonus: u32,
}

impl TierProfile {
    /// Display title, e.g. `Qi Refining (Early)`.
    pub fn title(&self) -> String {
        format!("{} ({})", self.realm, self.sub_rank.label())
    }
}

/// Look up the rules for a tier.
pub fn tier_profile(tier: Tier) -> TierProfile {
    let index = usize::from(tier.major().clamp(Tier::MIN_MAJOR, Tier::MAX_MAJOR))
        .saturating_sub(1)
        .min(REALMS.len().saturating_sub(1));
    let [first, ..] = &REALMS;
    let realm = REALMS.get(index).unwrap_or(first);
    TierProfile {
        realm: realm.name,
        sub_rank: SubRank::of(tier),
        required_progress: realm.required_progress,
        base_rate: realm.base_rate,
        hp_bonus: realm.hp_bonus,
        mp_bonus: realm.mp_bonus,
    }
}

/// Breakthrough success rate in percent: `base + 0.5 * karma`, clamped to `[5, 95]`.
pub fn success_rate(tier: Tier, karma: i32) -> f64 {
    let base = f64::from(tier_profile(tier).base_rate);
    KARMA_RATE_WEIGHT
        .mul_add(f64::from(karma), base)
        .clamp(MIN_SUCCESS_RATE, MAX_SUCCESS_RATE)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a breakthrough may not be attempted yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BreakthroughBlocker {
    /// Progress has not reached the tier's requirement.
    #[error("cultivation progress is insufficient ({have}/{need})")]
    InsufficientProgress {
        /// Current progress.
        have: u32,
        /// Required progress.
        need: u32,
    },

    /// HP is below half of max.
    #[error("your body is too weak to withstand a breakthrough ({hp}/{max_hp} HP)")]
    TooWounded {
        /// Current HP.
        hp: u32,
        /// Max HP.
        max_hp: u32,
    },

    /// Already at the highest tier.
    #[error("you stand at the peak of cultivation; there is nothing further to break through")]
    AtCeiling,
}

/// Errors from cultivation operations. All are plain refusals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CultivationError {
    /// Breakthrough preconditions are not met.
    #[error("{0}")]
    NotReady(#[from] BreakthroughBlocker),

    /// Not enough mana to cultivate.
    #[error("not enough mana to cultivate ({have}/{need} MP)")]
    InsufficientMana {
        /// Current MP.
        have: u32,
        /// Required MP.
        need: u32,
    },
}

// ---------------------------------------------------------------------------
// Breakthrough
// ---------------------------------------------------------------------------

/// Check breakthrough preconditions.
///
/// # Errors
///
/// Returns the first unmet [`BreakthroughBlocker`].
pub fn can_breakthrough(state: &PlayerState) -> Result<(), BreakthroughBlocker> {
    let profile = tier_profile(state.tier);
    if state.cultivation_progress < profile.required_progress {
        return Err(BreakthroughBlocker::InsufficientProgress {
            have: state.cultivation_progress,
            need: profile.required_progress,
        });
    }
    if u64::from(state.hp).saturating_mul(2) < u64::from(state.max_hp) {
        return Err(BreakthroughBlocker::TooWounded {
            hp: state.hp,
            max_hp: state.max_hp,
        });
    }
    if state.tier >= Tier::CEILING {
        return Err(BreakthroughBlocker::AtCeiling);
    }
    Ok(())
}

/// Result of one breakthrough attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakthroughOutcome {
    /// Whether the roll beat the success rate.
    pub success: bool,
    /// The uniform roll in `[0, 100)`.
    pub roll: f64,
    /// The success rate that was rolled against.
    pub rate: f64,
    /// Tier before the attempt.
    pub from: Tier,
    /// Tier after the attempt.
    pub to: Tier,
    /// Changes to apply.
    pub delta: StateDelta,
    /// Player-facing summary.
    pub message: String,
}

/// Resolve a breakthrough against a given roll in `[0, 100)`.
///
/// Success (`roll < rate`) advances the tier by three sub-ranks, resets
/// progress, raises both maxima by the realm bonus, and restores vitals.
/// Failure costs 30% of max HP and halves progress.
///
/// # Errors
///
/// Returns [`CultivationError::NotReady`] if [`can_breakthrough`] fails.
pub fn resolve_breakthrough(
    state: &PlayerState,
    roll: f64,
) -> Result<BreakthroughOutcome, CultivationError> {
    can_breakthrough(state)?;
    let profile = tier_profile(state.tier);
    let rate = success_rate(state.tier, state.karma);
    let from = state.tier;

    if roll < rate {
        let to = from.advance(BREAKTHROUGH_STEP);
        let delta = StateDelta {
            set_tier: Some(to),
            set_progress: Some(0),
            max_hp_change: profile.hp_bonus,
            max_mp_change: profile.mp_bonus,
            restore_vitals: true,
            breakthrough_attempted: true,
            ..StateDelta::default()
        };
        let crossed = if to.major() > from.major() {
            " You have entered a new realm!"
        } else {
            ""
        };
        let message = format!(
            "Breakthrough succeeded! You rise from {} to {} ({to}).{crossed} Max HP +{}, max MP +{}.",
            profile.title(),
            tier_profile(to).title(),
            profile.hp_bonus,
            profile.mp_bonus,
        );
        return Ok(BreakthroughOutcome {
            success: true,
            roll,
            rate,
            from,
            to,
            delta,
            message,
        });
    }

    let hp_loss = state.max_hp.saturating_mul(FAILURE_HP_LOSS_PCT) / 100;
    let new_progress = state.cultivation_progress / 2;
    let delta = StateDelta {
        hp_change: i32::try_from(hp_loss).map_or(i32::MIN, i32::saturating_neg),
        set_progress: Some(new_progress),
        breakthrough_attempted: true,
        ..StateDelta::default()
    };
    Ok(BreakthroughOutcome {
        success: false,
        roll,
        rate,
        from,
        to: from,
        delta,
        message: format!(
            "Breakthrough failed! The backlash tears through your meridians: HP -{hp_loss}, progress falls to {new_progress}."
        ),
    })
}

/// Draw a roll in `[0, 100)` and resolve a breakthrough.
///
/// # Errors
///
/// Returns [`CultivationError::NotReady`] if [`can_breakthrough`] fails.
pub fn attempt_breakthrough(
    state: &PlayerState,
    rng: &mut impl rand::Rng,
) -> Result<BreakthroughOutcome, CultivationError> {
    let roll = rng.random_range(0.0..100.0);
    resolve_breakthrough(state, roll)
}

// ---------------------------------------------------------------------------
// Cultivation
// ---------------------------------------------------------------------------

/// Result of one cultivation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CultivationGain {
    /// Progress actually gained (after capping).
    pub progress_gained: u32,
    /// Mana spent.
    pub mp_cost: u32,
    /// Whether a breakthrough may now be attempted.
    pub breakthrough_ready: bool,
    /// Changes to apply.
    pub delta: StateDelta,
    /// Player-facing summary.
    pub message: String,
}

/// Meditate for one session at a location with the given bonus.
///
/// Spends [`CULTIVATE_MP_COST`] mana and gains
/// `BASE_PROGRESS_GAIN * bonus_pct / 100` progress, capped at the tier's
/// requirement.
///
/// # Errors
///
/// Returns [`CultivationError::InsufficientMana`] if MP is below the cost.
pub fn cultivate(state: &PlayerState, bonus_pct: u32) -> Result<CultivationGain, CultivationError> {
    if state.mp < CULTIVATE_MP_COST {
        return Err(CultivationError::InsufficientMana {
            have: state.mp,
            need: CULTIVATE_MP_COST,
        });
    }
    let profile = tier_profile(state.tier);
    let gain = BASE_PROGRESS_GAIN.saturating_mul(bonus_pct) / 100;
    let new_progress = state
        .cultivation_progress
        .saturating_add(gain)
        .min(profile.required_progress.max(state.cultivation_progress));
    let progress_gained = new_progress.saturating_sub(state.cultivation_progress);

    let mut projected = state.clone();
    projected.cultivation_progress = new_progress;
    projected.mp = state.mp.saturating_sub(CULTIVATE_MP_COST);
    let breakthrough_ready = can_breakthrough(&projected).is_ok();

    let delta = StateDelta {
        mp_change: i32::try_from(CULTIVATE_MP_COST).map_or(i32::MIN, i32::saturating_neg),
        set_progress: Some(new_progress),
        ..StateDelta::default()
    };
    let mut message = format!(
        "You circulate your qi through your meridians. Progress +{progress_gained} ({new_progress}/{}), MP -{CULTIVATE_MP_COST}.",
        profile.required_progress
    );
    if breakthrough_ready {
        message.push_str(" Your bottleneck loosens: you may attempt a breakthrough.");
    }
    Ok(CultivationGain {
        progress_gained,
        mp_cost: CULTIVATE_MP_COST,
        breakthrough_ready,
        delta,
        message,
    })
}
