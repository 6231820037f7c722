//! Built-in starting content: the Qingyun Sect and the town below it.
//!
//! Fifteen locations, all reachable from `qingyun_foot`, and the ten
//! registered NPCs who live there. Operators can replace both with JSON
//! files (see [`WorldGraph::load`] and [`NpcRegistry::load`]).

use std::collections::BTreeSet;

use dao_types::{Direction, IntentKind, LocationId, NpcId, Tier};

use crate::error::WorldError;
use crate::location::Location;
use crate::npc::{Npc, NpcRegistry};
use crate::world_graph::WorldGraph;

/// Id of the location where every new character starts.
pub const START_LOCATION: &str = "qingyun_foot";

/// Helper to build a [`Location`] with exits.
fn place(
    id: &str,
    name: &str,
    description: &str,
    exits: &[(Direction, &str)],
    event_chance: f64,
) -> Location {
    let mut location = Location::new(id, name, description);
    location.event_chance = event_chance;
    location.exits = exits
        .iter()
        .map(|(direction, target)| (*direction, LocationId::new(*target)))
        .collect();
    location
}

/// Helper for a tier literal that is known to be valid.
fn tier(major: u8, sub: u8) -> Tier {
    Tier::new(major, sub).unwrap_or(Tier::FLOOR)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

fn npc_ids(ids: &[&str]) -> Vec<NpcId> {
    ids.iter().map(|id| NpcId::new(*id)).collect()
}

fn all_but(excluded: IntentKind) -> BTreeSet<IntentKind> {
    IntentKind::ALL
        .into_iter()
        .filter(|kind| *kind != excluded)
        .collect()
}

/// Build the default Qingyun world graph.
///
/// # Errors
///
/// Returns a [`WorldError`] only if the built-in table is inconsistent.
#[allow(clippy::too_many_lines)]
pub fn starting_world() -> Result<WorldGraph, WorldError> {
    use Direction::{Down, East, North, South, Up, West};

    let mut foot = place(
        "qingyun_foot",
        "Qingyun Foothills",
        "Worn stone steps climb out of the valley mist toward the sect gate.",
        &[(North, "qingyun_plaza"), (East, "qingyun_herb"), (South, "nearby_market")],
        0.10,
    );
    foot.features = strings(&["stone steps", "mountain gate", "valley mist"]);
    foot.allowed_items = strings(&["Wild Herb"]);

    let mut plaza = place(
        "qingyun_plaza",
        "Outer Sect Plaza",
        "A wide square of white jade where outer disciples gather at dawn.",
        &[
            (South, "qingyun_foot"),
            (North, "qingyun_main_hall"),
            (West, "qingyun_library"),
            (East, "qingyun_training_hall"),
            (Up, "qingyun_inner_gate"),
        ],
        0.15,
    );
    plaza.features = strings(&["jade square", "mission board"]);
    plaza.allowed_npcs = npc_ids(&["npc_002_elder_chen", "npc_004_senior_sister_hong"]);

    let mut herb = place(
        "qingyun_herb",
        "Spirit Herb Garden",
        "Terraced beds of spirit grass glitter with dew that never dries.",
        &[(West, "qingyun_foot")],
        0.20,
    );
    herb.features = strings(&["herb terraces", "irrigation channels"]);
    herb.allowed_items = strings(&["Spirit Grass", "Dew Lotus", "Healing Herb"]);

    let mut library = place(
        "qingyun_library",
        "Scripture Pavilion",
        "Seven storeys of jade slips, guarded by wards older than the sect.",
        &[(East, "qingyun_plaza")],
        0.05,
    );
    library.rank_requirement = tier(2, 0);
    library.features = strings(&["jade slips", "warding arrays"]);
    library.allowed_items = strings(&["Jade Slip"]);

    let mut main_hall = place(
        "qingyun_main_hall",
        "Hall of Azure Clouds",
        "The sect's great hall, thick with incense and the pressure of its masters.",
        &[(South, "qingyun_plaza"), (West, "qingyun_temple"), (East, "qingyun_pool")],
        0.05,
    );
    main_hall.features = strings(&["incense burners", "ancestral tablets"]);
    main_hall.allowed_npcs = npc_ids(&["npc_001_master_xuanqing", "npc_002_elder_chen"]);
    main_hall.cultivation_bonus_pct = 130;

    let mut training = place(
        "qingyun_training_hall",
        "Outer Training Grounds",
        "Sand pits and wooden dummies scarred by ten thousand practice strikes.",
        &[(West, "qingyun_plaza"), (North, "qingyun_sword_dojo")],
        0.25,
    );
    training.features = strings(&["sparring ring", "wooden dummies"]);
    training.allowed_items = strings(&["Wooden Sword"]);

    let mut dojo = place(
        "qingyun_sword_dojo",
        "Sword Washing Dojo",
        "A quiet hall where a single stream runs over the blades of the fallen.",
        &[(South, "qingyun_training_hall")],
        0.10,
    );
    dojo.rank_requirement = tier(1, 5);
    dojo.features = strings(&["sword stream", "blade racks"]);

    let mut temple = place(
        "qingyun_temple",
        "Temple of Quiet Mind",
        "Bells hang silent in a courtyard swept clean each morning.",
        &[(East, "qingyun_main_hall")],
        0.05,
    );
    temple.features = strings(&["bronze bells", "meditation mats"]);
    temple.allowed_intents = all_but(IntentKind::Attack);

    let mut pool = place(
        "qingyun_pool",
        "Spirit Spring Pool",
        "Warm water wells up from the mountain's heart, thick with spiritual qi.",
        &[(West, "qingyun_main_hall")],
        0.05,
    );
    pool.features = strings(&["spirit spring", "steam"]);
    pool.allowed_items = strings(&["Spirit Water"]);
    pool.cultivation_bonus_pct = 150;

    let mut inner_gate = place(
        "qingyun_inner_gate",
        "Inner Sect Gate",
        "A gate of living cloud that parts only for those with a firm foundation.",
        &[(Down, "qingyun_plaza"), (North, "qingyun_inner")],
        0.05,
    );
    inner_gate.rank_requirement = tier(2, 0);
    inner_gate.features = strings(&["cloud gate"]);
    inner_gate.cultivation_bonus_pct = 150;

    let mut inner = place(
        "qingyun_inner",
        "Inner Sect Courtyard",
        "Pavilions float on clouds; inner disciples duel in the air above.",
        &[(South, "qingyun_inner_gate"), (Up, "qingyun_cliff")],
        0.15,
    );
    inner.rank_requirement = tier(2, 0);
    inner.features = strings(&["floating pavilions"]);

    let mut cliff = place(
        "qingyun_cliff",
        "Sword Tomb Cliff",
        "Ancient swords jut from the rock face, still humming with old intent.",
        &[(Down, "qingyun_inner")],
        0.30,
    );
    cliff.rank_requirement = tier(2, 0);
    cliff.features = strings(&["buried swords", "howling wind"]);
    cliff.safe = false;

    let mut market = place(
        "nearby_market",
        "Qingyun Town Market",
        "Stalls crowd the road below the mountain, hawking pills and talismans.",
        &[(North, "qingyun_foot"), (West, "wildlands_forest"), (East, "town_tavern")],
        0.20,
    );
    market.features = strings(&["pill stalls", "talisman sellers"]);
    market.allowed_items = strings(&["Qi Gathering Pill", "Iron Sword", "Spirit Stone"]);
    market.allowed_intents = all_but(IntentKind::Cultivate);

    let mut forest = place(
        "wildlands_forest",
        "Spirit Beast Forest",
        "Ancient trees blot out the sun; something large moves between them.",
        &[(East, "nearby_market")],
        0.35,
    );
    forest.features = strings(&["ancient trees", "beast tracks"]);
    forest.allowed_items = strings(&["Beast Core", "Frostflame Mane", "Wild Ginseng"]);
    forest.allowed_intents = all_but(IntentKind::Rest);
    forest.safe = false;

    let mut tavern = place(
        "town_tavern",
        "Drunken Immortal Tavern",
        "Loud, warm, and full of rumours about hidden treasure.",
        &[(West, "nearby_market")],
        0.25,
    );
    tavern.features = strings(&["rumour board", "wine jars"]);
    tavern.allowed_items = strings(&["Peach Wine"]);
    tavern.allowed_intents = all_but(IntentKind::Cultivate);

    WorldGraph::new(
        vec![
            foot, plaza, herb, library, main_hall, training, dojo, temple, pool, inner_gate,
            inner, cliff, market, forest, tavern,
        ],
        LocationId::new(START_LOCATION),
    )
}

/// Helper to build an [`Npc`].
fn resident(id: &str, name: &str, title: &str, rank: Tier, location: &str) -> Npc {
    Npc {
        id: NpcId::new(id),
        name: name.to_owned(),
        title: title.to_owned(),
        tier: rank,
        location_id: LocationId::new(location),
        personality: String::new(),
        lore: String::new(),
        combat_style: String::new(),
    }
}

/// Build the default NPC roster.
///
/// # Errors
///
/// Returns a [`WorldError`] only if the built-in table is inconsistent.
pub fn starting_npcs() -> Result<NpcRegistry, WorldError> {
    let mut master = resident(
        "npc_001_master_xuanqing",
        "Sect Master Xuanqing",
        "Master of the Qingyun Sect",
        tier(5, 6),
        "qingyun_main_hall",
    );
    master.personality = "Serene, distant, tests disciples with riddles".to_owned();
    master.combat_style = "Cloud-piercing sword arts".to_owned();

    let mut chen = resident(
        "npc_002_elder_chen",
        "Elder Chen",
        "Outer Sect Disciplinary Elder",
        tier(3, 2),
        "qingyun_plaza",
    );
    chen.personality = "Strict but fair, hates laziness".to_owned();
    chen.lore = "Lost his only disciple to a demonic cultivator decades ago".to_owned();
    chen.combat_style = "Heavy palm techniques".to_owned();

    let mut lion = resident(
        "npc_003_frostflame_lion",
        "Frostflame Lion",
        "Spirit Beast of the Deep Forest",
        tier(2, 4),
        "wildlands_forest",
    );
    lion.personality = "Territorial, proud, spares the humble".to_owned();
    lion.combat_style = "Freezing fire breath".to_owned();

    let mut hong = resident(
        "npc_004_senior_sister_hong",
        "Senior Sister Hong",
        "Outer Sect Champion",
        tier(1, 8),
        "qingyun_training_hall",
    );
    hong.personality = "Competitive, blunt, secretly kind".to_owned();
    hong.combat_style = "Twin crimson sabres".to_owned();

    let mut mu = resident(
        "npc_005_elder_mu",
        "Elder Mu",
        "Keeper of the Herb Garden",
        tier(2, 7),
        "qingyun_herb",
    );
    mu.personality = "Absent-minded, talks to plants".to_owned();

    let wen = resident(
        "npc_006_librarian_wen",
        "Librarian Wen",
        "Keeper of Scriptures",
        tier(3, 0),
        "qingyun_library",
    );

    let mut fang = resident(
        "npc_007_merchant_fang",
        "Merchant Fang",
        "Travelling Trader",
        tier(1, 2),
        "nearby_market",
    );
    fang.personality = "Greedy, cheerful, knows every rumour".to_owned();

    let lao = resident(
        "npc_008_innkeeper_lao",
        "Innkeeper Lao",
        "Owner of the Drunken Immortal",
        Tier::FLOOR,
        "town_tavern",
    );

    let mut jian = resident(
        "npc_009_elder_jian",
        "Elder Jian",
        "Sword Dojo Master",
        tier(3, 5),
        "qingyun_sword_dojo",
    );
    jian.combat_style = "Single flowing-water sword form".to_owned();

    let jingxin = resident(
        "npc_010_abbot_jingxin",
        "Abbot Jingxin",
        "Temple Abbot",
        tier(4, 1),
        "qingyun_temple",
    );

    NpcRegistry::new(vec![master, chen, lion, hong, mu, wen, fang, lao, jian, jingxin])
}
