//! Fixed vocabularies for spawn records.
//!
//! Every selectable value in a spawn file comes from one of the tables
//! here. The tables are read-only constants; nothing mutates them at
//! runtime. Preset tokens are an open-ended curated list — unknown tokens
//! found in a file are kept alongside these, never rejected.

/// Discriminator for a spawn entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpawnType {
    #[default]
    Pokemon,
    PokemonHerd,
    Npc,
}

impl SpawnType {
    pub fn all() -> &'static [SpawnType] {
        &[SpawnType::Pokemon, SpawnType::PokemonHerd, SpawnType::Npc]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpawnType::Pokemon => "pokemon",
            SpawnType::PokemonHerd => "pokemon-herd",
            SpawnType::Npc => "npc",
        }
    }

    /// Parse a type token. Unknown tokens fall back to `Pokemon`.
    pub fn from_token(token: &str) -> SpawnType {
        match token {
            "pokemon-herd" => SpawnType::PokemonHerd,
            "npc" => SpawnType::Npc,
            _ => SpawnType::Pokemon,
        }
    }

    /// Herd entries carry member lists and use `levelRange` instead of `level`.
    pub fn is_herd(&self) -> bool {
        matches!(self, SpawnType::PokemonHerd)
    }
}

/// Rarity bucket governing spawn-budget allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Bucket {
    #[default]
    Common,
    Uncommon,
    Rare,
    UltraRare,
}

impl Bucket {
    pub fn all() -> &'static [Bucket] {
        &[Bucket::Common, Bucket::Uncommon, Bucket::Rare, Bucket::UltraRare]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Common => "common",
            Bucket::Uncommon => "uncommon",
            Bucket::Rare => "rare",
            Bucket::UltraRare => "ultra-rare",
        }
    }

    pub fn from_token(token: &str) -> Bucket {
        match token {
            "uncommon" => Bucket::Uncommon,
            "rare" => Bucket::Rare,
            "ultra-rare" => Bucket::UltraRare,
            _ => Bucket::Common,
        }
    }
}

/// Where in the world a spawn may be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PositionType {
    #[default]
    Grounded,
    Submerged,
    Surface,
    Seafloor,
    Lavafloor,
    Fishing,
}

impl PositionType {
    pub fn all() -> &'static [PositionType] {
        &[
            PositionType::Grounded,
            PositionType::Submerged,
            PositionType::Surface,
            PositionType::Seafloor,
            PositionType::Lavafloor,
            PositionType::Fishing,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Grounded => "grounded",
            PositionType::Submerged => "submerged",
            PositionType::Surface => "surface",
            PositionType::Seafloor => "seafloor",
            PositionType::Lavafloor => "lavafloor",
            PositionType::Fishing => "fishing",
        }
    }

    pub fn from_token(token: &str) -> PositionType {
        match token {
            "submerged" => PositionType::Submerged,
            "surface" => PositionType::Surface,
            "seafloor" => PositionType::Seafloor,
            "lavafloor" => PositionType::Lavafloor,
            "fishing" => PositionType::Fishing,
            _ => PositionType::Grounded,
        }
    }
}

/// Time-of-day restriction. `Unset` means the key is omitted from the
/// encoded condition — distinct from a condition that never had the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Unset,
    Any,
    Day,
    Night,
    Morning,
    Noon,
    Afternoon,
    Evening,
    Midnight,
    Predawn,
    Dawn,
    Dusk,
    Twilight,
}

impl TimeRange {
    pub fn all() -> &'static [TimeRange] {
        &[
            TimeRange::Unset,
            TimeRange::Any,
            TimeRange::Day,
            TimeRange::Night,
            TimeRange::Morning,
            TimeRange::Noon,
            TimeRange::Afternoon,
            TimeRange::Evening,
            TimeRange::Midnight,
            TimeRange::Predawn,
            TimeRange::Dawn,
            TimeRange::Dusk,
            TimeRange::Twilight,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Unset => "",
            TimeRange::Any => "any",
            TimeRange::Day => "day",
            TimeRange::Night => "night",
            TimeRange::Morning => "morning",
            TimeRange::Noon => "noon",
            TimeRange::Afternoon => "afternoon",
            TimeRange::Evening => "evening",
            TimeRange::Midnight => "midnight",
            TimeRange::Predawn => "predawn",
            TimeRange::Dawn => "dawn",
            TimeRange::Dusk => "dusk",
            TimeRange::Twilight => "twilight",
        }
    }

    /// Parse a time token. Out-of-vocabulary tokens fall back to `Unset`.
    pub fn from_token(token: &str) -> TimeRange {
        TimeRange::all()
            .iter()
            .copied()
            .find(|t| *t != TimeRange::Unset && t.as_str() == token)
            .unwrap_or(TimeRange::Unset)
    }

    /// Human-readable form for selection widgets.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Unset => "(unset)",
            other => other.as_str(),
        }
    }
}

/// Moon-phase restriction, same unset semantics as [`TimeRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MoonPhase {
    #[default]
    Unset,
    Full,
    New,
    Crescent,
    Gibbous,
    Quarter,
    Waxing,
    Waning,
}

impl MoonPhase {
    pub fn all() -> &'static [MoonPhase] {
        &[
            MoonPhase::Unset,
            MoonPhase::Full,
            MoonPhase::New,
            MoonPhase::Crescent,
            MoonPhase::Gibbous,
            MoonPhase::Quarter,
            MoonPhase::Waxing,
            MoonPhase::Waning,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoonPhase::Unset => "",
            MoonPhase::Full => "full",
            MoonPhase::New => "new",
            MoonPhase::Crescent => "crescent",
            MoonPhase::Gibbous => "gibbous",
            MoonPhase::Quarter => "quarter",
            MoonPhase::Waxing => "waxing",
            MoonPhase::Waning => "waning",
        }
    }

    /// Parse a phase token. Out-of-vocabulary tokens fall back to `Unset`.
    pub fn from_token(token: &str) -> MoonPhase {
        MoonPhase::all()
            .iter()
            .copied()
            .find(|p| *p != MoonPhase::Unset && p.as_str() == token)
            .unwrap_or(MoonPhase::Unset)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::Unset => "(unset)",
            other => other.as_str(),
        }
    }
}

/// Curated preset tokens (named bundles of environmental constraints).
/// Files may carry tokens outside this list; those are preserved.
pub const PRESET_OPTIONS: [&str; 28] = [
    "ancient_city",
    "derelict",
    "desert_pyramid",
    "end_city",
    "foliage",
    "illager_structures",
    "jungle_pyramid",
    "lava",
    "mansion",
    "mansion_bedrooms",
    "mansion_dining",
    "natural",
    "nether_fossil",
    "nether_structures",
    "ocean_monument",
    "ocean_ruins",
    "pillager_outpost",
    "redstone",
    "ruined_portal",
    "saccharine_tree",
    "salt",
    "stronghold",
    "trail_ruins",
    "treetop",
    "urban",
    "water",
    "webs",
    "wild",
];

/// Condition fields encoded only when true.
pub const CONDITION_BOOL_FIELDS: [&str; 5] = [
    "canSeeSky",
    "isRaining",
    "isThundering",
    "isSlimeChunk",
    "fluidIsSource",
];

/// Condition fields holding an integer; an explicit zero in a file is
/// distinct from the field being absent.
pub const CONDITION_INT_FIELDS: [&str; 16] = [
    "minSkyLight",
    "maxSkyLight",
    "minLight",
    "maxLight",
    "minY",
    "maxY",
    "minX",
    "maxX",
    "minZ",
    "maxZ",
    "minLureLevel",
    "maxLureLevel",
    "minHeight",
    "maxHeight",
    "minDepth",
    "maxDepth",
];

/// Condition fields holding an ordered list of strings.
pub const CONDITION_LIST_FIELDS: [&str; 6] = [
    "biomes",
    "structures",
    "neededNearbyBlocks",
    "neededBaseBlocks",
    "dimensions",
    "markers",
];

/// Condition fields holding a free-form string.
pub const CONDITION_STRING_FIELDS: [&str; 4] = ["bait", "rodType", "rod", "fluid"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for bucket in Bucket::all() {
            assert_eq!(Bucket::from_token(bucket.as_str()), *bucket);
        }
        for pos in PositionType::all() {
            assert_eq!(PositionType::from_token(pos.as_str()), *pos);
        }
        for ty in SpawnType::all() {
            assert_eq!(SpawnType::from_token(ty.as_str()), *ty);
        }
    }

    #[test]
    fn test_unknown_tokens_fall_back() {
        assert_eq!(TimeRange::from_token("blood-moon"), TimeRange::Unset);
        assert_eq!(MoonPhase::from_token("13"), MoonPhase::Unset);
        assert_eq!(Bucket::from_token("mythic"), Bucket::Common);
    }

    #[test]
    fn test_unset_is_not_matchable_by_empty_token() {
        // The empty token is the unset choice itself, never a vocabulary hit.
        assert_eq!(TimeRange::from_token(""), TimeRange::Unset);
        assert_eq!(MoonPhase::from_token(""), MoonPhase::Unset);
    }
}
