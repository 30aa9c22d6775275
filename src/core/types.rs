use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle for one activation of an external identity.
///
/// Allocated by [`crate::session::Sessions`] and never reused, so a completion
/// issued for a previous activation cannot resolve to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityId(pub u64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One outstanding reason a session must not be treated as idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockToken(pub u64);

/// A world a player can hold state in, optionally grouped with other worlds
/// under a shared bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    name: String,
    bundle: Option<String>,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle: None,
        }
    }

    pub fn bundled(name: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle: Some(bundle.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bundle {
            Some(bundle) => write!(f, "{} ({})", self.name, bundle),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: String,
    pub count: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbt: Option<Vec<u8>>,
}

impl ItemStack {
    pub fn new(id: impl Into<String>, count: u8) -> Self {
        Self {
            id: id.into(),
            count,
            nbt: None,
        }
    }
}

/// Slot-indexed container contents. Empty slots are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: BTreeMap<u32, ItemStack>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, slot: u32, item: ItemStack) -> Self {
        self.slots.insert(slot, item);
        self
    }

    pub fn get(&self, slot: u32) -> Option<&ItemStack> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ItemStack)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub effect: String,
    pub duration_ticks: u32,
    pub amplifier: u8,
    pub visible: bool,
}

/// Persisted by numeric id, matching the Java edition game mode ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub fn id(self) -> u8 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(GameMode::Survival),
            1 => Some(GameMode::Creative),
            2 => Some(GameMode::Adventure),
            3 => Some(GameMode::Spectator),
            _ => None,
        }
    }
}

impl From<GameMode> for u8 {
    fn from(mode: GameMode) -> Self {
        mode.id()
    }
}

impl TryFrom<u8> for GameMode {
    type Error = String;

    fn try_from(id: u8) -> std::result::Result<Self, Self::Error> {
        GameMode::from_id(id).ok_or_else(|| format!("unknown game mode id {}", id))
    }
}

/// Snapshot of everything a player carries in one world.
///
/// Never mutated once built: sessions share it behind an `Rc` and replace it
/// wholesale on load or save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    pub armor_inventory: Inventory,
    pub inventory: Inventory,
    pub ender_inventory: Inventory,
    pub health: f32,
    pub effects: Vec<EffectInstance>,
    pub gamemode: GameMode,
    pub experience: i32,
    pub food: f32,
    pub exhaustion: f32,
    pub saturation: f32,
}

impl PartitionState {
    /// State handed out for a world the player has never saved in.
    pub fn empty() -> Self {
        Self {
            armor_inventory: Inventory::new(),
            inventory: Inventory::new(),
            ender_inventory: Inventory::new(),
            health: 20.0,
            effects: Vec::new(),
            gamemode: GameMode::Survival,
            experience: 0,
            food: 20.0,
            exhaustion: 0.0,
            saturation: 5.0,
        }
    }
}

impl Default for PartitionState {
    fn default() -> Self {
        Self::empty()
    }
}

/// What triggered a save. Only used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveCause {
    WorldChange,
    Disconnect,
    AutoSave,
    Shutdown,
    Custom(i32),
}

impl SaveCause {
    pub fn code(self) -> i32 {
        match self {
            SaveCause::WorldChange => 0,
            SaveCause::Disconnect => 1,
            SaveCause::AutoSave => 2,
            SaveCause::Shutdown => 3,
            SaveCause::Custom(code) => code,
        }
    }
}

impl fmt::Display for SaveCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
