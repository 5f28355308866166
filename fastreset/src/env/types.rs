use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full health of a Minecraft player.
pub const MAX_LIFE: f32 = 20.0;
/// Full hunger bar of a Minecraft player.
pub const MAX_FOOD: u32 = 20;

/// Agent location in world coordinates, `y` being the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A configured coordinate. Integers and decimals land differently on the
/// server (`/tp` centres integer x/z on the block), so the distinction is
/// kept all the way into the rendered command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Int(i64),
    Float(f64),
}

impl Coord {
    pub fn value(self) -> f64 {
        match self {
            Coord::Int(v) => v as f64,
            Coord::Float(v) => v,
        }
    }
}

impl Default for Coord {
    fn default() -> Self {
        Coord::Int(0)
    }
}

impl From<i64> for Coord {
    fn from(v: i64) -> Self {
        Coord::Int(v)
    }
}

impl From<f64> for Coord {
    fn from(v: f64) -> Self {
        Coord::Float(v)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Int(v) => write!(f, "{v}"),
            Coord::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// Position plus facing, as configured for the episode start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartPosition {
    pub x: Coord,
    pub y: Coord,
    pub z: Coord,
    #[serde(default)]
    pub yaw: Coord,
    #[serde(default)]
    pub pitch: Coord,
}

impl StartPosition {
    pub fn position(&self) -> Position {
        Position::new(self.x.value(), self.y.value(), self.z.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Normal,
    Clear,
    Rain,
    Thunder,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weather::Normal => "normal",
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Thunder => "thunder",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown weather `{0}`")]
pub struct ParseWeatherError(String);

impl FromStr for Weather {
    type Err = ParseWeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Weather::Normal),
            "clear" => Ok(Weather::Clear),
            "rain" => Ok(Weather::Rain),
            "thunder" => Ok(Weather::Thunder),
            _ => Err(ParseWeatherError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Mainhand,
    Offhand,
    Head,
    Chest,
    Legs,
    Feet,
}

impl EquipmentSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSlot::Mainhand => "mainhand",
            EquipmentSlot::Offhand => "offhand",
            EquipmentSlot::Head => "head",
            EquipmentSlot::Chest => "chest",
            EquipmentSlot::Legs => "legs",
            EquipmentSlot::Feet => "feet",
        }
    }
}

impl FromStr for EquipmentSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainhand" => Ok(EquipmentSlot::Mainhand),
            "offhand" => Ok(EquipmentSlot::Offhand),
            "head" => Ok(EquipmentSlot::Head),
            "chest" => Ok(EquipmentSlot::Chest),
            "legs" => Ok(EquipmentSlot::Legs),
            "feet" => Ok(EquipmentSlot::Feet),
            _ => Err(()),
        }
    }
}

/// Inventory slot, either by index (0..=40) or by equipment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InventorySlot {
    Index(u32),
    Equipment(EquipmentSlot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub slot: InventorySlot,
    /// Minecraft item id without the `minecraft:` namespace.
    pub name: String,
    #[serde(default)]
    pub variant: Option<u32>,
    pub quantity: u32,
}
