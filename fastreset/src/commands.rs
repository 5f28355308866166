//! Console commands issued during a fast reset.
//!
//! The text of every command is what the game server expects, so the
//! `Display` impls below are the wire format. Floating point values use the
//! `{:?}` rendering, which always keeps a decimal point (`5.0`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::env::{EquipmentSlot, InventoryItem, InventorySlot, Position, StartPosition, Weather};

/// Horizontal spread of the agent around a fixed center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub center_x: i64,
    pub center_z: i64,
    pub distance: f64,
}

impl Spread {
    /// Centers on the horizontal coordinates of `center`, truncated toward zero.
    pub fn around(center: Position, distance: f64) -> Self {
        Self {
            center_x: center.x.trunc() as i64,
            center_z: center.z.trunc() as i64,
            distance,
        }
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spreadplayers {} {} {:?} {:?} false @p",
            self.center_x,
            self.center_z,
            self.distance,
            self.distance + 1.0
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResetCommand {
    KillAgent,
    SetTime(u64),
    SetWeather(Weather),
    ReplaceItem {
        slot: String,
        item: String,
        quantity: u32,
        metadata: u32,
    },
    TeleportToStart(StartPosition),
    KillNonPlayers,
    KillItems,
    /// Absolute position, facing left untouched.
    TeleportTo(Position),
    SpreadPlayers(Spread),
    /// Spread again only when the agent stands on leaves.
    RespreadOffLeaves(Spread),
}

impl ResetCommand {
    /// `None` when the item's slot has no command form.
    pub fn replace_item(item: &InventoryItem) -> Option<Self> {
        Some(ResetCommand::ReplaceItem {
            slot: command_slot(item.slot)?,
            item: item.name.clone(),
            quantity: item.quantity,
            metadata: item.variant.unwrap_or(0),
        })
    }
}

impl fmt::Display for ResetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetCommand::KillAgent => f.write_str("/kill"),
            ResetCommand::SetTime(time) => write!(f, "/time set {time}"),
            ResetCommand::SetWeather(weather) => write!(f, "/weather {weather}"),
            ResetCommand::ReplaceItem {
                slot,
                item,
                quantity,
                metadata,
            } => write!(
                f,
                "/replaceitem entity @p {slot} minecraft:{item} {quantity} {metadata}"
            ),
            ResetCommand::TeleportToStart(start) => write!(
                f,
                "/tp @p {} {} {} {} {}",
                start.x, start.y, start.z, start.yaw, start.pitch
            ),
            ResetCommand::KillNonPlayers => f.write_str("/kill @e[type=!player]"),
            ResetCommand::KillItems => f.write_str("/kill @e[type=item]"),
            ResetCommand::TeleportTo(pos) => {
                write!(f, "/tp {:?} {:?} {:?} ~ ~", pos.x, pos.y, pos.z)
            }
            ResetCommand::SpreadPlayers(spread) => write!(f, "/{spread}"),
            ResetCommand::RespreadOffLeaves(spread) => write!(
                f,
                "/execute @p ~ ~ ~ execute @p ~ ~ ~ detect ~ ~-1 ~ minecraft:leaves -1 {spread}"
            ),
        }
    }
}

/// Ordered reset commands. Never empty: it always opens with `/kill`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSequence {
    first: ResetCommand,
    rest: Vec<ResetCommand>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self {
            first: ResetCommand::KillAgent,
            rest: Vec::new(),
        }
    }

    pub fn push(&mut self, command: ResetCommand) {
        self.rest.push(command);
    }

    pub fn first(&self) -> &ResetCommand {
        &self.first
    }

    pub fn rest(&self) -> &[ResetCommand] {
        &self.rest
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResetCommand> {
        std::iter::once(&self.first).chain(&self.rest)
    }

    /// Rendered command lines, in issue order.
    pub fn lines(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl Default for CommandSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an inventory slot to its `/replaceitem` name.
pub fn command_slot(slot: InventorySlot) -> Option<String> {
    let name = match slot {
        InventorySlot::Index(index @ 0..=8) => format!("slot.hotbar.{index}"),
        InventorySlot::Index(index @ 9..=35) => format!("slot.inventory.{}", index - 9),
        InventorySlot::Index(36) | InventorySlot::Equipment(EquipmentSlot::Feet) => {
            "slot.armor.feet".to_string()
        }
        InventorySlot::Index(37) | InventorySlot::Equipment(EquipmentSlot::Legs) => {
            "slot.armor.legs".to_string()
        }
        InventorySlot::Index(38) | InventorySlot::Equipment(EquipmentSlot::Chest) => {
            "slot.armor.chest".to_string()
        }
        InventorySlot::Index(39) | InventorySlot::Equipment(EquipmentSlot::Head) => {
            "slot.armor.head".to_string()
        }
        InventorySlot::Index(40) | InventorySlot::Equipment(EquipmentSlot::Offhand) => {
            "slot.weapon.offhand".to_string()
        }
        InventorySlot::Equipment(EquipmentSlot::Mainhand) => "slot.weapon.mainhand".to_string(),
        InventorySlot::Index(_) => return None,
    };
    Some(name)
}
