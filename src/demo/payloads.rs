//! Payload types of the sample handlers

use eyre::eyre;
use std::any::type_name;

use crate::inspect::{Attribute, Inspect, Layout};
use crate::inspect_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    ClassD,
    Scientist,
    FacilityGuard,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageType {
    Falldown,
    Firearm,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    ChaosInsurgency,
    NineTailedFox,
}

inspect_enum!(RoleType, DamageType, Team);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Inspect for Position {
    fn layout() -> Layout {
        Layout::object(type_name::<Position>(), &["X", "Y", "Z"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        format!("({}, {}, {})", self.x, self.y, self.z)
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("X", &self.x),
            Attribute::field("Y", &self.y),
            Attribute::field("Z", &self.z),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub nickname: String,
    pub role: RoleType,
    pub health: f32,
    pub position: Position,
    pub connected: bool,
}

impl Player {
    pub fn new(id: u32, nickname: &str, role: RoleType) -> Self {
        Self {
            id,
            nickname: nickname.to_string(),
            role,
            health: 100.0,
            position: Position { x: 0.0, y: 1.0, z: 0.0 },
            connected: true,
        }
    }

    /// Health is only known while the player's connection is alive
    pub fn health(&self) -> eyre::Result<f32> {
        if !self.connected {
            return Err(eyre!("player {} is not connected", self.id));
        }
        Ok(self.health)
    }
}

impl Inspect for Player {
    fn layout() -> Layout {
        Layout::object(type_name::<Player>(), &["Id", "Nickname", "Role", "Health", "Position"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        format!("{} ({})", self.nickname, self.id)
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("Id", &self.id),
            Attribute::field("Nickname", &self.nickname),
            Attribute::field("Role", &self.role),
            Attribute::computed("Health", self.health()),
            Attribute::field("Position", &self.position),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Door {
    pub name: String,
    pub is_open: bool,
    pub tags: Vec<String>,
}

impl Inspect for Door {
    fn layout() -> Layout {
        Layout::object(type_name::<Door>(), &["Name", "IsOpen", "Tags"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        self.name.clone()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("Name", &self.name),
            Attribute::field("IsOpen", &self.is_open),
            Attribute::field("Tags", &self.tags),
        ]
    }
}

/// Common base of every player event
#[derive(Debug, Clone)]
pub struct PlayerEventArgs {
    pub player: Player,
}

impl Inspect for PlayerEventArgs {
    fn layout() -> Layout {
        Layout::object(type_name::<PlayerEventArgs>(), &["Player"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "PlayerEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![Attribute::field("Player", &self.player)]
    }
}

#[derive(Debug, Clone)]
pub struct VerifiedEventArgs {
    pub base: PlayerEventArgs,
}

impl Inspect for VerifiedEventArgs {
    fn layout() -> Layout {
        Layout::object(type_name::<VerifiedEventArgs>(), &[])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "VerifiedEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        self.base.attributes()
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
pub struct HurtingEventArgs {
    pub base: PlayerEventArgs,
    pub attacker: Option<Player>,
    pub amount: f32,
    pub damage_type: DamageType,
    pub is_allowed: bool,
}

impl Inspect for HurtingEventArgs {
    fn layout() -> Layout {
        Layout::object(
            type_name::<HurtingEventArgs>(),
            &["Attacker", "Amount", "DamageType", "IsAllowed"],
        )
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "HurtingEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        let mut attributes = self.declared();
        attributes.extend(self.base.attributes());
        attributes
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::optional("Attacker", self.attacker.as_ref()),
            Attribute::field("Amount", &self.amount),
            Attribute::field("DamageType", &self.damage_type),
            Attribute::field("IsAllowed", &self.is_allowed),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct InteractingDoorEventArgs {
    pub base: PlayerEventArgs,
    pub door: Door,
    pub is_allowed: bool,
}

impl Inspect for InteractingDoorEventArgs {
    fn layout() -> Layout {
        Layout::object(type_name::<InteractingDoorEventArgs>(), &["Door", "IsAllowed"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "InteractingDoorEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        let mut attributes = self.declared();
        attributes.extend(self.base.attributes());
        attributes
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("Door", &self.door),
            Attribute::field("IsAllowed", &self.is_allowed),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct RespawningTeamEventArgs {
    pub players: Vec<String>,
    pub maximum_respawn_amount: u32,
    pub next_known_team: Team,
    pub is_allowed: bool,
}

impl Inspect for RespawningTeamEventArgs {
    fn layout() -> Layout {
        Layout::object(
            type_name::<RespawningTeamEventArgs>(),
            &["Players", "MaximumRespawnAmount", "NextKnownTeam", "IsAllowed"],
        )
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "RespawningTeamEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("Players", &self.players),
            Attribute::field("MaximumRespawnAmount", &self.maximum_respawn_amount),
            Attribute::field("NextKnownTeam", &self.next_known_team),
            Attribute::field("IsAllowed", &self.is_allowed),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SendingConsoleCommandEventArgs {
    pub base: PlayerEventArgs,
    pub name: String,
    pub arguments: Vec<String>,
}

impl Inspect for SendingConsoleCommandEventArgs {
    fn layout() -> Layout {
        Layout::object(type_name::<SendingConsoleCommandEventArgs>(), &["Name", "Arguments"])
    }

    fn describe(&self) -> Layout {
        Self::layout()
    }

    fn display(&self) -> String {
        "SendingConsoleCommandEventArgs".to_string()
    }

    fn attributes(&self) -> Vec<Attribute<'_>> {
        let mut attributes = self.declared();
        attributes.extend(self.base.attributes());
        attributes
    }

    fn declared(&self) -> Vec<Attribute<'_>> {
        vec![
            Attribute::field("Name", &self.name),
            Attribute::field("Arguments", &self.arguments),
        ]
    }
}
