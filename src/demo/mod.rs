//! Sample handler ecosystem
//!
//! A small stand-in for a game server plugin framework: `Player`, `Server`
//! and `Warhead` handler types with a mix of payload and payload-less events.
//! The CLI attaches devtools to it so the whole pipeline can be seen without
//! a real host.

use eyre::Result;
use std::sync::Arc;

pub mod payloads;

use crate::config::DEFAULT_HANDLER_NAMESPACE;
use crate::event::{Event, Signal};
use crate::handler::{Handler, HandlerCatalog};
use payloads::*;

/// Namespace of handlers that exist but are never scanned by default
pub const INTERNAL_NAMESPACE: &str = "devtools.demo.internal";

pub struct PlayerEvents {
    pub verified: Arc<Event<VerifiedEventArgs>>,
    pub hurting: Arc<Event<HurtingEventArgs>>,
    pub interacting_door: Arc<Event<InteractingDoorEventArgs>>,
    pub sending_console_command: Arc<Event<SendingConsoleCommandEventArgs>>,
}

pub struct ServerEvents {
    pub waiting_for_players: Arc<Signal>,
    pub round_started: Arc<Signal>,
    pub respawning_team: Arc<Event<RespawningTeamEventArgs>>,
}

pub struct WarheadEvents {
    pub detonated: Arc<Signal>,
}

/// The sample world: its handler catalog plus direct access to each event
pub struct Sandbox {
    pub catalog: Arc<HandlerCatalog>,
    pub player: PlayerEvents,
    pub server: ServerEvents,
    pub warhead: WarheadEvents,
    pub heartbeat: Arc<Signal>,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        let player = PlayerEvents {
            verified: Arc::new(Event::new("Verified")),
            hurting: Arc::new(Event::new("Hurting")),
            interacting_door: Arc::new(Event::new("InteractingDoor")),
            sending_console_command: Arc::new(Event::new("SendingConsoleCommand")),
        };
        let server = ServerEvents {
            waiting_for_players: Arc::new(Signal::new("WaitingForPlayers")),
            round_started: Arc::new(Signal::new("RoundStarted")),
            respawning_team: Arc::new(Event::new("RespawningTeam")),
        };
        let warhead = WarheadEvents {
            detonated: Arc::new(Signal::new("Detonated")),
        };
        let heartbeat = Arc::new(Signal::new("Heartbeat"));

        let catalog = Arc::new(HandlerCatalog::new());
        catalog.register(Arc::new(
            Handler::new(DEFAULT_HANDLER_NAMESPACE, "Player")
                .with_event(player.verified.clone())
                .with_event(player.hurting.clone())
                .with_event(player.interacting_door.clone())
                .with_event(player.sending_console_command.clone()),
        ))?;
        catalog.register(Arc::new(
            Handler::new(DEFAULT_HANDLER_NAMESPACE, "Server")
                .with_event(server.waiting_for_players.clone())
                .with_event(server.round_started.clone())
                .with_event(server.respawning_team.clone()),
        ))?;
        catalog.register(Arc::new(
            Handler::new(DEFAULT_HANDLER_NAMESPACE, "Warhead").with_event(warhead.detonated.clone()),
        ))?;
        catalog.register(Arc::new(
            Handler::new(INTERNAL_NAMESPACE, "Internal").with_event(heartbeat.clone()),
        ))?;

        Ok(Self {
            catalog,
            player,
            server,
            warhead,
            heartbeat,
        })
    }

    /// Fire one scripted round of events, in order. Only events whose name
    /// contains `filter` (case-insensitive) are fired. Returns the names fired.
    pub fn play_round(&self, filter: Option<&str>) -> Vec<&'static str> {
        let filter = filter.map(|f| f.to_lowercase());
        let wanted = |name: &str| filter.as_ref().is_none_or(|f| name.to_lowercase().contains(f));
        let mut fired = Vec::new();

        let mut alice = Player::new(2, "Alice", RoleType::ClassD);
        let bob = Player::new(3, "Bob", RoleType::FacilityGuard);

        if wanted("WaitingForPlayers") {
            self.server.waiting_for_players.fire();
            fired.push("WaitingForPlayers");
        }

        if wanted("Verified") {
            self.player.verified.fire(&VerifiedEventArgs {
                base: PlayerEventArgs { player: alice.clone() },
            });
            fired.push("Verified");
        }

        if wanted("RoundStarted") {
            self.server.round_started.fire();
            fired.push("RoundStarted");
        }

        if wanted("InteractingDoor") {
            self.player.interacting_door.fire(&InteractingDoorEventArgs {
                base: PlayerEventArgs { player: alice.clone() },
                door: Door {
                    name: "Door1".to_string(),
                    is_open: true,
                    tags: vec!["red".to_string(), "blue".to_string()],
                },
                is_allowed: true,
            });
            fired.push("InteractingDoor");
        }

        if wanted("SendingConsoleCommand") {
            self.player.sending_console_command.fire(&SendingConsoleCommandEventArgs {
                base: PlayerEventArgs { player: bob.clone() },
                name: "radio".to_string(),
                arguments: vec!["frequency".to_string(), "3".to_string()],
            });
            fired.push("SendingConsoleCommand");
        }

        if wanted("Hurting") {
            alice.position = Position {
                x: 12.5,
                y: 1.0,
                z: -40.25,
            };
            // Alice dropped mid-event: her health getter fails
            alice.connected = false;
            self.player.hurting.fire(&HurtingEventArgs {
                base: PlayerEventArgs { player: alice },
                attacker: Some(bob),
                amount: 35.0,
                damage_type: DamageType::Firearm,
                is_allowed: true,
            });
            fired.push("Hurting");
        }

        if wanted("RespawningTeam") {
            self.server.respawning_team.fire(&RespawningTeamEventArgs {
                players: vec!["Carol".to_string(), "Dave".to_string(), "Erin".to_string()],
                maximum_respawn_amount: 8,
                next_known_team: Team::NineTailedFox,
                is_allowed: true,
            });
            fired.push("RespawningTeam");
        }

        if wanted("Detonated") {
            self.warhead.detonated.fire();
            fired.push("Detonated");
        }

        if wanted("Heartbeat") {
            self.heartbeat.fire();
            fired.push("Heartbeat");
        }

        fired
    }
}
