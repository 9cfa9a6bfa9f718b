//! Wire protocol between server and clients.
//!
//! Clients speak a line-oriented protocol: the first line of a connection is
//! the player name, every following line is a [`Command`]. The server answers
//! with one [`Welcome`] JSON line and then one [`WorldSnapshot`] JSON line
//! per tick.

use crate::components::{Projectile, Ship, Star};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way the player wants to turn this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnIntent {
    #[default]
    None,
    Left,
    Right,
}

/// The decoded state of a client command line.
///
/// Only the most recent command matters; the server keeps one slot per
/// session and overwrites it on every received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Command {
    pub turn: TurnIntent,
    pub thrust: bool,
    pub fire: bool,
}

/// Error produced when a command line does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// The line did not have exactly three fields.
    FieldCount(usize),
    /// The turn field was not `none`, `left` or `right`.
    BadTurn(String),
    /// A flag field was not `true` or `false`.
    BadFlag(String),
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandParseError::FieldCount(n) => {
                write!(f, "expected 3 fields, got {}", n)
            }
            CommandParseError::BadTurn(s) => {
                write!(f, "invalid turn intent '{}'", s)
            }
            CommandParseError::BadFlag(s) => {
                write!(f, "invalid flag '{}'", s)
            }
        }
    }
}

impl std::error::Error for CommandParseError {}

impl FromStr for Command {
    type Err = CommandParseError;

    /// Parses a command line of the form `<none|left|right> <true|false> <true|false>`,
    /// meaning turn, thrust, fire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(CommandParseError::FieldCount(fields.len()));
        }

        let turn = match fields[0] {
            "none" => TurnIntent::None,
            "left" => TurnIntent::Left,
            "right" => TurnIntent::Right,
            other => return Err(CommandParseError::BadTurn(other.to_string())),
        };

        let parse_flag = |field: &str| {
            field
                .parse::<bool>()
                .map_err(|_| CommandParseError::BadFlag(field.to_string()))
        };

        Ok(Command {
            turn,
            thrust: parse_flag(fields[1])?,
            fire: parse_flag(fields[2])?,
        })
    }
}

/// First message sent to a client after its name is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Welcome {
    pub client_id: u32,
    pub world_size: f64,
}

/// The state of all live components at the end of a tick, broadcast to
/// every connected client as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub ships: Vec<Ship>,
    pub projectiles: Vec<Projectile>,
    pub stars: Vec<Star>,
}
