use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod payload;

/// Initialize logging with the given default level. Respects `RUST_LOG`
/// overrides.
pub fn init_logging(default_level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}

/// Out-of-domain screen or state values, rejected before any payload is
/// built. Always recoverable: surfaced to the caller, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid screen id {0}: valid screens are 1 and 2")]
    InvalidScreen(u8),
    #[error("invalid tally state {0:?}: valid states are off, rouge, vert, jaune")]
    InvalidState(String),
}

/// A screen position on a bandeau. The RM209 addresses exactly two screens
/// per bandeau; the id travels inside the payload header, not the network
/// address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Screen {
    One = 1,
    Two = 2,
}

impl Screen {
    pub const ALL: [Screen; 2] = [Screen::One, Screen::Two];

    /// Parse a screen id as received from the HTTP surface.
    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        Screen::try_from(id).map_err(|_| ProtocolError::InvalidScreen(id))
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// A commanded tally state. The operator-facing names are French, matching
/// the switcher-side configuration this bridge is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TallyState {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "rouge")]
    Red,
    #[serde(rename = "vert")]
    Green,
    #[serde(rename = "jaune")]
    Yellow,
}

impl TallyState {
    pub const ALL: [TallyState; 4] = [
        TallyState::Off,
        TallyState::Red,
        TallyState::Green,
        TallyState::Yellow,
    ];

    /// Protocol byte for this state, as captured from the panel vendor's
    /// own control app.
    pub fn code(self) -> u8 {
        match self {
            TallyState::Off => 0x07,
            TallyState::Red => 0x17,
            TallyState::Green => 0x27,
            TallyState::Yellow => 0x37,
        }
    }

    /// Operator-facing name, as accepted and echoed by the HTTP surface.
    pub fn name(self) -> &'static str {
        match self {
            TallyState::Off => "off",
            TallyState::Red => "rouge",
            TallyState::Green => "vert",
            TallyState::Yellow => "jaune",
        }
    }

    /// Whether this is the idle state. Idle entries are not kept alive by
    /// the refresh loop.
    pub fn is_off(self) -> bool {
        self == TallyState::Off
    }
}

impl FromStr for TallyState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(TallyState::Off),
            "rouge" => Ok(TallyState::Red),
            "vert" => Ok(TallyState::Green),
            "jaune" => Ok(TallyState::Yellow),
            _ => Err(ProtocolError::InvalidState(s.to_string())),
        }
    }
}

impl fmt::Display for TallyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
