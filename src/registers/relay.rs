use crate::channel::{channel_index, Channel};
use bilge::prelude::*;
use serde::{Deserialize, Serialize};

pub const NUM_RELAY_HEADERS: usize = 4;

channel_index!(
    /// Relay header on the base board.
    RelayHeader,
    "relay header",
    NUM_RELAY_HEADERS
);

/// Raw relay word: one forward and one reverse bit per header.
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayValue {
    pub forward: u4,
    pub reverse: u4,
}

/// Classified output of one relay header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayState {
    Off,
    Reverse,
    Forward,
    /// Forward and reverse asserted together.
    Error,
}

impl RelayState {
    pub fn from_bits(forward: bool, reverse: bool) -> Self {
        match (forward, reverse) {
            (false, false) => RelayState::Off,
            (true, false) => RelayState::Forward,
            (false, true) => RelayState::Reverse,
            (true, true) => RelayState::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelayState::Off => "OFF",
            RelayState::Reverse => "REVERSE",
            RelayState::Forward => "FORWARD",
            RelayState::Error => "ERROR",
        }
    }
}

impl core::fmt::Display for RelayState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelaySystem {
    value: RelayValue,
}

impl RelaySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> RelayValue {
        self.value
    }

    pub fn set_value(&mut self, value: RelayValue) {
        self.value = value;
    }

    pub fn forward(&self, header: RelayHeader) -> bool {
        self.value.forward().value() & (1 << header.index()) != 0
    }

    pub fn reverse(&self, header: RelayHeader) -> bool {
        self.value.reverse().value() & (1 << header.index()) != 0
    }

    pub fn set_forward(&mut self, header: RelayHeader, on: bool) {
        let bits = toggle(self.value.forward().value(), header.index(), on);
        self.value.set_forward(u4::new(bits));
    }

    pub fn set_reverse(&mut self, header: RelayHeader, on: bool) {
        let bits = toggle(self.value.reverse().value(), header.index(), on);
        self.value.set_reverse(u4::new(bits));
    }

    pub fn state(&self, header: RelayHeader) -> RelayState {
        RelayState::from_bits(self.forward(header), self.reverse(header))
    }
}

fn toggle(bits: u8, index: usize, on: bool) -> u8 {
    if on {
        bits | (1 << index)
    } else {
        bits & !(1 << index)
    }
}
