//! Driver-station facing state: match data, the robot mode word and the
//! FPGA clock.

use crate::error::HardwareError;
use arrayvec::ArrayString;
use bilge::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_MATCH_STRING_LEN: usize = 64;
pub const MAX_DS_ERRORS: usize = 64;

pub type MatchString = ArrayString<MAX_MATCH_STRING_LEN>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchType {
    #[default]
    None,
    Practice,
    Qualification,
    Elimination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllianceStation {
    #[default]
    Red1,
    Red2,
    Red3,
    Blue1,
    Blue2,
    Blue3,
}

/// An error or warning the robot program reported to the driver station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsError {
    pub is_error: bool,
    pub error_code: i32,
    pub details: String,
    pub location: String,
    pub call_stack: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchInfo {
    event_name: MatchString,
    game_specific_message: MatchString,
    match_type: MatchType,
    match_number: u16,
    replay_number: u8,
    alliance_station: AllianceStation,
    match_time: f64,
    ds_errors: Vec<DsError>,
}

fn match_string(field: &'static str, value: &str) -> Result<MatchString, HardwareError> {
    MatchString::from(value).map_err(|_| HardwareError::length(field, value.len(), MAX_MATCH_STRING_LEN))
}

impl MatchInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Names longer than [`MAX_MATCH_STRING_LEN`] bytes are rejected.
    pub fn set_event_name(&mut self, name: &str) -> Result<(), HardwareError> {
        self.event_name = match_string("event name", name)?;
        Ok(())
    }

    pub fn game_specific_message(&self) -> &str {
        &self.game_specific_message
    }

    pub fn set_game_specific_message(&mut self, message: &str) -> Result<(), HardwareError> {
        self.game_specific_message = match_string("game specific message", message)?;
        Ok(())
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn set_match_type(&mut self, match_type: MatchType) {
        self.match_type = match_type;
    }

    pub fn match_number(&self) -> u16 {
        self.match_number
    }

    pub fn set_match_number(&mut self, number: u16) {
        self.match_number = number;
    }

    pub fn replay_number(&self) -> u8 {
        self.replay_number
    }

    pub fn set_replay_number(&mut self, number: u8) {
        self.replay_number = number;
    }

    pub fn alliance_station(&self) -> AllianceStation {
        self.alliance_station
    }

    pub fn set_alliance_station(&mut self, station: AllianceStation) {
        self.alliance_station = station;
    }

    pub fn match_time(&self) -> f64 {
        self.match_time
    }

    pub fn set_match_time(&mut self, seconds: f64) {
        self.match_time = seconds;
    }

    pub fn ds_errors(&self) -> &[DsError] {
        &self.ds_errors
    }

    /// Appends to the error log, dropping the oldest entry once it is full.
    pub fn report_error(&mut self, error: DsError) {
        if self.ds_errors.len() >= MAX_DS_ERRORS {
            self.ds_errors.remove(0);
        }
        self.ds_errors.push(error);
    }

    pub fn clear_errors(&mut self) {
        self.ds_errors.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    Autonomous,
    #[default]
    Teleoperated,
    Test,
}

/// Control word handed to the robot program, one bit per mode flag.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlWord {
    pub enabled: bool,
    pub autonomous: bool,
    pub test: bool,
    pub e_stop: bool,
    pub fms_attached: bool,
    pub ds_attached: bool,
    pub reserved: u26,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RobotMode {
    mode: Mode,
    enabled: bool,
    emergency_stopped: bool,
    fms_attached: bool,
    ds_attached: bool,
}

impl RobotMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn emergency_stopped(&self) -> bool {
        self.emergency_stopped
    }

    pub fn set_emergency_stopped(&mut self, stopped: bool) {
        self.emergency_stopped = stopped;
    }

    pub fn fms_attached(&self) -> bool {
        self.fms_attached
    }

    pub fn set_fms_attached(&mut self, attached: bool) {
        self.fms_attached = attached;
    }

    pub fn ds_attached(&self) -> bool {
        self.ds_attached
    }

    pub fn set_ds_attached(&mut self, attached: bool) {
        self.ds_attached = attached;
    }

    pub fn control_word(&self) -> ControlWord {
        let mut word = ControlWord::from(0u32);
        word.set_enabled(self.enabled);
        word.set_autonomous(self.mode == Mode::Autonomous);
        word.set_test(self.mode == Mode::Test);
        word.set_e_stop(self.emergency_stopped);
        word.set_fms_attached(self.fms_attached);
        word.set_ds_attached(self.ds_attached);
        word
    }
}

/// FPGA clock, counted in microseconds from controller start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Global {
    fpga_start_time_us: u64,
}

impl Default for Global {
    fn default() -> Self {
        Self::new()
    }
}

impl Global {
    pub fn new() -> Self {
        Self {
            fpga_start_time_us: Self::current_time_us(),
        }
    }

    pub fn fpga_start_time_us(&self) -> u64 {
        self.fpga_start_time_us
    }

    pub fn fpga_time_us(&self) -> u64 {
        Self::current_time_us().saturating_sub(self.fpga_start_time_us)
    }

    /// Wall-clock microseconds since the Unix epoch.
    pub fn current_time_us() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}
