use crate::channel::{channel_index, ChannelArray};
use crate::error::{check_width, HardwareError};
use bilge::prelude::*;

pub const NUM_PWM_HEADERS: usize = 10;
pub const NUM_PWM_MXP: usize = 10;
/// FPGA loop timing the PWM generator is clocked against.
pub const EXPECTED_LOOP_TIMING: u16 = 40;
const MAX_PERIOD_SCALE: u8 = 0b11;

channel_index!(
    /// PWM header on the base board, numbered 0-9.
    PwmHeader,
    "pwm header",
    NUM_PWM_HEADERS
);

channel_index!(
    /// PWM pin on the MXP expansion port.
    PwmMxp,
    "pwm mxp",
    NUM_PWM_MXP
);

/// PWM system configuration word.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct PwmConfig {
    pub period: u16,
    pub min_high: u16,
}

/// Decoded 2-bit period scale. The scale squelches output pulses,
/// stretching the effective period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodScale {
    X1,
    X2,
    /// Bit pattern 0b10 has no defined multiplier.
    Unused,
    X4,
}

impl PeriodScale {
    pub fn from_bits(bits: u8) -> Result<Self, HardwareError> {
        match check_width("pwm period scale", bits, MAX_PERIOD_SCALE)? {
            0 => Ok(PeriodScale::X1),
            1 => Ok(PeriodScale::X2),
            2 => Ok(PeriodScale::Unused),
            _ => Ok(PeriodScale::X4),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            PeriodScale::X1 => 0,
            PeriodScale::X2 => 1,
            PeriodScale::Unused => 2,
            PeriodScale::X4 => 3,
        }
    }

    pub fn multiplier(self) -> Option<u8> {
        match self {
            PeriodScale::X1 => Some(1),
            PeriodScale::X2 => Some(2),
            PeriodScale::Unused => None,
            PeriodScale::X4 => Some(4),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pwm {
    period_scale: u8,
    duty_cycle: u16,
}

impl Pwm {
    pub fn period_scale(&self) -> u8 {
        self.period_scale
    }

    pub fn duty_cycle(&self) -> u16 {
        self.duty_cycle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PwmSystem {
    config: PwmConfig,
    hdr: ChannelArray<PwmHeader, Pwm, NUM_PWM_HEADERS>,
    mxp: ChannelArray<PwmMxp, Pwm, NUM_PWM_MXP>,
}

impl Default for PwmSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmSystem {
    pub fn new() -> Self {
        Self {
            config: PwmConfig::from(0u32),
            hdr: ChannelArray::default(),
            mxp: ChannelArray::default(),
        }
    }

    pub fn config(&self) -> PwmConfig {
        self.config
    }

    pub fn set_config(&mut self, config: PwmConfig) {
        self.config = config;
    }

    pub fn hdr(&self, channel: PwmHeader) -> Pwm {
        self.hdr[channel]
    }

    pub fn hdr_period_scale(&self, channel: PwmHeader) -> u8 {
        self.hdr[channel].period_scale
    }

    /// Period scale is a 2-bit field; values above 3 are rejected.
    pub fn set_hdr_period_scale(&mut self, channel: PwmHeader, scale: u8) -> Result<(), HardwareError> {
        self.hdr[channel].period_scale = PeriodScale::from_bits(scale)?.bits();
        Ok(())
    }

    pub fn hdr_duty_cycle(&self, channel: PwmHeader) -> u16 {
        self.hdr[channel].duty_cycle
    }

    pub fn set_hdr_duty_cycle(&mut self, channel: PwmHeader, duty_cycle: u16) {
        self.hdr[channel].duty_cycle = duty_cycle;
    }

    pub fn mxp(&self, channel: PwmMxp) -> Pwm {
        self.mxp[channel]
    }

    pub fn mxp_period_scale(&self, channel: PwmMxp) -> u8 {
        self.mxp[channel].period_scale
    }

    pub fn set_mxp_period_scale(&mut self, channel: PwmMxp, scale: u8) -> Result<(), HardwareError> {
        self.mxp[channel].period_scale = PeriodScale::from_bits(scale)?.bits();
        Ok(())
    }

    pub fn mxp_duty_cycle(&self, channel: PwmMxp) -> u16 {
        self.mxp[channel].duty_cycle
    }

    pub fn set_mxp_duty_cycle(&mut self, channel: PwmMxp, duty_cycle: u16) {
        self.mxp[channel].duty_cycle = duty_cycle;
    }

    pub fn headers(&self) -> impl Iterator<Item = (PwmHeader, &Pwm)> {
        self.hdr.iter()
    }
}
