//! On-board three-axis accelerometer, modeled as the I2C register file of an
//! MMA8452Q-class part.

use crate::error::HardwareError;

pub const WHO_AM_I_VALUE: u8 = 0x2A;
const SAMPLE_FULL_SCALE: f32 = 2048.0;
const SAMPLE_MIN: i32 = -2048;
const SAMPLE_MAX: i32 = 2047;
const CTRL_REG1_ACTIVE: u8 = 0x01;

/// Register addresses understood by the emulated part.
pub mod reg {
    pub const STATUS: u8 = 0x00;
    pub const OUT_X_MSB: u8 = 0x01;
    pub const OUT_X_LSB: u8 = 0x02;
    pub const OUT_Y_MSB: u8 = 0x03;
    pub const OUT_Y_LSB: u8 = 0x04;
    pub const OUT_Z_MSB: u8 = 0x05;
    pub const OUT_Z_LSB: u8 = 0x06;
    pub const SYSMOD: u8 = 0x0B;
    pub const WHO_AM_I: u8 = 0x0D;
    pub const XYZ_DATA_CFG: u8 = 0x0E;
    pub const CTRL_REG1: u8 = 0x2A;
}

/// Whether the next bus write selects a register or writes data to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    SetCommTarget,
    SetData,
}

/// Full-scale range selector (`XYZ_DATA_CFG` bits 0-1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccelRange {
    #[default]
    G2,
    G4,
    G8,
}

impl AccelRange {
    /// Value 3 is reserved on the part and rejected.
    pub fn from_bits(bits: u8) -> Result<Self, HardwareError> {
        match bits {
            0 => Ok(AccelRange::G2),
            1 => Ok(AccelRange::G4),
            2 => Ok(AccelRange::G8),
            other => Err(HardwareError::value("accelerometer range", other, 2)),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            AccelRange::G2 => 0,
            AccelRange::G4 => 1,
            AccelRange::G8 => 2,
        }
    }

    pub fn full_scale_g(self) -> f32 {
        match self {
            AccelRange::G2 => 2.0,
            AccelRange::G4 => 4.0,
            AccelRange::G8 => 8.0,
        }
    }

    /// Converts a left-justified 12-bit two's-complement sample pair to g.
    pub fn to_g(self, msb: u8, lsb: u8) -> f32 {
        let word = i16::from_be_bytes([msb, lsb]) >> 4;
        f32::from(word) * self.full_scale_g() / SAMPLE_FULL_SCALE
    }

    /// Inverse of [`AccelRange::to_g`]; saturates outside the full-scale range.
    pub fn from_g(self, g: f32) -> (u8, u8) {
        let counts = (g * SAMPLE_FULL_SCALE / self.full_scale_g()).round() as i32;
        let counts = counts.clamp(SAMPLE_MIN, SAMPLE_MAX) as i16;
        let [msb, lsb] = (counts << 4).to_be_bytes();
        (msb, lsb)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accelerometer {
    control_mode: ControlMode,
    comm_target_reg: u8,
    active: bool,
    range: AccelRange,
    x_accel: f32,
    y_accel: f32,
    z_accel: f32,
}

impl Accelerometer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode;
    }

    pub fn comm_target_reg(&self) -> u8 {
        self.comm_target_reg
    }

    pub fn set_comm_target_reg(&mut self, reg: u8) {
        self.comm_target_reg = reg;
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn range(&self) -> AccelRange {
        self.range
    }

    pub fn set_range(&mut self, range: AccelRange) {
        self.range = range;
    }

    pub fn x_accel(&self) -> f32 {
        self.x_accel
    }

    pub fn set_x_accel(&mut self, g: f32) {
        self.x_accel = g;
    }

    pub fn y_accel(&self) -> f32 {
        self.y_accel
    }

    pub fn set_y_accel(&mut self, g: f32) {
        self.y_accel = g;
    }

    pub fn z_accel(&self) -> f32 {
        self.z_accel
    }

    pub fn set_z_accel(&mut self, g: f32) {
        self.z_accel = g;
    }

    pub fn convert_to_g(&self, msb: u8, lsb: u8) -> f32 {
        self.range.to_g(msb, lsb)
    }

    pub fn convert_from_g(&self, g: f32) -> (u8, u8) {
        self.range.from_g(g)
    }

    /// Reads a register of the emulated part. Unmodeled registers read as zero.
    pub fn read_register(&self, register: u8) -> u8 {
        match register {
            reg::OUT_X_MSB => self.range.from_g(self.x_accel).0,
            reg::OUT_X_LSB => self.range.from_g(self.x_accel).1,
            reg::OUT_Y_MSB => self.range.from_g(self.y_accel).0,
            reg::OUT_Y_LSB => self.range.from_g(self.y_accel).1,
            reg::OUT_Z_MSB => self.range.from_g(self.z_accel).0,
            reg::OUT_Z_LSB => self.range.from_g(self.z_accel).1,
            reg::SYSMOD => u8::from(self.active),
            reg::WHO_AM_I => WHO_AM_I_VALUE,
            reg::XYZ_DATA_CFG => self.range.bits(),
            reg::CTRL_REG1 => if self.active { CTRL_REG1_ACTIVE } else { 0 },
            _ => 0,
        }
    }

    /// Writes a register of the emulated part. Writes to unmodeled registers are ignored.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), HardwareError> {
        match register {
            reg::XYZ_DATA_CFG => self.range = AccelRange::from_bits(value & 0b11)?,
            reg::CTRL_REG1 => self.active = value & CTRL_REG1_ACTIVE != 0,
            _ => {}
        }
        Ok(())
    }

    /// One byte written over the bus: selects the target register or writes
    /// to it, depending on the control mode.
    pub fn bus_write(&mut self, byte: u8) -> Result<(), HardwareError> {
        match self.control_mode {
            ControlMode::SetCommTarget => {
                self.comm_target_reg = byte;
                Ok(())
            }
            ControlMode::SetData => self.write_register(self.comm_target_reg, byte),
        }
    }

    /// One byte read over the bus from the current target register.
    pub fn bus_read(&self) -> u8 {
        self.read_register(self.comm_target_reg)
    }
}
