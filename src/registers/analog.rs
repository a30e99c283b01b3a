use crate::channel::{channel_index, ChannelArray};
use crate::error::{check_width, HardwareError};
use bilge::prelude::*;

pub const NUM_ANALOG_INPUTS: usize = 8;
pub const NUM_ANALOG_OUTPUTS: usize = 2;
/// Samples retained per analog input; older samples fall off the front.
pub const MAX_VALUE_HISTORY: usize = 64;
pub const MAX_ANALOG_OUTPUT: u16 = 0x0FFF;
const ANALOG_OUTPUT_FULL_SCALE_V: f64 = 5.0;

channel_index!(
    /// One of the eight on-board analog input lines.
    AnalogInputChannel,
    "analog input",
    NUM_ANALOG_INPUTS
);

channel_index!(
    /// One of the two MXP analog outputs.
    AnalogOutputChannel,
    "analog output",
    NUM_ANALOG_OUTPUTS
);

/// Analog input system configuration word.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalogConfig {
    pub scan_size: u3,
    pub convert_rate: u26,
    pub reserved: u3,
}

/// Selects which analog input a read targets.
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSelect {
    pub channel: u3,
    pub averaged: bool,
    pub reserved: u4,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogInput {
    /// History keeps `2^(oversample_bits + average_bits)` samples on hardware.
    pub oversample_bits: u8,
    /// Averaging uses `2^average_bits` samples.
    pub average_bits: u8,
    pub scan_list: u8,
    values: heapless::Vec<i32, MAX_VALUE_HISTORY>,
}

impl AnalogInput {
    /// Sample history, most recent last.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn latest(&self) -> Option<i32> {
        self.values.last().copied()
    }

    fn set_values(&mut self, values: &[i32]) {
        let keep = &values[values.len().saturating_sub(MAX_VALUE_HISTORY)..];
        self.values.clear();
        // `keep` never exceeds capacity
        let _ = self.values.extend_from_slice(keep);
    }

    fn push_value(&mut self, value: i32) {
        if self.values.is_full() {
            self.values.remove(0);
        }
        let _ = self.values.push(value);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogInputs {
    inputs: ChannelArray<AnalogInputChannel, AnalogInput, NUM_ANALOG_INPUTS>,
    config: AnalogConfig,
    read_select: ReadSelect,
}

impl AnalogInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> AnalogConfig {
        self.config
    }

    pub fn set_config(&mut self, config: AnalogConfig) {
        self.config = config;
    }

    pub fn read_select(&self) -> ReadSelect {
        self.read_select
    }

    pub fn set_read_select(&mut self, read_select: ReadSelect) {
        self.read_select = read_select;
    }

    /// The input addressed by the current read select word.
    pub fn selected_channel(&self) -> AnalogInputChannel {
        // a 3-bit channel field always addresses one of the eight inputs
        AnalogInputChannel(self.read_select.channel().value())
    }

    pub fn input(&self, channel: AnalogInputChannel) -> &AnalogInput {
        &self.inputs[channel]
    }

    pub fn oversample_bits(&self, channel: AnalogInputChannel) -> u8 {
        self.inputs[channel].oversample_bits
    }

    pub fn set_oversample_bits(&mut self, channel: AnalogInputChannel, bits: u8) {
        self.inputs[channel].oversample_bits = bits;
    }

    pub fn average_bits(&self, channel: AnalogInputChannel) -> u8 {
        self.inputs[channel].average_bits
    }

    pub fn set_average_bits(&mut self, channel: AnalogInputChannel, bits: u8) {
        self.inputs[channel].average_bits = bits;
    }

    pub fn scan_list(&self, channel: AnalogInputChannel) -> u8 {
        self.inputs[channel].scan_list
    }

    pub fn set_scan_list(&mut self, channel: AnalogInputChannel, scan_list: u8) {
        self.inputs[channel].scan_list = scan_list;
    }

    pub fn values(&self, channel: AnalogInputChannel) -> &[i32] {
        self.inputs[channel].values()
    }

    /// Replaces the sample history. Only the newest [`MAX_VALUE_HISTORY`] samples are kept.
    pub fn set_values(&mut self, channel: AnalogInputChannel, values: &[i32]) {
        self.inputs[channel].set_values(values);
    }

    pub fn push_value(&mut self, channel: AnalogInputChannel, value: i32) {
        self.inputs[channel].push_value(value);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogOutputs {
    mxp_outputs: ChannelArray<AnalogOutputChannel, u16, NUM_ANALOG_OUTPUTS>,
}

impl AnalogOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mxp_output(&self, channel: AnalogOutputChannel) -> u16 {
        self.mxp_outputs[channel]
    }

    /// Writes a 12-bit output value; wider values are rejected.
    pub fn set_mxp_output(&mut self, channel: AnalogOutputChannel, value: u16) -> Result<(), HardwareError> {
        self.mxp_outputs[channel] = check_width("analog output", value, MAX_ANALOG_OUTPUT)?;
        Ok(())
    }

    pub fn voltage(&self, channel: AnalogOutputChannel) -> f64 {
        Self::raw_to_voltage(self.mxp_outputs[channel])
    }

    pub fn raw_to_voltage(raw: u16) -> f64 {
        f64::from(raw) * ANALOG_OUTPUT_FULL_SCALE_V / f64::from(MAX_ANALOG_OUTPUT + 1)
    }
}

/// Integrating accumulator attached to an analog input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub value: i64,
    pub count: u32,
    pub center: i32,
    pub deadband: i32,
}

impl Accumulator {
    /// Folds one raw sample in, honoring center and deadband.
    pub fn accumulate(&mut self, sample: i32) {
        let offset = i64::from(sample) - i64::from(self.center);
        if offset.abs() > i64::from(self.deadband) {
            self.value = self.value.wrapping_add(offset);
        }
        self.count = self.count.wrapping_add(1);
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.count = 0;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    accumulators: ChannelArray<AnalogInputChannel, Accumulator, NUM_ANALOG_INPUTS>,
}

impl Accumulators {
    pub fn get(&self, channel: AnalogInputChannel) -> Accumulator {
        self.accumulators[channel]
    }

    pub fn get_mut(&mut self, channel: AnalogInputChannel) -> &mut Accumulator {
        &mut self.accumulators[channel]
    }

    pub fn set(&mut self, channel: AnalogInputChannel, accumulator: Accumulator) {
        self.accumulators[channel] = accumulator;
    }
}
