//! Counter and quadrature encoder register blocks.
//!
//! Both share the output and timer word layouts; they differ in how their
//! input sources are configured.

use crate::channel::{channel_index, ChannelArray};
use crate::error::HardwareError;
use bilge::prelude::*;

pub const NUM_COUNTERS: usize = 8;
pub const NUM_ENCODERS: usize = 8;

const OUTPUT_VALUE_MIN: i32 = -(1 << 30);
const OUTPUT_VALUE_MAX: i32 = (1 << 30) - 1;

channel_index!(CounterIndex, "counter", NUM_COUNTERS);
channel_index!(EncoderIndex, "encoder", NUM_ENCODERS);

/// Count output: a direction bit plus a 31-bit signed count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadratureOutput {
    direction: bool,
    value: i32,
}

impl QuadratureOutput {
    /// Rejects counts that do not fit in 31 signed bits.
    pub fn new(direction: bool, value: i32) -> Result<Self, HardwareError> {
        if !(OUTPUT_VALUE_MIN..=OUTPUT_VALUE_MAX).contains(&value) {
            return Err(HardwareError::value("quadrature count", value, OUTPUT_VALUE_MAX));
        }
        Ok(Self { direction, value })
    }

    pub fn direction(&self) -> bool {
        self.direction
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Bit 0 is the direction; bits 1-31 hold the count.
    pub fn to_raw(self) -> u32 {
        ((self.value as u32) << 1) | u32::from(self.direction)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn from_raw(raw: u32) -> Self {
        Self {
            direction: raw & 1 != 0,
            // arithmetic shift restores the sign of the 31-bit field
            value: (raw as i32) >> 1,
        }
    }
}

/// Period measurement output.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerOutput {
    pub period: u23,
    pub count: u8,
    pub stalled: bool,
}

#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerConfig {
    pub stall_period: u24,
    pub average_size: u7,
    pub update_when_empty: bool,
}

#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterConfig {
    pub up_source_channel: u4,
    pub up_source_analog_trigger: bool,
    pub up_rising_edge: bool,
    pub up_falling_edge: bool,
    pub down_source_channel: u4,
    pub down_source_analog_trigger: bool,
    pub down_rising_edge: bool,
    pub down_falling_edge: bool,
    pub mode: u2,
    pub pulse_length_threshold: u6,
    pub enable: bool,
    pub reserved: u9,
}

#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    pub a_source_channel: u4,
    pub a_source_analog_trigger: bool,
    pub b_source_channel: u4,
    pub b_source_analog_trigger: bool,
    pub index_source_channel: u4,
    pub index_source_analog_trigger: bool,
    pub index_active_high: bool,
    pub index_edge_sensitive: bool,
    pub reverse_direction: bool,
    pub enable: bool,
    pub reserved: u13,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub output: QuadratureOutput,
    pub config: CounterConfig,
    pub timer_output: TimerOutput,
    pub timer_config: TimerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    pub output: QuadratureOutput,
    pub config: EncoderConfig,
    pub timer_output: TimerOutput,
    pub timer_config: TimerConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counters {
    counters: ChannelArray<CounterIndex, Counter, NUM_COUNTERS>,
}

impl Counters {
    pub fn get(&self, index: CounterIndex) -> &Counter {
        &self.counters[index]
    }

    pub fn get_mut(&mut self, index: CounterIndex) -> &mut Counter {
        &mut self.counters[index]
    }

    pub fn output(&self, index: CounterIndex) -> QuadratureOutput {
        self.counters[index].output
    }

    pub fn set_output(&mut self, index: CounterIndex, output: QuadratureOutput) {
        self.counters[index].output = output;
    }

    pub fn config(&self, index: CounterIndex) -> CounterConfig {
        self.counters[index].config
    }

    pub fn set_config(&mut self, index: CounterIndex, config: CounterConfig) {
        self.counters[index].config = config;
    }

    pub fn timer_output(&self, index: CounterIndex) -> TimerOutput {
        self.counters[index].timer_output
    }

    pub fn set_timer_output(&mut self, index: CounterIndex, output: TimerOutput) {
        self.counters[index].timer_output = output;
    }

    pub fn timer_config(&self, index: CounterIndex) -> TimerConfig {
        self.counters[index].timer_config
    }

    pub fn set_timer_config(&mut self, index: CounterIndex, config: TimerConfig) {
        self.counters[index].timer_config = config;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoders {
    encoders: ChannelArray<EncoderIndex, Encoder, NUM_ENCODERS>,
}

impl Encoders {
    pub fn get(&self, index: EncoderIndex) -> &Encoder {
        &self.encoders[index]
    }

    pub fn get_mut(&mut self, index: EncoderIndex) -> &mut Encoder {
        &mut self.encoders[index]
    }

    pub fn output(&self, index: EncoderIndex) -> QuadratureOutput {
        self.encoders[index].output
    }

    pub fn set_output(&mut self, index: EncoderIndex, output: QuadratureOutput) {
        self.encoders[index].output = output;
    }

    pub fn config(&self, index: EncoderIndex) -> EncoderConfig {
        self.encoders[index].config
    }

    pub fn set_config(&mut self, index: EncoderIndex, config: EncoderConfig) {
        self.encoders[index].config = config;
    }

    pub fn timer_output(&self, index: EncoderIndex) -> TimerOutput {
        self.encoders[index].timer_output
    }

    pub fn set_timer_output(&mut self, index: EncoderIndex, output: TimerOutput) {
        self.encoders[index].timer_output = output;
    }

    pub fn timer_config(&self, index: EncoderIndex) -> TimerConfig {
        self.encoders[index].timer_config
    }

    pub fn set_timer_config(&mut self, index: EncoderIndex, config: TimerConfig) {
        self.encoders[index].timer_config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[test]
    fn test_quadrature_output_raw_round_trip() {
        for value in [0, 1, -1, OUTPUT_VALUE_MAX, OUTPUT_VALUE_MIN] {
            let output = QuadratureOutput::new(true, value).unwrap();
            assert_eq!(QuadratureOutput::from_raw(output.to_raw()), output);
        }
    }

    #[test]
    fn test_quadrature_output_rejects_wide_counts() {
        assert!(QuadratureOutput::new(false, OUTPUT_VALUE_MAX + 1).is_err());
        assert!(QuadratureOutput::new(false, OUTPUT_VALUE_MIN - 1).is_err());
    }

    #[test]
    fn test_timer_output_layout() {
        let mut timer = TimerOutput::from(0u32);
        timer.set_period(u23::new(0x7F_FFFF));
        timer.set_count(0x12);
        timer.set_stalled(true);
        assert_eq!(u32::from(timer), 0x7F_FFFF | (0x12 << 23) | (1 << 31));
    }

    #[test]
    fn test_encoders_are_independent() {
        let mut encoders = Encoders::default();
        let a = EncoderIndex::new(0).unwrap();
        let b = EncoderIndex::new(7).unwrap();
        encoders.set_output(a, QuadratureOutput::new(true, -42).unwrap());
        assert_eq!(encoders.output(a).value(), -42);
        assert_eq!(encoders.output(b), QuadratureOutput::default());
    }
}
