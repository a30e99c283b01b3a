use super::pwm::{PwmMxp, PwmSystem};
use crate::channel::{channel_index, Channel, ChannelArray};
use bilge::prelude::*;
use serde::{Deserialize, Serialize};

pub const NUM_DIGITAL_HEADERS: usize = 10;
pub const NUM_DIGITAL_MXP_CHANNELS: usize = 16;
pub const NUM_DIGITAL_PWM_OUTPUTS: usize = 6;

channel_index!(
    /// Digital I/O header on the base board.
    DigitalHeader,
    "digital header",
    NUM_DIGITAL_HEADERS
);

channel_index!(
    /// Digital channel on the MXP expansion port.
    DigitalMxp,
    "digital mxp",
    NUM_DIGITAL_MXP_CHANNELS
);

channel_index!(
    /// Digital PWM generator.
    DigitalPwm,
    "digital pwm",
    NUM_DIGITAL_PWM_OUTPUTS
);

/// One bit per header and per MXP channel. Shared layout of the output,
/// output-enable, input and pulse words.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct DioWord {
    pub headers: u10,
    pub mxp: u16,
    pub reserved: u6,
}

impl DioWord {
    pub fn header(&self, channel: DigitalHeader) -> bool {
        self.headers().value() & (1 << channel.index()) != 0
    }

    pub fn set_header(&mut self, channel: DigitalHeader, on: bool) {
        let bits = set_bit(self.headers().value(), channel.index(), on);
        self.set_headers(u10::new(bits));
    }

    pub fn mxp_bit(&self, channel: DigitalMxp) -> bool {
        self.mxp() & (1 << channel.index()) != 0
    }

    pub fn set_mxp_bit(&mut self, channel: DigitalMxp, on: bool) {
        let bits = set_bit(self.mxp(), channel.index(), on);
        self.set_mxp(bits);
    }
}

fn set_bit(bits: u16, index: usize, on: bool) -> u16 {
    if on {
        bits | (1 << index)
    } else {
        bits & !(1 << index)
    }
}

/// How an MXP channel is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MxpConfig {
    DigitalInput,
    DigitalOutput,
    /// The pin is handed to a special function (PWM, SPI, I2C, UART).
    SpecialFunction,
}

/// Visible state of one MXP channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MxpData {
    pub config: MxpConfig,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigitalSystem {
    outputs: DioWord,
    enabled_outputs: DioWord,
    pulses: DioWord,
    inputs: DioWord,
    mxp_special_functions_enabled: u16,
    pulse_length: u8,
    pwm: ChannelArray<DigitalPwm, u8, NUM_DIGITAL_PWM_OUTPUTS>,
}

impl Default for DigitalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalSystem {
    pub fn new() -> Self {
        Self {
            outputs: DioWord::from(0u32),
            enabled_outputs: DioWord::from(0u32),
            pulses: DioWord::from(0u32),
            inputs: DioWord::from(0u32),
            mxp_special_functions_enabled: 0,
            pulse_length: 0,
            pwm: ChannelArray::default(),
        }
    }

    pub fn outputs(&self) -> DioWord {
        self.outputs
    }

    pub fn set_outputs(&mut self, outputs: DioWord) {
        self.outputs = outputs;
    }

    pub fn enabled_outputs(&self) -> DioWord {
        self.enabled_outputs
    }

    pub fn set_enabled_outputs(&mut self, enabled: DioWord) {
        self.enabled_outputs = enabled;
    }

    pub fn pulses(&self) -> DioWord {
        self.pulses
    }

    pub fn set_pulses(&mut self, pulses: DioWord) {
        self.pulses = pulses;
    }

    pub fn inputs(&self) -> DioWord {
        self.inputs
    }

    pub fn set_inputs(&mut self, inputs: DioWord) {
        self.inputs = inputs;
    }

    pub fn mxp_special_functions_enabled(&self) -> u16 {
        self.mxp_special_functions_enabled
    }

    pub fn set_mxp_special_functions_enabled(&mut self, mask: u16) {
        self.mxp_special_functions_enabled = mask;
    }

    pub fn pulse_length(&self) -> u8 {
        self.pulse_length
    }

    pub fn set_pulse_length(&mut self, length: u8) {
        self.pulse_length = length;
    }

    pub fn pwm_duty_cycle(&self, channel: DigitalPwm) -> u8 {
        self.pwm[channel]
    }

    pub fn set_pwm_duty_cycle(&mut self, channel: DigitalPwm, duty_cycle: u8) {
        self.pwm[channel] = duty_cycle;
    }

    /// Level seen on a header: the driven output when the pin is an output,
    /// the external input otherwise.
    pub fn header_level(&self, channel: DigitalHeader) -> bool {
        if self.enabled_outputs.header(channel) {
            self.outputs.header(channel)
        } else {
            self.inputs.header(channel)
        }
    }

    pub fn mxp_config(&self, channel: DigitalMxp) -> MxpConfig {
        if self.mxp_special_functions_enabled & (1 << channel.index()) != 0 {
            MxpConfig::SpecialFunction
        } else if self.enabled_outputs.mxp_bit(channel) {
            MxpConfig::DigitalOutput
        } else {
            MxpConfig::DigitalInput
        }
    }

    /// Derives the visible state of an MXP channel. Special-function pins that
    /// carry a PWM report its duty cycle as a fraction of full scale.
    pub fn mxp_data(&self, channel: DigitalMxp, pwm: &PwmSystem) -> MxpData {
        let config = self.mxp_config(channel);
        let value = match config {
            MxpConfig::DigitalOutput => bool_level(self.outputs.mxp_bit(channel)),
            MxpConfig::DigitalInput => bool_level(self.inputs.mxp_bit(channel)),
            MxpConfig::SpecialFunction => match PwmMxp::new(channel.index()) {
                Ok(pwm_channel) => f64::from(pwm.mxp_duty_cycle(pwm_channel)) / f64::from(u16::MAX),
                Err(_) => 0.0,
            },
        };
        MxpData { config, value }
    }
}

fn bool_level(level: bool) -> f64 {
    if level {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_level_follows_direction() {
        let mut dio = DigitalSystem::new();
        let header = DigitalHeader::new(7).unwrap();

        let mut inputs = dio.inputs();
        inputs.set_header(header, true);
        dio.set_inputs(inputs);
        assert!(dio.header_level(header));

        let mut enabled = dio.enabled_outputs();
        enabled.set_header(header, true);
        dio.set_enabled_outputs(enabled);
        assert!(!dio.header_level(header));
    }

    #[test]
    fn test_dio_word_layout() {
        let mut word = DioWord::from(0u32);
        word.set_header(DigitalHeader::new(9).unwrap(), true);
        word.set_mxp_bit(DigitalMxp::new(0).unwrap(), true);
        assert_eq!(u32::from(word), (1 << 9) | (1 << 10));
    }

    #[test]
    fn test_mxp_special_function_reads_pwm() {
        let mut dio = DigitalSystem::new();
        let mut pwm = PwmSystem::new();
        dio.set_mxp_special_functions_enabled(0b1);
        pwm.set_mxp_duty_cycle(PwmMxp::new(0).unwrap(), u16::MAX);

        let data = dio.mxp_data(DigitalMxp::new(0).unwrap(), &pwm);
        assert_eq!(data.config, MxpConfig::SpecialFunction);
        assert!((data.value - 1.0).abs() < f64::EPSILON);

        let data = dio.mxp_data(DigitalMxp::new(12).unwrap(), &pwm);
        assert_eq!(data.config, MxpConfig::DigitalInput);
        assert_eq!(data.value, 0.0);
    }
}
