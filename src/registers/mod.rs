pub mod accelerometer;
pub mod analog;
pub mod can;
pub mod counter;
pub mod digital;
pub mod joystick;
pub mod match_info;
pub mod net_comm;
pub mod power;
pub mod pwm;
pub mod relay;
pub mod spi;

pub use accelerometer::{AccelRange, Accelerometer, ControlMode};
pub use analog::{
    Accumulator, Accumulators, AnalogConfig, AnalogInput, AnalogInputChannel, AnalogInputs, AnalogOutputChannel,
    AnalogOutputs, ReadSelect,
};
pub use can::{CanBus, CanId, CanMessage, CanMotorController, CanMotorControllers, MotorControllerKind};
pub use counter::{
    Counter, CounterConfig, CounterIndex, Counters, Encoder, EncoderConfig, EncoderIndex, Encoders, QuadratureOutput,
    TimerConfig, TimerOutput,
};
pub use digital::{DigitalHeader, DigitalMxp, DigitalPwm, DigitalSystem, DioWord, MxpConfig, MxpData};
pub use joystick::{Joystick, JoystickParseError, JoystickPort, Joysticks};
pub use match_info::{AllianceStation, ControlWord, DsError, Global, MatchInfo, MatchType, Mode, RobotMode};
pub use net_comm::{NetComm, OccurHook};
pub use power::{Power, RailFaultCounts, RailFlags, SysWatchdog, WatchdogStatus};
pub use pwm::{PeriodScale, Pwm, PwmConfig, PwmHeader, PwmMxp, PwmSystem};
pub use relay::{RelayHeader, RelayState, RelaySystem, RelayValue};
pub use spi::{AutoByteCount, AutoTriggerConfig, ChipSelectActiveHigh, SpiSystem};

use bitflags::bitflags;

bitflags! {
    /// A set of register blocks, used to track which ones were written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Blocks: u32 {
        const ACCELEROMETER = 1 << 0;
        const ACCUMULATORS = 1 << 1;
        const ANALOG_INPUTS = 1 << 2;
        const ANALOG_OUTPUTS = 1 << 3;
        const CAN_BUS = 1 << 4;
        const CAN_MOTOR_CONTROLLERS = 1 << 5;
        const COUNTERS = 1 << 6;
        const DIGITAL = 1 << 7;
        const ENCODERS = 1 << 8;
        const GLOBAL = 1 << 9;
        const JOYSTICKS = 1 << 10;
        const MATCH_INFO = 1 << 11;
        const POWER = 1 << 12;
        const PWM = 1 << 13;
        const RELAY = 1 << 14;
        const ROBOT_MODE = 1 << 15;
        const SPI = 1 << 16;
        const WATCHDOG = 1 << 17;
        const USER_BUTTON = 1 << 18;
        const NET_COMM = 1 << 19;
    }
}
