use crate::registers::{
    Accelerometer, Accumulators, AnalogInputs, AnalogOutputs, Blocks, CanBus, CanMotorControllers, Counters,
    DigitalSystem, Encoders, Global, Joysticks, MatchInfo, NetComm, Power, PwmSystem, RelaySystem, RobotMode, SpiSystem,
    SysWatchdog,
};

/// Every register block of one emulated controller, owned by value.
///
/// Cloning yields a fully independent copy, CAN queues included. Each
/// `*_mut` accessor records the block in the dirty set whether or not the
/// caller then changes anything.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareState {
    accelerometer: Accelerometer,
    accumulators: Accumulators,
    analog_inputs: AnalogInputs,
    analog_outputs: AnalogOutputs,
    can_bus: CanBus,
    can_motor_controllers: CanMotorControllers,
    counters: Counters,
    digital: DigitalSystem,
    encoders: Encoders,
    global: Global,
    joysticks: Joysticks,
    match_info: MatchInfo,
    net_comm: NetComm,
    power: Power,
    pwm: PwmSystem,
    relay: RelaySystem,
    robot_mode: RobotMode,
    spi: SpiSystem,
    watchdog: SysWatchdog,
    user_button: bool,
    dirty: Blocks,
}

impl Default for HardwareState {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! block_accessors {
    ($($field:ident, $field_mut:ident: $ty:ty => $block:ident;)*) => {
        $(
            pub fn $field(&self) -> &$ty {
                &self.$field
            }

            pub fn $field_mut(&mut self) -> &mut $ty {
                self.dirty |= Blocks::$block;
                &mut self.$field
            }
        )*
    };
}

impl HardwareState {
    /// Rest state: outputs neutral, queues empty, teleoperated and disabled,
    /// watchdog alive. The user button line idles high.
    pub fn new() -> Self {
        Self {
            accelerometer: Accelerometer::new(),
            accumulators: Accumulators::default(),
            analog_inputs: AnalogInputs::new(),
            analog_outputs: AnalogOutputs::new(),
            can_bus: CanBus::new(),
            can_motor_controllers: CanMotorControllers::default(),
            counters: Counters::default(),
            digital: DigitalSystem::new(),
            encoders: Encoders::default(),
            global: Global::new(),
            joysticks: Joysticks::default(),
            match_info: MatchInfo::new(),
            net_comm: NetComm::new(),
            power: Power::new(),
            pwm: PwmSystem::new(),
            relay: RelaySystem::new(),
            robot_mode: RobotMode::new(),
            spi: SpiSystem::new(),
            watchdog: SysWatchdog::new(),
            user_button: true,
            dirty: Blocks::empty(),
        }
    }

    block_accessors! {
        accelerometer, accelerometer_mut: Accelerometer => ACCELEROMETER;
        accumulators, accumulators_mut: Accumulators => ACCUMULATORS;
        analog_inputs, analog_inputs_mut: AnalogInputs => ANALOG_INPUTS;
        analog_outputs, analog_outputs_mut: AnalogOutputs => ANALOG_OUTPUTS;
        can_bus, can_bus_mut: CanBus => CAN_BUS;
        can_motor_controllers, can_motor_controllers_mut: CanMotorControllers => CAN_MOTOR_CONTROLLERS;
        counters, counters_mut: Counters => COUNTERS;
        digital, digital_mut: DigitalSystem => DIGITAL;
        encoders, encoders_mut: Encoders => ENCODERS;
        global, global_mut: Global => GLOBAL;
        joysticks, joysticks_mut: Joysticks => JOYSTICKS;
        match_info, match_info_mut: MatchInfo => MATCH_INFO;
        net_comm, net_comm_mut: NetComm => NET_COMM;
        power, power_mut: Power => POWER;
        pwm, pwm_mut: PwmSystem => PWM;
        relay, relay_mut: RelaySystem => RELAY;
        robot_mode, robot_mode_mut: RobotMode => ROBOT_MODE;
        spi, spi_mut: SpiSystem => SPI;
        watchdog, watchdog_mut: SysWatchdog => WATCHDOG;
    }

    pub fn user_button(&self) -> bool {
        self.user_button
    }

    pub fn set_user_button(&mut self, pressed: bool) {
        self.dirty |= Blocks::USER_BUTTON;
        self.user_button = pressed;
    }

    /// Blocks written since their dirty bits were last taken.
    pub fn dirty(&self) -> Blocks {
        self.dirty
    }

    /// Returns the dirty bits within `mask` and clears them. Bits outside the
    /// mask are left for other consumers.
    pub fn take_dirty(&mut self, mask: Blocks) -> Blocks {
        let taken = self.dirty & mask;
        self.dirty.remove(taken);
        taken
    }

    pub fn mark_dirty(&mut self, blocks: Blocks) {
        self.dirty |= blocks;
    }
}
