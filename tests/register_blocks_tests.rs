use riobus::channel::Channel;
use riobus::registers::*;
use riobus::HardwareError;

fn assert_out_of_range<T: std::fmt::Debug>(result: Result<T, HardwareError>, expected_block: &str) {
    match result {
        Err(HardwareError::OutOfRange { block, index, count }) => {
            assert_eq!(block, expected_block);
            assert_eq!(index, count);
        }
        other => panic!("expected OutOfRange for {}, got {:?}", expected_block, other),
    }
}

#[test]
fn test_channel_bounds_per_block() {
    assert_out_of_range(AnalogInputChannel::new(8), "analog input");
    assert_out_of_range(AnalogOutputChannel::new(2), "analog output");
    assert_out_of_range(PwmHeader::new(10), "pwm header");
    assert_out_of_range(PwmMxp::new(10), "pwm mxp");
    assert_out_of_range(DigitalHeader::new(10), "digital header");
    assert_out_of_range(DigitalMxp::new(16), "digital mxp");
    assert_out_of_range(DigitalPwm::new(6), "digital pwm");
    assert_out_of_range(RelayHeader::new(4), "relay header");
    assert_out_of_range(CounterIndex::new(8), "counter");
    assert_out_of_range(EncoderIndex::new(8), "encoder");
    assert_out_of_range(JoystickPort::new(6), "joystick");
}

#[test]
fn test_pwm_set_get_every_channel() {
    let mut pwm = PwmSystem::new();
    for header in PwmHeader::all() {
        let duty = 1000 + header.index() as u16;
        pwm.set_hdr_duty_cycle(header, duty);
        pwm.set_hdr_period_scale(header, (header.index() % 4) as u8).unwrap();
    }
    for mxp in PwmMxp::all() {
        pwm.set_mxp_duty_cycle(mxp, u16::MAX - mxp.index() as u16);
    }

    for header in PwmHeader::all() {
        assert_eq!(pwm.hdr_duty_cycle(header), 1000 + header.index() as u16);
        assert_eq!(pwm.hdr_period_scale(header), (header.index() % 4) as u8);
    }
    for mxp in PwmMxp::all() {
        assert_eq!(pwm.mxp_duty_cycle(mxp), u16::MAX - mxp.index() as u16);
    }
}

#[test]
fn test_analog_outputs_are_twelve_bit() {
    let mut outputs = AnalogOutputs::new();
    for channel in AnalogOutputChannel::all() {
        outputs.set_mxp_output(channel, 0x0FFF).unwrap();
        assert_eq!(outputs.mxp_output(channel), 0x0FFF);
        assert!(matches!(
            outputs.set_mxp_output(channel, 0x1000),
            Err(HardwareError::ValueOutOfRange { .. })
        ));
        assert_eq!(outputs.mxp_output(channel), 0x0FFF);
    }
    assert!((AnalogOutputs::raw_to_voltage(2048) - 2.5).abs() < 1e-9);
}

#[test]
fn test_analog_input_history_keeps_newest() {
    let mut inputs = AnalogInputs::new();
    let channel = AnalogInputChannel::new(5).unwrap();
    let samples: Vec<i32> = (0..100).collect();
    inputs.set_values(channel, &samples);
    assert_eq!(inputs.values(channel).len(), 64);
    assert_eq!(inputs.values(channel)[0], 36);
    assert_eq!(inputs.input(channel).latest(), Some(99));

    inputs.push_value(channel, 100);
    assert_eq!(inputs.values(channel)[0], 37);
    assert_eq!(inputs.input(channel).latest(), Some(100));
    assert!(inputs.values(AnalogInputChannel::new(4).unwrap()).is_empty());
}

#[test]
fn test_accumulator_deadband() {
    let mut accumulators = Accumulators::default();
    let channel = AnalogInputChannel::new(0).unwrap();
    {
        let acc = accumulators.get_mut(channel);
        acc.center = 100;
        acc.deadband = 5;
        acc.accumulate(103);
        acc.accumulate(110);
        acc.accumulate(90);
    }
    let acc = accumulators.get(channel);
    assert_eq!(acc.value, 0);
    assert_eq!(acc.count, 3);
}

#[test]
fn test_digital_words_per_channel() {
    let mut dio = DigitalSystem::new();
    let mut outputs = dio.outputs();
    let mut enabled = dio.enabled_outputs();
    for header in DigitalHeader::all().filter(|h| h.index() % 2 == 0) {
        outputs.set_header(header, true);
        enabled.set_header(header, true);
    }
    dio.set_outputs(outputs);
    dio.set_enabled_outputs(enabled);

    for header in DigitalHeader::all() {
        assert_eq!(dio.header_level(header), header.index() % 2 == 0);
    }
    for pwm in DigitalPwm::all() {
        dio.set_pwm_duty_cycle(pwm, pwm.index() as u8 * 10);
        assert_eq!(dio.pwm_duty_cycle(pwm), pwm.index() as u8 * 10);
    }
}

#[test]
fn test_relay_states_per_header() {
    let mut relays = RelaySystem::new();
    let h = |i| RelayHeader::new(i).unwrap();
    relays.set_forward(h(0), true);
    relays.set_reverse(h(1), true);
    relays.set_forward(h(3), true);
    relays.set_reverse(h(3), true);

    assert_eq!(relays.state(h(0)), RelayState::Forward);
    assert_eq!(relays.state(h(1)), RelayState::Reverse);
    assert_eq!(relays.state(h(2)), RelayState::Off);
    assert_eq!(relays.state(h(3)), RelayState::Error);
    assert_eq!(RelayState::Error.to_string(), "ERROR");
}

#[test]
fn test_counters_and_encoders() {
    let mut counters = Counters::default();
    let mut encoders = Encoders::default();
    for index in CounterIndex::all() {
        let output = QuadratureOutput::new(index.index() % 2 == 1, -(index.index() as i32) * 1000).unwrap();
        counters.set_output(index, output);
    }
    for index in CounterIndex::all() {
        assert_eq!(counters.output(index).value(), -(index.index() as i32) * 1000);
        assert_eq!(counters.output(index).direction(), index.index() % 2 == 1);
    }

    let encoder = EncoderIndex::new(7).unwrap();
    encoders.set_output(encoder, QuadratureOutput::new(false, 12345).unwrap());
    assert_eq!(encoders.get(encoder).output.value(), 12345);

    assert!(QuadratureOutput::new(true, i32::MAX).is_err());
    let raw = QuadratureOutput::new(true, -5).unwrap().to_raw();
    assert_eq!(QuadratureOutput::from_raw(raw), QuadratureOutput::new(true, -5).unwrap());
}

#[test]
fn test_accelerometer_conversion_is_invertible() {
    for range in [AccelRange::G2, AccelRange::G4, AccelRange::G8] {
        let step = range.full_scale_g() / 2048.0;
        for g in [-1.5f32, -0.25, 0.0, 0.5, 1.0] {
            let (msb, lsb) = range.from_g(g);
            assert!((range.to_g(msb, lsb) - g).abs() <= step / 2.0 + f32::EPSILON);
        }
    }
    assert!(AccelRange::from_bits(3).is_err());
}

#[test]
fn test_accelerometer_bus_protocol() {
    let mut accel = Accelerometer::new();
    accel.set_x_accel(1.0);

    accel.bus_write(0x0D).unwrap();
    assert_eq!(accel.bus_read(), 0x2A);

    accel.set_control_mode(ControlMode::SetCommTarget);
    accel.bus_write(0x0E).unwrap();
    accel.set_control_mode(ControlMode::SetData);
    accel.bus_write(0x01).unwrap();
    assert_eq!(accel.range(), AccelRange::G4);

    let msb = accel.read_register(0x01);
    let lsb = accel.read_register(0x02);
    assert!((accel.convert_to_g(msb, lsb) - 1.0).abs() < 0.01);
}

#[test]
fn test_power_and_watchdog_rest_state() {
    let power = Power::new();
    assert_eq!(power.status(), RailFlags::ALL);
    assert!((power.vin_voltage() - 12.0).abs() < f64::EPSILON);

    let mut watchdog = SysWatchdog::new();
    assert!(!watchdog.is_tripped());
    watchdog.trip();
    assert!(watchdog.is_tripped());
}

#[test]
fn test_watchdog_trip_past_saturation() {
    // alive and active, sys_disable_count at its 15-bit maximum
    let saturated: u32 = (0x7FFF << 2) | 0b11;
    let mut watchdog = SysWatchdog::new();
    watchdog.set_status(WatchdogStatus::from(saturated));

    for _ in 0..3 {
        watchdog.trip();
        watchdog.feed();
    }
    let status = watchdog.status();
    assert_eq!(status.sys_disable_count().value(), 0x7FFF);
    assert_eq!(status.power_disable_count().value(), 0);
    assert_eq!(u32::from(status), saturated);
}

#[test]
fn test_robot_mode_and_match_info() {
    let mut mode = RobotMode::new();
    assert_eq!(mode.mode(), Mode::Teleoperated);
    mode.set_mode(Mode::Test);
    mode.set_emergency_stopped(true);
    let word = mode.control_word();
    assert!(word.test());
    assert!(word.e_stop());
    assert!(!word.enabled());

    let mut info = MatchInfo::new();
    info.set_match_type(MatchType::Qualification);
    info.set_match_number(42);
    info.set_alliance_station(AllianceStation::Blue2);
    assert_eq!(info.match_type(), MatchType::Qualification);
    assert_eq!(info.match_number(), 42);
    assert_eq!(info.alliance_station(), AllianceStation::Blue2);
    assert!(info.set_event_name(&"e".repeat(65)).is_err());
}

#[test]
fn test_spi_words() {
    let mut spi = SpiSystem::new();
    spi.set_auto_rate(1_000_000);
    spi.set_auto_spi_1_select(true);
    let mut cs = ChipSelectActiveHigh::from(0u8);
    cs.set_mxp(true);
    spi.set_chip_select_active_high(cs);

    assert_eq!(spi.auto_rate(), 1_000_000);
    assert!(spi.auto_spi_1_select());
    assert_eq!(u8::from(spi.chip_select_active_high()), 0b0001_0000);
}

#[test]
fn test_net_comm_occurrence_through_state() {
    use riobus::HardwareState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let occurrences = Arc::new(AtomicU32::new(0));
    let mut state = HardwareState::new();
    {
        let occurrences = Arc::clone(&occurrences);
        let net_comm = state.net_comm_mut();
        net_comm.set_ref_num(3);
        net_comm.set_occur_hook(move |ref_num| {
            occurrences.fetch_add(ref_num, Ordering::SeqCst);
        });
    }
    assert!(state.dirty().contains(Blocks::NET_COMM));

    let copy = state.clone();
    assert!(state.net_comm().occur());
    assert!(copy.net_comm().occur());
    assert_eq!(occurrences.load(Ordering::SeqCst), 6);
}
