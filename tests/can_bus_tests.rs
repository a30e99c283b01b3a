use riobus::registers::can::{
    CAN_11BIT_MESSAGE_ID_MASK, CAN_29BIT_MESSAGE_ID_MASK, CAN_IS_FRAME_11BIT, CAN_IS_FRAME_REMOTE,
    CAN_SEND_PERIOD_NO_REPEAT, CAN_SEND_PERIOD_STOP_REPEATING,
};
use riobus::registers::{CanBus, CanId, CanMessage, CanMotorController, MotorControllerKind};
use riobus::HardwareError;

fn msg(address: u32, byte: u8) -> CanMessage {
    CanMessage::new(CanId::base(address), &[byte], 0).unwrap()
}

#[test]
fn test_incoming_queue_is_fifo() {
    let mut bus = CanBus::new();
    bus.deliver(msg(1, 10));
    bus.deliver(msg(2, 20));
    bus.deliver(msg(3, 30));

    assert_eq!(bus.next_message().unwrap().data(), &[10]);
    let popped: Vec<u8> = (0..3).map(|_| bus.pop_next_message().unwrap().data()[0]).collect();
    assert_eq!(popped, vec![10, 20, 30]);
}

#[test]
fn test_empty_queue_is_rejected() {
    let mut bus = CanBus::new();
    assert!(matches!(bus.next_message(), Err(HardwareError::InvalidState(_))));
    assert!(matches!(bus.pop_next_message(), Err(HardwareError::InvalidState(_))));
}

#[test]
fn test_outgoing_queue_is_fifo() {
    let mut bus = CanBus::new();
    for byte in [1u8, 2, 3] {
        bus.enqueue_message(msg(0x40, byte));
    }
    let sent: Vec<u8> = std::iter::from_fn(|| bus.take_outgoing()).map(|m| m.data()[0]).collect();
    assert_eq!(sent, vec![1, 2, 3]);
}

#[test]
fn test_base_identifier_round_trip() {
    let raw = CAN_IS_FRAME_11BIT | 0x123;
    let id = CanId::from_raw(raw);
    assert!(id.is_base());
    assert!(!id.is_remote());
    assert_eq!(id.raw() & CAN_11BIT_MESSAGE_ID_MASK, 0x123);
    assert_eq!(id.address(), 0x123);
    assert_eq!(CanId::base(0x123).raw(), raw);
}

#[test]
fn test_extended_identifier_round_trip() {
    let id = CanId::extended(0x1ABC_DE0);
    assert!(id.is_extended());
    assert_eq!(id.raw() & CAN_29BIT_MESSAGE_ID_MASK, 0x1ABC_DE0);
    assert_eq!(CanId::from_raw(id.raw()).address(), 0x1ABC_DE0);
}

#[test]
fn test_remote_flag_is_bit_31() {
    let id = CanId::extended(0x55).with_remote(true);
    assert_eq!(id.raw(), CAN_IS_FRAME_REMOTE | 0x55);
    assert_eq!(id.route(), CanId::extended(0x55));
}

#[test]
fn test_send_periods() {
    let mut bus = CanBus::new();
    bus.send(msg(0x10, 1), CAN_SEND_PERIOD_NO_REPEAT).unwrap();
    assert_eq!(bus.repeat_period(CanId::base(0x10)), None);

    bus.send(msg(0x30, 3), 10).unwrap();
    bus.send(msg(0x20, 2), 10).unwrap();
    assert_eq!(bus.outgoing_len(), 3);

    // due repeats go out in identifier order
    assert_eq!(bus.tick(10), 2);
    let order: Vec<u8> = bus.outgoing().skip(3).map(|m| m.data()[0]).collect();
    assert_eq!(order, vec![2, 3]);

    bus.send(msg(0x20, 0), CAN_SEND_PERIOD_STOP_REPEATING).unwrap();
    assert_eq!(bus.tick(20), 1);
    assert!(matches!(
        bus.send(msg(0x20, 0), -7),
        Err(HardwareError::ValueOutOfRange { value: -7, .. })
    ));
}

#[test]
fn test_repeat_schedule_across_clock_wrap() {
    let mut bus = CanBus::new();
    let start = u32::MAX - 5;
    let message = CanMessage::new(CanId::base(0x42), &[9], start).unwrap();
    bus.send(message, 20).unwrap();
    assert_eq!(bus.outgoing_len(), 1);

    // next due lands past the wrap at 14; nothing fires before it
    let fired: Vec<usize> = (1..=5).map(|elapsed| bus.tick(start.wrapping_add(elapsed))).collect();
    assert_eq!(fired, vec![0; 5]);
    assert_eq!(bus.tick(13), 0);

    assert_eq!(bus.tick(14), 1);
    assert_eq!(bus.tick(20), 0);
    assert_eq!(bus.tick(34), 1);
    assert_eq!(bus.outgoing_len(), 3);
    assert_eq!(bus.outgoing().last().map(CanMessage::time_stamp_ms), Some(34));
}

#[test]
fn test_motor_controller_serializes_fields() {
    let mut controller = CanMotorController::new(CanId::extended(0x0204_0003), MotorControllerKind::SparkMax);
    controller.set_percent_output(-0.5);
    controller.set_brake_mode(true);
    let value = serde_json::to_value(controller).unwrap();
    assert_eq!(value["id"], 0x0204_0003);
    assert_eq!(value["kind"], "SPARK_MAX");
    assert_eq!(value["percent_output"], -0.5);
    assert_eq!(value["brake_mode"], true);
}
