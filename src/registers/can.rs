//! CAN bus: identifier framing, the two message queues and the set of motor
//! controllers the robot program addresses over the bus.
//!
//! The robot program appends to the outgoing queue and drains the incoming
//! one; the simulated device does the reverse through [`CanBus::take_outgoing`]
//! and [`CanBus::deliver`]. Both queues are strict FIFO.

use crate::error::HardwareError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

pub const CAN_SEND_PERIOD_NO_REPEAT: i32 = 0;
pub const CAN_SEND_PERIOD_STOP_REPEATING: i32 = -1;

pub const CAN_IS_FRAME_REMOTE: u32 = 0x8000_0000;
pub const CAN_IS_FRAME_11BIT: u32 = 0x4000_0000;
pub const CAN_29BIT_MESSAGE_ID_MASK: u32 = 0x1FFF_FFFF;
pub const CAN_11BIT_MESSAGE_ID_MASK: u32 = 0x0000_07FF;

pub const MAX_CAN_PAYLOAD: usize = 8;

/// Deadlines are compared on a wrapping millisecond clock; one counts as
/// reached once `now` is less than half the clock range past it.
const HALF_CLOCK_RANGE: u32 = 1 << 31;

fn is_due(now_ms: u32, due_ms: u32) -> bool {
    now_ms.wrapping_sub(due_ms) < HALF_CLOCK_RANGE
}

/// A 32-bit CAN identifier word.
///
/// Bit 31 flags a remote frame, bit 30 flags 11-bit base framing, and the
/// address sits in the low bits under the mask that framing selects. Bits
/// outside the flags and the selected mask are dropped on construction, so two
/// identifiers compare equal exactly when they address the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanId(u32);

impl CanId {
    /// 11-bit base-format identifier. Address bits above bit 10 are masked off.
    pub fn base(address: u32) -> Self {
        CanId(CAN_IS_FRAME_11BIT | (address & CAN_11BIT_MESSAGE_ID_MASK))
    }

    /// 29-bit extended-format identifier. Address bits above bit 28 are masked off.
    pub fn extended(address: u32) -> Self {
        CanId(address & CAN_29BIT_MESSAGE_ID_MASK)
    }

    /// Decodes a raw identifier word, masking the address by its framing.
    pub fn from_raw(raw: u32) -> Self {
        let remote = raw & CAN_IS_FRAME_REMOTE;
        let id = if raw & CAN_IS_FRAME_11BIT != 0 {
            Self::base(raw)
        } else {
            Self::extended(raw)
        };
        CanId(id.0 | remote)
    }

    pub fn with_remote(self, remote: bool) -> Self {
        if remote {
            CanId(self.0 | CAN_IS_FRAME_REMOTE)
        } else {
            CanId(self.0 & !CAN_IS_FRAME_REMOTE)
        }
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_remote(self) -> bool {
        self.0 & CAN_IS_FRAME_REMOTE != 0
    }

    pub fn is_base(self) -> bool {
        self.0 & CAN_IS_FRAME_11BIT != 0
    }

    pub fn is_extended(self) -> bool {
        !self.is_base()
    }

    pub fn address(self) -> u32 {
        if self.is_base() {
            self.0 & CAN_11BIT_MESSAGE_ID_MASK
        } else {
            self.0 & CAN_29BIT_MESSAGE_ID_MASK
        }
    }

    /// The identifier with the remote flag cleared; repeat scheduling and
    /// controller lookup are keyed by this.
    pub fn route(self) -> CanId {
        self.with_remote(false)
    }
}

/// One CAN frame with its 0-8 byte payload and a millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanMessage {
    id: CanId,
    data: heapless::Vec<u8, MAX_CAN_PAYLOAD>,
    time_stamp_ms: u32,
}

impl CanMessage {
    /// Payloads longer than eight bytes are rejected.
    pub fn new(id: CanId, payload: &[u8], time_stamp_ms: u32) -> Result<Self, HardwareError> {
        let data = heapless::Vec::from_slice(payload)
            .map_err(|_| HardwareError::length("CAN payload length", payload.len(), MAX_CAN_PAYLOAD))?;
        Ok(Self { id, data, time_stamp_ms })
    }

    pub fn id(&self) -> CanId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Data length code; never above eight.
    pub fn data_size(&self) -> u8 {
        self.data.len() as u8
    }

    pub fn time_stamp_ms(&self) -> u32 {
        self.time_stamp_ms
    }

    pub fn set_time_stamp_ms(&mut self, time_stamp_ms: u32) {
        self.time_stamp_ms = time_stamp_ms;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RepeatingMessage {
    message: CanMessage,
    period_ms: u32,
    next_due_ms: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanBus {
    in_message_queue: VecDeque<CanMessage>,
    out_message_queue: VecDeque<CanMessage>,
    repeating: BTreeMap<CanId, RepeatingMessage>,
}

impl CanBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message from the robot program to the outgoing queue.
    pub fn enqueue_message(&mut self, message: CanMessage) {
        self.out_message_queue.push_back(message);
    }

    /// Sends with a repeat period: `0` sends once, a positive period sends now
    /// and again every `period_ms`, and `-1` stops repeating the identifier
    /// without sending.
    pub fn send(&mut self, message: CanMessage, period_ms: i32) -> Result<(), HardwareError> {
        match period_ms {
            CAN_SEND_PERIOD_STOP_REPEATING => {
                self.repeating.remove(&message.id.route());
            }
            CAN_SEND_PERIOD_NO_REPEAT => self.enqueue_message(message),
            period if period > 0 => {
                let period_ms = period as u32;
                self.repeating.insert(
                    message.id.route(),
                    RepeatingMessage {
                        message: message.clone(),
                        period_ms,
                        next_due_ms: message.time_stamp_ms.wrapping_add(period_ms),
                    },
                );
                self.enqueue_message(message);
            }
            other => return Err(HardwareError::value("CAN send period", other, i32::MAX)),
        }
        Ok(())
    }

    /// Repeat period registered for an identifier, if any.
    pub fn repeat_period(&self, id: CanId) -> Option<u32> {
        self.repeating.get(&id.route()).map(|r| r.period_ms)
    }

    /// Enqueues every repeating message due at `now_ms`, in identifier order.
    /// Returns how many were enqueued.
    pub fn tick(&mut self, now_ms: u32) -> usize {
        let mut sent = 0;
        for entry in self.repeating.values_mut() {
            if is_due(now_ms, entry.next_due_ms) {
                let mut message = entry.message.clone();
                message.time_stamp_ms = now_ms;
                self.out_message_queue.push_back(message);
                entry.next_due_ms = now_ms.wrapping_add(entry.period_ms);
                sent += 1;
            }
        }
        sent
    }

    /// Oldest message waiting for the robot program. Peeking an empty queue
    /// is an error; check [`CanBus::has_incoming`] first.
    pub fn next_message(&self) -> Result<&CanMessage, HardwareError> {
        self.in_message_queue
            .front()
            .ok_or(HardwareError::InvalidState("incoming CAN queue is empty"))
    }

    pub fn pop_next_message(&mut self) -> Result<CanMessage, HardwareError> {
        self.in_message_queue
            .pop_front()
            .ok_or(HardwareError::InvalidState("incoming CAN queue is empty"))
    }

    pub fn has_incoming(&self) -> bool {
        !self.in_message_queue.is_empty()
    }

    pub fn incoming_len(&self) -> usize {
        self.in_message_queue.len()
    }

    /// Device side: hands a received frame to the robot program.
    pub fn deliver(&mut self, message: CanMessage) {
        self.in_message_queue.push_back(message);
    }

    /// Device side: takes the oldest frame the robot program sent.
    pub fn take_outgoing(&mut self) -> Option<CanMessage> {
        self.out_message_queue.pop_front()
    }

    pub fn outgoing(&self) -> impl Iterator<Item = &CanMessage> {
        self.out_message_queue.iter()
    }

    pub fn outgoing_len(&self) -> usize {
        self.out_message_queue.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotorControllerKind {
    TalonSrx,
    VictorSpx,
    SparkMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanMotorController {
    id: CanId,
    kind: MotorControllerKind,
    percent_output: f64,
    inverted: bool,
    brake_mode: bool,
}

impl CanMotorController {
    pub fn new(id: CanId, kind: MotorControllerKind) -> Self {
        Self {
            id: id.route(),
            kind,
            percent_output: 0.0,
            inverted: false,
            brake_mode: false,
        }
    }

    pub fn id(&self) -> CanId {
        self.id
    }

    pub fn kind(&self) -> MotorControllerKind {
        self.kind
    }

    pub fn percent_output(&self) -> f64 {
        self.percent_output
    }

    /// Output is clamped to [-1, 1]; NaN reads as neutral.
    pub fn set_percent_output(&mut self, output: f64) {
        self.percent_output = if output.is_nan() { 0.0 } else { output.clamp(-1.0, 1.0) };
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn brake_mode(&self) -> bool {
        self.brake_mode
    }

    pub fn set_brake_mode(&mut self, brake: bool) {
        self.brake_mode = brake;
    }
}

/// Motor controllers on the bus, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanMotorControllers {
    controllers: BTreeMap<CanId, CanMotorController>,
}

impl CanMotorControllers {
    pub fn get(&self, id: CanId) -> Option<&CanMotorController> {
        self.controllers.get(&id.route())
    }

    pub fn get_mut(&mut self, id: CanId) -> Option<&mut CanMotorController> {
        self.controllers.get_mut(&id.route())
    }

    /// Inserts or replaces the controller at its identifier.
    pub fn upsert(&mut self, controller: CanMotorController) {
        self.controllers.insert(controller.id, controller);
    }

    pub fn remove(&mut self, id: CanId) -> Option<CanMotorController> {
        self.controllers.remove(&id.route())
    }

    /// Controllers in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CanMotorController> {
        self.controllers.values()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: CanId, byte: u8, at: u32) -> CanMessage {
        CanMessage::new(id, &[byte], at).unwrap()
    }

    #[test]
    fn test_identifier_framing_bits() {
        let id = CanId::base(0x123).with_remote(true);
        assert_eq!(id.raw(), 0xC000_0123);
        assert!(id.is_remote());
        assert!(id.is_base());

        let decoded = CanId::from_raw(0x4000_F123);
        assert_eq!(decoded.address(), 0x123);
        assert_eq!(decoded, CanId::base(0x123));
    }

    #[test]
    fn test_extended_address_is_masked() {
        let id = CanId::from_raw(0x3FFF_FFFF);
        assert!(id.is_extended());
        assert_eq!(id.address(), CAN_29BIT_MESSAGE_ID_MASK);
    }

    #[test]
    fn test_payload_length_limit() {
        assert!(CanMessage::new(CanId::base(1), &[0; 8], 0).is_ok());
        assert!(matches!(
            CanMessage::new(CanId::base(1), &[0; 9], 0),
            Err(HardwareError::ValueOutOfRange { value: 9, max: 8, .. })
        ));
        assert_eq!(CanMessage::new(CanId::base(1), &[], 0).unwrap().data_size(), 0);
    }

    #[test]
    fn test_repeating_send_and_stop() {
        let mut bus = CanBus::new();
        let id = CanId::extended(0x0204_1401);
        bus.send(message(id, 1, 100), 20).unwrap();
        assert_eq!(bus.outgoing_len(), 1);
        assert_eq!(bus.repeat_period(id), Some(20));

        assert_eq!(bus.tick(110), 0);
        assert_eq!(bus.tick(120), 1);
        assert_eq!(bus.tick(125), 0);
        assert_eq!(bus.tick(140), 1);
        assert_eq!(bus.outgoing_len(), 3);
        assert_eq!(bus.outgoing().last().map(CanMessage::time_stamp_ms), Some(140));

        bus.send(message(id, 0, 150), CAN_SEND_PERIOD_STOP_REPEATING).unwrap();
        assert_eq!(bus.repeat_period(id), None);
        assert_eq!(bus.tick(1_000), 0);
        assert_eq!(bus.outgoing_len(), 3);
    }

    #[test]
    fn test_due_check_wraps() {
        assert!(is_due(100, 100));
        assert!(is_due(101, 100));
        assert!(!is_due(99, 100));
        // a deadline just past the wrap is still ahead of a clock just before it
        assert!(!is_due(u32::MAX - 5, 14));
        assert!(is_due(3, u32::MAX - 5));
    }

    #[test]
    fn test_invalid_send_period() {
        let mut bus = CanBus::new();
        assert!(bus.send(message(CanId::base(1), 0, 0), -2).is_err());
        assert_eq!(bus.outgoing_len(), 0);
    }

    #[test]
    fn test_device_side_of_queues() {
        let mut bus = CanBus::new();
        bus.enqueue_message(message(CanId::base(1), 1, 0));
        bus.enqueue_message(message(CanId::base(2), 2, 0));
        assert_eq!(bus.take_outgoing().unwrap().data(), &[1]);
        assert_eq!(bus.take_outgoing().unwrap().data(), &[2]);
        assert!(bus.take_outgoing().is_none());

        assert!(!bus.has_incoming());
        bus.deliver(message(CanId::base(3), 3, 0));
        assert_eq!(bus.next_message().unwrap().data(), &[3]);
        assert_eq!(bus.incoming_len(), 1);
    }

    #[test]
    fn test_motor_controllers_keyed_by_identifier() {
        let mut controllers = CanMotorControllers::default();
        let mut talon = CanMotorController::new(CanId::extended(0x0204_0005), MotorControllerKind::TalonSrx);
        talon.set_percent_output(1.7);
        controllers.upsert(talon);
        controllers.upsert(CanMotorController::new(CanId::extended(0x0204_0001), MotorControllerKind::VictorSpx));

        let ids: Vec<u32> = controllers.iter().map(|c| c.id().address()).collect();
        assert_eq!(ids, vec![0x0204_0001, 0x0204_0005]);
        let stored = controllers.get(CanId::extended(0x0204_0005).with_remote(true)).unwrap();
        assert_eq!(stored.percent_output(), 1.0);
    }
}
