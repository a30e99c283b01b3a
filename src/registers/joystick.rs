//! Driver-station joysticks and their compact text form.
//!
//! The compact form is used for fixtures and for default joystick
//! configurations stored in the emulator config. It is independent of the
//! live snapshot format:
//!
//! ```text
//! joystick(is_xbox:1,type:1,name:"Gamepad",buttons:5,button_count:10,axes:[..12],axis_count:6,
//!          axis_types:[..12],povs:[..12],pov_count:1,outputs:0,left_rumble:0,right_rumble:0)
//! ```
//!
//! Fields always appear in that order, arrays always carry every slot, and
//! `"` and `\` inside the name are backslash-escaped.

use crate::channel::{channel_index, ChannelArray};
use crate::error::{check_width, HardwareError};
use core::fmt;
use core::str::FromStr;
use thiserror::Error;

pub const MAX_JOYSTICK_COUNT: usize = 6;
pub const MAX_AXIS_COUNT: usize = 12;
pub const MAX_POV_COUNT: usize = 12;
pub const MAX_BUTTON_COUNT: u8 = 32;

channel_index!(
    /// Driver-station joystick port.
    JoystickPort,
    "joystick",
    MAX_JOYSTICK_COUNT
);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Joystick {
    is_xbox: bool,
    kind: u8,
    name: String,
    buttons: u32,
    button_count: u8,
    axes: [i8; MAX_AXIS_COUNT],
    axis_count: u8,
    axis_types: [u8; MAX_AXIS_COUNT],
    povs: [i16; MAX_POV_COUNT],
    pov_count: u8,
    outputs: u32,
    left_rumble: u16,
    right_rumble: u16,
}

impl Joystick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_xbox(&self) -> bool {
        self.is_xbox
    }

    pub fn set_is_xbox(&mut self, is_xbox: bool) {
        self.is_xbox = is_xbox;
    }

    /// HID device type reported by the driver station.
    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn set_kind(&mut self, kind: u8) {
        self.kind = kind;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn buttons(&self) -> u32 {
        self.buttons
    }

    pub fn set_buttons(&mut self, buttons: u32) {
        self.buttons = buttons;
    }

    pub fn button(&self, index: u8) -> bool {
        index < MAX_BUTTON_COUNT && self.buttons & (1 << index) != 0
    }

    pub fn button_count(&self) -> u8 {
        self.button_count
    }

    pub fn set_button_count(&mut self, count: u8) -> Result<(), HardwareError> {
        self.button_count = check_width("joystick button count", count, MAX_BUTTON_COUNT)?;
        Ok(())
    }

    pub fn axes(&self) -> [i8; MAX_AXIS_COUNT] {
        self.axes
    }

    pub fn set_axes(&mut self, axes: [i8; MAX_AXIS_COUNT]) {
        self.axes = axes;
    }

    pub fn axis_count(&self) -> u8 {
        self.axis_count
    }

    pub fn set_axis_count(&mut self, count: u8) -> Result<(), HardwareError> {
        self.axis_count = check_width("joystick axis count", count, MAX_AXIS_COUNT as u8)?;
        Ok(())
    }

    pub fn axis_types(&self) -> [u8; MAX_AXIS_COUNT] {
        self.axis_types
    }

    pub fn set_axis_types(&mut self, types: [u8; MAX_AXIS_COUNT]) {
        self.axis_types = types;
    }

    pub fn povs(&self) -> [i16; MAX_POV_COUNT] {
        self.povs
    }

    pub fn set_povs(&mut self, povs: [i16; MAX_POV_COUNT]) {
        self.povs = povs;
    }

    pub fn pov_count(&self) -> u8 {
        self.pov_count
    }

    pub fn set_pov_count(&mut self, count: u8) -> Result<(), HardwareError> {
        self.pov_count = check_width("joystick pov count", count, MAX_POV_COUNT as u8)?;
        Ok(())
    }

    pub fn outputs(&self) -> u32 {
        self.outputs
    }

    pub fn set_outputs(&mut self, outputs: u32) {
        self.outputs = outputs;
    }

    pub fn left_rumble(&self) -> u16 {
        self.left_rumble
    }

    pub fn set_left_rumble(&mut self, rumble: u16) {
        self.left_rumble = rumble;
    }

    pub fn right_rumble(&self) -> u16 {
        self.right_rumble
    }

    pub fn set_right_rumble(&mut self, rumble: u16) {
        self.right_rumble = rumble;
    }

    /// Compact text form; see the module docs.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    pub fn deserialize(input: &str) -> Result<Self, JoystickParseError> {
        input.parse()
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl fmt::Display for Joystick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joystick(is_xbox:{},type:{},name:\"", u8::from(self.is_xbox), self.kind)?;
        for c in self.name.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "\",buttons:{},button_count:{},axes:", self.buttons, self.button_count)?;
        write_list(f, &self.axes)?;
        write!(f, ",axis_count:{},axis_types:", self.axis_count)?;
        write_list(f, &self.axis_types)?;
        f.write_str(",povs:")?;
        write_list(f, &self.povs)?;
        write!(
            f,
            ",pov_count:{},outputs:{},left_rumble:{},right_rumble:{})",
            self.pov_count, self.outputs, self.left_rumble, self.right_rumble
        )
    }
}

#[derive(Error, Debug)]
pub enum JoystickParseError {
    #[error("expected `{expected}` at offset {offset}")]
    Expected { expected: &'static str, offset: usize },

    #[error("invalid number for {field} at offset {offset}")]
    InvalidNumber { field: &'static str, offset: usize },

    #[error("{field} has {actual} entries, expected {expected}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unterminated or badly escaped name starting at offset {offset}")]
    BadName { offset: usize },

    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },

    #[error(transparent)]
    Field(#[from] HardwareError),
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let input: &'a str = self.input;
        &input[self.pos..]
    }

    fn expect(&mut self, token: &'static str) -> Result<(), JoystickParseError> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(JoystickParseError::Expected {
                expected: token,
                offset: self.pos,
            })
        }
    }

    fn key(&mut self, key: &'static str) -> Result<(), JoystickParseError> {
        self.expect(key)?;
        self.expect(":")
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, JoystickParseError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c == '-' || c.is_ascii_digit()))
            .unwrap_or(rest.len());
        let value = rest[..len].parse().map_err(|_| JoystickParseError::InvalidNumber {
            field,
            offset: self.pos,
        })?;
        self.pos += len;
        Ok(value)
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, JoystickParseError> {
        let value: u8 = self.number(field)?;
        Ok(check_width(field, value, 1)? == 1)
    }

    fn list<T, const N: usize>(&mut self, field: &'static str) -> Result<[T; N], JoystickParseError>
    where
        T: FromStr + Copy + Default,
    {
        self.expect("[")?;
        let mut out = [T::default(); N];
        let mut count = 0;
        if !self.rest().starts_with(']') {
            loop {
                let value = self.number(field)?;
                if count < N {
                    out[count] = value;
                }
                count += 1;
                if self.rest().starts_with(',') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect("]")?;
        if count != N {
            return Err(JoystickParseError::WrongLength {
                field,
                expected: N,
                actual: count,
            });
        }
        Ok(out)
    }

    fn quoted(&mut self) -> Result<String, JoystickParseError> {
        let start = self.pos;
        self.expect("\"")?;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped @ ('"' | '\\'))) => out.push(escaped),
                    _ => break,
                },
                other => out.push(other),
            }
        }
        Err(JoystickParseError::BadName { offset: start })
    }
}

impl FromStr for Joystick {
    type Err = JoystickParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(input.trim());
        let mut joystick = Joystick::new();

        cursor.expect("joystick(")?;
        cursor.key("is_xbox")?;
        joystick.is_xbox = cursor.flag("is_xbox")?;
        cursor.expect(",")?;
        cursor.key("type")?;
        joystick.kind = cursor.number("type")?;
        cursor.expect(",")?;
        cursor.key("name")?;
        joystick.name = cursor.quoted()?;
        cursor.expect(",")?;
        cursor.key("buttons")?;
        joystick.buttons = cursor.number("buttons")?;
        cursor.expect(",")?;
        cursor.key("button_count")?;
        joystick.set_button_count(cursor.number("button_count")?)?;
        cursor.expect(",")?;
        cursor.key("axes")?;
        joystick.axes = cursor.list("axes")?;
        cursor.expect(",")?;
        cursor.key("axis_count")?;
        joystick.set_axis_count(cursor.number("axis_count")?)?;
        cursor.expect(",")?;
        cursor.key("axis_types")?;
        joystick.axis_types = cursor.list("axis_types")?;
        cursor.expect(",")?;
        cursor.key("povs")?;
        joystick.povs = cursor.list("povs")?;
        cursor.expect(",")?;
        cursor.key("pov_count")?;
        joystick.set_pov_count(cursor.number("pov_count")?)?;
        cursor.expect(",")?;
        cursor.key("outputs")?;
        joystick.outputs = cursor.number("outputs")?;
        cursor.expect(",")?;
        cursor.key("left_rumble")?;
        joystick.left_rumble = cursor.number("left_rumble")?;
        cursor.expect(",")?;
        cursor.key("right_rumble")?;
        joystick.right_rumble = cursor.number("right_rumble")?;
        cursor.expect(")")?;

        if !cursor.rest().is_empty() {
            return Err(JoystickParseError::TrailingInput { offset: cursor.pos });
        }
        Ok(joystick)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Joysticks {
    ports: ChannelArray<JoystickPort, Joystick, MAX_JOYSTICK_COUNT>,
}

impl Joysticks {
    pub fn get(&self, port: JoystickPort) -> &Joystick {
        &self.ports[port]
    }

    pub fn get_mut(&mut self, port: JoystickPort) -> &mut Joystick {
        &mut self.ports[port]
    }

    pub fn set(&mut self, port: JoystickPort, joystick: Joystick) {
        self.ports[port] = joystick;
    }

    pub fn iter(&self) -> impl Iterator<Item = (JoystickPort, &Joystick)> {
        self.ports.iter()
    }
}
