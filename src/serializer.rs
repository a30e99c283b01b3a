//! Snapshot export of the hardware state for an external visualizer.
//!
//! A snapshot is a sequence of sections, one line each:
//!
//! ```text
//! {"section":"pwm_hdrs","data":[{"channel":0,"period_scale":0,"duty_cycle":0},...]}
//! {"section":"relays","data":[{"channel":0,"state":"OFF"},...]}
//! ```
//!
//! Sections always appear in [`Section::ALL`] order. A shallow pass emits only
//! sections whose source blocks were written since the previous pass; a deep
//! pass emits all of them.

use crate::channel::Channel;
use crate::error::HardwareError;
use crate::manager::{AcquireState, StateManager};
use crate::registers::{
    AnalogOutputChannel, AnalogOutputs, Blocks, CanMotorController, DigitalHeader, DigitalMxp, MxpConfig,
};
use crate::state::HardwareState;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

pub use crate::registers::RelayState;

pub const SECTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    PwmHeaders,
    Relays,
    AnalogOutputs,
    DigitalMxp,
    DigitalHeaders,
    CanMotorControllers,
}

impl Section {
    pub const ALL: [Section; SECTION_COUNT] = [
        Section::PwmHeaders,
        Section::Relays,
        Section::AnalogOutputs,
        Section::DigitalMxp,
        Section::DigitalHeaders,
        Section::CanMotorControllers,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Section::PwmHeaders => "pwm_hdrs",
            Section::Relays => "relays",
            Section::AnalogOutputs => "analog_outputs",
            Section::DigitalMxp => "digital_mxp",
            Section::DigitalHeaders => "digital_hdrs",
            Section::CanMotorControllers => "can_motor_controllers",
        }
    }

    /// Blocks whose writes invalidate this section.
    pub fn sources(self) -> Blocks {
        match self {
            Section::PwmHeaders => Blocks::PWM,
            Section::Relays => Blocks::RELAY,
            Section::AnalogOutputs => Blocks::ANALOG_OUTPUTS,
            // special-function pins report their MXP PWM
            Section::DigitalMxp => Blocks::DIGITAL | Blocks::PWM,
            Section::DigitalHeaders => Blocks::DIGITAL,
            Section::CanMotorControllers => Blocks::CAN_MOTOR_CONTROLLERS,
        }
    }

    fn position(self) -> usize {
        self as usize
    }

    /// Renders this section from `state` as one terminated line.
    pub fn render(self, state: &HardwareState) -> Result<String, HardwareError> {
        match self {
            Section::PwmHeaders => line(self, &pwm_headers(state)),
            Section::Relays => line(self, &relays(state)),
            Section::AnalogOutputs => line(self, &analog_outputs(state)),
            Section::DigitalMxp => line(self, &digital_mxp(state)),
            Section::DigitalHeaders => line(self, &digital_headers(state)),
            Section::CanMotorControllers => line(self, &can_motor_controllers(state)),
        }
    }
}

/// Union of every block some section reads.
pub fn tracked_blocks() -> Blocks {
    Section::ALL.iter().fold(Blocks::empty(), |acc, s| acc | s.sources())
}

#[derive(Serialize)]
struct SectionLine<'a, T: Serialize> {
    section: &'static str,
    data: &'a T,
}

fn line<T: Serialize>(section: Section, data: &T) -> Result<String, HardwareError> {
    let mut text = serde_json::to_string(&SectionLine {
        section: section.tag(),
        data,
    })?;
    text.push('\n');
    Ok(text)
}

#[derive(Serialize)]
struct PwmEntry {
    channel: usize,
    period_scale: u8,
    duty_cycle: u16,
}

fn pwm_headers(state: &HardwareState) -> Vec<PwmEntry> {
    state
        .pwm()
        .headers()
        .map(|(channel, pwm)| PwmEntry {
            channel: channel.index(),
            period_scale: pwm.period_scale(),
            duty_cycle: pwm.duty_cycle(),
        })
        .collect()
}

#[derive(Serialize)]
struct RelayEntry {
    channel: usize,
    state: RelayState,
}

fn relays(state: &HardwareState) -> Vec<RelayEntry> {
    crate::registers::RelayHeader::all()
        .map(|header| RelayEntry {
            channel: header.index(),
            state: state.relay().state(header),
        })
        .collect()
}

#[derive(Serialize)]
struct AnalogOutputEntry {
    channel: usize,
    raw: u16,
    voltage: f64,
}

fn analog_outputs(state: &HardwareState) -> Vec<AnalogOutputEntry> {
    let outputs = state.analog_outputs();
    AnalogOutputChannel::all()
        .map(|channel| {
            let raw = outputs.mxp_output(channel);
            AnalogOutputEntry {
                channel: channel.index(),
                raw,
                voltage: AnalogOutputs::raw_to_voltage(raw),
            }
        })
        .collect()
}

#[derive(Serialize)]
struct MxpEntry {
    channel: usize,
    config: MxpConfig,
    value: f64,
}

fn digital_mxp(state: &HardwareState) -> Vec<MxpEntry> {
    DigitalMxp::all()
        .map(|channel| {
            let data = state.digital().mxp_data(channel, state.pwm());
            MxpEntry {
                channel: channel.index(),
                config: data.config,
                value: data.value,
            }
        })
        .collect()
}

#[derive(Serialize)]
struct DigitalHeaderEntry {
    channel: usize,
    output: bool,
    level: bool,
}

fn digital_headers(state: &HardwareState) -> Vec<DigitalHeaderEntry> {
    let digital = state.digital();
    DigitalHeader::all()
        .map(|channel| DigitalHeaderEntry {
            channel: channel.index(),
            output: digital.enabled_outputs().header(channel),
            level: digital.header_level(channel),
        })
        .collect()
}

fn can_motor_controllers(state: &HardwareState) -> Vec<CanMotorController> {
    state.can_motor_controllers().iter().copied().collect()
}

/// Caches the rendered sections and tracks which ones the last pass changed.
#[derive(Debug)]
pub struct Serializer<S: AcquireState = StateManager> {
    manager: Arc<S>,
    sections: [String; SECTION_COUNT],
    changed: heapless::Vec<Section, SECTION_COUNT>,
}

impl<S: AcquireState> Serializer<S> {
    pub fn new(manager: Arc<S>) -> Self {
        Self {
            manager,
            sections: Default::default(),
            changed: heapless::Vec::new(),
        }
    }

    pub fn manager(&self) -> &Arc<S> {
        &self.manager
    }

    /// Re-renders the sections whose source blocks were written since the
    /// previous pass and consumes their dirty bits.
    pub fn update_shallow(&mut self) -> Result<(), HardwareError> {
        let guard = self.manager.acquire();
        let dirty = guard.state_mut()?.take_dirty(tracked_blocks());
        let state = guard.state()?;

        self.changed.clear();
        for section in Section::ALL {
            if dirty.intersects(section.sources()) {
                self.sections[section.position()] = section.render(&state)?;
                // capacity equals the section count
                let _ = self.changed.push(section);
            }
        }
        trace!(dirty = ?dirty, sections = self.changed.len(), "shallow update");
        Ok(())
    }

    /// Re-renders every section. Pending dirty bits are consumed as well.
    pub fn update_deep(&mut self) -> Result<(), HardwareError> {
        let guard = self.manager.acquire();
        guard.state_mut()?.take_dirty(tracked_blocks());
        let state = guard.state()?;

        self.changed.clear();
        for section in Section::ALL {
            self.sections[section.position()] = section.render(&state)?;
            let _ = self.changed.push(section);
        }
        trace!("deep update");
        Ok(())
    }

    /// Changed sections only. An empty string means nothing was written.
    pub fn serialize_shallow(&mut self) -> Result<String, HardwareError> {
        self.update_shallow()?;
        Ok(self.changed_text())
    }

    pub fn serialize_deep(&mut self) -> Result<String, HardwareError> {
        self.update_deep()?;
        Ok(self.changed_text())
    }

    /// Whether a tracked block was written since the last pass.
    ///
    /// # Errors
    ///
    /// `InvalidState` when called while this thread holds a mutable borrow
    /// of the state.
    pub fn has_new_data(&self) -> Result<bool, HardwareError> {
        let guard = self.manager.acquire();
        let dirty = guard.state()?.dirty();
        Ok(dirty.intersects(tracked_blocks()))
    }

    /// Sections the last pass re-rendered, in section order.
    pub fn changed_sections(&self) -> &[Section] {
        &self.changed
    }

    /// Cached text of one section; empty until a pass has rendered it.
    pub fn section(&self, section: Section) -> &str {
        &self.sections[section.position()]
    }

    fn changed_text(&self) -> String {
        self.changed.iter().map(|s| self.section(*s)).collect()
    }
}

/// The full cached snapshot, every rendered section in order.
impl<S: AcquireState> core::fmt::Display for Serializer<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for text in &self.sections {
            f.write_str(text)?;
        }
        Ok(())
    }
}
