use thiserror::Error;

/// Failures raised by register blocks, the CAN queues and the serializer.
#[derive(Error, Debug)]
pub enum HardwareError {
    /// A channel index outside a block's fixed channel count. Always a caller defect.
    #[error("{block} channel {index} out of range (block has {count} channels)")]
    OutOfRange {
        block: &'static str,
        index: usize,
        count: usize,
    },

    /// A setter was handed a value wider than the field it writes.
    #[error("value {value} does not fit {field} (max {max})")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HardwareError {
    pub(crate) fn value(field: &'static str, value: impl Into<i64>, max: impl Into<i64>) -> Self {
        HardwareError::ValueOutOfRange {
            field,
            value: value.into(),
            max: max.into(),
        }
    }

    /// [`HardwareError::value`] for a length that exceeds its capacity.
    pub(crate) fn length(field: &'static str, len: usize, max: usize) -> Self {
        let widen = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        HardwareError::ValueOutOfRange {
            field,
            value: widen(len),
            max: widen(max),
        }
    }
}

/// Checks `value <= max` for an unsigned narrow field, rejecting wider input.
pub(crate) fn check_width<T>(field: &'static str, value: T, max: T) -> Result<T, HardwareError>
where
    T: PartialOrd + Copy + Into<i64>,
{
    if value > max {
        Err(HardwareError::value(field, value, max))
    } else {
        Ok(value)
    }
}

pub type Result<T, E = HardwareError> = core::result::Result<T, E>;
