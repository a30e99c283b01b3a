//! Bounds-checked channel addressing.
//!
//! Every register block that owns an array of channels gets its own index
//! newtype. The index is validated once, when it is built, so the accessors on
//! the block itself cannot go out of range and a PWM header index can never be
//! handed to the analog input block by accident.

use crate::error::HardwareError;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

/// A validated channel index for one register block.
pub trait Channel: Copy + Eq + core::fmt::Debug {
    /// Fixed number of channels in the owning block.
    const COUNT: usize;
    /// Block name reported in [`HardwareError::OutOfRange`].
    const BLOCK: &'static str;

    fn new(index: usize) -> Result<Self, HardwareError>;

    fn index(self) -> usize;

    /// Every valid channel, in ascending order.
    fn all() -> ChannelIter<Self> {
        ChannelIter {
            next: 0,
            _marker: PhantomData,
        }
    }
}

pub struct ChannelIter<C> {
    next: usize,
    _marker: PhantomData<C>,
}

impl<C: Channel> Iterator for ChannelIter<C> {
    type Item = C;

    fn next(&mut self) -> Option<C> {
        if self.next >= C::COUNT {
            return None;
        }
        let channel = C::new(self.next).ok();
        self.next += 1;
        channel
    }
}

/// Declares a channel index newtype with a fixed bound.
macro_rules! channel_index {
    ($(#[$meta:meta])* $name:ident, $block:literal, $count:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u8);

        impl $crate::channel::Channel for $name {
            const COUNT: usize = $count;
            const BLOCK: &'static str = $block;

            fn new(index: usize) -> Result<Self, $crate::error::HardwareError> {
                match u8::try_from(index) {
                    Ok(raw) if index < Self::COUNT => Ok($name(raw)),
                    _ => Err($crate::error::HardwareError::OutOfRange {
                        block: Self::BLOCK,
                        index,
                        count: Self::COUNT,
                    }),
                }
            }

            fn index(self) -> usize {
                usize::from(self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = $crate::error::HardwareError;

            fn try_from(index: usize) -> Result<Self, Self::Error> {
                <$name as $crate::channel::Channel>::new(index)
            }
        }

        static_assertions::const_assert!($count <= u8::MAX as usize);
    };
}

pub(crate) use channel_index;

/// Fixed-length storage addressed only by its channel type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelArray<C, T, const N: usize> {
    slots: [T; N],
    _marker: PhantomData<C>,
}

impl<C: Channel, T, const N: usize> ChannelArray<C, T, N> {
    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        debug_assert_eq!(N, C::COUNT, "{} storage does not match its channel count", C::BLOCK);
        Self {
            slots: core::array::from_fn(f),
            _marker: PhantomData,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (C, &T)> {
        C::all().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (C, &mut T)> {
        C::all().zip(self.slots.iter_mut())
    }

    pub fn values(&self) -> &[T; N] {
        &self.slots
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<C: Channel, T: Default, const N: usize> Default for ChannelArray<C, T, N> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<C: Channel, T, const N: usize> Index<C> for ChannelArray<C, T, N> {
    type Output = T;

    fn index(&self, channel: C) -> &T {
        &self.slots[channel.index()]
    }
}

impl<C: Channel, T, const N: usize> IndexMut<C> for ChannelArray<C, T, N> {
    fn index_mut(&mut self, channel: C) -> &mut T {
        &mut self.slots[channel.index()]
    }
}
