//! Levelled assertions used to check the partition invariants of the engine.
//!
//! Simple checks are always on. The more expensive levels are enabled by the `debug-checks`
//! feature, since they re-verify complete decompositions after every detector call.

#[cfg(not(feature = "debug-checks"))]
pub const BLOCKSPLIT_ASSERT_LEVEL_DEFINITION: u8 = BLOCKSPLIT_ASSERT_SIMPLE;

#[cfg(feature = "debug-checks")]
pub const BLOCKSPLIT_ASSERT_LEVEL_DEFINITION: u8 = BLOCKSPLIT_ASSERT_ADVANCED;

pub const BLOCKSPLIT_ASSERT_SIMPLE: u8 = 1;
pub const BLOCKSPLIT_ASSERT_MODERATE: u8 = 2;
pub const BLOCKSPLIT_ASSERT_ADVANCED: u8 = 3;

#[macro_export]
#[doc(hidden)]
macro_rules! blocksplit_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::BLOCKSPLIT_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! blocksplit_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::BLOCKSPLIT_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! blocksplit_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::BLOCKSPLIT_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! blocksplit_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::BLOCKSPLIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::BLOCKSPLIT_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}
