//! This module defines the functional units of the iterative multiplier
//! datapath. The units are defined using the `define_units!` macro. Registers
//! and multiplexers are not units: they are wired by each architecture.

use crate::define_units;

/// Number of low-order bits of B inspected by the shift amount calculator.
pub const SHAMT_WINDOW: u32 = 8;

/// Count the consecutive zero bits of `low8` starting from bit 0. An all-zero
/// byte gives 8.
pub fn trailing_zeros8(low8: u8) -> u32 {
    low8.trailing_zeros()
}

/// Number of B bits consumed by one CALC step.
///
/// A set bit 0 is consumed alone (the step accumulates); otherwise the whole
/// run of low zeros is skipped, at most [`SHAMT_WINDOW`] of them. The B zero
/// check uses all 32 bits, so skipping only 8 of a longer run is still safe.
pub fn shift_amount(low8: u8) -> u32 {
    trailing_zeros8(low8).max(1)
}

define_units! {
    /// Computes how far A and B are shifted in this step from the low byte
    /// of B.
    ShiftAmount calc_shamt {
        .input(b_low: u8)
        .output(shamt: u32)
    } {
        *shamt = shift_amount(b_low);
    }

    LeftShifter lshifter {
        .input(val: u32, shamt: u32)
        .output(out: u32)
    } {
        *out = val.checked_shl(shamt).unwrap_or(0);
    }

    RightShifter rshifter {
        .input(val: u32, shamt: u32)
        .output(out: u32)
    } {
        *out = val.checked_shr(shamt).unwrap_or(0);
    }

    /// 32-bit adder. Carries out of bit 31 are dropped.
    Adder adder {
        .input(a: u32, b: u32)
        .output(sum: u32)
    } {
        *sum = a.wrapping_add(b);
    }

    ZeroComparator b_zero_cmp {
        .input(val: u32)
        .output(is_zero: bool)
    } {
        *is_zero = val == 0;
    }

    /// Iteration counter incrementer, only wired by the fixed latency design.
    Incrementer cnt_inc {
        .input(val: u32)
        .output(out: u32)
    } {
        *out = val.wrapping_add(1);
    }
}
