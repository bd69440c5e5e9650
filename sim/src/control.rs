//! Control unit of the iterative multiplier: multiplexer select encodings and
//! the IDLE -> CALC -> DONE Moore machine that sequences the datapath.

use crate::define_sel;

define_sel! {
    /// Source of the next operand-A register value.
    AMuxSel {
        /// A shifted left by the shift amount
        Shift = 0,
        /// Operand `a` of the request
        Load = 1,
    }
    X = Shift;
}

define_sel! {
    /// Source of the next operand-B register value.
    BMuxSel {
        /// B shifted right by the shift amount
        Shift = 0,
        /// Operand `b` of the request
        Load = 1,
    }
    X = Shift;
}

define_sel! {
    /// Source of the next result register value.
    ResultMuxSel {
        /// Output of the add mux
        Add = 0,
        /// Constant zero, used when loading operands
        Zero = 1,
    }
    X = Add;
}

define_sel! {
    /// Selects whether this step accumulates.
    AddMuxSel {
        /// A + result
        Add = 0,
        /// Result unchanged
        Result = 1,
    }
    X = Add;
}

/// Control signals driven into the datapath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CtrlSignals {
    pub a_mux_sel: AMuxSel,
    pub b_mux_sel: BMuxSel,
    pub result_mux_sel: ResultMuxSel,
    pub result_reg_en: bool,
    pub add_mux_sel: AddMuxSel,
}

/// State of the control FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CtrlState {
    #[default]
    Idle,
    Calc,
    Done,
}

impl std::fmt::Display for CtrlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CtrlState::Idle => "IDLE",
            CtrlState::Calc => "CALC",
            CtrlState::Done => "DONE",
        })
    }
}

/// Everything the control unit drives in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CtrlOutputs {
    pub req_rdy: bool,
    pub resp_en: bool,
    /// CALC step that shifts and accumulates
    pub do_sh_add: bool,
    /// CALC step that only shifts
    pub do_sh: bool,
    pub sel: CtrlSignals,
}

impl CtrlOutputs {
    /// Short tag of the current step used by line traces.
    pub fn trace_tag(&self, state: CtrlState) -> &'static str {
        match state {
            CtrlState::Idle => "I ",
            CtrlState::Calc if self.do_sh_add => "C+",
            CtrlState::Calc if self.do_sh => "C ",
            CtrlState::Calc => "C?",
            CtrlState::Done => "D ",
        }
    }
}

/// Outputs of the control unit as a function of its state.
///
/// `b_lsb` only matters in CALC (add select), `resp_rdy` only in DONE, where
/// the response is already latched and `resp_en` simply follows the consumer.
pub fn state_outputs(state: CtrlState, b_lsb: bool, resp_rdy: bool) -> CtrlOutputs {
    match state {
        // wait for operands and latch them, clearing the result
        CtrlState::Idle => CtrlOutputs {
            req_rdy: true,
            resp_en: false,
            do_sh_add: false,
            do_sh: false,
            sel: CtrlSignals {
                a_mux_sel: AMuxSel::Load,
                b_mux_sel: BMuxSel::Load,
                result_mux_sel: ResultMuxSel::Zero,
                result_reg_en: true,
                add_mux_sel: AddMuxSel::X,
            },
        },
        CtrlState::Calc => CtrlOutputs {
            req_rdy: false,
            resp_en: false,
            do_sh_add: b_lsb,
            do_sh: !b_lsb,
            sel: CtrlSignals {
                a_mux_sel: AMuxSel::Shift,
                b_mux_sel: BMuxSel::Shift,
                result_mux_sel: ResultMuxSel::Add,
                result_reg_en: true,
                add_mux_sel: if b_lsb {
                    AddMuxSel::Add
                } else {
                    AddMuxSel::Result
                },
            },
        },
        // hold everything until the response is taken
        CtrlState::Done => CtrlOutputs {
            req_rdy: false,
            resp_en: resp_rdy,
            do_sh_add: false,
            do_sh: false,
            sel: CtrlSignals {
                a_mux_sel: AMuxSel::X,
                b_mux_sel: BMuxSel::X,
                result_mux_sel: ResultMuxSel::X,
                result_reg_en: false,
                add_mux_sel: AddMuxSel::X,
            },
        },
    }
}

/// Conditions sampled by the state register at the clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    pub reset: bool,
    /// A request is transferred this cycle (`req_en && req_rdy`).
    pub req_go: bool,
    /// The datapath has finished iterating.
    pub calc_done: bool,
    /// A response is transferred this cycle (`resp_en && resp_rdy`).
    pub resp_go: bool,
}

/// State transition table of the control FSM. Reset dominates.
pub fn next_state(state: CtrlState, cond: Transition) -> CtrlState {
    use CtrlState::*;
    if cond.reset {
        return Idle;
    }
    match (state, cond.req_go, cond.calc_done, cond.resp_go) {
        (Idle, true, _, _) => Calc,
        (Idle, false, _, _) => Idle,
        (Calc, _, true, _) => Done,
        (Calc, _, false, _) => Calc,
        (Done, _, _, true) => Idle,
        (Done, _, _, false) => Done,
    }
}
