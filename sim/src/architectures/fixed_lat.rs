//! Fixed latency iterative multiplier.
//!
//! Every CALC step consumes exactly one bit of B, so a multiply always takes
//! 32 CALC cycles. An iteration counter decides when CALC ends.

use super::{hardware_imul::*, MulArch, PortIn, PortOut};
use crate::{
    control::*,
    framework::{CircuitTypes, PropCircuit, PropOrderBuilder, RtlSim},
    utils::format_word,
};

/// Number of CALC steps of one multiply.
pub const NSTEPS: u32 = 32;

// 5-bit counter register
const COUNTER_MASK: u32 = NSTEPS - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Registers {
    pub a_reg: u32,
    pub b_reg: u32,
    pub result_reg: u32,
    /// Index of the current CALC step
    pub counter: u32,
    pub state: CtrlState,
}

#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IntermediateSignal {
    pub port_in: PortIn,
    pub port_out: PortOut,

    pub a_val: u32,
    pub b_val: u32,
    pub result_val: u32,
    pub b_lsb: bool,
    /// The step in flight is the last one.
    pub is_last_step: bool,

    pub ctrl: CtrlOutputs,

    pub a_mux_out: u32,
    pub b_mux_out: u32,
    pub add_mux_out: u32,
    pub result_mux_out: u32,
    pub counter_mux_out: u32,
}

pub struct Arch;

impl CircuitTypes for Arch {
    type UnitIn = UnitInputSignal;
    type UnitOut = UnitOutputSignal;
    type Inter = IntermediateSignal;
    type StageState = Registers;
}

impl crate::framework::Arch for Arch {
    type Units = Units;

    fn build_circuit() -> PropCircuit<Self> {
        let order = {
            let mut g = PropOrderBuilder::new();
            hardware_setup(&mut g);

            g.add_update("a_val", &[]);
            g.add_rev_deps("a_val", &["lshifter.val", "lshifter.shamt", "adder.a"]);
            g.add_update("b_val", &[]);
            g.add_rev_deps("b_val", &["rshifter.val", "rshifter.shamt"]);
            g.add_update("result_val", &[]);
            g.add_rev_deps("result_val", &["adder.b"]);
            g.add_update("counter_val", &[]);
            g.add_rev_deps("counter_val", &["cnt_inc.val"]);

            g.add_update("b_lsb", &["b_val"]);
            g.add_update("is_last_step", &["counter_val"]);

            g.add_update("ctrl", &["b_lsb"]);
            g.add_update("next_state", &["ctrl", "is_last_step"]);

            g.add_update("a_mux_out", &["ctrl", "lshifter.out"]);
            g.add_update("b_mux_out", &["ctrl", "rshifter.out"]);
            g.add_update("counter_mux_out", &["ctrl", "cnt_inc.out"]);
            g.add_update("add_mux_out", &["ctrl", "adder.sum", "result_val"]);
            g.add_update("result_mux_out", &["ctrl", "add_mux_out"]);
            g.build()
        };

        let mut circuit = PropCircuit::<Self>::new(order);

        // :========================: Register outputs :========================:

        // both shifters move by exactly one bit
        circuit.add_update("a_val", |i, c, _, _, _, s| {
            c.a_val = s.a_reg;
            i.lshifter.val = c.a_val;
            i.lshifter.shamt = 1;
            i.adder.a = c.a_val;
        });
        circuit.add_update("b_val", |i, c, _, _, _, s| {
            c.b_val = s.b_reg;
            i.rshifter.val = c.b_val;
            i.rshifter.shamt = 1;
        });
        circuit.add_update("result_val", |i, c, _, _, _, s| {
            c.result_val = s.result_reg;
            i.adder.b = c.result_val;
            c.port_out.resp_msg = c.result_val;
        });
        circuit.add_update("counter_val", |i, _, _, _, _, s| {
            i.cnt_inc.val = s.counter;
        });

        circuit.add_update("b_lsb", |_, c, _, _, _, _| {
            c.b_lsb = c.b_val & 1 == 1;
        });
        circuit.add_update("is_last_step", |_, c, _, _, _, s| {
            c.is_last_step = s.counter == NSTEPS - 1;
        });

        // :==========================: Control unit :==========================:

        circuit.add_update("ctrl", |_, c, _, _, _, s| {
            c.ctrl = state_outputs(s.state, c.b_lsb, c.port_in.resp_rdy);
            c.port_out.req_rdy = c.ctrl.req_rdy;
            c.port_out.resp_en = c.ctrl.resp_en;
        });
        circuit.add_update("next_state", |_, c, n, tracer, _, s| {
            let cond = Transition {
                reset: c.port_in.reset,
                req_go: c.port_out.req_go(&c.port_in),
                calc_done: c.is_last_step,
                resp_go: c.port_out.resp_go(&c.port_in),
            };
            n.state = next_state(s.state, cond);
            if cond.req_go {
                tracer.trigger_tunnel("req");
            }
            if cond.resp_go {
                tracer.trigger_tunnel("resp");
            }
        });

        // :============================: Datapath :============================:

        circuit.add_update("a_mux_out", |_, c, n, _, o, _| {
            c.a_mux_out = match c.ctrl.sel.a_mux_sel {
                AMuxSel::Shift => o.lshifter.out,
                AMuxSel::Load => c.port_in.req_msg.a,
            };
            n.a_reg = c.a_mux_out;
        });
        circuit.add_update("b_mux_out", |_, c, n, _, o, _| {
            c.b_mux_out = match c.ctrl.sel.b_mux_sel {
                BMuxSel::Shift => o.rshifter.out,
                BMuxSel::Load => c.port_in.req_msg.b,
            };
            n.b_reg = c.b_mux_out;
        });
        // the counter restarts whenever operands are loaded
        circuit.add_update("counter_mux_out", |_, c, n, _, o, _| {
            c.counter_mux_out = match c.ctrl.sel.b_mux_sel {
                BMuxSel::Shift => o.cnt_inc.out,
                BMuxSel::Load => 0,
            };
            n.counter = c.counter_mux_out & COUNTER_MASK;
        });
        circuit.add_update("add_mux_out", |_, c, _, _, o, _| {
            c.add_mux_out = match c.ctrl.sel.add_mux_sel {
                AddMuxSel::Add => o.adder.sum,
                AddMuxSel::Result => c.result_val,
            };
        });
        circuit.add_update("result_mux_out", |_, c, n, tracer, _, _| {
            c.result_mux_out = match c.ctrl.sel.result_mux_sel {
                ResultMuxSel::Add => c.add_mux_out,
                ResultMuxSel::Zero => 0,
            };
            if c.ctrl.sel.result_reg_en {
                n.result_reg = c.result_mux_out;
                tracer.trigger_tunnel("result_mux->result_reg");
            }
        });

        circuit
    }
}

impl MulArch for Arch {
    fn port_in(inter: &IntermediateSignal) -> &PortIn {
        &inter.port_in
    }
    fn port_in_mut(inter: &mut IntermediateSignal) -> &mut PortIn {
        &mut inter.port_in
    }
    fn port_out(inter: &IntermediateSignal) -> PortOut {
        inter.port_out
    }
    fn ctrl_state(state: &Registers) -> CtrlState {
        state.state
    }
    fn line_trace(sim: &RtlSim<Self>) -> String {
        let regs = sim.state();
        format!(
            "({} {} {} {:02} {})",
            format_word(regs.a_reg),
            format_word(regs.b_reg),
            format_word(regs.result_reg),
            regs.counter,
            sim.inter().ctrl.trace_tag(regs.state),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{architectures::MinionSim, framework::CycleSim, msgs::MulReqMsg};

    fn run(a: u32, b: u32) -> (u32, usize) {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        sim.initiate_next_cycle();
        sim.drive(PortIn {
            req_en: true,
            req_msg: MulReqMsg::new(a, b),
            ..Default::default()
        });
        sim.propagate_signals();

        let mut calc = 0;
        loop {
            sim.initiate_next_cycle();
            sim.drive(PortIn::default());
            sim.propagate_signals();
            match sim.ctrl_state() {
                CtrlState::Calc => calc += 1,
                CtrlState::Done => return (sim.state().result_reg, calc),
                CtrlState::Idle => panic!("unexpected IDLE"),
            }
        }
    }

    #[test]
    fn test_fixed_latency() {
        for (a, b) in [(6, 7), (0, 0), (1, 0xffff_ffff), (0x8000_0000, 2)] {
            let (res, calc) = run(a, b);
            assert_eq!(res, a.wrapping_mul(b));
            assert_eq!(calc, NSTEPS as usize);
        }
    }

    #[test]
    fn test_line_trace_has_counter() {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        sim.initiate_next_cycle();
        sim.propagate_signals();
        assert_eq!(sim.line_trace(), "(00000000 00000000 00000000 00 I )");
    }
}
