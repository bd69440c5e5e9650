//! Variable latency iterative multiplier.
//!
//! The classic shift-add loop, where a CALC step either accumulates and
//! consumes the set bit 0 of B, or skips the whole run (up to 8) of low zero
//! bits of B at once. The loop ends as soon as B becomes zero.

use super::{hardware_imul::*, MulArch, PortIn, PortOut};
use crate::{
    control::*,
    framework::{CircuitTypes, PropCircuit, PropOrderBuilder, RtlSim},
    utils::format_word,
};

/// Registers of the datapath and the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Registers {
    /// Multiplicand, shifted left every CALC step
    pub a_reg: u32,
    /// Multiplier, shifted right every CALC step
    pub b_reg: u32,
    pub result_reg: u32,
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

    // status signals (dpath -> ctrl)
    pub b_lsb: bool,
    pub is_b_zero: bool,

    pub shamt: u32,
    pub ctrl: CtrlOutputs,

    pub a_mux_out: u32,
    pub b_mux_out: u32,
    pub add_mux_out: u32,
    pub result_mux_out: u32,
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
            g.add_rev_deps("a_val", &["lshifter.val", "adder.a"]);
            g.add_update("b_val", &[]);
            g.add_rev_deps(
                "b_val",
                &["rshifter.val", "b_zero_cmp.val", "calc_shamt.b_low"],
            );
            g.add_update("result_val", &[]);
            g.add_rev_deps("result_val", &["adder.b"]);

            g.add_update("b_lsb", &["b_val"]);
            g.add_update("is_b_zero", &["b_zero_cmp.is_zero"]);
            g.add_update("shamt", &["calc_shamt.shamt"]);
            g.add_rev_deps("shamt", &["lshifter.shamt", "rshifter.shamt"]);

            g.add_update("ctrl", &["b_lsb"]);
            g.add_update("next_state", &["ctrl", "is_b_zero"]);

            g.add_update("a_mux_out", &["ctrl", "lshifter.out"]);
            g.add_update("b_mux_out", &["ctrl", "rshifter.out"]);
            g.add_update("add_mux_out", &["ctrl", "adder.sum", "result_val"]);
            g.add_update("result_mux_out", &["ctrl", "add_mux_out"]);
            g.build()
        };

        let mut circuit = PropCircuit::<Self>::new(order);

        // :========================: Register outputs :========================:

        circuit.add_update("a_val", |i, c, _, _, _, s| {
            c.a_val = s.a_reg;
            i.lshifter.val = c.a_val;
            // the adder takes A before this step's shift
            i.adder.a = c.a_val;
        });
        circuit.add_update("b_val", |i, c, _, _, _, s| {
            c.b_val = s.b_reg;
            i.rshifter.val = c.b_val;
            i.b_zero_cmp.val = c.b_val;
            i.calc_shamt.b_low = (c.b_val & 0xff) as u8;
        });
        circuit.add_update("result_val", |i, c, _, _, _, s| {
            c.result_val = s.result_reg;
            i.adder.b = c.result_val;
            c.port_out.resp_msg = c.result_val;
        });

        // :=========================: Status signals :=========================:

        circuit.add_update("b_lsb", |_, c, _, _, _, _| {
            c.b_lsb = c.b_val & 1 == 1;
        });
        circuit.add_update("is_b_zero", |_, c, _, _, o, _| {
            c.is_b_zero = o.b_zero_cmp.is_zero;
        });
        circuit.add_update("shamt", |i, c, _, _, o, _| {
            c.shamt = o.calc_shamt.shamt;
            i.lshifter.shamt = c.shamt;
            i.rshifter.shamt = c.shamt;
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
                calc_done: c.is_b_zero,
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

        circuit.add_update("a_mux_out", |_, c, n, tracer, o, _| {
            c.a_mux_out = match c.ctrl.sel.a_mux_sel {
                AMuxSel::Shift => o.lshifter.out,
                AMuxSel::Load => {
                    tracer.trigger_tunnel("req.a->a_reg");
                    c.port_in.req_msg.a
                }
            };
            n.a_reg = c.a_mux_out;
        });
        circuit.add_update("b_mux_out", |_, c, n, tracer, o, _| {
            c.b_mux_out = match c.ctrl.sel.b_mux_sel {
                BMuxSel::Shift => o.rshifter.out,
                BMuxSel::Load => {
                    tracer.trigger_tunnel("req.b->b_reg");
                    c.port_in.req_msg.b
                }
            };
            n.b_reg = c.b_mux_out;
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
                let sel = &c.ctrl.sel;
                let tunnel = match (sel.result_mux_sel, sel.add_mux_sel) {
                    (ResultMuxSel::Zero, _) => "zero->result_reg",
                    (ResultMuxSel::Add, AddMuxSel::Add) => "adder->result_reg",
                    (ResultMuxSel::Add, AddMuxSel::Result) => "result_reg->result_reg",
                };
                tracer.trigger_tunnel(tunnel);
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
            "({} {} {} {})",
            format_word(regs.a_reg),
            format_word(regs.b_reg),
            format_word(regs.result_reg),
            sim.inter().ctrl.trace_tag(regs.state),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        architectures::MinionSim,
        framework::{CycleSim, RtlSim},
        msgs::MulReqMsg,
    };

    fn request(a: u32, b: u32) -> PortIn {
        PortIn {
            reset: false,
            req_en: true,
            req_msg: MulReqMsg::new(a, b),
            resp_rdy: true,
        }
    }

    /// Clock edge, drive the ports, settle.
    fn cycle(sim: &mut RtlSim<Arch>, port_in: PortIn) -> PortOut {
        sim.initiate_next_cycle();
        sim.drive(port_in);
        sim.propagate_signals();
        sim.port_out()
    }

    /// Submit one request and return (product, CALC cycles).
    fn multiply(sim: &mut RtlSim<Arch>, a: u32, b: u32) -> (u32, usize) {
        sim.reset();
        let out = cycle(sim, request(a, b));
        assert!(out.req_rdy);
        let mut calc = 0;
        loop {
            let out = cycle(sim, PortIn::default());
            match sim.ctrl_state() {
                CtrlState::Calc => calc += 1,
                CtrlState::Done => {
                    assert!(!out.resp_en, "response valid without a ready consumer");
                    return (sim.state().result_reg, calc);
                }
                CtrlState::Idle => panic!("left CALC without passing DONE"),
            }
            assert!(calc <= 64, "hang in CALC for {a:#x} * {b:#x}");
        }
    }

    #[test]
    fn test_circuit_order() {
        let sim = RtlSim::<Arch>::new();
        let order: Vec<_> = sim.prop_order().names().collect();
        let pos = |n: &str| order.iter().position(|x| *x == n).unwrap();
        assert!(pos("b_val") < pos("calc_shamt"));
        assert!(pos("calc_shamt") < pos("shamt"));
        assert!(pos("shamt") < pos("lshifter"));
        assert!(pos("lshifter") < pos("a_mux_out"));
        assert!(pos("ctrl") < pos("add_mux_out"));
        assert!(pos("add_mux_out") < pos("result_mux_out"));
        assert!(pos("b_zero_cmp") < pos("next_state"));
    }

    #[test]
    fn test_next_registers_settle_before_edge() {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        cycle(&mut sim, request(6, 7));
        assert_eq!(sim.state().state, CtrlState::Idle);
        assert_eq!(sim.next_state().state, CtrlState::Calc);
        assert_eq!((sim.next_state().a_reg, sim.next_state().b_reg), (6, 7));

        cycle(&mut sim, PortIn::default());
        let (unit_in, unit_out) = sim.unit_signals();
        assert_eq!((unit_in.adder.a, unit_in.adder.b), (6, 0));
        assert_eq!(unit_out.adder.sum, 6);
        assert_eq!(unit_in.calc_shamt.b_low, 7);
        assert_eq!(unit_out.lshifter.out, 12);
        assert_eq!(sim.next_state().result_reg, 6);
    }

    #[test]
    fn test_small_products() {
        let mut sim = RtlSim::<Arch>::new();
        let (res, calc) = multiply(&mut sim, 6, 7);
        assert_eq!(res, 42);
        assert!(calc <= 4, "6 * 7 took {calc} CALC cycles");

        assert_eq!(multiply(&mut sim, 0xffff_ffff, 2).0, 0xffff_fffe);
        assert_eq!(multiply(&mut sim, 0x8000_0000, 2).0, 0);
        assert_eq!(multiply(&mut sim, 0, 0xdead_beef).0, 0);
    }

    #[test]
    fn test_zero_b_takes_one_calc_cycle() {
        let mut sim = RtlSim::<Arch>::new();
        assert_eq!(multiply(&mut sim, 1234, 0), (0, 1));
    }

    #[test]
    fn test_zero_runs_are_skipped() {
        let mut sim = RtlSim::<Arch>::new();
        // 2^24: three full 8-bit skips, one add, one final CALC with b == 0
        assert_eq!(multiply(&mut sim, 3, 1 << 24), (3 << 24, 5));
    }

    #[test]
    fn test_line_trace() {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        cycle(&mut sim, request(6, 7));
        assert_eq!(sim.line_trace(), "(00000000 00000000 00000000 I )");
        cycle(&mut sim, PortIn::default());
        assert_eq!(sim.line_trace(), "(00000006 00000007 00000000 C+)");
        assert!(sim.tunnels().contains(&"adder->result_reg"));
        cycle(&mut sim, PortIn::default());
        assert_eq!(sim.line_trace(), "(0000000c 00000003 00000006 C+)");
    }

    #[test]
    fn test_request_ignored_unless_idle() {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        cycle(&mut sim, request(5, 3));
        let out = cycle(&mut sim, request(100, 100));
        assert!(!out.req_rdy);
        while sim.ctrl_state() != CtrlState::Done {
            cycle(&mut sim, request(100, 100));
        }
        assert_eq!(sim.state().result_reg, 15);
    }

    #[test]
    fn test_done_holds_until_accepted() {
        let mut sim = RtlSim::<Arch>::new();
        let (res, _) = multiply(&mut sim, 9, 9);
        let pending = PortIn {
            req_en: true,
            req_msg: MulReqMsg::new(2, 2),
            ..Default::default()
        };
        for _ in 0..10 {
            let out = cycle(&mut sim, pending);
            assert_eq!(sim.ctrl_state(), CtrlState::Done);
            assert!(!out.resp_en);
            assert_eq!(sim.state().result_reg, res);
        }
        let out = cycle(
            &mut sim,
            PortIn {
                resp_rdy: true,
                ..Default::default()
            },
        );
        assert!(out.resp_en);
        assert_eq!(out.resp_msg, 81);
        // the response is consumed at this edge
        cycle(&mut sim, PortIn::default());
        assert_eq!(sim.ctrl_state(), CtrlState::Idle);
    }

    #[test]
    fn test_reset_abandons_computation() {
        let mut sim = RtlSim::<Arch>::new();
        sim.reset();
        cycle(&mut sim, request(0xffff_ffff, 0xffff_ffff));
        cycle(&mut sim, PortIn::default());
        assert_eq!(sim.ctrl_state(), CtrlState::Calc);
        sim.reset();
        cycle(&mut sim, PortIn::default());
        assert_eq!(sim.ctrl_state(), CtrlState::Idle);
        assert_eq!(multiply(&mut sim, 11, 11).0, 121);
    }
}
