// All hardware modules
pub mod hardware_imul;

// Multiplier designs
pub mod fixed_lat;
pub mod var_lat;

use anyhow::{bail, Result};

use crate::{
    control::CtrlState,
    framework::{Arch, CycleSim, RtlSim},
    msgs::MulReqMsg,
};

/// Signals driven into the unit by its surroundings in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PortIn {
    pub reset: bool,
    /// The requester presents `req_msg` this cycle.
    pub req_en: bool,
    pub req_msg: MulReqMsg,
    /// The consumer can take a response this cycle.
    pub resp_rdy: bool,
}

/// Signals driven by the unit in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PortOut {
    pub req_rdy: bool,
    pub resp_en: bool,
    pub resp_msg: u32,
}

impl PortOut {
    /// Whether a request is consumed this cycle.
    pub fn req_go(&self, port_in: &PortIn) -> bool {
        port_in.req_en && self.req_rdy
    }
    /// Whether a response is consumed this cycle.
    pub fn resp_go(&self, port_in: &PortIn) -> bool {
        self.resp_en && port_in.resp_rdy
    }
}

/// A multiplier architecture exposing the minion interface.
pub trait MulArch: Arch {
    fn port_in(inter: &Self::Inter) -> &PortIn;
    fn port_in_mut(inter: &mut Self::Inter) -> &mut PortIn;
    fn port_out(inter: &Self::Inter) -> PortOut;
    fn ctrl_state(state: &Self::StageState) -> CtrlState;
    fn line_trace(sim: &RtlSim<Self>) -> String;
}

/// A cycle-level simulator of a multiplier behind a request/response
/// (minion) interface.
pub trait MinionSim: CycleSim {
    /// Drive the input ports for the current cycle. Call
    /// [`CycleSim::propagate_signals`] afterwards to see the effect.
    fn drive(&mut self, port_in: PortIn);
    fn port_in(&self) -> PortIn;
    fn port_out(&self) -> PortOut;
    /// FSM state latched at the last clock edge.
    fn ctrl_state(&self) -> CtrlState;
    /// Short snapshot of the registers and the control step.
    fn line_trace(&self) -> String;
    /// Datapath tunnels triggered by the last propagation.
    fn tunnels(&self) -> &[&'static str];

    /// Spend one cycle with reset asserted. The FSM is IDLE afterwards.
    fn reset(&mut self) {
        self.initiate_next_cycle();
        self.drive(PortIn {
            reset: true,
            ..Default::default()
        });
        self.propagate_signals();
        self.drive(PortIn::default());
    }
}

impl<T: MulArch> MinionSim for RtlSim<T> {
    fn drive(&mut self, port_in: PortIn) {
        *T::port_in_mut(&mut self.cur_inter) = port_in;
    }
    fn port_in(&self) -> PortIn {
        *T::port_in(&self.cur_inter)
    }
    fn port_out(&self) -> PortOut {
        T::port_out(&self.cur_inter)
    }
    fn ctrl_state(&self) -> CtrlState {
        T::ctrl_state(&self.cur_state)
    }
    fn line_trace(&self) -> String {
        T::line_trace(self)
    }
    fn tunnels(&self) -> &[&'static str] {
        self.tracer.tunnels()
    }
}

/// Get all architecture names
pub fn arch_names() -> Vec<&'static str> {
    vec!["var_lat", "fixed_lat"]
}

pub fn create_sim(kind: &str) -> Result<Box<dyn MinionSim>> {
    let sim: Box<dyn MinionSim> = match kind {
        "var_lat" => Box::new(RtlSim::<var_lat::Arch>::new()),
        "fixed_lat" => Box::new(RtlSim::<fixed_lat::Arch>::new()),
        _ => bail!(
            "unknown architecture `{kind}`, available: {}",
            arch_names().join(", ")
        ),
    };
    tracing::debug!("created `{kind}` multiplier");
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sim() {
        for name in arch_names() {
            let sim = create_sim(name).unwrap();
            assert_eq!(sim.ctrl_state(), CtrlState::Idle);
            assert_eq!(sim.cycle_count(), 0);
        }
        assert!(create_sim("booth").is_err());
    }

    #[test]
    fn test_handshake_helpers() {
        let port_in = PortIn {
            req_en: true,
            resp_rdy: false,
            ..Default::default()
        };
        let port_out = PortOut {
            req_rdy: true,
            resp_en: true,
            resp_msg: 0,
        };
        assert!(port_out.req_go(&port_in));
        assert!(!port_out.resp_go(&port_in));
    }
}
