//! To provide a flexible codebase for different multiplier designs, we give a
//! general cycle-level simulator framework for synchronous logic.
mod propagate;

pub use propagate::{
    topo, NameList, PropCircuit, PropOrder, PropOrderBuilder, PropUpdates, Propagator, Tracer,
};

/// A set of functional units, usually generated by [`crate::define_units`].
pub trait HardwareUnits: Default {
    type UnitIn;
    type UnitOut;
    /// Evaluate unit `name` from its input signals into its output signals.
    fn run_unit(&mut self, name: &'static str, input: &Self::UnitIn, output: &mut Self::UnitOut);
}

/// During a cycle, the values held in registers are propagated through the
/// combinational logic circuits. The values driven into the registers are then
/// latched at the clock edge. Therefore we can use two basic operations to
/// simulate the design.
pub trait CycleSim {
    /// Initiate the next cycle or the first cycle. This is the clock edge: the
    /// register values computed by the last [`CycleSim::propagate_signals`]
    /// become the current ones.
    fn initiate_next_cycle(&mut self);

    /// Propagate signals through the combinational logic circuits. This should
    /// be called after [`CycleSim::initiate_next_cycle`]. Each call recomputes
    /// everything from the current registers, so it can be called again after
    /// the inputs of this cycle change.
    fn propagate_signals(&mut self);

    /// Number of clock edges seen so far.
    fn cycle_count(&self) -> u64;

    fn step(&mut self) {
        self.initiate_next_cycle();
        self.propagate_signals();
    }
}

// here we use trait to collect the types
pub trait CircuitTypes {
    type UnitIn: Default;
    type UnitOut: Default;
    type Inter: Default;
    /// Contents of every register (including the FSM state) at one moment.
    type StageState: Default + Clone;
}

pub trait Arch: CircuitTypes + Sized {
    type Units: HardwareUnits<UnitIn = Self::UnitIn, UnitOut = Self::UnitOut>;
    fn build_circuit() -> PropCircuit<Self>;
}

/// Register transfer level simulator.
///
/// - Combinational logics: from `cur_state`, through `cur_unit_in`,
///   `cur_inter` and `cur_unit_out`, to `nex_state`.
/// - Clock edge: `nex_state` replaces `cur_state` as a whole.
pub struct RtlSim<T: Arch> {
    pub(crate) circuit: PropCircuit<T>,
    pub(crate) cur_unit_in: T::UnitIn,
    pub(crate) cur_unit_out: T::UnitOut,
    pub(crate) cur_inter: T::Inter,
    pub(crate) cur_state: T::StageState,
    pub(crate) nex_state: T::StageState,
    pub(crate) units: T::Units,
    /// Tunnels triggered by the last propagation.
    pub(crate) tracer: Tracer,
    pub(crate) cycle_count: u64,
}

impl<T: Arch> Default for RtlSim<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Arch> RtlSim<T> {
    pub fn new() -> Self {
        Self {
            circuit: T::build_circuit(),
            cur_unit_in: T::UnitIn::default(),
            cur_unit_out: T::UnitOut::default(),
            cur_inter: T::Inter::default(),
            cur_state: T::StageState::default(),
            nex_state: T::StageState::default(),
            units: T::Units::default(),
            tracer: Tracer::default(),
            cycle_count: 0,
        }
    }

    /// Registers as latched at the last clock edge.
    pub fn state(&self) -> &T::StageState {
        &self.cur_state
    }
    /// Registers as they will be latched at the next clock edge.
    pub fn next_state(&self) -> &T::StageState {
        &self.nex_state
    }
    pub fn inter(&self) -> &T::Inter {
        &self.cur_inter
    }
    pub fn unit_signals(&self) -> (&T::UnitIn, &T::UnitOut) {
        (&self.cur_unit_in, &self.cur_unit_out)
    }
    pub fn prop_order(&self) -> &PropOrder {
        &self.circuit.order
    }
}

impl<T: Arch> CycleSim for RtlSim<T> {
    fn initiate_next_cycle(&mut self) {
        self.cur_state = self.nex_state.clone();
        self.cycle_count += 1;
    }

    fn propagate_signals(&mut self) {
        // registers without a write this cycle keep their value
        self.nex_state = self.cur_state.clone();

        let mut prop = self.circuit.updates.make_propagator(
            &mut self.cur_unit_in,
            &mut self.cur_unit_out,
            &mut self.nex_state,
            &self.cur_state,
            &mut self.cur_inter,
        );
        for (is_unit, name) in &self.circuit.order.order {
            if *is_unit {
                prop.run_unit(&mut self.units, name);
            } else {
                prop.run_combinational_logic(name);
            }
        }
        self.tracer = prop.finalize();
    }

    fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
