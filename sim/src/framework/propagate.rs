use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    fmt::Debug,
    hash::Hash,
};

use super::{CircuitTypes, HardwareUnits};

/// Vec<(is_unit, name)>.
/// A node can be either a unit name or a combinational logic name.
pub type NameList = Vec<(bool, &'static str)>;

#[derive(Debug, Default)]
pub struct PropOrder {
    pub(crate) order: NameList,
}

impl PropOrder {
    /// Runnable nodes in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().map(|(_, name)| *name)
    }
}

/// Compute topological order of nodes using BFS.
///
/// Return node list in order and their levels
pub fn topo<Node: Copy + Eq + Hash + Debug>(
    nodes: impl Iterator<Item = Node> + Clone,
    edges: impl Iterator<Item = (Node, Node)> + Clone,
) -> Vec<(Node, i32)> {
    let mut degree_level: HashMap<Node, (i32, i32)> = HashMap::default();
    for (_, to) in edges.clone() {
        let entry = degree_level.entry(to).or_default();
        entry.0 += 1;
    }
    let mut que: VecDeque<Node> = VecDeque::new();
    let mut levels = Vec::new();
    for node in nodes {
        if degree_level.get(&node).copied().unwrap_or_default().0 == 0 {
            que.push_back(node)
        }
    }
    while let Some(head) = que.pop_front() {
        let level = degree_level.remove(&head).map(|o| o.1).unwrap_or(0);
        levels.push((head, level));
        for (from, to) in edges.clone() {
            if from == head {
                let Some(entry) = degree_level.get_mut(&to) else {
                    continue;
                };
                entry.0 -= 1;
                entry.1 = entry.1.max(level + 1);
                if entry.0 == 0 {
                    que.push_back(to);
                }
            }
        }
    }

    if !degree_level.is_empty() {
        panic!("combinational loop detected, degrees: {:?}", degree_level)
    }

    levels
}

pub struct PropOrderBuilder {
    runnable_nodes: NameList,
    unit_nodes: BTreeSet<&'static str>,
    /// `unit.field` ports declared by the units
    port_nodes: BTreeSet<String>,
    nodes: BTreeSet<String>,
    edges: Vec<(String, String)>,
}

impl Default for PropOrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropOrderBuilder {
    pub fn new() -> Self {
        Self {
            runnable_nodes: Default::default(),
            unit_nodes: Default::default(),
            port_nodes: Default::default(),
            nodes: Default::default(),
            edges: Default::default(),
        }
    }
    fn add_edge(&mut self, from: String, to: String) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.edges.push((from, to));
    }
    pub fn add_unit_node(&mut self, unit_name: &'static str) {
        self.runnable_nodes.push((true, unit_name));
        self.unit_nodes.insert(unit_name);
        self.nodes.insert(unit_name.to_string());
    }
    pub fn add_unit_input(&mut self, unit_name: &'static str, field_name: &'static str) {
        let full_name = String::from(unit_name) + "." + field_name;
        self.port_nodes.insert(full_name.clone());
        self.add_edge(full_name, unit_name.to_string());
    }
    pub fn add_unit_output(&mut self, unit_name: &'static str, field_name: &'static str) {
        let full_name = String::from(unit_name) + "." + field_name;
        self.port_nodes.insert(full_name.clone());
        self.add_edge(unit_name.to_string(), full_name);
    }
    /// Set combinational logic `name` as runnable. It reads the unit ports or
    /// other combinational logics listed in `deps`.
    pub fn add_update(&mut self, name: &'static str, deps: &[&'static str]) {
        self.runnable_nodes.push((false, name));
        self.nodes.insert(name.to_string());
        for dep in deps {
            assert!(
                !self.unit_nodes.contains(dep),
                "`{name}` depends on unit `{dep}` instead of one of its ports"
            );
            self.add_edge(dep.to_string(), name.to_string());
        }
    }
    /// Combinational logic `name` drives the unit input ports in `dests`.
    pub fn add_rev_deps(&mut self, name: &'static str, dests: &[&'static str]) {
        for dest in dests {
            self.add_edge(name.to_string(), dest.to_string());
        }
    }
    /// Compute topological order of nodes.
    ///
    /// Panics if a name used in the wiring is neither a unit port nor a
    /// combinational logic, or if the wiring contains a loop.
    pub fn build(self) -> PropOrder {
        for node in &self.nodes {
            let known = self.unit_nodes.contains(node.as_str())
                || self.port_nodes.contains(node)
                || self.runnable_nodes.iter().any(|(_, p)| *p == node.as_str());
            assert!(known, "unknown node `{node}` in the wiring");
        }
        let levels = topo(self.nodes.iter(), self.edges.iter().map(|(a, b)| (a, b)));
        let order: NameList = levels
            .iter()
            .filter_map(|(node, _)| {
                self.runnable_nodes
                    .iter()
                    .find(|(_, p)| *p == node.as_str())
                    .copied()
            })
            .collect();

        PropOrder { order }
    }
}

/// Record the datapath tunnels triggered in a cycle.
#[derive(Default, Debug, Clone)]
pub struct Tracer {
    pub(crate) tunnel: Vec<&'static str>,
}

impl Tracer {
    pub fn trigger_tunnel(&mut self, name: &'static str) {
        if self.tunnel.contains(&name) {
            return;
        }
        tracing::trace!("tunnel {name}");
        self.tunnel.push(name);
    }
    pub fn tunnels(&self) -> &[&'static str] {
        &self.tunnel
    }
}

// Update input and intermediate signals from output signals.
// (unit_in, inter, nex_state, tracer, unit_out, cur_state)
pub type Updater<UnitIn, UnitOut, Inter, StageState> =
    Box<dyn FnMut(&mut UnitIn, &mut Inter, &mut StageState, &mut Tracer, &UnitOut, &StageState)>;

pub struct PropUpdates<T: CircuitTypes> {
    pub(crate) updates:
        BTreeMap<&'static str, Updater<T::UnitIn, T::UnitOut, T::Inter, T::StageState>>,
}

impl<T: CircuitTypes> PropUpdates<T> {
    pub fn make_propagator<'a>(
        &'a mut self,
        unit_in: &'a mut T::UnitIn,
        unit_out: &'a mut T::UnitOut,
        nex_state: &'a mut T::StageState,
        cur_state: &'a T::StageState,
        context: &'a mut T::Inter,
    ) -> Propagator<'a, T> {
        Propagator {
            unit_in,
            unit_out,
            nex_state,
            cur_state,
            context,
            updates: self,
            tracer: Default::default(),
        }
    }
}

/// Simulate the combinational logic circuits by update functions.
pub struct PropCircuit<T: CircuitTypes> {
    pub updates: PropUpdates<T>,
    pub order: PropOrder,
}

impl<T: CircuitTypes> PropCircuit<T> {
    pub fn new(order: PropOrder) -> Self {
        Self {
            updates: PropUpdates {
                updates: Default::default(),
            },
            order,
        }
    }

    /// Generally, a circuit update function accepts output signals from units
    /// and the current registers, and then emits input signals of the next
    /// units, intermediate signals, or the values latched at the next edge.
    pub fn add_update(
        &mut self,
        name: &'static str,
        func: impl FnMut(
                &mut T::UnitIn,
                &mut T::Inter,
                &mut T::StageState,
                &mut Tracer,
                &T::UnitOut,
                &T::StageState,
            ) + 'static,
    ) {
        self.updates.updates.insert(name, Box::new(func));
    }
}

/// Propagator simulates the combinational logic circuits.
pub struct Propagator<'a, T: CircuitTypes> {
    unit_in: &'a mut T::UnitIn,
    unit_out: &'a mut T::UnitOut,
    cur_state: &'a T::StageState,
    nex_state: &'a mut T::StageState,
    context: &'a mut T::Inter,
    updates: &'a mut PropUpdates<T>,
    tracer: Tracer,
}

impl<'a, T: CircuitTypes> Propagator<'a, T> {
    /// Execute a combinational logic. See [`PropCircuit::add_update`].
    pub fn run_combinational_logic(&mut self, name: &'static str) {
        let Some(func) = self.updates.updates.get_mut(name) else {
            panic!("no combinational logic named `{name}`")
        };
        func(
            self.unit_in,
            self.context,
            self.nex_state,
            &mut self.tracer,
            self.unit_out,
            self.cur_state,
        )
    }
    /// Execute a unit.
    pub fn run_unit<U>(&mut self, units: &mut U, name: &'static str)
    where
        U: HardwareUnits<UnitIn = T::UnitIn, UnitOut = T::UnitOut>,
    {
        units.run_unit(name, self.unit_in, self.unit_out)
    }
    pub fn finalize(self) -> Tracer {
        self.tracer
    }
}
