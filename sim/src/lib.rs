pub mod architectures;
pub mod control;
mod dsl;
pub mod framework;
pub mod harness;
pub mod msgs;
mod utils;
pub mod xcel;

#[cfg(test)]
mod test;

pub use architectures::{arch_names, create_sim, MinionSim, PortIn, PortOut};
pub use harness::{HarnessOption, RunReport, TestHarness};
pub use msgs::{parse_requests, MulReqMsg};
