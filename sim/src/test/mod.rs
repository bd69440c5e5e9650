//! This module contains utilities for verifying the correctness of an
//! architecture's implementation.

mod scenario;

use crate::{HarnessOption, RunReport, TestHarness};

pub struct SimTester {
    arch: String,
}

impl SimTester {
    pub fn new(arch: &str) -> Option<Self> {
        if crate::architectures::arch_names()
            .iter()
            .any(|&a| a == arch)
        {
            Some(Self { arch: arch.into() })
        } else {
            None
        }
    }

    /// Multiply every pair and check the products against `wrapping_mul`.
    fn simulate(&self, reqs: &[(u32, u32)], option: HarnessOption) -> anyhow::Result<RunReport> {
        let sim = crate::architectures::create_sim(&self.arch)?;
        let mut harness = TestHarness::new(sim, option);
        for &(a, b) in reqs {
            harness.push(a, b);
        }
        harness.run()
    }
}
