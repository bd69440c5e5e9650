//! A test source and a test sink wrapped around a multiplier.
//!
//! The source presents requests one by one, the sink takes responses and
//! checks them against the expected products. Both sides can be slowed down
//! with a delay before every message, which exercises the back pressure paths
//! of the handshake.

use std::collections::VecDeque;

use anyhow::{bail, Result};

use crate::{
    architectures::{MinionSim, PortIn},
    control::CtrlState,
    msgs::MulReqMsg,
    utils::{format_word, trace_column},
};

const SRC_WIDTH: usize = 17;
const SINK_WIDTH: usize = 8;

pub struct HarnessOption {
    src_delay: u32,
    sink_delay: u32,
    max_cycles: u64,
    trace: bool,
}

impl Default for HarnessOption {
    fn default() -> Self {
        Self {
            src_delay: 0,
            sink_delay: 0,
            max_cycles: 10_000,
            trace: false,
        }
    }
}

impl HarnessOption {
    /// Idle cycles of the source before every request.
    pub fn set_src_delay(mut self, delay: u32) -> Self {
        self.src_delay = delay;
        self
    }
    /// Cycles the sink stays not ready before every response.
    pub fn set_sink_delay(mut self, delay: u32) -> Self {
        self.sink_delay = delay;
        self
    }
    pub fn set_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }
    /// Collect a line trace of every cycle into the report.
    pub fn set_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Result of a harness run.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunReport {
    /// Clock edges seen by the unit, reset included.
    pub cycles: u64,
    /// Responses in arrival order.
    pub results: Vec<u32>,
    pub trace: Vec<String>,
}

struct Transaction {
    req: MulReqMsg,
    expected: u32,
}

pub struct TestHarness {
    sim: Box<dyn MinionSim>,
    option: HarnessOption,
    src: VecDeque<Transaction>,
    sink: VecDeque<Transaction>,
}

impl TestHarness {
    pub fn new(sim: Box<dyn MinionSim>, option: HarnessOption) -> Self {
        Self {
            sim,
            option,
            src: VecDeque::new(),
            sink: VecDeque::new(),
        }
    }

    /// Enqueue a request expecting the 32-bit wrapped product.
    pub fn push(&mut self, a: u32, b: u32) -> &mut Self {
        let req = MulReqMsg::new(a, b);
        self.push_checked(a, b, req.product())
    }

    pub fn push_checked(&mut self, a: u32, b: u32, expected: u32) -> &mut Self {
        self.src.push_back(Transaction {
            req: MulReqMsg::new(a, b),
            expected,
        });
        self
    }

    pub fn sim(&self) -> &dyn MinionSim {
        self.sim.as_ref()
    }

    /// Reset the unit and run until every queued request is answered.
    pub fn run(&mut self) -> Result<RunReport> {
        let HarnessOption {
            src_delay,
            sink_delay,
            max_cycles,
            trace,
        } = self.option;

        self.sim.reset();
        let mut report = RunReport::default();
        let mut src_wait = src_delay;
        let mut sink_wait = sink_delay;

        while !self.src.is_empty() || !self.sink.is_empty() {
            if self.sim.cycle_count() >= max_cycles {
                bail!(
                    "no progress within {max_cycles} cycles, {} responses outstanding",
                    self.src.len() + self.sink.len()
                );
            }
            self.sim.initiate_next_cycle();

            let src_msg = self.src.front().filter(|_| src_wait == 0).map(|t| t.req);
            let port_in = PortIn {
                reset: false,
                req_en: src_msg.is_some(),
                req_msg: src_msg.unwrap_or_default(),
                resp_rdy: sink_wait == 0,
            };
            self.sim.drive(port_in);
            self.sim.propagate_signals();

            let port_out = self.sim.port_out();
            let req_go = port_out.req_go(&port_in);
            let resp_go = port_out.resp_go(&port_in);
            let cycle = self.sim.cycle_count();

            if trace {
                let src_col = src_msg.map(|req| {
                    if req_go {
                        req.to_string()
                    } else {
                        "#".to_string()
                    }
                });
                let sink_col = if resp_go {
                    Some(format_word(port_out.resp_msg))
                } else if self.sim.ctrl_state() == CtrlState::Done {
                    Some("#".to_string())
                } else {
                    None
                };
                let line = format!(
                    "{cycle:>4}: {} > {} > {}",
                    trace_column(src_col, SRC_WIDTH),
                    self.sim.line_trace(),
                    trace_column(sink_col, SINK_WIDTH),
                );
                tracing::trace!("{line}");
                report.trace.push(line);
            }

            if req_go {
                if let Some(t) = self.src.pop_front() {
                    tracing::debug!(cycle, "request {} accepted", t.req);
                    self.sink.push_back(t);
                }
                src_wait = src_delay;
            } else if src_wait > 0 && !self.src.is_empty() {
                src_wait -= 1;
            }

            if resp_go {
                let Some(t) = self.sink.pop_front() else {
                    bail!(
                        "cycle {cycle}: unexpected response {}",
                        format_word(port_out.resp_msg)
                    );
                };
                if port_out.resp_msg != t.expected {
                    bail!(
                        "cycle {cycle}: response to {} is {}, expected {}",
                        t.req,
                        format_word(port_out.resp_msg),
                        format_word(t.expected)
                    );
                }
                tracing::debug!(cycle, "response {} checked", format_word(t.expected));
                report.results.push(port_out.resp_msg);
                sink_wait = sink_delay;
            } else if sink_wait > 0 {
                sink_wait -= 1;
            }
        }

        report.cycles = self.sim.cycle_count();
        tracing::info!(
            cycles = report.cycles,
            "{} multiplications done",
            report.results.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architectures::{arch_names, create_sim};

    fn harness(arch: &str, option: HarnessOption) -> TestHarness {
        TestHarness::new(create_sim(arch).unwrap(), option)
    }

    #[test]
    fn test_small_products() {
        for arch in arch_names() {
            let mut h = harness(arch, HarnessOption::default());
            h.push(6, 7).push(0, 0x1234).push(0xffff_ffff, 2).push(1, 1);
            let report = h.run().unwrap();
            assert_eq!(report.results, vec![42, 0, 0xffff_fffe, 1]);
            // the source ran dry before the last response left
            assert!(!h.sim().port_in().req_en);
            assert!(h.sim().port_in().resp_rdy);
        }
    }

    #[test]
    fn test_src_sink_delays() {
        for (src_delay, sink_delay) in [(0, 3), (3, 0), (2, 5)] {
            for arch in arch_names() {
                let option = HarnessOption::default()
                    .set_src_delay(src_delay)
                    .set_sink_delay(sink_delay);
                let mut h = harness(arch, option);
                h.push(3, 5).push(0x8000_0000, 2).push(0xdead_beef, 0x10);
                let report = h.run().unwrap();
                assert_eq!(report.results, vec![15, 0, 0xead_beef0]);
            }
        }
    }

    #[test]
    fn test_mismatch_is_error() {
        let mut h = harness("var_lat", HarnessOption::default());
        h.push(6, 7).push_checked(2, 2, 5);
        let err = h.run().unwrap_err();
        assert!(err.to_string().contains("expected 00000005"));
    }

    #[test]
    fn test_max_cycles() {
        let option = HarnessOption::default().set_max_cycles(10);
        let mut h = harness("fixed_lat", option);
        h.push(1, 1);
        assert!(h.run().is_err());
    }

    #[test]
    fn test_trace_format() {
        let option = HarnessOption::default().set_trace(true);
        let mut h = harness("var_lat", option);
        h.push(6, 7);
        let report = h.run().unwrap();
        assert_eq!(report.trace.len() as u64, report.cycles - 1);
        assert_eq!(
            report.trace[0],
            "   2: 00000006:00000007 > (00000000 00000000 00000000 I ) >         "
        );
        let last = report.trace.last().unwrap();
        assert!(last.ends_with("> 0000002a"), "{last}");
    }
}
