//! Multiplication scenarios shared by every architecture.

use super::SimTester;
use crate::HarnessOption;

macro_rules! test_ensure {
    ($name:literal, $ans:expr, $res:expr) => {
        if ($res) != ($ans) {
            anyhow::bail!(
                "test failed: {name}, expected: {answer:?}, got: {result:?}",
                name = format!($name),
                answer = &$ans,
                result = &$res
            );
        }
    };
}

/// Operands with long runs of zeros and ones, plus the corners.
const OPERANDS: [u32; 10] = [
    0,
    1,
    2,
    7,
    0x100,
    0x8000_0000,
    0x8000_0001,
    0x00ff_0000,
    0xdead_beef,
    0xffff_ffff,
];

impl SimTester {
    pub fn test_corner_operands(&self) -> anyhow::Result<()> {
        for a in OPERANDS {
            for b in OPERANDS {
                let report = self.simulate(&[(a, b)], HarnessOption::default())?;
                test_ensure!("{a:#x}*{b:#x}", vec![a.wrapping_mul(b)], report.results);
            }
        }
        Ok(())
    }

    /// Requests offered every cycle with the sink always ready.
    pub fn test_back_to_back(&self) -> anyhow::Result<()> {
        let reqs: Vec<_> = OPERANDS
            .iter()
            .zip(OPERANDS.iter().rev())
            .map(|(&a, &b)| (a, b))
            .collect();
        let report = self.simulate(&reqs, HarnessOption::default())?;
        let answer: Vec<_> = reqs.iter().map(|&(a, b)| a.wrapping_mul(b)).collect();
        test_ensure!("back-to-back", answer, report.results);
        Ok(())
    }

    pub fn test_delays(&self) -> anyhow::Result<()> {
        let reqs: [(u32, u32); 3] = [(13, 17), (0xffff, 0xffff), (0x1234_5678, 0x9abc_def0)];
        let answer: Vec<_> = reqs.iter().map(|&(a, b)| a.wrapping_mul(b)).collect();
        for src_delay in [0, 1, 4] {
            for sink_delay in [0, 2, 7] {
                let option = HarnessOption::default()
                    .set_src_delay(src_delay)
                    .set_sink_delay(sink_delay);
                let report = self.simulate(&reqs, option)?;
                test_ensure!("delay-{src_delay}-{sink_delay}", answer, report.results);
            }
        }
        Ok(())
    }
}

#[test]
fn test_all_archs() -> anyhow::Result<()> {
    for arch in crate::architectures::arch_names() {
        let tester = SimTester::new(arch).ok_or_else(|| anyhow::anyhow!("no arch {arch}"))?;
        tester.test_corner_operands()?;
        tester.test_back_to_back()?;
        tester.test_delays()?;
    }
    assert!(SimTester::new("booth").is_none());
    Ok(())
}
