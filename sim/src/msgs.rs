//! Messages carried by the multiplier's request/response interface.

use anyhow::{Context, Result};

use crate::utils::parse_literal;

/// A multiply request: two 32-bit unsigned operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MulReqMsg {
    pub a: u32,
    pub b: u32,
}

impl MulReqMsg {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// The response a correct unit produces for this request.
    pub fn product(&self) -> u32 {
        self.a.wrapping_mul(self.b)
    }
}

impl std::fmt::Display for MulReqMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}:{:08x}", self.a, self.b)
    }
}

impl std::str::FromStr for MulReqMsg {
    type Err = anyhow::Error;

    /// Parse `a b` where both operands are decimal or `0x` hex literals.
    fn from_str(s: &str) -> Result<Self> {
        let mut it = s.split_whitespace();
        let (Some(a), Some(b), None) = (it.next(), it.next(), it.next()) else {
            anyhow::bail!("expect two operands, got `{s}`");
        };
        Ok(Self {
            a: parse_operand(a)?,
            b: parse_operand(b)?,
        })
    }
}

/// Parse one 32-bit operand.
pub fn parse_operand(s: &str) -> Result<u32> {
    let val = parse_literal(s).with_context(|| format!("invalid operand `{s}`"))?;
    u32::try_from(val).with_context(|| format!("operand `{s}` does not fit in 32 bits"))
}

/// Parse a list of requests, one `a b` pair per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn parse_requests(src: &str) -> Result<Vec<MulReqMsg>> {
    src.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(no, line)| {
            line.parse::<MulReqMsg>()
                .with_context(|| format!("line {}: invalid request", no + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let req: MulReqMsg = "6 7".parse().unwrap();
        assert_eq!(req, MulReqMsg::new(6, 7));
        assert_eq!(req.product(), 42);
        let req: MulReqMsg = "0xffffffff\t2".parse().unwrap();
        assert_eq!(req.to_string(), "ffffffff:00000002");
        assert!("1".parse::<MulReqMsg>().is_err());
        assert!("1 2 3".parse::<MulReqMsg>().is_err());
        assert!("0x100000000 1".parse::<MulReqMsg>().is_err());
        assert!("x 1".parse::<MulReqMsg>().is_err());
    }

    #[test]
    fn test_parse_requests() {
        let src = "# operands\n6 7\n\n  0x80000000 2\n";
        let reqs = parse_requests(src).unwrap();
        assert_eq!(reqs, vec![MulReqMsg::new(6, 7), MulReqMsg::new(0x8000_0000, 2)]);
        assert_eq!(reqs[1].product(), 0);

        let err = parse_requests("1 2\n3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
