//! Register level boundary of the sorting accelerator.
//!
//! The accelerator exposes three registers to the processor:
//!
//! - `xr0`: go/done. Writing starts the sort, reading gives 1 once finished.
//! - `xr1`: base address of the array.
//! - `xr2`: number of elements.
//!
//! Software writes `xr1` and `xr2`, writes `xr0`, then polls `xr0`. The sort
//! itself is a [`SortEngine`] supplied by the user of [`SortXcel`]. It sees
//! memory through a word level [`MemMaster`].

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum XcelMsgType {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct XcelReqMsg {
    /// Returned unchanged in the response.
    pub opaque: u8,
    pub ty: XcelMsgType,
    pub raddr: u8,
    /// Ignored by reads.
    pub data: u32,
}

impl XcelReqMsg {
    pub fn read(opaque: u8, raddr: u8) -> Self {
        Self {
            opaque,
            ty: XcelMsgType::Read,
            raddr,
            data: 0,
        }
    }
    pub fn write(opaque: u8, raddr: u8, data: u32) -> Self {
        Self {
            opaque,
            ty: XcelMsgType::Write,
            raddr,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct XcelRespMsg {
    pub opaque: u8,
    pub ty: XcelMsgType,
    /// Zero for writes.
    pub data: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XcelReg {
    Go = 0,
    Base = 1,
    Size = 2,
}

impl TryFrom<u8> for XcelReg {
    type Error = anyhow::Error;

    fn try_from(raddr: u8) -> Result<Self> {
        Ok(match raddr {
            0 => Self::Go,
            1 => Self::Base,
            2 => Self::Size,
            _ => bail!("invalid accelerator register xr{raddr}"),
        })
    }
}

/// Word addressed view of the memory the accelerator can access.
pub trait MemMaster {
    fn read(&mut self, addr: u32) -> Result<u32>;
    fn write(&mut self, addr: u32, data: u32) -> Result<()>;
}

/// Sorts `size` words starting at `base`.
pub trait SortEngine {
    fn run(&mut self, mem: &mut dyn MemMaster, base: u32, size: u32) -> Result<()>;
}

pub struct SortXcel<E: SortEngine> {
    engine: E,
    base: u32,
    size: u32,
    done: bool,
}

impl<E: SortEngine> SortXcel<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            base: 0,
            size: 0,
            done: false,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Serve one register access.
    pub fn handle(&mut self, req: XcelReqMsg, mem: &mut dyn MemMaster) -> Result<XcelRespMsg> {
        let reg = XcelReg::try_from(req.raddr)?;
        let data = match req.ty {
            XcelMsgType::Read => match reg {
                XcelReg::Go => self.done as u32,
                XcelReg::Base => self.base,
                XcelReg::Size => self.size,
            },
            XcelMsgType::Write => {
                match reg {
                    XcelReg::Go => {
                        self.done = false;
                        tracing::debug!(base = self.base, size = self.size, "sort started");
                        self.engine.run(mem, self.base, self.size)?;
                        self.done = true;
                    }
                    XcelReg::Base => self.base = req.data,
                    XcelReg::Size => self.size = req.data,
                }
                0
            }
        };
        Ok(XcelRespMsg {
            opaque: req.opaque,
            ty: req.ty,
            data,
        })
    }

    pub fn line_trace(&self) -> String {
        format!(
            "({} {:08x} {:08x})",
            if self.done { 'D' } else { ' ' },
            self.base,
            self.size
        )
    }
}
