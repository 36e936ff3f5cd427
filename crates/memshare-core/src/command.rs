//! Transport-independent command surface.
//!
//! One variant per external command, dispatched against a region handle.
//! The framing that carries these commands (ioctl, RPC, anything else) is
//! a collaborator's concern; this layer only defines the operations and
//! their privilege requirements.

use memshare_common::{ProtMask, Result};

use crate::pin::{PinOutcome, PinStatus};
use crate::purge::{purge_walk, Credentials};
use crate::registry::RegionHandle;

/// A command addressed to a region (or, for the purge, to the whole
/// manager the region belongs to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fix the region's size. Only before the backing store exists.
    SetSize(usize),
    /// Read the region's size.
    GetSize,
    /// Narrow the protection mask.
    SetProtMask(ProtMask),
    /// Read the protection mask.
    GetProtMask,
    /// Name the region. Only before the backing store exists.
    SetName(String),
    /// Read the region's name.
    GetName,
    /// Pin a byte range; `len == 0` means "to the end of the region".
    Pin {
        /// Byte offset, page-aligned.
        offset: usize,
        /// Byte length, page-aligned.
        len: usize,
    },
    /// Unpin a byte range; `len == 0` means "to the end of the region".
    Unpin {
        /// Byte offset, page-aligned.
        offset: usize,
        /// Byte length, page-aligned.
        len: usize,
    },
    /// Query whether any page of a byte range is unpinned.
    GetPinStatus {
        /// Byte offset, page-aligned.
        offset: usize,
        /// Byte length, page-aligned.
        len: usize,
    },
    /// Evict all reclaimable content process-wide. Privileged.
    PurgeAllCaches,
}

/// The reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The command succeeded with nothing to report.
    Ok,
    /// Reply to [`Command::GetSize`].
    Size(usize),
    /// Reply to [`Command::GetProtMask`].
    ProtMask(ProtMask),
    /// Reply to [`Command::GetName`].
    Name(String),
    /// Reply to [`Command::Pin`].
    Pin(PinOutcome),
    /// Reply to [`Command::GetPinStatus`].
    PinStatus(PinStatus),
    /// Reply to [`Command::PurgeAllCaches`]: bytes reclaimed.
    Reclaimed(usize),
}

impl RegionHandle {
    /// Executes one command against this region.
    ///
    /// `creds` only matters for [`Command::PurgeAllCaches`]; every other
    /// command is unprivileged.
    pub fn execute(&self, command: Command, creds: &Credentials) -> Result<Response> {
        match command {
            Command::SetSize(size) => self.set_size(size).map(|()| Response::Ok),
            Command::GetSize => Ok(Response::Size(self.size())),
            Command::SetProtMask(mask) => self.set_prot_mask(mask).map(|()| Response::Ok),
            Command::GetProtMask => Ok(Response::ProtMask(self.prot_mask())),
            Command::SetName(name) => self.set_name(&name).map(|()| Response::Ok),
            Command::GetName => Ok(Response::Name(self.name())),
            Command::Pin { offset, len } => self.pin(offset, len).map(Response::Pin),
            Command::Unpin { offset, len } => self.unpin(offset, len).map(|()| Response::Ok),
            Command::GetPinStatus { offset, len } => {
                self.pin_status(offset, len).map(Response::PinStatus)
            }
            Command::PurgeAllCaches => {
                purge_walk(self.shared(), creds).map(Response::Reclaimed)
            }
        }
    }
}
