//! Command-sequence model for scripted instrument scans.
//!
//! This library defines the typed commands a scan program is assembled from
//! (set a device, wait for a condition, log readings, loop over a range) and
//! the [`CommandSequence`] builder that owns them. Every command in a built
//! sequence carries a unique, strictly increasing **address** reflecting its
//! depth-first position in the (possibly nested) command tree. Addresses are
//! the stable identifiers an execution engine uses to report progress, resume
//! after a pause, and correlate remote status updates with the submitted
//! program.
//!
//! The library builds and addresses sequences; it never talks to hardware,
//! never blocks, and spawns nothing. Execution belongs to an external engine
//! that consumes the finished, read-only command list.
//!
//! # Example
//!
//! ```
//! use scan_commands::{CommandSequence, Comparison, ScanCommand};
//! use std::time::Duration;
//!
//! let mut seq = CommandSequence::new();
//! seq.set("setpoint", 1);
//! seq.wait("readback", Comparison::Equals, 1.0, 0.1, Duration::ZERO)?;
//! seq.loop_over("setpoint", 1.0, 5.0, 1.0, [ScanCommand::log(["readback"])])?;
//!
//! // Addresses run depth-first: set = 0, wait = 1, loop = 2, body log = 3.
//! assert_eq!(seq.commands()[2].address(), Some(2));
//! assert_eq!(seq.next_address(), 4);
//! # Ok::<(), scan_commands::ScanError>(())
//! ```

pub mod address;
pub mod command;
pub mod error;
pub mod sequence;

pub use address::assign_addresses;
pub use command::{
    Comparison, LogCommand, LoopCommand, ParamValue, ScanCommand, SetCommand, WaitCommand,
};
pub use error::{ScanError, ScanResult};
pub use sequence::CommandSequence;
