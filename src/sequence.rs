//! The mutable top-level container a scan program is assembled in.
//!
//! A [`CommandSequence`] owns an ordered list of [`ScanCommand`] entries and
//! is grown by one logical writer (a script generator, a parser, a GUI
//! editor) through [`add`](CommandSequence::add) and its convenience
//! shortcuts. Every append re-runs the addressing pass over the whole tree,
//! so the sequence is consistently numbered at all times. Once handed to an
//! execution engine the sequence is read-only:
//! [`commands`](CommandSequence::commands) exposes a shared slice and nothing
//! mutates a command in place.
//!
//! [`dump`](CommandSequence::dump) renders the tree one command per line with
//! its address and indentation proportional to nesting depth. The format is
//! for humans and tests, not a wire contract.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::assign_addresses;
use crate::command::{
    Comparison, LogCommand, LoopCommand, ParamValue, ScanCommand, SetCommand, WaitCommand,
};
use crate::error::{ScanError, ScanResult};

/// Ordered, growable list of top-level scan commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    commands: Vec<ScanCommand>,
}

impl CommandSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully-constructed command and re-address the whole tree.
    ///
    /// The command may be a [`ScanCommand::Loop`] with a pre-built body; its
    /// body addresses are re-stamped here to continue this sequence's
    /// numbering.
    pub fn add(&mut self, command: ScanCommand) {
        self.commands.push(command);
        let assigned = assign_addresses(&mut self.commands);
        tracing::debug!(
            "Appended command; sequence has {} top-level entries, {} addresses",
            self.commands.len(),
            assigned
        );
    }

    /// Append a fire-and-forget set command.
    pub fn set(&mut self, device: impl Into<String>, value: impl Into<ParamValue>) {
        self.add(ScanCommand::Set(SetCommand::new(device, value)));
    }

    /// Append a wait command.
    ///
    /// A zero `timeout` means the engine waits with no time bound.
    pub fn wait(
        &mut self,
        device: impl Into<String>,
        comparison: Comparison,
        desired: f64,
        tolerance: f64,
        timeout: Duration,
    ) -> ScanResult<()> {
        let command = WaitCommand::new(device, comparison, desired, tolerance)?
            .with_timeout(timeout);
        self.add(ScanCommand::Wait(command));
        Ok(())
    }

    /// Append a wait for a reading to equal `desired` within `tolerance`,
    /// with no time bound.
    pub fn wait_for(
        &mut self,
        device: impl Into<String>,
        desired: f64,
        tolerance: f64,
    ) -> ScanResult<()> {
        self.wait(device, Comparison::Equals, desired, tolerance, Duration::ZERO)
    }

    /// Append a log command over an ordered list of device identifiers.
    pub fn log<I, S>(&mut self, devices: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(ScanCommand::Log(LogCommand::new(devices)));
    }

    /// Append a loop command owning the given body. Named `loop_over`
    /// because `loop` is a keyword.
    pub fn loop_over<I>(
        &mut self,
        device: impl Into<String>,
        start: f64,
        end: f64,
        step: f64,
        body: I,
    ) -> ScanResult<()>
    where
        I: IntoIterator<Item = ScanCommand>,
    {
        self.add(ScanCommand::Loop(LoopCommand::new(
            device, start, end, step, body,
        )?));
        Ok(())
    }

    /// Read-only view of the top-level command list.
    pub fn commands(&self) -> &[ScanCommand] {
        &self.commands
    }

    pub(crate) fn commands_mut(&mut self) -> &mut [ScanCommand] {
        &mut self.commands
    }

    /// Top-level command at `index`, or [`ScanError::IndexOutOfRange`].
    pub fn get(&self, index: usize) -> ScanResult<&ScanCommand> {
        self.commands.get(index).ok_or(ScanError::IndexOutOfRange {
            index,
            len: self.commands.len(),
        })
    }

    /// Number of top-level commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the sequence holds no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The address the next appended command would receive, i.e. the total
    /// number of commands in the tree including loop bodies.
    pub fn next_address(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self.commands.iter()];
        while let Some(frame) = stack.last_mut() {
            match frame.next() {
                None => {
                    stack.pop();
                }
                Some(command) => {
                    total += 1;
                    if let Some(body) = command.body() {
                        stack.push(body.commands().iter());
                    }
                }
            }
        }
        total
    }

    /// Depth-first textual rendering of the tree, one command per line with
    /// its address, indented two spaces per nesting level. Diagnostics only.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![self.commands.iter()];
        while let Some(frame) = stack.last_mut() {
            match frame.next() {
                None => {
                    stack.pop();
                }
                Some(command) => {
                    let indent = "  ".repeat(stack.len() - 1);
                    match command.address() {
                        Some(address) => write!(f, "{:>4}", address)?,
                        None => write!(f, "{:>4}", "?")?,
                    }
                    writeln!(f, "  {}{}", indent, command)?;
                    if let Some(body) = command.body() {
                        stack.push(body.commands().iter());
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_addresses_follow_append_order() {
        let mut seq = CommandSequence::new();
        seq.set("setpoint", 1);
        seq.wait_for("readback", 1.0, 0.1).unwrap();
        seq.log(["readback"]);

        assert_eq!(seq.len(), 3);
        for (i, command) in seq.commands().iter().enumerate() {
            assert_eq!(command.address(), Some(i));
        }
        assert_eq!(seq.next_address(), 3);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut seq = CommandSequence::new();
        seq.set("setpoint", 1);
        assert!(seq.get(0).is_ok());
        assert_eq!(
            seq.get(3),
            Err(ScanError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_prebuilt_loop_body_is_renumbered_on_add() {
        // Body built standalone starts numbering at 0; appending the loop
        // into a parent restamps it to continue the parent's numbering.
        let loop_cmd = ScanCommand::loop_over(
            "setpoint",
            1.0,
            5.0,
            1.0,
            [ScanCommand::log(["readback"])],
        )
        .unwrap();
        assert_eq!(loop_cmd.body().unwrap().commands()[0].address(), Some(0));

        let mut seq = CommandSequence::new();
        seq.set("setpoint", 1);
        seq.add(loop_cmd);

        let body = seq.commands()[1].body().unwrap();
        assert_eq!(seq.commands()[1].address(), Some(1));
        assert_eq!(body.commands()[0].address(), Some(2));
        assert_eq!(seq.next_address(), 3);
    }

    #[test]
    fn test_dump_indents_nested_bodies() {
        let mut seq = CommandSequence::new();
        seq.set("setpoint", 1);
        seq.loop_over("setpoint", 1.0, 2.0, 1.0, [ScanCommand::log(["readback"])])
            .unwrap();

        let dump = seq.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   0  Set 'setpoint' = 1");
        assert_eq!(lines[1], "   1  Loop 'setpoint' = 1 .. 2, step 1");
        assert_eq!(lines[2], "   2    Log 'readback'");
    }

    #[test]
    fn test_empty_sequence() {
        let seq = CommandSequence::new();
        assert!(seq.is_empty());
        assert_eq!(seq.next_address(), 0);
        assert_eq!(seq.dump(), "");
    }
}
