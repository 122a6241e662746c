//! The closed set of scan command shapes and their construction-time checks.
//!
//! A scan program is a tree of four command kinds:
//!
//! - **`Set`**: write a value to a device, optionally awaiting completion
//! - **`Wait`**: hold until a device reading satisfies a comparison
//! - **`Log`**: record the current readings of a list of devices
//! - **`Loop`**: step a device across a range, executing a nested body of
//!   further commands (including further loops) at each point
//!
//! [`ScanCommand`] is a closed sum type over these shapes so that every
//! consumer (the address assigner, the diagnostics dump, an execution
//! engine) dispatches exhaustively at compile time. Each variant carries an
//! address stamped by the owning sequence's addressing pass; the address is
//! `None` until the command has been appended somewhere.
//!
//! Commands are plain value holders. The only validation here is what is
//! impossible to interpret later: a negative wait tolerance and a zero loop
//! step are rejected with [`ScanError::InvalidArgument`]. Device identifiers
//! are opaque strings; whether they name real devices is the execution
//! engine's concern.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::sequence::CommandSequence;

// =============================================================================
// ParamValue - value written by a Set command
// =============================================================================

/// Value written to a device by a [`SetCommand`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Integer setpoint.
    Int(i64),
    /// Floating-point setpoint.
    Float(f64),
    /// Textual setpoint (e.g. a mode name).
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(fl) => write!(f, "{}", fl),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl ParamValue {
    /// Extract value as f64, parsing text if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(fl) => Some(*fl),
            ParamValue::Text(s) => s.parse().ok(),
        }
    }

    /// Extract value as a string.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

// =============================================================================
// Comparison - wait condition semantics
// =============================================================================

/// Comparison applied by a [`WaitCommand`] to the observed device reading.
///
/// The equality family treats two values as equal when they differ by no
/// more than the wait tolerance; the ordering comparisons use exact numeric
/// ordering and ignore the tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Observed value equals the desired value within tolerance.
    Equals,
    /// Observed value differs from the desired value by more than tolerance.
    NotEquals,
    /// Observed value is strictly below the desired value.
    Less,
    /// Observed value is at or below the desired value.
    LessOrEqual,
    /// Observed value is strictly above the desired value.
    Greater,
    /// Observed value is at or above the desired value.
    GreaterOrEqual,
}

impl Comparison {
    /// Whether `observed` satisfies this comparison against `desired`.
    ///
    /// This is the pure predicate an execution engine polls while waiting;
    /// the model itself never blocks.
    pub fn is_met(self, observed: f64, desired: f64, tolerance: f64) -> bool {
        match self {
            Comparison::Equals => (observed - desired).abs() <= tolerance,
            Comparison::NotEquals => (observed - desired).abs() > tolerance,
            Comparison::Less => observed < desired,
            Comparison::LessOrEqual => observed <= desired,
            Comparison::Greater => observed > desired,
            Comparison::GreaterOrEqual => observed >= desired,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Equals => "==",
            Comparison::NotEquals => "!=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

// =============================================================================
// Command variants
// =============================================================================

/// Write a value to a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetCommand {
    #[serde(default)]
    address: Option<usize>,
    device: String,
    value: ParamValue,
    /// Zero means fire-and-forget; otherwise the engine awaits completion
    /// for at most this long.
    #[serde(with = "humantime_serde")]
    completion: Duration,
}

impl SetCommand {
    /// Create a fire-and-forget set command.
    pub fn new(device: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            address: None,
            device: device.into(),
            value: value.into(),
            completion: Duration::ZERO,
        }
    }

    /// Await completion of the write for at most `completion`.
    pub fn with_completion(mut self, completion: Duration) -> Self {
        self.completion = completion;
        self
    }

    /// Target device identifier.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Value to write.
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Completion timeout; zero means fire-and-forget.
    pub fn completion(&self) -> Duration {
        self.completion
    }

    /// Address stamped by the owning sequence, if any.
    pub fn address(&self) -> Option<usize> {
        self.address
    }
}

impl fmt::Display for SetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Set '{}' = {}", self.device, self.value)?;
        if !self.completion.is_zero() {
            write!(f, " (completion within {:?})", self.completion)?;
        }
        Ok(())
    }
}

/// Hold until a device reading satisfies a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitCommand {
    #[serde(default)]
    address: Option<usize>,
    device: String,
    comparison: Comparison,
    desired: f64,
    /// Meaningful only for the equality family; must not be negative.
    tolerance: f64,
    /// Zero means wait with no time bound.
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

impl WaitCommand {
    /// Create a wait command with no time bound.
    ///
    /// Fails with [`ScanError::InvalidArgument`] if `tolerance` is negative.
    pub fn new(
        device: impl Into<String>,
        comparison: Comparison,
        desired: f64,
        tolerance: f64,
    ) -> ScanResult<Self> {
        let device = device.into();
        if tolerance < 0.0 {
            return Err(ScanError::InvalidArgument(format!(
                "negative tolerance {} for wait on '{}'",
                tolerance, device
            )));
        }
        Ok(Self {
            address: None,
            device,
            comparison,
            desired,
            tolerance,
            timeout: Duration::ZERO,
        })
    }

    /// Bound the wait to at most `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Target device identifier.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Comparison applied to the observed reading.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Desired device reading.
    pub fn desired(&self) -> f64 {
        self.desired
    }

    /// Tolerance for the equality family of comparisons.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Wait timeout; zero means no time bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `observed` would end this wait.
    pub fn is_met(&self, observed: f64) -> bool {
        self.comparison.is_met(observed, self.desired, self.tolerance)
    }

    /// Address stamped by the owning sequence, if any.
    pub fn address(&self) -> Option<usize> {
        self.address
    }
}

impl fmt::Display for WaitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wait for '{}' {} {}",
            self.device, self.comparison, self.desired
        )?;
        if matches!(self.comparison, Comparison::Equals | Comparison::NotEquals) {
            write!(f, " (+-{})", self.tolerance)?;
        }
        if !self.timeout.is_zero() {
            write!(f, ", timeout {:?}", self.timeout)?;
        }
        Ok(())
    }
}

/// Record the current readings of a list of devices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogCommand {
    #[serde(default)]
    address: Option<usize>,
    devices: Vec<String>,
}

impl LogCommand {
    /// Create a log command over an ordered list of device identifiers.
    ///
    /// The list behaves as an ordered set: a device mentioned twice is
    /// recorded once, at its first position.
    pub fn new<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for device in devices {
            let device = device.into();
            if !unique.contains(&device) {
                unique.push(device);
            }
        }
        Self {
            address: None,
            devices: unique,
        }
    }

    /// Device identifiers to record, in order.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Address stamped by the owning sequence, if any.
    pub fn address(&self) -> Option<usize> {
        self.address
    }
}

impl fmt::Display for LogCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Log")?;
        for (i, device) in self.devices.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}'{}'", sep, device)?;
        }
        Ok(())
    }
}

/// Step a device across a range, executing a nested body at each point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopCommand {
    #[serde(default)]
    address: Option<usize>,
    device: String,
    start: f64,
    end: f64,
    step: f64,
    body: CommandSequence,
}

impl LoopCommand {
    /// Create a loop command owning the given body commands.
    ///
    /// Fails with [`ScanError::InvalidArgument`] if `step` is zero. A step
    /// whose sign cannot progress from `start` toward `end` is tolerated:
    /// the loop constructs fine and [`iteration_count`](Self::iteration_count)
    /// reports zero, so the engine simply never enters the body.
    pub fn new<I>(
        device: impl Into<String>,
        start: f64,
        end: f64,
        step: f64,
        body: I,
    ) -> ScanResult<Self>
    where
        I: IntoIterator<Item = ScanCommand>,
    {
        let device = device.into();
        if step == 0.0 {
            return Err(ScanError::InvalidArgument(format!(
                "zero step for loop on '{}'",
                device
            )));
        }
        let mut body_seq = CommandSequence::new();
        for command in body {
            body_seq.add(command);
        }
        let command = Self {
            address: None,
            device,
            start,
            end,
            step,
            body: body_seq,
        };
        if command.iteration_count() == 0 {
            tracing::warn!(
                "Loop on '{}' never executes: step {} does not progress from {} toward {}",
                command.device,
                command.step,
                command.start,
                command.end
            );
        }
        Ok(command)
    }

    /// Device stepped by the loop.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// First value written to the device.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Value the loop steps toward (inclusive).
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Increment applied per iteration; never zero.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Nested body executed once per iteration.
    pub fn body(&self) -> &CommandSequence {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut CommandSequence {
        &mut self.body
    }

    /// Number of iterations the execution engine would run.
    ///
    /// Zero when the step sign cannot reach `end` from `start`.
    pub fn iteration_count(&self) -> usize {
        let steps = ((self.end - self.start) / self.step).floor();
        if steps < 0.0 {
            0
        } else {
            steps as usize + 1
        }
    }

    /// Address stamped by the owning sequence, if any.
    pub fn address(&self) -> Option<usize> {
        self.address
    }
}

impl fmt::Display for LoopCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loop '{}' = {} .. {}, step {}",
            self.device, self.start, self.end, self.step
        )
    }
}

// =============================================================================
// ScanCommand - the closed command sum type
// =============================================================================

/// A single command in a scan program.
///
/// The variant set is fixed; every consumer dispatches over it exhaustively.
/// Common accessors are provided here so callers holding a `ScanCommand` do
/// not need to match just to read the address or peek at a loop body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScanCommand {
    /// Write a value to a device.
    Set(SetCommand),
    /// Hold until a device reading satisfies a comparison.
    Wait(WaitCommand),
    /// Record the current readings of a list of devices.
    Log(LogCommand),
    /// Step a device across a range, executing a nested body at each point.
    Loop(LoopCommand),
}

impl ScanCommand {
    /// Shorthand for a fire-and-forget [`SetCommand`].
    pub fn set(device: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        ScanCommand::Set(SetCommand::new(device, value))
    }

    /// Shorthand for an unbounded [`WaitCommand`].
    pub fn wait(
        device: impl Into<String>,
        comparison: Comparison,
        desired: f64,
        tolerance: f64,
    ) -> ScanResult<Self> {
        Ok(ScanCommand::Wait(WaitCommand::new(
            device, comparison, desired, tolerance,
        )?))
    }

    /// Shorthand for a [`LogCommand`].
    pub fn log<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScanCommand::Log(LogCommand::new(devices))
    }

    /// Shorthand for a [`LoopCommand`]. Named `loop_over` because `loop`
    /// is a keyword.
    pub fn loop_over<I>(
        device: impl Into<String>,
        start: f64,
        end: f64,
        step: f64,
        body: I,
    ) -> ScanResult<Self>
    where
        I: IntoIterator<Item = ScanCommand>,
    {
        Ok(ScanCommand::Loop(LoopCommand::new(
            device, start, end, step, body,
        )?))
    }

    /// Address stamped by the owning sequence, or `None` before the first
    /// addressing pass.
    pub fn address(&self) -> Option<usize> {
        match self {
            ScanCommand::Set(c) => c.address,
            ScanCommand::Wait(c) => c.address,
            ScanCommand::Log(c) => c.address,
            ScanCommand::Loop(c) => c.address,
        }
    }

    pub(crate) fn set_address(&mut self, address: usize) {
        match self {
            ScanCommand::Set(c) => c.address = Some(address),
            ScanCommand::Wait(c) => c.address = Some(address),
            ScanCommand::Log(c) => c.address = Some(address),
            ScanCommand::Loop(c) => c.address = Some(address),
        }
    }

    /// Nested body, for loop commands.
    pub fn body(&self) -> Option<&CommandSequence> {
        match self {
            ScanCommand::Loop(c) => Some(&c.body),
            _ => None,
        }
    }
}

impl fmt::Display for ScanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanCommand::Set(c) => c.fmt(f),
            ScanCommand::Wait(c) => c.fmt(f),
            ScanCommand::Log(c) => c.fmt(f),
            ScanCommand::Loop(c) => c.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = WaitCommand::new("readback", Comparison::Equals, 1.0, -0.1);
        assert!(matches!(err, Err(ScanError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = LoopCommand::new("setpoint", 1.0, 5.0, 0.0, []);
        assert!(matches!(err, Err(ScanError::InvalidArgument(_))));
    }

    #[test]
    fn test_wrong_step_sign_is_tolerated() {
        let cmd = LoopCommand::new("setpoint", 1.0, 5.0, -1.0, []).unwrap();
        assert_eq!(cmd.iteration_count(), 0);
    }

    #[test]
    fn test_iteration_count() {
        let up = LoopCommand::new("setpoint", 1.0, 5.0, 1.0, []).unwrap();
        assert_eq!(up.iteration_count(), 5);

        let down = LoopCommand::new("setpoint", 5.0, 1.0, -1.0, []).unwrap();
        assert_eq!(down.iteration_count(), 5);

        let single = LoopCommand::new("setpoint", 2.0, 2.0, 0.5, []).unwrap();
        assert_eq!(single.iteration_count(), 1);

        let overshoot = LoopCommand::new("setpoint", 0.0, 1.0, 3.0, []).unwrap();
        assert_eq!(overshoot.iteration_count(), 1);
    }

    #[test]
    fn test_comparison_tolerance_semantics() {
        assert!(Comparison::Equals.is_met(1.05, 1.0, 0.1));
        assert!(!Comparison::Equals.is_met(1.2, 1.0, 0.1));
        assert!(Comparison::NotEquals.is_met(1.2, 1.0, 0.1));
        assert!(!Comparison::NotEquals.is_met(1.05, 1.0, 0.1));

        // Ordering comparisons ignore tolerance.
        assert!(Comparison::Less.is_met(0.99, 1.0, 10.0));
        assert!(!Comparison::Less.is_met(1.0, 1.0, 10.0));
        assert!(Comparison::LessOrEqual.is_met(1.0, 1.0, 0.0));
        assert!(Comparison::Greater.is_met(1.01, 1.0, 10.0));
        assert!(Comparison::GreaterOrEqual.is_met(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_log_devices_are_an_ordered_set() {
        let cmd = LogCommand::new(["readback", "power", "readback"]);
        assert_eq!(cmd.devices(), ["readback", "power"]);
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::from(1), ParamValue::Int(1));
        assert_eq!(ParamValue::from(2.5), ParamValue::Float(2.5));
        assert_eq!(ParamValue::from("auto"), ParamValue::Text("auto".into()));
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Text("4.5".into()).as_f64(), Some(4.5));
        assert_eq!(ParamValue::Text("fast".into()).as_f64(), None);
    }

    #[test]
    fn test_display_renderings() {
        let set = SetCommand::new("setpoint", 1);
        assert_eq!(set.to_string(), "Set 'setpoint' = 1");

        let set = SetCommand::new("shutter", "open")
            .with_completion(Duration::from_secs(5));
        assert_eq!(set.to_string(), "Set 'shutter' = open (completion within 5s)");

        let wait = WaitCommand::new("readback", Comparison::Equals, 1.0, 0.1).unwrap();
        assert_eq!(wait.to_string(), "Wait for 'readback' == 1 (+-0.1)");

        let wait = WaitCommand::new("temp", Comparison::GreaterOrEqual, 23.5, 0.0)
            .unwrap()
            .with_timeout(Duration::from_secs(30));
        assert_eq!(wait.to_string(), "Wait for 'temp' >= 23.5, timeout 30s");

        let log = LogCommand::new(["readback", "power"]);
        assert_eq!(log.to_string(), "Log 'readback', 'power'");

        let lp = LoopCommand::new("setpoint", 1.0, 5.0, 1.0, []).unwrap();
        assert_eq!(lp.to_string(), "Loop 'setpoint' = 1 .. 5, step 1");
    }

    #[test]
    fn test_wait_is_met_delegates() {
        let wait = WaitCommand::new("readback", Comparison::Equals, 1.0, 0.1).unwrap();
        assert!(wait.is_met(0.95));
        assert!(!wait.is_met(1.5));
    }
}
