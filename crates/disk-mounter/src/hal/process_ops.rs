//! Process execution helpers.
//!
//! External commands are "world-touching" and must go through the HAL so the
//! mounter can be tested without spawning real processes.

use crate::{MountError, MountResult};
use std::process::Output;
use std::time::Duration;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit is not an error at this level; see [`command_status`].
    ///
    /// [`command_status`]: ProcessOps::command_status
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration)
        -> MountResult<Output>;

    /// Run `program` and fail with [`MountError::CommandFailed`] on a non-zero exit.
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> MountResult<Output> {
        let output = self.command_output(program, args, timeout)?;
        if !output.status.success() {
            return Err(output_failed(program, &output));
        }
        Ok(output)
    }
}

pub(crate) fn output_failed(program: &str, output: &Output) -> MountError {
    MountError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
