//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real disks.
//! It keeps an in-memory mount table that successful `mount`/`umount`
//! commands update, and an in-memory `swapon -s` summary.

use super::{FileOps, ProcessOps, SystemOps};
use crate::procfs::parse_mounts;
use crate::MountResult;
use std::collections::HashMap;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SWAP_HEADER: &str = "Filename\t\t\t\tType\t\tSize\tUsed\tPriority";

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
        timeout_secs: u64,
    },
    ReadFile {
        path: PathBuf,
    },
    Sleep {
        duration: Duration,
    },
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    /// `None` fails forever.
    remaining: Option<u32>,
    code: i32,
    stderr: String,
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Contents served for any file read
    mount_table: String,
    /// Output served for `swapon -s`
    swap_summary: String,
    table_read_error: Option<io::ErrorKind>,
    failures: HashMap<String, InjectedFailure>,
}

/// Fake HAL implementation that records operations without executing them.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
        }
    }

    /// Start from the given mount table text.
    pub fn with_mount_table(self, table: &str) -> Self {
        self.set_mount_table(table);
        self
    }

    /// Start from the given `swapon -s` output (header line included).
    pub fn with_swap_summary(self, summary: &str) -> Self {
        self.state.lock().unwrap().swap_summary = summary.to_string();
        self
    }

    pub fn set_mount_table(&self, table: &str) {
        self.state.lock().unwrap().mount_table = table.to_string();
    }

    /// Current contents of the simulated mount table.
    pub fn mount_table(&self) -> String {
        self.state.lock().unwrap().mount_table.clone()
    }

    /// Current contents of the simulated `swapon -s` output.
    pub fn swap_summary(&self) -> String {
        self.state.lock().unwrap().swap_summary.clone()
    }

    /// Make every invocation of `program` exit with status 32 and `stderr`.
    pub fn fail_command(&self, program: &str, stderr: &str) {
        self.inject_failure(program, None, stderr);
    }

    /// Make the next `times` invocations of `program` fail, then succeed.
    pub fn fail_command_times(&self, program: &str, times: u32, stderr: &str) {
        self.inject_failure(program, Some(times), stderr);
    }

    /// Make every mount table read fail with `kind`.
    pub fn fail_mount_table_read(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().table_read_error = Some(kind);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Recorded commands as `program args...` lines, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Command { program, args, .. } => {
                    let mut line = program;
                    for arg in args {
                        line.push(' ');
                        line.push_str(&arg);
                    }
                    Some(line)
                }
                _ => None,
            })
            .collect()
    }

    /// Number of recorded invocations of `program`.
    pub fn command_count(&self, program: &str) -> usize {
        self.count_operations(|op| {
            matches!(op, Operation::Command { program: p, .. } if p == program)
        })
    }

    /// Recorded sleep durations, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Sleep { duration } => Some(duration),
                _ => None,
            })
            .collect()
    }

    /// Clear all recorded operations. The simulated tables are kept.
    pub fn clear(&self) {
        self.state.lock().unwrap().operations.clear();
    }

    fn count_operations(&self, check: impl Fn(&Operation) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| check(op))
            .count()
    }

    fn inject_failure(&self, program: &str, remaining: Option<u32>, stderr: &str) {
        self.state.lock().unwrap().failures.insert(
            program.to_string(),
            InjectedFailure {
                remaining,
                code: 32,
                stderr: stderr.to_string(),
            },
        );
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }

    /// Consume one injected failure for `program`, if any is pending.
    fn take_failure(&self, program: &str) -> Option<InjectedFailure> {
        let mut state = self.state.lock().unwrap();
        let failure = state.failures.get_mut(program)?;
        if failure.remaining == Some(0) {
            return None;
        }
        if let Some(n) = failure.remaining.as_mut() {
            *n -= 1;
        }
        Some(failure.clone())
    }

    /// Apply the effect a successful command would have on the host.
    fn simulate(&self, program: &str, args: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        match (program, args) {
            ("mount", [device, mount_point, ..]) => {
                let line = format!("{device} {mount_point} auto rw 0 0\n");
                if !state.mount_table.is_empty() && !state.mount_table.ends_with('\n') {
                    state.mount_table.push('\n');
                }
                state.mount_table.push_str(&line);
                String::new()
            }
            ("umount", [target]) => {
                // The kernel unmounts the most recent mount on a stacked path.
                let lines: Vec<&str> = state.mount_table.lines().collect();
                let hit = lines.iter().rposition(|line| {
                    parse_mounts(line).next().is_some_and(|entry| entry.matches(target))
                });
                if let Some(idx) = hit {
                    let mut table: String = lines
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != idx)
                        .map(|(_, line)| format!("{line}\n"))
                        .collect();
                    if table.trim().is_empty() {
                        table.clear();
                    }
                    state.mount_table = table;
                }
                String::new()
            }
            ("swapon", ["-s"]) => state.swap_summary.clone(),
            ("swapon", [device]) => {
                if state.swap_summary.is_empty() {
                    state.swap_summary = format!("{SWAP_HEADER}\n");
                }
                let line = format!("{device}\t\t\t\tpartition\t1048572\t0\t-2\n");
                state.swap_summary.push_str(&line);
                String::new()
            }
            _ => String::new(),
        }
    }
}

fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

impl ProcessOps for FakeHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> MountResult<Output> {
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: timeout.as_secs(),
        });

        if let Some(failure) = self.take_failure(program) {
            log::info!("FAKE HAL: {} {} -> exit {}", program, args.join(" "), failure.code);
            return Ok(Output {
                status: exit_status(failure.code),
                stdout: Vec::new(),
                stderr: failure.stderr.into_bytes(),
            });
        }

        log::info!("FAKE HAL: {} {}", program, args.join(" "));
        let stdout = self.simulate(program, args);
        Ok(Output {
            status: exit_status(0),
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
        })
    }
}

impl FileOps for FakeHal {
    fn read_file_string(&self, path: &Path) -> io::Result<String> {
        self.record_operation(Operation::ReadFile {
            path: path.to_path_buf(),
        });
        let state = self.state.lock().unwrap();
        if let Some(kind) = state.table_read_error {
            return Err(io::Error::new(kind, "injected read failure"));
        }
        Ok(state.mount_table.clone())
    }
}

impl SystemOps for FakeHal {
    fn sleep(&self, duration: Duration) {
        self.record_operation(Operation::Sleep { duration });
    }
}
