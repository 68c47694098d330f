//! Callbacks used while a Calamari job executes.
//!
//! The job-execution path reports through these hooks: process output as
//! messages, fractional progress, a poll-style cancellation check and the
//! terminal state. Closures implement every hook.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Terminal state of a processor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorState {
    Completed,
    Canceled,
    Interrupted,
}

/// Receives non-blank, trimmed text.
pub trait Message {
    fn update(&mut self, content: &str);
}

impl<F: FnMut(&str)> Message for F {
    fn update(&mut self, content: &str) {
        self(content)
    }
}

/// Receives completion values. The scale is up to the caller.
pub trait Progress {
    fn update(&mut self, value: f32);
}

impl<F: FnMut(f32)> Progress for F {
    fn update(&mut self, value: f32) {
        self(value)
    }
}

/// Polled between processing increments; `true` means stop.
pub trait ProcessorRunningState {
    fn is_canceled(&self) -> bool;
}

impl<F: Fn() -> bool> ProcessorRunningState for F {
    fn is_canceled(&self) -> bool {
        self()
    }
}

/// Produces the terminal state. Called once per job.
pub trait ProcessorExecution {
    fn complete(self) -> ProcessorState;
}

impl<F: FnOnce() -> ProcessorState> ProcessorExecution for F {
    fn complete(self) -> ProcessorState {
        self()
    }
}

/// Shared cancellation flag set by the host, polled by the job.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ProcessorRunningState for CancellationFlag {
    fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Captured output of an external process.
pub trait SystemProcess {
    fn standard_output(&self) -> String;
    fn standard_error(&self) -> String;
}

impl SystemProcess for std::process::Output {
    fn standard_output(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn standard_error(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Forward a process's output to the message sinks, one call per stream that
/// produced non-blank content.
pub fn update_processor_messages(
    process: Option<&dyn SystemProcess>,
    standard_output: &mut dyn Message,
    standard_error: &mut dyn Message,
) {
    let Some(process) = process else {
        return;
    };

    let message = process.standard_output();
    if !message.trim().is_empty() {
        standard_output.update(message.trim());
    }

    let message = process.standard_error();
    if !message.trim().is_empty() {
        standard_error.update(message.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Captured {
        out: &'static str,
        err: &'static str,
    }

    impl SystemProcess for Captured {
        fn standard_output(&self) -> String {
            self.out.to_string()
        }

        fn standard_error(&self) -> String {
            self.err.to_string()
        }
    }

    #[test]
    fn test_messages_trimmed_and_blank_skipped() {
        let process = Captured {
            out: "  epoch 1 done\n",
            err: " \n\t",
        };
        let mut out = Vec::new();
        let mut err = Vec::new();

        update_processor_messages(
            Some(&process),
            &mut |m: &str| out.push(m.to_string()),
            &mut |m: &str| err.push(m.to_string()),
        );

        assert_eq!(out, vec!["epoch 1 done"]);
        assert!(err.is_empty());
    }

    #[test]
    fn test_messages_without_process() {
        let mut calls = 0;
        let mut sink = |_: &str| calls += 1;
        let mut other = |_: &str| {};
        update_processor_messages(None, &mut sink, &mut other);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_process_output_adapter() {
        let output = std::process::Output {
            status: Default::default(),
            stdout: b"recognized 12 lines".to_vec(),
            stderr: b"warning: low contrast".to_vec(),
        };
        let mut out = String::new();
        let mut err = String::new();
        update_processor_messages(
            Some(&output),
            &mut |m: &str| out.push_str(m),
            &mut |m: &str| err.push_str(m),
        );
        assert_eq!(out, "recognized 12 lines");
        assert_eq!(err, "warning: low contrast");
    }

    #[test]
    fn test_cancellation_polling_loop() {
        let flag = CancellationFlag::new();
        let host = flag.clone();
        let mut progress = Vec::new();

        let state = {
            let mut sink = |v: f32| progress.push(v);
            let mut state = ProcessorState::Completed;
            for step in 1..=10 {
                if flag.is_canceled() {
                    state = ProcessorState::Canceled;
                    break;
                }
                Progress::update(&mut sink, step as f32 / 10.0);
                if step == 3 {
                    host.cancel();
                }
            }
            let finish = move || state;
            finish.complete()
        };

        assert_eq!(state, ProcessorState::Canceled);
        assert_eq!(progress, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_closure_running_state() {
        let never = || false;
        assert!(!never.is_canceled());
    }
}
