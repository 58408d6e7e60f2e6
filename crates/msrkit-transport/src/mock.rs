//! Scripted transport for deterministic testing of the layers above.
//!
//! [`MockTransport`] records every written report and hands out queued
//! inbound reports in order. A `read` with nothing queued blocks, like a
//! real device waiting for a card swipe, until a report is queued, the
//! transport is closed, or the stall limit elapses.

use std::collections::VecDeque;
use std::io;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};
use crate::traits::{Report, Transport, REPORT_SIZE};

/// Upper bound on how long an unanswered `read` blocks before failing.
pub const DEFAULT_STALL_LIMIT: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum Inbound {
    Report(Report),
    Error(io::ErrorKind),
}

#[derive(Debug, Default)]
struct MockState {
    inbound: VecDeque<Inbound>,
    written: Vec<Vec<u8>>,
    fail_writes_after: Option<usize>,
    closed: bool,
}

/// A mock [`Transport`] for testing without hardware.
#[derive(Debug)]
pub struct MockTransport {
    state: Mutex<MockState>,
    ready: Condvar,
    stall_limit: Duration,
}

impl MockTransport {
    /// Create an open mock with nothing queued.
    pub fn new() -> Self {
        Self::with_stall_limit(DEFAULT_STALL_LIMIT)
    }

    /// Create a mock whose empty reads give up after `stall_limit`.
    pub fn with_stall_limit(stall_limit: Duration) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            ready: Condvar::new(),
            stall_limit,
        }
    }

    /// Queue one inbound report.
    pub fn push_report(&self, report: Report) {
        self.lock().inbound.push_back(Inbound::Report(report));
        self.ready.notify_all();
    }

    /// Queue several inbound reports in order.
    pub fn push_reports<I: IntoIterator<Item = Report>>(&self, reports: I) {
        let mut state = self.lock();
        state
            .inbound
            .extend(reports.into_iter().map(Inbound::Report));
        drop(state);
        self.ready.notify_all();
    }

    /// Queue a read failure.
    pub fn push_read_error(&self, kind: io::ErrorKind) {
        self.lock().inbound.push_back(Inbound::Error(kind));
        self.ready.notify_all();
    }

    /// Make every write after the first `n` successful writes fail.
    pub fn fail_writes_after(&self, n: usize) {
        self.lock().fail_writes_after = Some(n);
    }

    /// All reports written so far, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Number of queued inbound reports not yet read.
    pub fn pending_reads(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn write(&self, report: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if report.len() > REPORT_SIZE {
            return Err(TransportError::ShortWrite {
                written: REPORT_SIZE,
                expected: report.len(),
            });
        }
        if let Some(limit) = state.fail_writes_after {
            if state.written.len() >= limit {
                return Err(TransportError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
            }
        }
        state.written.push(report.to_vec());
        Ok(())
    }

    fn read(&self, report: &mut Report) -> Result<()> {
        let deadline = Instant::now() + self.stall_limit;
        let mut state = self.lock();
        loop {
            if state.closed {
                return Err(TransportError::Closed);
            }
            match state.inbound.pop_front() {
                Some(Inbound::Report(next)) => {
                    *report = next;
                    return Ok(());
                }
                Some(Inbound::Error(kind)) => return Err(TransportError::Io(kind.into())),
                None => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TransportError::Io(io::ErrorKind::TimedOut.into()));
            }
            state = self
                .ready
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    fn close(&self) -> Result<()> {
        self.lock().closed = true;
        self.ready.notify_all();
        Ok(())
    }
}
