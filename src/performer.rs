// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A performer rings the (at most two) pitches it holds whenever the conductor cues it.
//!
//! Each performer owns one worker thread. The conductor hands cues over through a single pending
//! slot guarded by the same lock as the run state and the stop flag, so accepting a cue and
//! stopping can never interleave.

use std::{
    fmt, io,
    panic::{self, AssertUnwindSafe},
    str::FromStr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, span, warn, Level, Span};

use crate::{cue::Cue, error::SetupError, notes::Pitch, sink::Sink};

/// One of the two hands a performer rings with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Left,
    Right,
}

impl Slot {
    fn index(&self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Right => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Left => f.write_str("left"),
            Slot::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Slot {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Slot::Left),
            "right" => Ok(Slot::Right),
            _ => Err(SetupError::InvalidSlot(s.to_string())),
        }
    }
}

/// The run state of a performer's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for a cue.
    Idle,
    /// Handing a cue to the output sink.
    Rendering,
    /// Stop was observed; no further cues are taken.
    Stopping,
    /// The worker has exited.
    Terminated,
}

/// Counters describing what a performer did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformerStats {
    /// Cues accepted by deliver_cue.
    pub accepted: u64,
    /// Cues refused by deliver_cue.
    pub refused: u64,
    /// Renders that finished, successfully or not.
    pub rendered: u64,
    /// Renders that the sink failed.
    pub failed: u64,
    /// Calls to stop.
    pub stop_requests: u64,
}

/// Errors from driving a performer's worker thread.
#[derive(Debug, thiserror::Error)]
pub enum PerformerError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("{0} can't be joined before it has been told to stop")]
    NotStopped(String),

    #[error("{0} panicked")]
    Panicked(String),

    #[error("unable to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// State shared between the performer handle and its worker thread. Everything lives under one
/// lock.
struct Inner {
    state: RunState,
    started: bool,
    stop_requested: bool,
    pending: Option<Cue>,
    stats: PerformerStats,
}

struct Shared {
    inner: Mutex<Inner>,
    condvar: Condvar,
}

/// A member of the choir.
pub struct Performer {
    /// The name of the performer. Also used as the worker thread name.
    name: String,
    /// Assigned pitches, indexed by slot.
    assignments: [Option<Pitch>; 2],
    shared: Arc<Shared>,
    /// The worker thread, present between start and join.
    join: Mutex<Option<JoinHandle<()>>>,
    /// The logging span.
    span: Span,
}

impl Performer {
    /// Creates a new performer with no assignments.
    pub fn new(name: &str) -> Performer {
        Performer {
            name: name.to_string(),
            assignments: [None, None],
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: RunState::Idle,
                    started: false,
                    stop_requested: false,
                    pending: None,
                    stats: PerformerStats::default(),
                }),
                condvar: Condvar::new(),
            }),
            join: Mutex::new(None),
            span: span!(Level::INFO, "performer", name = name),
        }
    }

    /// Binds a pitch to the slot with the given label ("left" or "right").
    pub fn assign(&mut self, slot: &str, pitch: Pitch) -> Result<(), SetupError> {
        self.assign_slot(slot.parse::<Slot>()?, pitch)
    }

    /// Binds a pitch to the given slot.
    pub fn assign_slot(&mut self, slot: Slot, pitch: Pitch) -> Result<(), SetupError> {
        if self.shared.inner.lock().started {
            return Err(SetupError::AlreadyStarted(self.name.clone()));
        }

        let assignment = &mut self.assignments[slot.index()];
        if assignment.is_some() {
            return Err(SetupError::DuplicateSlot {
                performer: self.name.clone(),
                slot: slot.to_string(),
            });
        }
        *assignment = Some(pitch);
        Ok(())
    }

    /// The name of the performer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pitch bound to the given slot.
    pub fn assignment(&self, slot: Slot) -> Option<Pitch> {
        self.assignments[slot.index()]
    }

    /// All assigned pitches, left slot first.
    pub fn pitches(&self) -> Vec<Pitch> {
        self.assignments.iter().flatten().copied().collect()
    }

    /// Returns true if the performer holds the given pitch.
    pub fn holds(&self, pitch: Pitch) -> bool {
        self.assignments.contains(&Some(pitch))
    }

    /// The current run state.
    pub fn state(&self) -> RunState {
        self.shared.inner.lock().state
    }

    /// A snapshot of the performer's counters.
    pub fn stats(&self) -> PerformerStats {
        self.shared.inner.lock().stats
    }

    /// Starts the worker thread. Rendered durations are capped to one measure.
    pub fn start(&self, sink: Arc<dyn Sink>, measure_length: Duration) -> Result<(), PerformerError> {
        self.start_with(|shared, span| {
            thread::Builder::new()
                .name(self.name.clone())
                .spawn(move || Performer::run(shared, sink, measure_length, span))
        })
    }

    /// Marks the performer started and spawns its worker. If the worker can't be spawned the
    /// performer goes back to not started, so it can be started again or stopped for good.
    fn start_with<F>(&self, spawn: F) -> Result<(), PerformerError>
    where
        F: FnOnce(Arc<Shared>, Span) -> io::Result<JoinHandle<()>>,
    {
        let _enter = self.span.enter();

        {
            let mut inner = self.shared.inner.lock();
            if inner.started {
                return Err(SetupError::AlreadyStarted(self.name.clone()).into());
            }
            inner.started = true;
        }

        let handle = match spawn(self.shared.clone(), self.span.clone()) {
            Ok(handle) => handle,
            Err(source) => {
                let mut inner = self.shared.inner.lock();
                inner.started = false;
                if let Some(cue) = inner.pending.take() {
                    inner.stats.accepted -= 1;
                    inner.stats.refused += 1;
                    warn!(cue = cue.to_string(), "Dropped cue, the performer never started.");
                }
                if inner.stop_requested {
                    inner.state = RunState::Terminated;
                }
                error!(err = %source, "Unable to start performer.");
                return Err(PerformerError::Spawn {
                    name: self.name.clone(),
                    source,
                });
            }
        };
        *self.join.lock() = Some(handle);

        info!(pitches = format!("{:?}", self.pitches()), "Performer ready.");
        Ok(())
    }

    /// Offers a cue to the performer. Never waits for the render; returns whether the cue was
    /// taken.
    pub fn deliver_cue(&self, cue: Cue) -> bool {
        let _enter = self.span.enter();

        let mut inner = self.shared.inner.lock();
        let refusal = if !self.holds(cue.pitch()) {
            Some("not assigned this pitch")
        } else if !inner.started {
            Some("not started")
        } else if inner.stop_requested || inner.state == RunState::Terminated {
            Some("stopped")
        } else if inner.pending.is_some() {
            Some("still holding a cue")
        } else {
            None
        };

        if let Some(reason) = refusal {
            inner.stats.refused += 1;
            warn!(cue = cue.to_string(), reason, "Refused cue.");
            return false;
        }

        inner.pending = Some(cue);
        inner.stats.accepted += 1;
        self.shared.condvar.notify_all();
        debug!(cue = cue.to_string(), "Accepted cue.");
        true
    }

    /// Tells the performer to finish any accepted cue and then exit. Safe to call more than once.
    pub fn stop(&self) {
        let _enter = self.span.enter();

        let mut inner = self.shared.inner.lock();
        inner.stats.stop_requests += 1;
        if inner.stop_requested {
            return;
        }
        inner.stop_requested = true;
        if !inner.started {
            inner.state = RunState::Terminated;
        }
        self.shared.condvar.notify_all();
        info!("Performer told to stop.");
    }

    /// Waits for the worker thread to exit. The performer must have been told to stop.
    pub fn join(&self) -> Result<(), PerformerError> {
        if !self.shared.inner.lock().stop_requested {
            return Err(PerformerError::NotStopped(self.name.clone()));
        }

        let handle = self.join.lock().take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| PerformerError::Panicked(self.name.clone())),
            None => Ok(()),
        }
    }

    /// The worker loop: wait for a cue or a stop, render, repeat.
    fn run(shared: Arc<Shared>, sink: Arc<dyn Sink>, measure_length: Duration, span: Span) {
        let _enter = span.enter();

        loop {
            let cue = {
                let mut inner = shared.inner.lock();
                shared.condvar.wait_while(&mut inner, |inner| {
                    inner.pending.is_none() && !inner.stop_requested
                });

                match inner.pending.take() {
                    Some(cue) => {
                        inner.state = RunState::Rendering;
                        cue
                    }
                    None => {
                        inner.state = RunState::Stopping;
                        break;
                    }
                }
            };

            let duration = cue.duration(measure_length).min(measure_length);
            debug!(
                pitch = %cue.pitch(),
                length = %cue.length(),
                duration = format!("{:?}", duration),
                "Rendering."
            );
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                sink.render(&cue.pitch().waveform(), duration)
            }));
            let failed = match result {
                Ok(Ok(())) => false,
                Ok(Err(e)) => {
                    error!(err = %e, sink = %sink, cue = cue.to_string(), "Error while rendering");
                    true
                }
                Err(_) => {
                    error!(sink = %sink, cue = cue.to_string(), "Sink panicked while rendering");
                    true
                }
            };

            let mut inner = shared.inner.lock();
            inner.stats.rendered += 1;
            if failed {
                inner.stats.failed += 1;
            }
            inner.state = if inner.stop_requested {
                RunState::Stopping
            } else {
                RunState::Idle
            };
        }

        shared.inner.lock().state = RunState::Terminated;
        info!("Performer finished.");
    }
}

impl Drop for Performer {
    fn drop(&mut self) {
        // Don't leave the worker parked forever.
        let mut inner = self.shared.inner.lock();
        if !inner.stop_requested {
            inner.stop_requested = true;
            self.shared.condvar.notify_all();
        }
    }
}

impl fmt::Display for Performer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pitches: Vec<String> = self.pitches().iter().map(Pitch::to_string).collect();
        write!(f, "{} ({})", self.name, pitches.join(", "))
    }
}
