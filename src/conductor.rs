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

//! The conductor walks the score and cues the choir.
//!
//! Every cue is routed point to point to the first performer holding its pitch. The conductor
//! then waits out the cue on the tempo clock before moving on; it never waits for a render to
//! finish, so the rhythm comes from the score and not from how long the output takes.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing::{debug, info, span, warn, Level, Span};

use crate::{
    cue::{Cue, Score},
    error::RoutingError,
    playsync::CancelHandle,
    roster::Roster,
    util::duration_minutes_seconds,
};

/// How the conductor spaces cues. One mode governs a whole performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Each cue lasts its own note length.
    #[default]
    Duration,
    /// Each cue lasts one beat at the given tempo, whatever its note length.
    Tempo { bpm: u32 },
}

impl Pacing {
    /// How long the conductor waits after issuing the given cue.
    pub fn interval(&self, cue: &Cue, measure_length: Duration) -> Duration {
        match self {
            Pacing::Duration => cue.duration(measure_length),
            Pacing::Tempo { bpm } => Duration::from_millis(60_000 / u64::from((*bpm).max(1))),
        }
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pacing::Duration => f.write_str("note duration"),
            Pacing::Tempo { bpm } => write!(f, "{} BPM", bpm),
        }
    }
}

/// What happened during a performance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceResult {
    /// Cues accepted by a performer.
    pub delivered: usize,
    /// Cues no performer holds.
    pub unresolved: usize,
    /// Cues a performer refused.
    pub rejected: usize,
    /// Rests waited out.
    pub rests: usize,
    /// True if the performance was cancelled before the score ran out.
    pub cancelled: bool,
    /// Wall clock time spent conducting.
    pub elapsed: Duration,
    /// Every routing problem, in score order.
    pub errors: Vec<RoutingError>,
}

impl fmt::Display for PerformanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Performance {} after {}:",
            if self.cancelled { "cancelled" } else { "completed" },
            duration_minutes_seconds(self.elapsed)
        )?;
        writeln!(f, "  delivered: {}", self.delivered)?;
        writeln!(f, "  rests: {}", self.rests)?;
        writeln!(f, "  unresolved: {}", self.unresolved)?;
        writeln!(f, "  rejected: {}", self.rejected)?;
        for error in self.errors.iter() {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    #[error("this conductor has already performed")]
    AlreadyPerformed,
}

/// Directs a roster through a score.
pub struct Conductor {
    /// The choir.
    roster: Arc<Roster>,
    /// The length of one measure.
    measure_length: Duration,
    /// How cues are spaced.
    pacing: Pacing,
    /// Cancels the performance.
    cancel_handle: CancelHandle,
    /// Set once perform has been called.
    performed: AtomicBool,
    /// The logging span.
    span: Span,
}

impl Conductor {
    /// Creates a new conductor for the given roster.
    pub fn new(roster: Arc<Roster>, measure_length: Duration, pacing: Pacing) -> Conductor {
        Conductor {
            roster,
            measure_length,
            pacing,
            cancel_handle: CancelHandle::new(),
            performed: AtomicBool::new(false),
            span: span!(Level::INFO, "conductor"),
        }
    }

    /// Uses the given cancel handle instead of a fresh one.
    pub fn with_cancel_handle(mut self, cancel_handle: CancelHandle) -> Conductor {
        self.cancel_handle = cancel_handle;
        self
    }

    /// Returns a handle that cancels the performance.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    /// Performs the score, then stops every performer. Routing problems are collected in the
    /// result rather than returned as errors. A conductor performs only once.
    pub fn perform(&self, score: &Score) -> Result<PerformanceResult, ConductorError> {
        let _enter = self.span.enter();

        if self.performed.swap(true, Ordering::SeqCst) {
            return Err(ConductorError::AlreadyPerformed);
        }

        info!(
            cues = score.len(),
            performers = self.roster.len(),
            pacing = %self.pacing,
            "Starting the performance."
        );

        let start = Instant::now();
        let mut result = PerformanceResult::default();
        for (i, cue) in score.cues().iter().enumerate() {
            if self.cancel_handle.is_cancelled() {
                result.cancelled = true;
                break;
            }

            self.cue(i + 1, cue, &mut result);

            if self
                .cancel_handle
                .wait_timeout(self.pacing.interval(cue, self.measure_length))
            {
                result.cancelled = true;
                break;
            }
        }

        info!("Signaling performers to stop.");
        self.roster.stop_all();

        result.elapsed = start.elapsed();
        info!(
            delivered = result.delivered,
            rests = result.rests,
            unresolved = result.unresolved,
            rejected = result.rejected,
            cancelled = result.cancelled,
            "Performance finished."
        );
        Ok(result)
    }

    /// Routes a single cue to its performer, recording the outcome.
    fn cue(&self, index: usize, cue: &Cue, result: &mut PerformanceResult) {
        if cue.is_rest() {
            debug!(index, cue = cue.to_string(), "Resting.");
            result.rests += 1;
            return;
        }

        let performer = match self.roster.resolve(cue.pitch()) {
            Some(performer) => performer,
            None => {
                warn!(index, cue = cue.to_string(), "No performer for cue.");
                result.unresolved += 1;
                result
                    .errors
                    .push(RoutingError::Unresolved { index, cue: *cue });
                return;
            }
        };

        if performer.deliver_cue(*cue) {
            debug!(
                index,
                cue = cue.to_string(),
                performer = performer.name(),
                "Cued."
            );
            result.delivered += 1;
        } else {
            result.rejected += 1;
            result.errors.push(RoutingError::DeliveryRejected {
                index,
                cue: *cue,
                performer: performer.name().to_string(),
            });
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };

    use crate::{
        cue::{Cue, Score},
        error::RoutingError,
        notes::{NoteLength, Pitch},
        performer::{Performer, RunState},
        roster::Roster,
        sink::mock,
    };

    use super::*;

    const MEASURE: Duration = Duration::from_millis(200);

    fn roster(members: &[(&str, Pitch)]) -> Arc<Roster> {
        let mut roster = Roster::new();
        for (name, pitch) in members {
            let mut performer = Performer::new(name);
            performer.assign("left", *pitch).unwrap();
            roster.add(performer).unwrap();
        }
        Arc::new(roster)
    }

    fn start(roster: &Roster) -> mock::Sink {
        let sink = mock::Sink::get("mock");
        roster.start(Arc::new(sink.clone()), MEASURE).unwrap();
        sink
    }

    fn cue(pitch: Pitch, length: NoteLength) -> Cue {
        Cue::new(pitch, length)
    }

    #[test]
    fn test_two_performers_and_a_rest() {
        let roster = roster(&[("A", Pitch::C4), ("B", Pitch::G4)]);
        let sink = start(&roster);
        let score = Score::new(vec![
            cue(Pitch::C4, NoteLength::Quarter),
            cue(Pitch::G4, NoteLength::Quarter),
            cue(Pitch::Rest, NoteLength::Quarter),
        ]);

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());

        assert_eq!(2, result.delivered);
        assert_eq!(1, result.rests);
        assert_eq!(0, result.unresolved);
        assert_eq!(0, result.rejected);
        assert!(!result.cancelled);
        assert!(result.elapsed >= 3 * NoteLength::Quarter.duration(MEASURE));

        let a = sink.renders_by("A");
        assert_eq!(1, a.len());
        assert_eq!(Pitch::C4, a[0].pitch);
        assert_eq!(NoteLength::Quarter.duration(MEASURE), a[0].duration);
        let b = sink.renders_by("B");
        assert_eq!(1, b.len());
        assert_eq!(Pitch::G4, b[0].pitch);
        assert_eq!(2, sink.renders().len());
    }

    #[test]
    fn test_unresolved_cue() {
        let roster = roster(&[("A", Pitch::C4)]);
        let sink = start(&roster);
        let score = Score::new(vec![
            cue(Pitch::C4, NoteLength::Eighth),
            cue(Pitch::D4, NoteLength::Eighth),
            cue(Pitch::C4, NoteLength::Eighth),
        ]);

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());

        assert_eq!(1, result.unresolved);
        assert_eq!(2, result.delivered);
        assert!(!result.cancelled);
        assert_eq!(
            vec![RoutingError::Unresolved {
                index: 2,
                cue: cue(Pitch::D4, NoteLength::Eighth),
            }],
            result.errors
        );
        assert_eq!(2, sink.renders().len());
        assert_eq!(RunState::Terminated, roster.performers()[0].state());
        assert_eq!(1, roster.performers()[0].stats().stop_requests);
    }

    #[test]
    fn test_first_registered_performer_gets_the_cue() {
        let roster = roster(&[("First", Pitch::E4), ("Second", Pitch::E4)]);
        let sink = start(&roster);
        let score = Score::new(vec![cue(Pitch::E4, NoteLength::Eighth); 4]);

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());

        assert_eq!(4, result.delivered);
        assert_eq!(4, sink.renders_by("First").len());
        assert!(sink.renders_by("Second").is_empty());
        assert_eq!(0, roster.get("Second").unwrap().stats().accepted);
    }

    #[test]
    fn test_routing_order_and_counts() {
        let roster = roster(&[("C", Pitch::C4), ("E", Pitch::E4), ("G", Pitch::G4)]);
        let sink = start(&roster);
        let pitches = [
            Pitch::C4,
            Pitch::E4,
            Pitch::G4,
            Pitch::E4,
            Pitch::C4,
            Pitch::Rest,
            Pitch::G4,
            Pitch::C4,
        ];
        let score = Score::new(
            pitches
                .iter()
                .map(|pitch| cue(*pitch, NoteLength::Eighth))
                .collect(),
        );

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());
        assert_eq!(7, result.delivered);

        let rendered: Vec<Pitch> = sink.renders().iter().map(|r| r.pitch).collect();
        let expected: Vec<Pitch> = pitches.into_iter().filter(|p| !p.is_rest()).collect();
        assert_eq!(expected, rendered);

        for (name, pitch) in [("C", Pitch::C4), ("E", Pitch::E4), ("G", Pitch::G4)] {
            let resolved = pitches.iter().filter(|p| **p == pitch).count() as u64;
            let stats = roster.get(name).unwrap().stats();
            assert_eq!(resolved, stats.accepted);
            assert_eq!(resolved, stats.rendered);
        }
    }

    #[test]
    fn test_rejected_cue() {
        let roster = roster(&[("A", Pitch::C4), ("B", Pitch::G4)]);
        let sink = start(&roster);
        // B leaves before the performance, so its cue is refused.
        roster.get("B").unwrap().stop();
        let score = Score::new(vec![
            cue(Pitch::G4, NoteLength::Eighth),
            cue(Pitch::C4, NoteLength::Eighth),
        ]);

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());

        assert_eq!(1, result.rejected);
        assert_eq!(1, result.delivered);
        assert_eq!(
            vec![RoutingError::DeliveryRejected {
                index: 1,
                cue: cue(Pitch::G4, NoteLength::Eighth),
                performer: "B".to_string(),
            }],
            result.errors
        );
        let rendered: Vec<Pitch> = sink.renders().iter().map(|r| r.pitch).collect();
        assert_eq!(vec![Pitch::C4], rendered);
    }

    #[test]
    fn test_cancellation() {
        let roster = roster(&[("A", Pitch::C4), ("B", Pitch::G4)]);
        start(&roster);
        let score = Score::new(vec![cue(Pitch::C4, NoteLength::Whole); 50]);

        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let cancel_handle = conductor.cancel_handle();
        let join = thread::spawn(move || conductor.perform(&score));

        thread::sleep(Duration::from_millis(300));
        let cancelled_at = Instant::now();
        cancel_handle.cancel();
        let result = join.join().unwrap().unwrap();
        assert!(cancelled_at.elapsed() < MEASURE);

        assert!(result.cancelled);
        assert!(result.delivered < 50);
        assert!(result.delivered >= 1);
        assert_eq!(0, roster.join_all());
        for performer in roster.performers() {
            assert_eq!(1, performer.stats().stop_requests);
            assert_eq!(RunState::Terminated, performer.state());
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let roster = roster(&[("A", Pitch::C4)]);
        let sink = start(&roster);
        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        conductor.cancel_handle().cancel();

        let result = conductor
            .perform(&Score::new(vec![cue(Pitch::C4, NoteLength::Whole)]))
            .unwrap();
        assert_eq!(0, roster.join_all());
        assert!(result.cancelled);
        assert_eq!(0, result.delivered);
        assert!(sink.renders().is_empty());
    }

    #[test]
    fn test_perform_only_once() {
        let roster = roster(&[("A", Pitch::C4)]);
        start(&roster);
        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);
        let score = Score::new(vec![cue(Pitch::C4, NoteLength::Eighth)]);

        assert!(conductor.perform(&score).is_ok());
        assert!(matches!(
            conductor.perform(&score),
            Err(ConductorError::AlreadyPerformed)
        ));
        assert_eq!(0, roster.join_all());
    }

    #[test]
    fn test_empty_score_stops_everyone() {
        let roster = roster(&[("A", Pitch::C4), ("B", Pitch::G4)]);
        start(&roster);
        let conductor = Conductor::new(roster.clone(), MEASURE, Pacing::Duration);

        let result = conductor.perform(&Score::default()).unwrap();
        assert_eq!(0, result.delivered);
        assert!(!result.cancelled);
        assert_eq!(0, roster.join_all());
        for performer in roster.performers() {
            assert_eq!(RunState::Terminated, performer.state());
        }
    }

    #[test]
    fn test_tempo_pacing() {
        let roster = roster(&[("A", Pitch::C4)]);
        let sink = start(&roster);
        // Whole notes, but at 1200 BPM every cue only holds the conductor for 50ms.
        let score = Score::new(vec![cue(Pitch::C4, NoteLength::Whole); 3]);

        let conductor = Conductor::new(
            roster.clone(),
            Duration::from_secs(10),
            Pacing::Tempo { bpm: 1200 },
        );
        let result = conductor.perform(&score).unwrap();
        assert_eq!(0, roster.join_all());

        assert!(result.elapsed >= Duration::from_millis(150));
        assert!(result.elapsed < Duration::from_secs(10));
        assert_eq!(3, sink.renders().len());
    }

    #[test]
    fn test_pacing_intervals() {
        let quarter = cue(Pitch::C4, NoteLength::Quarter);
        let whole = cue(Pitch::C4, NoteLength::Whole);
        let measure = Duration::from_secs(1);

        assert_eq!(
            Duration::from_millis(250),
            Pacing::Duration.interval(&quarter, measure)
        );
        assert_eq!(
            Duration::from_millis(1000),
            Pacing::Duration.interval(&whole, measure)
        );

        let tempo = Pacing::Tempo { bpm: 120 };
        assert_eq!(Duration::from_millis(500), tempo.interval(&quarter, measure));
        assert_eq!(Duration::from_millis(500), tempo.interval(&whole, measure));
        // Floor division.
        assert_eq!(
            Duration::from_millis(857),
            Pacing::Tempo { bpm: 70 }.interval(&whole, measure)
        );
    }
}
