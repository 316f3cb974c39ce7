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
use std::{fmt, sync::Arc, time::Duration};

use tracing::{error, info};

use crate::{
    cue::Score,
    error::SetupError,
    notes::Pitch,
    performer::{Performer, PerformerError, Slot},
    sink::Sink,
};

/// The choir: performers in registration order, each with a unique name. The roster is read-only
/// once the performance begins, so the conductor iterates it without locking.
#[derive(Default)]
pub struct Roster {
    performers: Vec<Arc<Performer>>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Roster {
        Roster {
            performers: Vec::new(),
        }
    }

    /// Builds the default choir for a score: one performer per distinct pitch, in order of first
    /// appearance, each ringing with their left hand.
    pub fn for_score(score: &Score) -> Result<Roster, SetupError> {
        let mut roster = Roster::new();
        for pitch in score.pitches() {
            let mut performer = Performer::new(&format!("Member {}", pitch));
            performer.assign_slot(Slot::Left, pitch)?;
            roster.add(performer)?;
        }
        Ok(roster)
    }

    /// Adds a performer to the end of the roster.
    pub fn add(&mut self, performer: Performer) -> Result<(), SetupError> {
        if self.get(performer.name()).is_some() {
            return Err(SetupError::DuplicatePerformer(performer.name().to_string()));
        }
        self.performers.push(Arc::new(performer));
        Ok(())
    }

    /// Gets the performer with the given name.
    pub fn get(&self, name: &str) -> Option<&Arc<Performer>> {
        self.performers
            .iter()
            .find(|performer| performer.name() == name)
    }

    /// Finds the performer to cue for a pitch. If more than one performer holds the pitch, the
    /// first one registered always wins.
    pub fn resolve(&self, pitch: Pitch) -> Option<&Arc<Performer>> {
        self.performers
            .iter()
            .find(|performer| performer.holds(pitch))
    }

    /// Returns the pitches of the score that no performer holds.
    pub fn uncovered(&self, score: &Score) -> Vec<Pitch> {
        score
            .pitches()
            .into_iter()
            .filter(|pitch| self.resolve(*pitch).is_none())
            .collect()
    }

    /// The performers in roster order.
    pub fn performers(&self) -> &[Arc<Performer>] {
        &self.performers
    }

    pub fn len(&self) -> usize {
        self.performers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.performers.is_empty()
    }

    /// Starts every performer. If one fails to start, the ones already started are stopped and
    /// joined before the error is returned.
    pub fn start(&self, sink: Arc<dyn Sink>, measure_length: Duration) -> Result<(), PerformerError> {
        for (i, performer) in self.performers.iter().enumerate() {
            if let Err(e) = performer.start(sink.clone(), measure_length) {
                for started in &self.performers[..i] {
                    started.stop();
                    if let Err(e) = started.join() {
                        error!(err = %e, "Error while unwinding roster start");
                    }
                }
                return Err(e);
            }
        }
        info!(performers = self.performers.len(), sink = %sink, "Choir ready.");
        Ok(())
    }

    /// Tells every performer to stop.
    pub fn stop_all(&self) {
        self.performers.iter().for_each(|performer| performer.stop());
    }

    /// Waits for every performer to exit, logging any that can't be joined. Returns the number of
    /// performers that failed to join cleanly.
    pub fn join_all(&self) -> usize {
        self.performers
            .iter()
            .filter_map(|performer| performer.join().err())
            .inspect(|e| error!(err = %e, "Error waiting for performer to finish"))
            .count()
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Roster ({} performers):", self.performers.len())?;
        for performer in self.performers.iter() {
            writeln!(f, "  - {}", performer)?;
        }
        Ok(())
    }
}
