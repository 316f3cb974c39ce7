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

//! The ensemble puts a choir, a sink and a conductor together and runs a performance from
//! start to finish.

use std::{sync::Arc, thread, time::Duration};

use tracing::{error, info, span, warn, Level, Span};

use crate::{
    conductor::{Conductor, ConductorError, Pacing, PerformanceResult},
    config::{self, ConfigError},
    cue::Score,
    performer::PerformerError,
    playsync::CancelHandle,
    roster::Roster,
    sink::Sink,
};

#[derive(Debug, thiserror::Error)]
pub enum EnsembleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Performer(#[from] PerformerError),

    #[error(transparent)]
    Conductor(#[from] ConductorError),

    #[error("unable to start the conductor: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("the conductor panicked")]
    ConductorPanicked,
}

/// A choir ready to perform.
pub struct Ensemble {
    roster: Arc<Roster>,
    sink: Arc<dyn Sink>,
    measure_length: Duration,
    pacing: Pacing,
    cancel_handle: CancelHandle,
    span: Span,
}

impl Ensemble {
    /// Creates a new ensemble.
    pub fn new(
        roster: Roster,
        sink: Arc<dyn Sink>,
        measure_length: Duration,
        pacing: Pacing,
    ) -> Ensemble {
        Ensemble {
            roster: Arc::new(roster),
            sink,
            measure_length,
            pacing,
            cancel_handle: CancelHandle::new(),
            span: span!(Level::INFO, "ensemble"),
        }
    }

    /// Creates an ensemble for the score from its configuration.
    pub fn from_config(
        config: &config::Ensemble,
        score: &Score,
        sink: Arc<dyn Sink>,
    ) -> Result<Ensemble, EnsembleError> {
        Ok(Ensemble::new(
            config.roster(score)?,
            sink,
            config.measure_length()?,
            config.pacing()?,
        ))
    }

    /// The choir.
    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    /// Returns a handle that cancels the performance.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    /// Performs the score: starts the choir, conducts on a separate thread, and waits until
    /// every performer has finished.
    pub fn perform(&self, score: Score) -> Result<PerformanceResult, EnsembleError> {
        let _enter = self.span.enter();

        let uncovered = self.roster.uncovered(&score);
        if !uncovered.is_empty() {
            warn!(
                pitches = format!("{:?}", uncovered),
                "No performer holds some pitches of the song; they will be skipped."
            );
        }

        self.roster.start(self.sink.clone(), self.measure_length)?;

        let conductor = Conductor::new(self.roster.clone(), self.measure_length, self.pacing)
            .with_cancel_handle(self.cancel_handle.clone());
        let conductor_join = thread::Builder::new()
            .name("conductor".to_string())
            .spawn(move || conductor.perform(&score));

        let outcome = match conductor_join {
            Ok(handle) => match handle.join() {
                Ok(result) => result.map_err(EnsembleError::from),
                Err(_) => Err(EnsembleError::ConductorPanicked),
            },
            Err(e) => Err(EnsembleError::Spawn(e)),
        };

        // The conductor stops everyone on its way out, but not if it never ran.
        if outcome.is_err() {
            self.roster.stop_all();
        }
        let failed = self.roster.join_all();
        if failed > 0 {
            error!(failed, "Some performers did not finish cleanly.");
        }

        if let Ok(result) = &outcome {
            info!(
                delivered = result.delivered,
                cancelled = result.cancelled,
                "Ensemble finished."
            );
        }
        outcome
    }
}
