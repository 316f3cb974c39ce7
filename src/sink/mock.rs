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
use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::notes::{Pitch, PitchWaveform};

use super::SinkError;

/// A render observed by the mock sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    /// The pitch that was rendered.
    pub pitch: Pitch,
    /// The duration requested by the performer.
    pub duration: Duration,
    /// The name of the thread that rendered, which is the performer's name.
    pub performer: Option<String>,
}

/// A mock sink. Doesn't produce any output, but remembers every render.
#[derive(Clone)]
pub struct Sink {
    name: String,
    /// How long each render holds the performer, regardless of the requested duration.
    delay: Duration,
    /// Pitches whose renders fail.
    failing: Arc<Mutex<HashSet<Pitch>>>,
    /// Completed renders, in completion order.
    renders: Arc<Mutex<Vec<Render>>>,
    /// Renders that are currently in progress.
    in_flight: Arc<AtomicUsize>,
    /// Observers notified when a render completes.
    observers: Arc<Mutex<Vec<Sender<Render>>>>,
}

impl Sink {
    /// Gets the given mock sink. Renders complete immediately.
    pub fn get(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
            delay: Duration::ZERO,
            failing: Arc::new(Mutex::new(HashSet::new())),
            renders: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes every render hold the caller for the given delay.
    pub fn with_delay(mut self, delay: Duration) -> Sink {
        self.delay = delay;
        self
    }

    /// Makes every render of the given pitch fail.
    pub fn fail_on(&self, pitch: Pitch) {
        self.failing.lock().insert(pitch);
    }

    /// Returns a channel that receives every render completed from now on.
    pub fn subscribe(&self) -> Receiver<Render> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.observers.lock().push(tx);
        rx
    }

    /// Returns the completed renders.
    pub fn renders(&self) -> Vec<Render> {
        self.renders.lock().clone()
    }

    /// Returns the completed renders made by the given performer.
    pub fn renders_by(&self, performer: &str) -> Vec<Render> {
        self.renders
            .lock()
            .iter()
            .filter(|render| render.performer.as_deref() == Some(performer))
            .cloned()
            .collect()
    }

    /// Returns the number of renders in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl super::Sink for Sink {
    fn render(&self, waveform: &PitchWaveform, duration: Duration) -> Result<(), SinkError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let render = Render {
            pitch: waveform.pitch(),
            duration,
            performer: thread::current().name().map(str::to_string),
        };
        debug!(sink = self.name, render = ?render, "Mock render.");
        self.renders.lock().push(render.clone());
        self.observers
            .lock()
            .retain(|observer| observer.send(render.clone()).is_ok());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(&waveform.pitch()) {
            return Err(SinkError::Write(format!(
                "{} refused {}",
                self.name,
                waveform.pitch()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use crate::notes::Pitch;
    use crate::sink::Sink as _;

    use super::*;

    #[test]
    fn test_records_renders() {
        let sink = Sink::get("mock-sink");
        let observed = sink.subscribe();

        let join = {
            let sink = sink.clone();
            thread::Builder::new()
                .name("Alice".to_string())
                .spawn(move || sink.render(&Pitch::C4.waveform(), Duration::from_millis(250)))
                .unwrap()
        };
        assert!(join.join().unwrap().is_ok());

        let expected = Render {
            pitch: Pitch::C4,
            duration: Duration::from_millis(250),
            performer: Some("Alice".to_string()),
        };
        assert_eq!(vec![expected.clone()], sink.renders_by("Alice"));
        assert!(sink.renders_by("Bob").is_empty());
        assert_eq!(expected, observed.recv_timeout(Duration::from_secs(1)).unwrap());
        assert_eq!(0, sink.in_flight());
    }

    #[test]
    fn test_scripted_failure() {
        let sink = Sink::get("mock-sink");
        sink.fail_on(Pitch::G4);

        assert!(sink
            .render(&Pitch::C4.waveform(), Duration::from_millis(1))
            .is_ok());
        assert!(sink
            .render(&Pitch::G4.waveform(), Duration::from_millis(1))
            .is_err());
        assert_eq!(2, sink.renders().len());
    }
}
