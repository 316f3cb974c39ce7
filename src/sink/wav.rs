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
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use tracing::info;

use crate::notes::PitchWaveform;

use super::SinkError;

/// Number of silent samples written after every note so repeated notes don't run together.
const NOTE_GAP_SAMPLES: usize = 50;

/// A sink that writes everything the choir rings into a single mono 8 bit WAV file. Renders are
/// appended in the order they complete, like writes to one shared output line.
pub struct Sink {
    path: PathBuf,
    sample_rate: u32,
    samples: Mutex<Vec<i8>>,
}

impl Sink {
    /// Creates a new WAV sink that will write to the given path when finished.
    pub fn new(path: &Path, sample_rate: u32) -> Sink {
        Sink {
            path: path.to_path_buf(),
            sample_rate,
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of samples rendered so far.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Writes the rendered samples to disk.
    pub fn finish(&self) -> Result<(), SinkError> {
        let samples = self.samples.lock();
        let mut writer = WavWriter::create(
            &self.path,
            WavSpec {
                channels: 1,
                sample_rate: self.sample_rate,
                bits_per_sample: 8,
                sample_format: SampleFormat::Int,
            },
        )?;
        for sample in samples.iter() {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;

        info!(
            path = self.path.display().to_string(),
            samples = samples.len(),
            "Wrote performance."
        );
        Ok(())
    }
}

impl super::Sink for Sink {
    fn render(&self, waveform: &PitchWaveform, duration: Duration) -> Result<(), SinkError> {
        let rendered = waveform.samples(self.sample_rate, duration);
        let mut samples = self.samples.lock();
        samples.extend_from_slice(&rendered);
        samples.extend(std::iter::repeat(0i8).take(NOTE_GAP_SAMPLES));
        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (WAV)", self.path.display())
    }
}
