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

//! A bell choir: a conductor cues a roster of performer threads through a song, one note at a
//! time, pacing the cues against a tempo clock.

pub mod conductor;
pub mod config;
pub mod cue;
pub mod ensemble;
pub mod error;
pub mod notes;
pub mod performer;
pub mod playsync;
pub mod roster;
pub mod sink;
pub mod songs;
pub mod util;

#[cfg(test)]
mod testutil;
