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

use crate::cue::Cue;
use crate::notes::ParseNoteError;

/// Errors raised while setting up an ensemble. These happen before any thread is started
/// and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("invalid slot '{0}': slot must be 'left' or 'right'")]
    InvalidSlot(String),

    #[error("{performer} is already assigned a note in their {slot} slot")]
    DuplicateSlot { performer: String, slot: String },

    #[error("{0} has already started and can no longer be assigned notes")]
    AlreadyStarted(String),

    #[error("a performer named {0} is already in the roster")]
    DuplicatePerformer(String),

    #[error("malformed score entry {index}: {source}")]
    MalformedScore {
        index: usize,
        #[source]
        source: ParseNoteError,
    },
}

/// Problems routing a single cue. These are recorded in the performance result and never stop
/// a performance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("no performer is assigned {cue} (score entry {index})")]
    Unresolved { index: usize, cue: Cue },

    #[error("{performer} refused {cue} (score entry {index})")]
    DeliveryRejected {
        index: usize,
        cue: Cue,
        performer: String,
    },
}
