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
use std::path::Path;

use config::{Config, File, FileFormat};

pub mod ensemble;
pub mod error;
pub mod performer;

pub use self::ensemble::{Ensemble, Pacing};
pub use self::error::ConfigError;
pub use self::performer::Performer;

/// Parses the ensemble configuration from a YAML file.
pub fn load_ensemble(file: &Path) -> Result<Ensemble, ConfigError> {
    Ok(Config::builder()
        .add_source(File::from(file).format(FileFormat::Yaml))
        .build()?
        .try_deserialize()?)
}

/// Parses the ensemble configuration from a YAML string.
pub fn parse_ensemble(yaml: &str) -> Result<Ensemble, ConfigError> {
    Ok(Config::builder()
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()?
        .try_deserialize()?)
}
