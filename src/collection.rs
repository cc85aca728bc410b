// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env::current_dir;
use std::path::PathBuf;
use std::time::Instant;

use crate::clock::Clock;
use crate::config::CalendarConfig;
use crate::config::Config;
use crate::db::Database;
use crate::engine::ProgressEngine;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

pub const CONFIG_FILE: &str = "flipdays.toml";
pub const DATABASE_FILE: &str = "flipdays.db";

/// A configuration file and the database that sits next to it.
pub struct Collection {
    pub directory: PathBuf,
    pub db: Database,
    pub config: Config,
}

impl Collection {
    /// Open the collection at `config_path`, or at `flipdays.toml` in the
    /// current directory.
    pub fn new(config_path: Option<String>) -> Fallible<Self> {
        let config_path: PathBuf = match config_path {
            Some(path) => PathBuf::from(path),
            None => current_dir()?.join(CONFIG_FILE),
        };
        let config_path = if config_path.exists() {
            config_path.canonicalize()?
        } else {
            return fail(format!(
                "configuration file {} does not exist.",
                config_path.display()
            ));
        };
        let directory: PathBuf = match config_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return fail("configuration file has no parent directory."),
        };

        let config = {
            let start = Instant::now();
            let config = Config::load(&config_path)?;
            let duration = start.elapsed().as_millis();
            log::debug!(
                "Loaded {} calendars in {duration}ms.",
                config.calendars().len()
            );
            config
        };

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db: Database = Database::new(db_path)?;

        Ok(Self {
            directory,
            db,
            config,
        })
    }

    /// The named calendar, or the default one. Unlike web routing, an
    /// unknown name is an error here.
    pub fn calendar(&self, slug: Option<&str>) -> Fallible<&CalendarConfig> {
        match slug {
            None => Ok(self.config.default_calendar()),
            Some(slug) => match self.config.get(slug) {
                Some(calendar) => Ok(calendar),
                None => fail(format!("no calendar named {slug}.")),
            },
        }
    }

    pub fn engine<C: Clock>(
        &self,
        calendar: &CalendarConfig,
        clock: C,
    ) -> ProgressEngine<Database, C> {
        ProgressEngine::open(
            calendar.storage_key(),
            calendar.sequence(),
            &calendar.skip_rules,
            self.db.clone(),
            clock,
        )
    }
}
