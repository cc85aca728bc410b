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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::clock::Clock;
use crate::cmd::clock_from;
use crate::collection::Collection;
use crate::config::CalendarConfig;
use crate::engine::ProgressEngine;
use crate::error::Fallible;
use crate::progress::ProgressSnapshot;
use crate::sequence::date_range;
use crate::storage::FlipStore;
use crate::types::date::Date;

#[derive(ValueEnum, Clone)]
pub enum StatusFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatusFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFormat::Text => write!(f, "text"),
            StatusFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    slug: String,
    name: String,
    first_day: Option<Date>,
    last_day: Option<Date>,
    today: Date,
    progress: ProgressSnapshot,
}

pub fn print_status(
    config: Option<String>,
    slug: Option<String>,
    today: Option<String>,
    format: StatusFormat,
) -> Fallible<()> {
    let clock = clock_from(today)?;
    let coll = Collection::new(config)?;
    let calendar = coll.calendar(slug.as_deref())?;
    let engine = coll.engine(calendar, clock);
    let status = get_status(calendar, &engine, clock.today());
    match format {
        StatusFormat::Text => {
            println!("{}: {}", status.name, status.progress);
            if let Some(note) = status.progress.skip_note() {
                println!("{note}");
            }
            if status.progress.is_complete {
                println!("Goal reached.");
            }
            if let Some(ts) = coll.db.last_saved(engine.key())? {
                println!("Last saved: {ts}");
            }
        }
        StatusFormat::Json => {
            let json = serde_json::to_string_pretty(&status)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn get_status<S: FlipStore, C: Clock>(
    calendar: &CalendarConfig,
    engine: &ProgressEngine<S, C>,
    today: Date,
) -> Status {
    let range = date_range(engine.sequence());
    Status {
        slug: calendar.slug.clone(),
        name: calendar.name.clone(),
        first_day: range.map(|(first, _)| first),
        last_day: range.map(|(_, last)| last),
        today,
        progress: engine.snapshot(),
    }
}
