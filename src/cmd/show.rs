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

use std::fmt::Write;

use crate::clock::Clock;
use crate::cmd::clock_from;
use crate::collection::Collection;
use crate::engine::DayStatus;
use crate::engine::ProgressEngine;
use crate::error::Fallible;
use crate::sequence::range_label;
use crate::storage::FlipStore;

pub fn show_calendar(
    config: Option<String>,
    slug: Option<String>,
    today: Option<String>,
) -> Fallible<()> {
    let clock = clock_from(today)?;
    let coll = Collection::new(config)?;
    let calendar = coll.calendar(slug.as_deref())?;
    let engine = coll.engine(calendar, clock);
    println!("{}", calendar.name);
    print!("{}", render_board(&engine));
    Ok(())
}

/// One line per day, followed by the progress line.
pub fn render_board<S: FlipStore, C: Clock>(engine: &ProgressEngine<S, C>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", range_label(engine.sequence()));
    for (day, status) in engine.board() {
        let marker = match status {
            DayStatus::Skip(rule) => format!("{} {}", rule.emoji, rule.reason),
            DayStatus::Future => "·".to_string(),
            DayStatus::Flippable { flipped: true } => "[x]".to_string(),
            DayStatus::Flippable { flipped: false } => "[ ]".to_string(),
        };
        let _ = writeln!(
            out,
            "{:>4}  {} {:>2} {}  {}",
            day.index,
            day.date.weekday_short(),
            day.date.day_number(),
            day.date.month_short(),
            marker
        );
    }
    let snapshot = engine.snapshot();
    let _ = writeln!(out, "{snapshot}");
    if let Some(note) = snapshot.skip_note() {
        let _ = writeln!(out, "{note}");
    }
    out
}
