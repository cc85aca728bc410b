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

use crate::clock::Clock;
use crate::cmd::clock_from;
use crate::collection::Collection;
use crate::engine::DayStatus;
use crate::engine::ProgressEngine;
use crate::engine::ToggleOutcome;
use crate::error::Fallible;
use crate::error::fail;
use crate::storage::FlipStore;
use crate::types::date::Date;

pub fn flip_day(
    config: Option<String>,
    slug: String,
    day: String,
    today: Option<String>,
) -> Fallible<()> {
    let clock = clock_from(today)?;
    let coll = Collection::new(config)?;
    let calendar = coll.calendar(Some(&slug))?;
    let mut engine = coll.engine(calendar, clock);
    let index = parse_day(&engine, &day)?;
    for line in flip(&mut engine, index, &calendar.name) {
        println!("{line}");
    }
    Ok(())
}

/// Accept either an index or a date in the calendar.
fn parse_day<S: FlipStore, C: Clock>(engine: &ProgressEngine<S, C>, day: &str) -> Fallible<usize> {
    if let Ok(index) = day.parse::<usize>() {
        return Ok(index);
    }
    let date = match Date::parse(day) {
        Ok(date) => date,
        Err(_) => return fail(format!("{day:?} is neither a day index nor a date.")),
    };
    match engine.index_of(date) {
        Some(index) => Ok(index),
        None => fail(format!("{date} is not in this calendar.")),
    }
}

/// Toggle a day and describe what happened.
fn flip<S: FlipStore, C: Clock>(
    engine: &mut ProgressEngine<S, C>,
    index: usize,
    name: &str,
) -> Vec<String> {
    let mut lines = Vec::new();
    match engine.toggle(index) {
        ToggleOutcome::Ignored => {
            let reason = match engine.status_at(index) {
                Some(DayStatus::Skip(rule)) => {
                    format!("is a skip day ({} {})", rule.emoji, rule.reason)
                }
                Some(DayStatus::Future) => "is in the future".to_string(),
                Some(DayStatus::Flippable { .. }) => "cannot be flipped".to_string(),
                None => "does not exist".to_string(),
            };
            lines.push(format!("Day {index} {reason}; nothing changed."));
        }
        ToggleOutcome::Toggled { flipped, completed } => {
            let verb = if flipped { "Flipped" } else { "Unflipped" };
            lines.push(format!("{verb} day {index}."));
            lines.push(engine.snapshot().to_string());
            if completed {
                let goal = engine.snapshot().effective_goal;
                lines.push(format!(
                    "Congratulations, {name}! You completed all {goal} days! 🎉"
                ));
            }
        }
    }
    lines
}
