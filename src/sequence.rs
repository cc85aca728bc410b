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

use crate::types::date::Date;
use crate::types::day::DayDescriptor;

/// Generate `count` consecutive days starting at `start`.
///
/// Stops early if the calendar runs out of representable dates.
pub fn generate(start: Date, count: usize) -> Vec<DayDescriptor> {
    let mut days = Vec::with_capacity(count);
    for index in 0..count {
        match start.plus_days(index as u64) {
            Some(date) => days.push(DayDescriptor { index, date }),
            None => {
                log::warn!("Date range starting {start} overflows after {index} days.");
                break;
            }
        }
    }
    days
}

/// The first and last dates of a sequence.
pub fn date_range(sequence: &[DayDescriptor]) -> Option<(Date, Date)> {
    let first = sequence.first()?;
    let last = sequence.last()?;
    Some((first.date, last.date))
}

/// A label like `1 January → 10 April`.
pub fn range_label(sequence: &[DayDescriptor]) -> String {
    match date_range(sequence) {
        Some((first, last)) => format!("{} → {}", first.long_label(), last.long_label()),
        None => String::new(),
    }
}
