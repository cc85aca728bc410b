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

use std::collections::HashMap;

use crate::types::date::Date;
use crate::types::day::DayDescriptor;

/// A date that does not count toward the goal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SkipRule {
    pub date: Date,
    /// Human-readable description of the exception.
    pub reason: String,
    /// A glyph shown on the note, usually a single emoji.
    pub emoji: String,
}

/// Skip rules keyed by date.
///
/// When two rules share a date, the first one defined wins and the rest are
/// dropped.
#[derive(Clone, Default, Debug)]
pub struct SkipIndex {
    rules: HashMap<Date, SkipRule>,
}

impl SkipIndex {
    pub fn new(rules: &[SkipRule]) -> Self {
        let mut map: HashMap<Date, SkipRule> = HashMap::new();
        for rule in rules {
            if let Some(existing) = map.get(&rule.date) {
                log::warn!(
                    "Ignoring duplicate skip rule on {} ({:?}); keeping {:?}.",
                    rule.date,
                    rule.reason,
                    existing.reason
                );
                continue;
            }
            map.insert(rule.date, rule.clone());
        }
        Self { rules: map }
    }

    pub fn get(&self, date: Date) -> Option<&SkipRule> {
        self.rules.get(&date)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.rules.contains_key(&date)
    }

    /// The number of days in the sequence that fall on a skip date.
    pub fn count_in(&self, sequence: &[DayDescriptor]) -> usize {
        sequence.iter().filter(|day| self.contains(day.date)).count()
    }
}
