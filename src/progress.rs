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

use serde::Serialize;

/// Progress toward the goal. Recomputed on every read.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_days: usize,
    pub skip_days: usize,
    /// Total days minus skip days.
    pub effective_goal: usize,
    /// Days flipped by hand.
    pub completed_count: usize,
    /// Between 0 and 100 inclusive.
    pub percent: f64,
    pub is_complete: bool,
}

impl ProgressSnapshot {
    pub fn new(total_days: usize, skip_days: usize, completed_count: usize) -> Self {
        let effective_goal = total_days.saturating_sub(skip_days);
        let percent = if effective_goal == 0 {
            0.0
        } else {
            (completed_count as f64 / effective_goal as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            total_days,
            skip_days,
            effective_goal,
            completed_count,
            percent,
            is_complete: effective_goal > 0 && completed_count >= effective_goal,
        }
    }

    pub fn rounded_percent(&self) -> u32 {
        self.percent.round() as u32
    }

    /// A note like `2 skip days (not counted)`, if there are any.
    pub fn skip_note(&self) -> Option<String> {
        match self.skip_days {
            0 => None,
            1 => Some("1 skip day (not counted)".to_string()),
            n => Some(format!("{n} skip days (not counted)")),
        }
    }
}

impl Display for ProgressSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} days ({}%)",
            self.completed_count,
            self.effective_goal,
            self.rounded_percent()
        )
    }
}

/// Detects the moment the goal is reached.
///
/// Fires once per transition from incomplete to complete. The celebration
/// stays up until dismissed or until the goal is lost again.
#[derive(Clone, Copy, Debug)]
pub struct CompletionTracker {
    was_complete: bool,
    celebrating: bool,
}

impl CompletionTracker {
    /// Seed the tracker with the state observed at startup. A calendar that
    /// is already complete does not celebrate again.
    pub fn new(is_complete: bool) -> Self {
        Self {
            was_complete: is_complete,
            celebrating: false,
        }
    }

    /// Record the latest state. Returns `true` on the rising edge only.
    pub fn observe(&mut self, is_complete: bool) -> bool {
        let rising = is_complete && !self.was_complete;
        if rising {
            self.celebrating = true;
        }
        if !is_complete {
            self.celebrating = false;
        }
        self.was_complete = is_complete;
        rising
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    pub fn dismiss(&mut self) {
        self.celebrating = false;
    }
}
