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
use crate::types::timestamp::Timestamp;

/// The source of "today".
pub trait Clock {
    fn today(&self) -> Date;
}

/// Reads the local calendar date on every call.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        Timestamp::now().local_date()
    }
}

/// Always returns the same date.
#[derive(Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// Either clock, chosen at runtime from the command line.
#[derive(Clone, Copy)]
pub enum AnyClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl AnyClock {
    pub fn from_override(today: Option<Date>) -> Self {
        match today {
            Some(date) => AnyClock::Fixed(FixedClock(date)),
            None => AnyClock::System(SystemClock),
        }
    }
}

impl Clock for AnyClock {
    fn today(&self) -> Date {
        match self {
            AnyClock::System(clock) => clock.today(),
            AnyClock::Fixed(clock) => clock.today(),
        }
    }
}
