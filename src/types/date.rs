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

use chrono::Datelike;
use chrono::Days;
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Fallible;

const FORMAT: &str = "%Y-%m-%d";

/// A calendar date with no time-of-day component. All day arithmetic goes
/// through `NaiveDate`, so it never drifts across DST changes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Parse a date in `YYYY-MM-DD` format.
    pub fn parse(s: &str) -> Fallible<Self> {
        let date = NaiveDate::parse_from_str(s.trim(), FORMAT)?;
        Ok(Self(date))
    }

    /// The date `n` days later, or `None` past the end of the calendar.
    pub fn plus_days(self, n: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(n)).map(Self)
    }

    /// Short weekday name, e.g. `Thu`.
    pub fn weekday_short(self) -> String {
        self.0.format("%a").to_string()
    }

    /// Short month name, e.g. `Jan`.
    pub fn month_short(self) -> String {
        self.0.format("%b").to_string()
    }

    pub fn day_number(self) -> u32 {
        self.0.day()
    }

    /// Day and full month name, e.g. `1 January`.
    pub fn long_label(self) -> String {
        self.0.format("%-d %B").to_string()
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
