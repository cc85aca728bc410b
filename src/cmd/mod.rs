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

pub mod check;
pub mod flip;
pub mod serve;
pub mod show;
pub mod status;

use crate::clock::AnyClock;
use crate::error::Fallible;
use crate::types::date::Date;

/// The clock to use, given the `--today` option.
pub fn clock_from(today: Option<String>) -> Fallible<AnyClock> {
    let today = match today {
        Some(s) => Some(Date::parse(&s)?),
        None => None,
    };
    Ok(AnyClock::from_override(today))
}
