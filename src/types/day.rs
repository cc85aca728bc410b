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

/// One day in a generated sequence.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DayDescriptor {
    /// The position of the day in the sequence, starting at zero.
    pub index: usize,
    /// The day's calendar date.
    pub date: Date,
}
