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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::db::Database;
use crate::engine::ProgressEngine;

pub type Engine = ProgressEngine<Database, SystemClock>;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    /// One engine per calendar, keyed by slug. Each engine is one session.
    pub engines: HashMap<String, Engine>,
}

impl ServerState {
    pub fn acquire(&self) -> MutexGuard<'_, MutableState> {
        self.mutable.lock().unwrap_or_else(|e| e.into_inner())
    }
}
