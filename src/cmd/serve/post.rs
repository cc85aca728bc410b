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

use axum::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::cmd::serve::state::ServerState;
use crate::engine::ToggleOutcome;
use crate::error::Fallible;
use crate::error::fail;

#[derive(Debug, Deserialize)]
enum Action {
    Flip,
    Dismiss,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    index: Option<usize>,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Form(form): Form<FormData>,
) -> Redirect {
    // Unlike viewing, changing a calendar needs its exact slug.
    if state.config.get(&slug).is_none() {
        log::warn!("Ignoring {:?} for unknown calendar {slug:?}.", form.action);
        return Redirect::to("/");
    }
    if let Err(e) = action_handler(&state, &slug, form) {
        log::error!("{e}");
    }
    Redirect::to(&format!("/{slug}"))
}

fn action_handler(state: &ServerState, slug: &str, form: FormData) -> Fallible<()> {
    let mut mutable = state.acquire();
    let engine = match mutable.engines.get_mut(slug) {
        Some(engine) => engine,
        None => return fail(format!("no engine for calendar {slug}.")),
    };
    // The CLI may have written since the last request.
    engine.reload();
    match form.action {
        Action::Flip => {
            let index = match form.index {
                Some(index) => index,
                None => return fail("flip request without a day index."),
            };
            match engine.toggle(index) {
                ToggleOutcome::Ignored => {
                    log::debug!("{slug}: day {index} is not flippable.");
                }
                ToggleOutcome::Toggled { flipped, completed } => {
                    log::debug!("{slug}: day {index} flipped={flipped}.");
                    if completed {
                        log::info!("{slug}: goal reached.");
                    }
                }
            }
        }
        Action::Dismiss => {
            engine.dismiss_celebration();
        }
    }
    Ok(())
}
