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

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;
use crate::cmd::serve::view::board;

pub async fn get_default(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    render(&state, "")
}

pub async fn get_calendar(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> (StatusCode, Html<String>) {
    render(&state, &slug)
}

fn render(state: &ServerState, slug: &str) -> (StatusCode, Html<String>) {
    let calendar = state.config.resolve(slug);
    let mut mutable = state.acquire();
    match mutable.engines.get_mut(&calendar.slug) {
        Some(engine) => {
            engine.reload();
            let html = page_template(&calendar.name, board(calendar, engine));
            (StatusCode::OK, Html(html.into_string()))
        }
        None => {
            log::error!("No engine for calendar {}.", calendar.slug);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Internal Server Error".to_string()),
            )
        }
    }
}
