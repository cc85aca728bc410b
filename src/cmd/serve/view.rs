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

use maud::Markup;
use maud::html;

use crate::clock::Clock;
use crate::config::CalendarConfig;
use crate::engine::DayStatus;
use crate::engine::ProgressEngine;
use crate::sequence::range_label;
use crate::storage::FlipStore;
use crate::types::day::DayDescriptor;

/// Post-it colours, cycled by day index.
const NOTE_COLORS: [&str; 8] = [
    "#FFE066", "#FF6B9D", "#7FDBFF", "#98FB98", "#FFB366", "#DDA0DD", "#87CEEB", "#F0E68C",
];

pub fn board<S: FlipStore, C: Clock>(
    calendar: &CalendarConfig,
    engine: &ProgressEngine<S, C>,
) -> Markup {
    let snapshot = engine.snapshot();
    let action = format!("/{}", calendar.slug);
    html! {
        div.calendar {
            header.header {
                h1 { (calendar.name) }
                p.subtitle { (range_label(engine.sequence())) }
                div.progress-container {
                    div.progress-bar style=(format!("width: {:.1}%", snapshot.percent)) {}
                    span.progress-text { (snapshot.to_string()) }
                }
                @if let Some(note) = snapshot.skip_note() {
                    p.skip-info { (note) }
                }
                @if snapshot.is_complete {
                    p.celebration-banner {
                        "Congratulations! You completed all " (snapshot.effective_goal) " days 🎉"
                    }
                }
            }
            main.board {
                form.notes-grid action=(action) method="post" {
                    input type="hidden" name="action" value="Flip";
                    @for (day, status) in engine.board() {
                        (note(day, status))
                    }
                }
            }
            @if engine.is_celebrating() {
                div.celebration-modal role="dialog" aria-live="polite" aria-modal="true" {
                    div.celebration-card {
                        h2 { "Congratulations, " (calendar.name) "!" }
                        p { "You completed all " (snapshot.effective_goal) " days! 🎉" }
                        form action=(action) method="post" {
                            button.celebration-button type="submit" name="action" value="Dismiss" {
                                "Hooray!"
                            }
                        }
                    }
                }
            }
        }
    }
}

fn note(day: DayDescriptor, status: DayStatus<'_>) -> Markup {
    let color = NOTE_COLORS[day.index % NOTE_COLORS.len()];
    let skip = matches!(status, DayStatus::Skip(_));
    let future = matches!(status, DayStatus::Future);
    let flipped = skip || matches!(status, DayStatus::Flippable { flipped: true });
    let title = match status {
        DayStatus::Skip(rule) => format!("{} {}", rule.emoji, rule.reason),
        DayStatus::Future => "Not yet.".to_string(),
        DayStatus::Flippable { flipped: true } => "Click to unflip.".to_string(),
        DayStatus::Flippable { flipped: false } => "Click to mark as done.".to_string(),
    };
    html! {
        button.note-container.flipped[flipped].skip-day[skip].future[future]
            type="submit" name="index" value=(day.index) disabled[skip || future]
            style=(format!("--note-color: {color}")) title=(title) {
            span.note {
                span.note-front {
                    span.weekday { (day.date.weekday_short()) }
                    span.day { (day.date.day_number()) }
                    span.month { (day.date.month_short()) }
                }
                span.note-back.skip-back[skip] {
                    @match status {
                        DayStatus::Skip(rule) => {
                            span.skip-emoji { (rule.emoji) }
                            span.skip-reason { (rule.reason) }
                        }
                        _ => {
                            span.checkmark { "✓" }
                        }
                    }
                }
            }
            span.pin.pin-gold[skip] {}
        }
    }
}
