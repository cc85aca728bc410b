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

use crate::clock::Clock;
use crate::progress::CompletionTracker;
use crate::progress::ProgressSnapshot;
use crate::storage::FlipStore;
use crate::storage::encode;
use crate::storage::frame_key;
use crate::storage::load;
use crate::storage::load_frame;
use crate::types::date::Date;
use crate::types::day::DayDescriptor;
use crate::types::flipped::FlippedSet;
use crate::types::skip_rule::SkipIndex;
use crate::types::skip_rule::SkipRule;

/// How a day should be displayed, and whether it can be toggled.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DayStatus<'a> {
    /// The day is excluded from the goal. Always shown as flipped.
    Skip(&'a SkipRule),
    /// The day is after today and locked.
    Future,
    /// The day can be toggled by the user.
    Flippable { flipped: bool },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ToggleOutcome {
    /// The day was a skip day, a future day, or out of range.
    Ignored,
    Toggled {
        /// Whether the day is now flipped.
        flipped: bool,
        /// Whether this toggle completed the goal.
        completed: bool,
    },
}

/// Owns the flip state of one calendar.
pub struct ProgressEngine<S: FlipStore, C: Clock> {
    key: String,
    sequence: Vec<DayDescriptor>,
    skips: SkipIndex,
    flipped: FlippedSet,
    store: S,
    clock: C,
    tracker: CompletionTracker,
}

impl<S: FlipStore, C: Clock> ProgressEngine<S, C> {
    /// Load the state saved under `key` and move it into the given sequence.
    /// Saved days keep their date; days that are no longer in range, or that
    /// now fall on a skip date, are dropped.
    pub fn open(
        key: impl Into<String>,
        sequence: Vec<DayDescriptor>,
        rules: &[SkipRule],
        store: S,
        clock: C,
    ) -> Self {
        let mut engine = Self {
            key: key.into(),
            sequence,
            skips: SkipIndex::new(rules),
            flipped: FlippedSet::new(),
            store,
            clock,
            tracker: CompletionTracker::new(false),
        };
        if let Some(restored) = engine.restore() {
            engine.flipped = restored.flipped;
            if restored.stale {
                engine.persist();
            }
        }
        engine.tracker = CompletionTracker::new(engine.snapshot().is_complete);
        engine
    }

    /// Re-read the saved state, picking up writes made by another process.
    /// If nothing can be read, the in-memory state is kept.
    pub fn reload(&mut self) {
        let Some(restored) = self.restore() else {
            return;
        };
        if restored.flipped != self.flipped {
            log::debug!("Reloaded {} from the store.", self.key);
            self.flipped = restored.flipped;
            self.tracker.observe(self.snapshot().is_complete);
        }
        if restored.stale {
            self.persist();
        }
    }

    /// Read the saved set and remap it into the current sequence. The saved
    /// frame start turns each index back into a date; state saved without
    /// one is read in the current frame.
    fn restore(&self) -> Option<Restored> {
        let saved = load(&self.store, &self.key)?;
        let start = self.sequence.first().map(|day| day.date);
        let frame = load_frame(&self.store, &self.key);
        let origin = frame.or(start);
        let flipped = remap(
            &saved,
            |index| origin.and_then(|origin| origin.plus_days(index as u64)),
            &self.sequence,
            &self.skips,
        );
        if frame.is_some() && frame != start {
            log::debug!(
                "The range of {} moved; kept {} of {} flipped days.",
                self.key,
                flipped.len(),
                saved.len()
            );
        } else if flipped != saved {
            log::debug!(
                "Dropped {} stale entries from {}.",
                saved.len() - flipped.len(),
                self.key
            );
        }
        let stale = flipped != saved || (start.is_some() && frame != start);
        Some(Restored { flipped, stale })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn sequence(&self) -> &[DayDescriptor] {
        &self.sequence
    }

    pub fn flipped(&self) -> &FlippedSet {
        &self.flipped
    }

    pub fn skip_rule(&self, date: Date) -> Option<&SkipRule> {
        self.skips.get(date)
    }

    pub fn index_of(&self, date: Date) -> Option<usize> {
        self.sequence
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.index)
    }

    pub fn resolve_status(&self, day: &DayDescriptor) -> DayStatus<'_> {
        self.resolve_with(day, self.clock.today())
    }

    pub fn status_at(&self, index: usize) -> Option<DayStatus<'_>> {
        self.sequence.get(index).map(|day| self.resolve_status(day))
    }

    /// Every day with its status, sampling today once.
    pub fn board(&self) -> Vec<(DayDescriptor, DayStatus<'_>)> {
        let today = self.clock.today();
        self.sequence
            .iter()
            .map(|day| (*day, self.resolve_with(day, today)))
            .collect()
    }

    fn resolve_with(&self, day: &DayDescriptor, today: Date) -> DayStatus<'_> {
        if let Some(rule) = self.skips.get(day.date) {
            DayStatus::Skip(rule)
        } else if day.date > today {
            DayStatus::Future
        } else {
            DayStatus::Flippable {
                flipped: self.flipped.contains(day.index),
            }
        }
    }

    /// Flip or unflip a day. Skip days, future days, and unknown indices are
    /// left alone.
    pub fn toggle(&mut self, index: usize) -> ToggleOutcome {
        match self.status_at(index) {
            Some(DayStatus::Flippable { .. }) => {}
            status => {
                log::debug!("Ignoring toggle of day {index} ({status:?}).");
                return ToggleOutcome::Ignored;
            }
        }
        self.flipped.toggle(index);
        self.persist();
        let completed = self.tracker.observe(self.snapshot().is_complete);
        if completed {
            log::debug!("Goal reached for {}.", self.key);
        }
        ToggleOutcome::Toggled {
            flipped: self.flipped.contains(index),
            completed,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(
            self.sequence.len(),
            self.skips.count_in(&self.sequence),
            self.flipped.len(),
        )
    }

    /// Adopt a new sequence and skip rules. Flipped days keep their date:
    /// they are re-indexed into the new sequence, or dropped if their date
    /// is no longer in range or is now a skip date.
    pub fn reconcile(
        &mut self,
        sequence: Vec<DayDescriptor>,
        rules: &[SkipRule],
    ) -> &FlippedSet {
        let skips = SkipIndex::new(rules);
        let old = &self.sequence;
        let flipped = remap(
            &self.flipped,
            |index| old.get(index).map(|day| day.date),
            &sequence,
            &skips,
        );
        log::debug!(
            "Reconciled {}: kept {} of {} flipped days.",
            self.key,
            flipped.len(),
            self.flipped.len()
        );
        self.sequence = sequence;
        self.skips = skips;
        self.flipped = flipped;
        self.persist();
        self.tracker.observe(self.snapshot().is_complete);
        &self.flipped
    }

    pub fn is_celebrating(&self) -> bool {
        self.tracker.is_celebrating()
    }

    pub fn dismiss_celebration(&mut self) {
        self.tracker.dismiss();
    }

    /// Write the current state along with the first date of the sequence,
    /// so the indices can be read back after the range moves. A failed write
    /// is logged and otherwise ignored: the in-memory state stays
    /// authoritative.
    fn persist(&self) {
        let payload = encode(&self.flipped);
        let result = self
            .store
            .write(&self.key, &payload)
            .and_then(|_| match self.sequence.first() {
                Some(first) => self
                    .store
                    .write(&frame_key(&self.key), &first.date.to_string()),
                None => Ok(()),
            });
        if let Err(e) = result {
            log::warn!("Failed to save flip state under {}: {e}", self.key);
        }
    }
}

struct Restored {
    flipped: FlippedSet,
    /// Whether the store needs rewriting.
    stale: bool,
}

/// Move flipped indices into `new_sequence` by date. `old_date` gives the
/// date an old index stood for.
fn remap(
    flipped: &FlippedSet,
    old_date: impl Fn(usize) -> Option<Date>,
    new_sequence: &[DayDescriptor],
    skips: &SkipIndex,
) -> FlippedSet {
    let positions: HashMap<Date, usize> = new_sequence
        .iter()
        .map(|day| (day.date, day.index))
        .collect();
    flipped
        .iter()
        .filter_map(old_date)
        .filter(|date| !skips.contains(*date))
        .filter_map(|date| positions.get(&date).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::clock::FixedClock;
    use crate::error::Fallible;
    use crate::error::fail;
    use crate::sequence::generate;
    use crate::storage::MemoryStore;

    type Engine = ProgressEngine<MemoryStore, FixedClock>;

    const KEY: &str = "flipped-test";

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn skip(s: &str) -> SkipRule {
        SkipRule {
            date: date(s),
            reason: "birthday".to_string(),
            emoji: "🎂".to_string(),
        }
    }

    fn engine(count: usize, rules: &[SkipRule], today: &str) -> Engine {
        let sequence = generate(date("2026-01-01"), count);
        Engine::open(
            KEY,
            sequence,
            rules,
            MemoryStore::new(),
            FixedClock(date(today)),
        )
    }

    fn engine_with_saved(count: usize, rules: &[SkipRule], saved: &str) -> Fallible<Engine> {
        let store = MemoryStore::new();
        store.write(KEY, saved)?;
        let sequence = generate(date("2026-01-01"), count);
        Ok(Engine::open(
            KEY,
            sequence,
            rules,
            store,
            FixedClock(date("2026-12-31")),
        ))
    }

    fn indices(set: &FlippedSet) -> Vec<usize> {
        set.iter().collect()
    }

    #[test]
    fn test_three_days_toggle_one() {
        let mut engine = engine(3, &[], "2026-01-03");
        let outcome = engine.toggle(1);
        assert_eq!(
            outcome,
            ToggleOutcome::Toggled {
                flipped: true,
                completed: false
            }
        );
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.completed_count, 1);
        assert_eq!(snapshot.effective_goal, 3);
        assert_eq!(snapshot.rounded_percent(), 33);
    }

    #[test]
    fn test_single_skip_day() {
        let rules = [skip("2026-01-01")];
        let engine = engine(1, &rules, "2026-01-01");
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.effective_goal, 0);
        assert!(!snapshot.is_complete);
        assert_eq!(snapshot.percent, 0.0);
        assert_eq!(engine.status_at(0), Some(DayStatus::Skip(&rules[0])));
    }

    #[test]
    fn test_empty_sequence() {
        let mut engine = engine(0, &[], "2026-01-01");
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.effective_goal, 0);
        assert!(!snapshot.is_complete);
        assert_eq!(snapshot.percent, 0.0);
        assert_eq!(engine.toggle(0), ToggleOutcome::Ignored);
    }

    #[test]
    fn test_saved_state_beyond_range_is_dropped() -> Fallible<()> {
        let engine = engine_with_saved(3, &[], "[0, 5]")?;
        assert_eq!(indices(engine.flipped()), vec![0]);
        // The filtered state is written back.
        assert_eq!(engine.store.read(KEY)?, Some("[0]".to_string()));
        Ok(())
    }

    #[test]
    fn test_saved_state_on_skip_day_is_dropped() -> Fallible<()> {
        let engine = engine_with_saved(3, &[skip("2026-01-02")], "[0,1,2]")?;
        assert_eq!(indices(engine.flipped()), vec![0, 2]);
        Ok(())
    }

    #[test]
    fn test_malformed_saved_state() -> Fallible<()> {
        let engine = engine_with_saved(3, &[], "{oops")?;
        assert!(engine.flipped().is_empty());
        Ok(())
    }

    #[test]
    fn test_status_resolution() {
        let rules = [skip("2026-01-03")];
        let mut engine = engine(5, &rules, "2026-01-03");
        engine.toggle(0);
        assert_eq!(
            engine.status_at(0),
            Some(DayStatus::Flippable { flipped: true })
        );
        assert_eq!(
            engine.status_at(1),
            Some(DayStatus::Flippable { flipped: false })
        );
        assert_eq!(engine.status_at(2), Some(DayStatus::Skip(&rules[0])));
        assert_eq!(engine.status_at(3), Some(DayStatus::Future));
        assert_eq!(engine.status_at(5), None);
    }

    #[test]
    fn test_skip_wins_over_future() {
        let rules = [skip("2026-01-05")];
        let engine = engine(5, &rules, "2026-01-01");
        assert_eq!(engine.status_at(4), Some(DayStatus::Skip(&rules[0])));
    }

    #[test]
    fn test_today_is_flippable() {
        let engine = engine(3, &[], "2026-01-02");
        assert_eq!(
            engine.status_at(1),
            Some(DayStatus::Flippable { flipped: false })
        );
        assert_eq!(engine.status_at(2), Some(DayStatus::Future));
    }

    #[test]
    fn test_toggle_ignored_on_skip_future_and_out_of_range() -> Fallible<()> {
        let rules = [skip("2026-01-02")];
        let mut engine = engine(4, &rules, "2026-01-03");
        engine.toggle(0);
        let before = engine.flipped().clone();
        assert_eq!(engine.toggle(1), ToggleOutcome::Ignored);
        assert_eq!(engine.toggle(3), ToggleOutcome::Ignored);
        assert_eq!(engine.toggle(99), ToggleOutcome::Ignored);
        assert_eq!(engine.flipped(), &before);
        assert_eq!(engine.store.read(KEY)?, Some("[0]".to_string()));
        Ok(())
    }

    #[test]
    fn test_toggle_twice_restores_state() -> Fallible<()> {
        let mut engine = engine(5, &[], "2026-01-05");
        engine.toggle(0);
        engine.toggle(3);
        let before = engine.flipped().clone();
        for index in 0..5 {
            engine.toggle(index);
            engine.toggle(index);
            assert_eq!(engine.flipped(), &before);
        }
        assert_eq!(engine.store.read(KEY)?, Some("[0,3]".to_string()));
        Ok(())
    }

    #[test]
    fn test_completion_fires_once() {
        let rules = [skip("2026-01-02")];
        let mut engine = engine(3, &rules, "2026-01-03");
        assert_eq!(
            engine.toggle(0),
            ToggleOutcome::Toggled {
                flipped: true,
                completed: false
            }
        );
        assert!(!engine.is_celebrating());
        assert_eq!(
            engine.toggle(2),
            ToggleOutcome::Toggled {
                flipped: true,
                completed: true
            }
        );
        assert!(engine.is_celebrating());
        // Repeated reads keep reporting completion without a new edge.
        assert!(engine.snapshot().is_complete);
        assert!(engine.snapshot().is_complete);
        engine.dismiss_celebration();
        assert!(!engine.is_celebrating());
        assert!(engine.snapshot().is_complete);
    }

    #[test]
    fn test_completion_fires_again_after_unflip() {
        let mut engine = engine(1, &[], "2026-01-01");
        assert!(matches!(
            engine.toggle(0),
            ToggleOutcome::Toggled {
                completed: true,
                ..
            }
        ));
        engine.dismiss_celebration();
        assert!(matches!(
            engine.toggle(0),
            ToggleOutcome::Toggled {
                flipped: false,
                completed: false
            }
        ));
        assert!(matches!(
            engine.toggle(0),
            ToggleOutcome::Toggled {
                completed: true,
                ..
            }
        ));
        assert!(engine.is_celebrating());
    }

    #[test]
    fn test_reopening_a_complete_calendar_does_not_celebrate() -> Fallible<()> {
        let engine = engine_with_saved(2, &[], "[0,1]")?;
        assert!(engine.snapshot().is_complete);
        assert!(!engine.is_celebrating());
        Ok(())
    }

    #[test]
    fn test_reconcile_shrinks_range() {
        let mut engine = engine(5, &[], "2026-01-05");
        for index in [0, 2, 4] {
            engine.toggle(index);
        }
        let flipped = engine.reconcile(generate(date("2026-01-01"), 3), &[]);
        assert_eq!(indices(flipped), vec![0, 2]);
        assert_eq!(engine.snapshot().total_days, 3);
    }

    #[test]
    fn test_reconcile_drops_new_skip_dates() {
        let mut engine = engine(3, &[], "2026-01-03");
        engine.toggle(0);
        engine.toggle(1);
        let flipped = engine.reconcile(generate(date("2026-01-01"), 3), &[skip("2026-01-02")]);
        assert_eq!(indices(flipped), vec![0]);
    }

    #[test]
    fn test_reconcile_keeps_dates_when_start_moves() {
        let mut engine = engine(5, &[], "2026-01-05");
        engine.toggle(0);
        engine.toggle(3);
        // The new range starts on January 3rd: January 1st falls out, and
        // January 4th moves from index 3 to index 1.
        let flipped = engine.reconcile(generate(date("2026-01-03"), 5), &[]);
        assert_eq!(indices(flipped), vec![1]);
        assert_eq!(
            engine.status_at(1),
            Some(DayStatus::Flippable { flipped: true })
        );
    }

    #[test]
    fn test_reconcile_never_keeps_invalid_entries() {
        let mut engine = engine(10, &[], "2026-01-10");
        for index in 0..10 {
            engine.toggle(index);
        }
        let rules = [skip("2026-01-04"), skip("2026-01-06")];
        let sequence = generate(date("2026-01-03"), 4);
        let flipped = engine.reconcile(sequence.clone(), &rules).clone();
        for index in flipped.iter() {
            let day = sequence.get(index).copied();
            assert!(day.is_some());
            let day = day.unwrap();
            assert!(rules.iter().all(|rule| rule.date != day.date));
        }
        assert_eq!(indices(&flipped), vec![0, 2]);
    }

    #[test]
    fn test_reconcile_can_complete_the_goal() {
        let mut engine = engine(3, &[], "2026-01-03");
        engine.toggle(0);
        engine.toggle(1);
        assert!(!engine.is_celebrating());
        engine.reconcile(generate(date("2026-01-01"), 3), &[skip("2026-01-03")]);
        assert!(engine.snapshot().is_complete);
        assert!(engine.is_celebrating());
    }

    #[test]
    fn test_today_is_sampled_on_every_call() {
        struct SteppingClock(Cell<u64>);

        impl Clock for SteppingClock {
            fn today(&self) -> Date {
                let days = self.0.get();
                self.0.set(days + 1);
                date("2026-01-01").plus_days(days).unwrap()
            }
        }

        let sequence = generate(date("2026-01-01"), 3);
        let engine = ProgressEngine::open(
            KEY,
            sequence,
            &[],
            MemoryStore::new(),
            SteppingClock(Cell::new(0)),
        );
        assert_eq!(engine.status_at(1), Some(DayStatus::Future));
        assert_eq!(
            engine.status_at(1),
            Some(DayStatus::Flippable { flipped: false })
        );
    }

    #[test]
    fn test_failed_writes_keep_memory_state() {
        struct ReadOnlyStore;

        impl FlipStore for ReadOnlyStore {
            fn read(&self, _key: &str) -> Fallible<Option<String>> {
                Ok(Some("[0]".to_string()))
            }

            fn write(&self, _key: &str, _payload: &str) -> Fallible<()> {
                fail("read-only")
            }
        }

        let sequence = generate(date("2026-01-01"), 3);
        let mut engine = ProgressEngine::open(
            KEY,
            sequence,
            &[],
            ReadOnlyStore,
            FixedClock(date("2026-01-03")),
        );
        engine.toggle(1);
        assert_eq!(indices(engine.flipped()), vec![0, 1]);
        assert_eq!(engine.snapshot().completed_count, 2);
    }

    #[test]
    fn test_open_follows_dates_when_start_moves() -> Fallible<()> {
        let store = MemoryStore::new();
        store.write(KEY, "[0,1,2,3,4]")?;
        store.write(&frame_key(KEY), "2026-01-01")?;
        let engine = Engine::open(
            KEY,
            generate(date("2026-01-03"), 5),
            &[],
            store,
            FixedClock(date("2026-01-05")),
        );
        // January 3rd to 5th survive and move to the front.
        assert_eq!(indices(engine.flipped()), vec![0, 1, 2]);
        assert_eq!(engine.store.read(KEY)?, Some("[0,1,2]".to_string()));
        assert_eq!(
            engine.store.read(&frame_key(KEY))?,
            Some("2026-01-03".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_open_drops_days_before_a_later_start() -> Fallible<()> {
        let store = MemoryStore::new();
        store.write(KEY, "[0,1,2,3,4]")?;
        store.write(&frame_key(KEY), "2026-01-01")?;
        let engine = Engine::open(
            KEY,
            generate(date("2026-01-10"), 10),
            &[],
            store,
            FixedClock(date("2026-01-05")),
        );
        assert!(engine.flipped().is_empty());
        assert_eq!(engine.status_at(0), Some(DayStatus::Future));
        assert_eq!(engine.snapshot().completed_count, 0);
        Ok(())
    }

    #[test]
    fn test_toggle_records_the_frame() -> Fallible<()> {
        let mut engine = engine(3, &[], "2026-01-03");
        engine.toggle(1);
        assert_eq!(engine.store.read(KEY)?, Some("[1]".to_string()));
        assert_eq!(
            engine.store.read(&frame_key(KEY))?,
            Some("2026-01-01".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_reload_picks_up_outside_writes() -> Fallible<()> {
        let mut engine = engine(3, &[], "2026-01-03");
        engine.toggle(0);
        engine.store.write(KEY, "[0,2]")?;
        engine.reload();
        assert_eq!(indices(engine.flipped()), vec![0, 2]);
        engine.toggle(1);
        assert_eq!(engine.store.read(KEY)?, Some("[0,1,2]".to_string()));
        assert!(engine.is_celebrating());
        Ok(())
    }

    #[test]
    fn test_reload_keeps_memory_state_when_nothing_is_saved() {
        let mut engine = engine(3, &[], "2026-01-03");
        engine.reload();
        assert!(engine.flipped().is_empty());
        assert_eq!(
            engine.toggle(2),
            ToggleOutcome::Toggled {
                flipped: true,
                completed: false
            }
        );
    }

    #[test]
    fn test_index_of() {
        let engine = engine(3, &[], "2026-01-01");
        assert_eq!(engine.index_of(date("2026-01-03")), Some(2));
        assert_eq!(engine.index_of(date("2026-01-04")), None);
    }
}
