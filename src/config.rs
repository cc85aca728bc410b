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

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::sequence::generate;
use crate::types::date::Date;
use crate::types::day::DayDescriptor;
use crate::types::skip_rule::SkipRule;

/// The longest calendar we accept, in days.
const MAX_DAYS: usize = 36_600;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    default: Option<String>,
    #[serde(default, rename = "calendar")]
    calendars: Vec<RawCalendar>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCalendar {
    slug: String,
    name: String,
    start: String,
    days: Option<usize>,
    end: Option<String>,
    goal: Option<usize>,
    #[serde(default)]
    skip: Vec<RawSkip>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSkip {
    date: String,
    reason: String,
    emoji: String,
}

/// A validated calendar.
#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub slug: String,
    pub name: String,
    pub start: Date,
    pub days: usize,
    pub skip_rules: Vec<SkipRule>,
}

impl CalendarConfig {
    pub fn sequence(&self) -> Vec<DayDescriptor> {
        generate(self.start, self.days)
    }

    /// The key this calendar's flip state is stored under. Derived from the
    /// slug alone, so editing the dates keeps the same slot.
    pub fn storage_key(&self) -> String {
        let hash = blake3::hash(self.slug.as_bytes());
        format!("flipped-{}", &hash.to_hex()[..16])
    }
}

/// The set of named calendars.
#[derive(Clone, Debug)]
pub struct Config {
    calendars: Vec<CalendarConfig>,
    default: usize,
}

impl Config {
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return fail(format!("configuration file {} does not exist.", path.display()));
        }
        log::debug!("Loading configuration from {}", path.display());
        let content = read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        if raw.calendars.is_empty() {
            return fail("configuration defines no calendars.");
        }
        let mut calendars = Vec::with_capacity(raw.calendars.len());
        let mut slugs = HashSet::new();
        for entry in raw.calendars {
            let calendar = validate_calendar(entry)?;
            if !slugs.insert(calendar.slug.clone()) {
                return fail(format!("duplicate calendar slug: {}", calendar.slug));
            }
            calendars.push(calendar);
        }
        let default = match raw.default {
            Some(slug) => match calendars.iter().position(|c| c.slug == slug) {
                Some(index) => index,
                None => return fail(format!("default calendar {slug} is not defined.")),
            },
            None => 0,
        };
        Ok(Self { calendars, default })
    }

    pub fn calendars(&self) -> &[CalendarConfig] {
        &self.calendars
    }

    pub fn default_calendar(&self) -> &CalendarConfig {
        &self.calendars[self.default]
    }

    pub fn get(&self, slug: &str) -> Option<&CalendarConfig> {
        self.calendars.iter().find(|c| c.slug == slug)
    }

    /// Find the calendar for a request path like `/kine/`. The empty path
    /// and unknown slugs fall back to the default calendar.
    pub fn resolve(&self, path: &str) -> &CalendarConfig {
        let slug = path.trim_matches('/');
        if slug.is_empty() {
            return self.default_calendar();
        }
        match self.get(slug) {
            Some(calendar) => calendar,
            None => {
                log::debug!("Unknown calendar {slug:?}, using the default.");
                self.default_calendar()
            }
        }
    }
}

fn validate_calendar(raw: RawCalendar) -> Fallible<CalendarConfig> {
    let slug = raw.slug.trim().to_string();
    if slug.is_empty() {
        return fail("calendar slug must not be empty.");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return fail(format!(
            "calendar slug {slug:?} may only contain letters, digits, '-' and '_'."
        ));
    }
    let start = parse_date(&slug, "start", &raw.start)?;
    let mut skip_rules = Vec::with_capacity(raw.skip.len());
    for skip in raw.skip {
        skip_rules.push(SkipRule {
            date: parse_date(&slug, "skip date", &skip.date)?,
            reason: skip.reason,
            emoji: skip.emoji,
        });
    }
    let days = match (raw.days, raw.end, raw.goal) {
        (Some(days), None, None) => days,
        (None, Some(end), None) => {
            let end = parse_date(&slug, "end", &end)?;
            if end < start {
                return fail(format!("calendar {slug}: end {end} is before start {start}."));
            }
            let span = end.into_inner().signed_duration_since(start.into_inner());
            span.num_days() as usize + 1
        }
        (None, None, Some(goal)) if goal <= MAX_DAYS => total_for_goal(start, goal, &skip_rules),
        (None, None, Some(goal)) => goal,
        _ => {
            return fail(format!(
                "calendar {slug}: exactly one of `days`, `end` or `goal` must be set."
            ));
        }
    };
    if days > MAX_DAYS {
        return fail(format!(
            "calendar {slug}: {days} days is longer than the limit of {MAX_DAYS}."
        ));
    }
    Ok(CalendarConfig {
        slug,
        name: raw.name,
        start,
        days,
        skip_rules,
    })
}

fn parse_date(slug: &str, field: &str, value: &str) -> Fallible<Date> {
    match Date::parse(value) {
        Ok(date) => Ok(date),
        Err(_) => fail(format!(
            "calendar {slug}: invalid {field} {value:?}, expected YYYY-MM-DD."
        )),
    }
}

/// The number of days needed so that `goal` days remain after removing the
/// skip dates that fall inside the range.
fn total_for_goal(start: Date, goal: usize, rules: &[SkipRule]) -> usize {
    let dates: HashSet<Date> = rules.iter().map(|rule| rule.date).collect();
    let mut total = goal;
    loop {
        let skipped = dates
            .iter()
            .filter(|date| {
                let offset = date
                    .into_inner()
                    .signed_duration_since(start.into_inner())
                    .num_days();
                offset >= 0 && (offset as usize) < total
            })
            .count();
        if goal + skipped == total {
            return total;
        }
        total = goal + skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::skip_rule::SkipIndex;

    const EXAMPLE: &str = r#"
default = "kine"

[[calendar]]
slug = "elisabeth"
name = "Elisabeth"
start = "2026-01-01"
goal = 90

[[calendar]]
slug = "kine"
name = "Kine"
start = "2026-01-01"
goal = 100

[[calendar.skip]]
date = "2026-02-07"
reason = "Vilde's birthday"
emoji = "🎂"
"#;

    #[test]
    fn test_parse_example() -> Fallible<()> {
        let config = Config::parse(EXAMPLE)?;
        assert_eq!(config.calendars().len(), 2);
        let kine = config.default_calendar();
        assert_eq!(kine.slug, "kine");
        assert_eq!(kine.days, 101);
        assert_eq!(kine.skip_rules.len(), 1);
        let elisabeth = config.get("elisabeth").unwrap();
        assert_eq!(elisabeth.days, 90);
        Ok(())
    }

    #[test]
    fn test_goal_is_the_effective_goal() -> Fallible<()> {
        let config = Config::parse(EXAMPLE)?;
        let kine = config.default_calendar();
        let sequence = kine.sequence();
        let skips = SkipIndex::new(&kine.skip_rules);
        assert_eq!(sequence.len() - skips.count_in(&sequence), 100);
        Ok(())
    }

    #[test]
    fn test_goal_absorbs_skip_dates_pulled_into_range() -> Fallible<()> {
        let rules: Vec<SkipRule> = ["2026-01-03", "2026-01-04", "2026-01-20"]
            .iter()
            .map(|d| SkipRule {
                date: Date::parse(d).unwrap(),
                reason: "x".to_string(),
                emoji: "x".to_string(),
            })
            .collect();
        // Three goal days need January 1st to 5th; January 20th stays out.
        let total = total_for_goal(Date::parse("2026-01-01")?, 3, &rules);
        assert_eq!(total, 5);
        Ok(())
    }

    #[test]
    fn test_end_date() -> Fallible<()> {
        let config = Config::parse(
            r#"
[[calendar]]
slug = "q1"
name = "Q1"
start = "2026-01-01"
end = "2026-03-31"
"#,
        )?;
        assert_eq!(config.default_calendar().days, 90);
        Ok(())
    }

    #[test]
    fn test_zero_days() -> Fallible<()> {
        let config = Config::parse(
            r#"
[[calendar]]
slug = "none"
name = "None"
start = "2026-01-01"
days = 0
"#,
        )?;
        assert!(config.default_calendar().sequence().is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_configurations() {
        let cases = [
            // No calendars.
            "",
            // Negative day count.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = -1\n",
            // Unparsable date.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-13-01\"\ndays = 1\n",
            // No length.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\n",
            // Two lengths.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = 1\ngoal = 1\n",
            // End before start.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-02\"\nend = \"2026-01-01\"\n",
            // Bad slug.
            "[[calendar]]\nslug = \"a/b\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = 1\n",
            // Unknown default.
            "default = \"b\"\n[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = 1\n",
            // Too long.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = 1000000\n",
            // Unknown field.
            "[[calendar]]\nslug = \"a\"\nname = \"A\"\nstart = \"2026-01-01\"\ndays = 1\ncolour = \"red\"\n",
        ];
        for case in cases {
            assert!(Config::parse(case).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn test_rejects_duplicate_slugs() {
        let content = r#"
[[calendar]]
slug = "a"
name = "A"
start = "2026-01-01"
days = 1

[[calendar]]
slug = "a"
name = "Also A"
start = "2026-01-01"
days = 2
"#;
        let err = Config::parse(content).err().unwrap();
        assert_eq!(err.to_string(), "error: duplicate calendar slug: a");
    }

    #[test]
    fn test_resolve() -> Fallible<()> {
        let config = Config::parse(EXAMPLE)?;
        assert_eq!(config.resolve("/").slug, "kine");
        assert_eq!(config.resolve("").slug, "kine");
        assert_eq!(config.resolve("/elisabeth").slug, "elisabeth");
        assert_eq!(config.resolve("/elisabeth//").slug, "elisabeth");
        assert_eq!(config.resolve("/nobody").slug, "kine");
        Ok(())
    }

    #[test]
    fn test_storage_keys_are_distinct_and_stable() -> Fallible<()> {
        let config = Config::parse(EXAMPLE)?;
        let a = config.get("kine").unwrap().storage_key();
        let b = config.get("elisabeth").unwrap().storage_key();
        assert_ne!(a, b);
        assert!(a.starts_with("flipped-"));
        assert_eq!(a.len(), "flipped-".len() + 16);
        assert_eq!(a, Config::parse(EXAMPLE)?.default_calendar().storage_key());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("./derpherp.toml"));
        assert!(result.is_err());
    }
}
