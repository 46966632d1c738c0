//! Pure parts of the commit-window filter: date windows, hunk headers and
//! matching changed lines against function spans.

use crate::core::FunctionRecord;
use anyhow::{Context as _, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};

/// Inclusive range of commit dates, evaluated in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl CommitWindow {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Result<Self> {
        if since > until {
            anyhow::bail!("Commit window starts after it ends: {} > {}", since, until);
        }
        Ok(Self { since, until })
    }

    /// Parse `YYYY-MM-DD` dates; month and day need not be zero-padded
    pub fn parse(since: &str, until: &str) -> Result<Self> {
        Self::new(parse_date(since)?, parse_date(until)?)
    }

    /// First second of `since`
    pub fn start_timestamp(&self) -> i64 {
        Utc.from_utc_datetime(&self.since.and_time(NaiveTime::MIN))
            .timestamp()
    }

    /// Last second of `until`
    pub fn end_timestamp(&self) -> i64 {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.until.and_time(end_of_day))
            .timestamp()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        (self.start_timestamp()..=self.end_timestamp()).contains(&timestamp)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Inclusive 1-based line range in the post-change file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start <= end && start <= self.end
    }
}

/// Parsed `@@ -a,b +c,d @@` hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
}

impl HunkHeader {
    /// Parse a unified-diff hunk header. A missing count means one line.
    /// Returns `None` for anything that is not a well-formed header.
    pub fn parse(header: &str) -> Option<Self> {
        let rest = header.trim_end().strip_prefix("@@ ")?;
        let (ranges, _) = rest.split_once(" @@")?;
        let mut parts = ranges.split_whitespace();
        let (old_start, old_lines) = parse_range(parts.next()?.strip_prefix('-')?)?;
        let (new_start, new_lines) = parse_range(parts.next()?.strip_prefix('+')?)?;
        if parts.next().is_some() {
            return None;
        }
        // Ranges past the end of usize cannot come from a real file
        new_start.checked_add(new_lines)?;
        old_start.checked_add(old_lines)?;
        Some(Self {
            old_start,
            old_lines,
            new_start,
            new_lines,
        })
    }

    /// Lines of the new file covered by the hunk; pure deletions cover none
    pub fn new_range(&self) -> Option<LineRange> {
        if self.new_lines == 0 {
            return None;
        }
        let end = self.new_start.checked_add(self.new_lines - 1)?;
        Some(LineRange::new(self.new_start, end))
    }
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Uris of the records whose declared span overlaps a changed range of their
/// file. Records without a span never match. Input order is kept and each uri
/// appears once.
pub fn modified_functions(
    changed: &BTreeMap<String, Vec<LineRange>>,
    records: &[FunctionRecord],
) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| {
            let Some((start, end)) = record.line_span() else {
                return false;
            };
            changed
                .get(&record.file_path)
                .is_some_and(|ranges| ranges.iter().any(|range| range.overlaps(start, end)))
        })
        .filter(|record| seen.insert(record.uri.clone()))
        .map(|record| record.uri.clone())
        .collect()
}
