//! Chart series derived from the aggregate and solved-stats tables
//!
//! Three series are produced:
//! - language share: percentage of users per language, with small languages folded into
//!   one [`OTHER_LANGUAGES`] row
//! - solved summary: per-difficulty accepted totals and mean per-user success rate, over
//!   one or more solved-stats files de-duplicated by username
//! - activity groups: users bucketed by quartiles and the 90th percentile of their
//!   accepted totals, with per-group means and success rate

use crate::db::PopularLanguage;
use crate::error::{Error, Result};
use crate::input::{USERNAME_COLUMN, open_csv};
use crate::types::{Difficulty, SolvedRecord};
use crate::writer::write_csv_table;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Label of the row that collects languages below the share threshold
pub const OTHER_LANGUAGES: &str = "Other";

/// Default share (in percent) below which a language is folded into [`OTHER_LANGUAGES`]
pub const DEFAULT_SHARE_THRESHOLD: f64 = 1.5;

/// One slice of the language share chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LanguageShare {
    /// Language name, or [`OTHER_LANGUAGES`]
    pub languagename: String,
    /// Distinct users
    pub user_count: i64,
    /// Share of all users counted, in percent
    pub percentage: f64,
}

impl LanguageShare {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 3] = ["languagename", "user_count", "percentage"];
}

/// Read a `popular_languages.csv` table
pub fn read_popular_languages(path: &Path) -> Result<Vec<PopularLanguage>> {
    let mut reader = open_csv(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<PopularLanguage>, _>>()?;
    Ok(rows)
}

/// Percentage of users per language, most popular first
///
/// Languages whose share is below `threshold_pct` are summed into a single
/// [`OTHER_LANGUAGES`] row appended last. When nothing falls below the threshold there is
/// no such row.
pub fn language_share(rows: &[PopularLanguage], threshold_pct: f64) -> Vec<LanguageShare> {
    let mut sorted: Vec<&PopularLanguage> = rows.iter().collect();
    sorted.sort_by(|a, b| b.user_count.cmp(&a.user_count));

    let total: i64 = sorted.iter().map(|r| r.user_count).sum();
    let percentage = |count: i64| {
        if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    };

    let mut shares = Vec::with_capacity(sorted.len());
    let mut other: Option<LanguageShare> = None;
    for row in sorted {
        let pct = percentage(row.user_count);
        if pct >= threshold_pct {
            shares.push(LanguageShare {
                languagename: row.languagename.clone(),
                user_count: row.user_count,
                percentage: pct,
            });
        } else {
            let other = other.get_or_insert_with(|| LanguageShare {
                languagename: OTHER_LANGUAGES.to_string(),
                user_count: 0,
                percentage: 0.0,
            });
            other.user_count += row.user_count;
            other.percentage += pct;
        }
    }
    shares.extend(other);
    shares
}

/// Write a language share series as CSV
pub fn write_language_share(path: &Path, shares: &[LanguageShare]) -> Result<()> {
    write_csv_table(path, &LanguageShare::HEADERS, shares)
}

/// Totals for one difficulty across all users
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DifficultySummary {
    /// Difficulty label
    pub difficulty: Difficulty,
    /// Problems attempted, summed over users
    pub attempted: i64,
    /// Problems accepted, summed over users
    pub accepted: i64,
    /// This difficulty's share of all accepted problems, in percent
    pub accepted_share_pct: f64,
    /// Mean of `accepted / attempted` over users with at least one attempt, in percent
    pub mean_success_rate_pct: f64,
    /// Users with at least one attempt at this difficulty
    pub users_attempted: usize,
}

impl DifficultySummary {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 6] = [
        "difficulty",
        "attempted",
        "accepted",
        "accepted_share_pct",
        "mean_success_rate_pct",
        "users_attempted",
    ];
}

/// Summary of one or more solved-stats tables
///
/// Totals saturate at `i64::MAX` rather than overflowing.
#[derive(Clone, Debug, PartialEq)]
pub struct SolvedSummary {
    /// Distinct users counted
    pub users: usize,
    /// Accepted problems over all difficulties
    pub total_accepted: i64,
    /// Mean per-user overall success rate, in percent; users with no attempts count as 0
    pub mean_success_rate_pct: f64,
    /// Median of per-user accepted totals
    pub median_solved: f64,
    /// Mean of per-user accepted totals
    pub mean_solved: f64,
    /// One entry per difficulty, in [`Difficulty::ALL`] order
    pub difficulties: Vec<DifficultySummary>,
    /// Non-empty activity groups, least active first
    pub groups: Vec<ActivityGroup>,
}

/// Quantiles of per-user accepted totals that bound the activity groups
pub const GROUP_QUANTILES: [f64; 4] = [0.25, 0.5, 0.75, 0.9];

/// One user's totals and activity group
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserActivity {
    /// Username
    pub username: String,
    /// Problems accepted over all difficulties
    pub total_solved: i64,
    /// Problems attempted over all difficulties
    pub total_attempted: i64,
    /// `total_solved / total_attempted`, in percent; 0 with no attempts
    pub success_rate_pct: f64,
    /// Label of the activity group the user falls in
    pub group: String,
}

impl UserActivity {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 5] = [
        "username",
        "total_solved",
        "total_attempted",
        "success_rate_pct",
        "group",
    ];
}

/// Users grouped by how many problems they solved
///
/// Group bounds are the [`GROUP_QUANTILES`] of per-user accepted totals; a user belongs to
/// the first group whose upper bound is at least their total.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityGroup {
    /// Label such as `Solved (12-40)`
    pub group: String,
    /// Users in the group
    pub users: usize,
    /// Share of all users, in percent
    pub share_pct: f64,
    /// Mean accepted total
    pub mean_solved: f64,
    /// Mean accepted easy problems
    pub mean_ac_easy: f64,
    /// Mean accepted medium problems
    pub mean_ac_medium: f64,
    /// Mean accepted hard problems
    pub mean_ac_hard: f64,
    /// Mean attempted easy problems
    pub mean_easy: f64,
    /// Mean attempted medium problems
    pub mean_medium: f64,
    /// Mean attempted hard problems
    pub mean_hard: f64,
    /// Group accepted total over group attempted total, in percent
    pub success_rate_pct: f64,
}

impl ActivityGroup {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 11] = [
        "group",
        "users",
        "share_pct",
        "mean_solved",
        "mean_ac_easy",
        "mean_ac_medium",
        "mean_ac_hard",
        "mean_easy",
        "mean_medium",
        "mean_hard",
        "success_rate_pct",
    ];
}

/// Read solved-stats files and summarize them
///
/// See [`read_solved_records`] for how the files are combined.
pub fn solved_summary(paths: &[PathBuf]) -> Result<SolvedSummary> {
    let records = read_solved_records(paths)?;
    Ok(summarize_solved(&records))
}

/// Read and combine solved-stats files
///
/// Files are read in order and rows de-duplicated by username, keeping the first
/// occurrence. Rows repeating the header and rows with a blank username are skipped.
/// Missing or non-numeric counts read as 0.
pub fn read_solved_records(paths: &[PathBuf]) -> Result<Vec<SolvedRecord>> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for path in paths {
        let mut reader = open_csv(path)?;
        let headers = reader.headers()?.clone();
        let index = |name: &str| headers.iter().position(|h| h.trim() == name);

        let username_col = index(USERNAME_COLUMN).ok_or_else(|| Error::MissingColumn {
            path: path.clone(),
            column: USERNAME_COLUMN.to_string(),
        })?;
        let count_cols: Vec<Option<usize>> =
            SolvedRecord::HEADERS[1..].iter().map(|h| index(*h)).collect();

        let mut rows = 0usize;
        for record in reader.records() {
            let record = record?;
            let username = record.get(username_col).unwrap_or_default().trim();
            if username.is_empty() || username == USERNAME_COLUMN {
                continue;
            }
            rows += 1;
            if !seen.insert(username.to_string()) {
                continue;
            }

            let count = |i: usize| {
                count_cols[i]
                    .and_then(|col| record.get(col))
                    .map_or(0, parse_count)
            };
            records.push(SolvedRecord {
                username: username.to_string(),
                easy: count(0),
                medium: count(1),
                hard: count(2),
                ac_easy: count(3),
                ac_medium: count(4),
                ac_hard: count(5),
            });
        }

        tracing::debug!(path = %path.display(), rows, "read solved stats");
    }

    Ok(records)
}

/// Summarize combined solved-stats rows
pub fn summarize_solved(records: &[SolvedRecord]) -> SolvedSummary {
    let solved: Vec<i64> = records.iter().map(SolvedRecord::total_accepted).collect();
    let total_accepted = saturating_sum(solved.iter().copied());

    let difficulties = Difficulty::ALL
        .iter()
        .map(|&difficulty| {
            let pairs: Vec<(i64, i64)> = records.iter().map(|r| counts(r, difficulty)).collect();
            let attempted = saturating_sum(pairs.iter().map(|&(a, _)| a));
            let accepted = saturating_sum(pairs.iter().map(|&(_, ac)| ac));
            let rates: Vec<f64> = pairs
                .iter()
                .filter(|(a, _)| *a > 0)
                .map(|&(a, ac)| ac as f64 / a as f64 * 100.0)
                .collect();

            DifficultySummary {
                difficulty,
                attempted,
                accepted,
                accepted_share_pct: ratio_pct(accepted, total_accepted),
                mean_success_rate_pct: mean(&rates),
                users_attempted: rates.len(),
            }
        })
        .collect();

    let overall: Vec<f64> = records
        .iter()
        .map(|r| ratio_pct(r.total_accepted(), r.total_attempted()))
        .collect();
    let solved_f64: Vec<f64> = solved.iter().map(|&s| s as f64).collect();
    let mut sorted = solved_f64.clone();
    sorted.sort_by(f64::total_cmp);

    SolvedSummary {
        users: records.len(),
        total_accepted,
        mean_success_rate_pct: mean(&overall),
        median_solved: quantile(&sorted, 0.5),
        mean_solved: mean(&solved_f64),
        difficulties,
        groups: activity_groups(records),
    }
}

/// Per-user totals with the activity group each user falls in, in input order
pub fn user_activity(records: &[SolvedRecord]) -> Vec<UserActivity> {
    let grouping = Grouping::new(records);
    records
        .iter()
        .zip(&grouping.members)
        .map(|(r, &index)| UserActivity {
            username: r.username.clone(),
            total_solved: r.total_accepted(),
            total_attempted: r.total_attempted(),
            success_rate_pct: ratio_pct(r.total_accepted(), r.total_attempted()),
            group: grouping.labels[index].clone(),
        })
        .collect()
}

/// Non-empty activity groups, least active first
pub fn activity_groups(records: &[SolvedRecord]) -> Vec<ActivityGroup> {
    let grouping = Grouping::new(records);
    let mut buckets: Vec<Vec<&SolvedRecord>> = vec![Vec::new(); grouping.labels.len()];
    for (record, &index) in records.iter().zip(&grouping.members) {
        buckets[index].push(record);
    }

    buckets
        .into_iter()
        .zip(grouping.labels)
        .filter(|(members, _)| !members.is_empty())
        .map(|(members, group)| {
            let field_mean = |f: fn(&SolvedRecord) -> i64| {
                members.iter().map(|r| f(r) as f64).sum::<f64>() / members.len() as f64
            };
            let solved = saturating_sum(members.iter().map(|r| r.total_accepted()));
            let attempted = saturating_sum(members.iter().map(|r| r.total_attempted()));

            ActivityGroup {
                group,
                users: members.len(),
                share_pct: members.len() as f64 / records.len() as f64 * 100.0,
                mean_solved: field_mean(SolvedRecord::total_accepted),
                mean_ac_easy: field_mean(|r| r.ac_easy),
                mean_ac_medium: field_mean(|r| r.ac_medium),
                mean_ac_hard: field_mean(|r| r.ac_hard),
                mean_easy: field_mean(|r| r.easy),
                mean_medium: field_mean(|r| r.medium),
                mean_hard: field_mean(|r| r.hard),
                success_rate_pct: ratio_pct(solved, attempted),
            }
        })
        .collect()
}

/// Write the per-difficulty rows of a solved summary as CSV
pub fn write_solved_summary(path: &Path, summary: &SolvedSummary) -> Result<()> {
    write_csv_table(path, &DifficultySummary::HEADERS, &summary.difficulties)
}

/// Write activity groups as CSV
pub fn write_activity_groups(path: &Path, groups: &[ActivityGroup]) -> Result<()> {
    write_csv_table(path, &ActivityGroup::HEADERS, groups)
}

/// Write per-user activity rows as CSV
pub fn write_user_activity(path: &Path, users: &[UserActivity]) -> Result<()> {
    write_csv_table(path, &UserActivity::HEADERS, users)
}

/// Group label per bound and the group index of every record
struct Grouping {
    labels: Vec<String>,
    members: Vec<usize>,
}

impl Grouping {
    fn new(records: &[SolvedRecord]) -> Self {
        let solved: Vec<f64> = records.iter().map(|r| r.total_accepted() as f64).collect();
        let mut sorted = solved.clone();
        sorted.sort_by(f64::total_cmp);
        let cuts = GROUP_QUANTILES.map(|q| quantile(&sorted, q));

        let [q1, median, q3, p90] = cuts;
        let labels = vec![
            format!("Solved (0-{q1:.0})"),
            format!("Solved ({q1:.0}-{median:.0})"),
            format!("Solved ({median:.0}-{q3:.0})"),
            format!("Solved ({q3:.0}-{p90:.0})"),
            format!("Solved ({p90:.0}+)"),
        ];
        let members = solved
            .iter()
            .map(|&s| cuts.iter().position(|&cut| s <= cut).unwrap_or(cuts.len()))
            .collect();

        Self { labels, members }
    }
}

/// Quantile of sorted values, interpolating linearly between neighbours; 0 when empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

fn counts(record: &SolvedRecord, difficulty: Difficulty) -> (i64, i64) {
    match difficulty {
        Difficulty::Easy => (record.easy, record.ac_easy),
        Difficulty::Medium => (record.medium, record.ac_medium),
        Difficulty::Hard => (record.hard, record.ac_hard),
    }
}

/// Integers as-is, finite floats truncated, anything else 0
fn parse_count(raw: &str) -> i64 {
    let raw = raw.trim();
    raw.parse::<i64>().unwrap_or_else(|_| match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v as i64,
        _ => 0,
    })
}

fn ratio_pct(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
