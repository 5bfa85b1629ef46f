//! Mapping API payloads to table rows
//!
//! Both extractors are total: any payload shape (including [`FetchResult::Absent`]) yields
//! a well-formed record or record list. Missing or non-integer counts become 0.

use crate::types::{Difficulty, FetchResult, LanguageRecord, SolvedRecord};
use serde_json::Value;

/// Placeholder for language entries without a name
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Build the solved-stats row for `username`
///
/// Attempted counts come from `totalSubmissionNum`, accepted counts from `acSubmissionNum`.
/// In both arrays the first entry whose `difficulty` matches supplies the `count`.
pub fn extract_solved(username: &str, result: &FetchResult) -> SolvedRecord {
    let Some(payload) = result.payload() else {
        return SolvedRecord::zeroed(username);
    };

    let attempted = payload.get("totalSubmissionNum");
    let accepted = payload.get("acSubmissionNum");

    SolvedRecord {
        username: username.to_string(),
        easy: count_by_difficulty(attempted, Difficulty::Easy),
        medium: count_by_difficulty(attempted, Difficulty::Medium),
        hard: count_by_difficulty(attempted, Difficulty::Hard),
        ac_easy: count_by_difficulty(accepted, Difficulty::Easy),
        ac_medium: count_by_difficulty(accepted, Difficulty::Medium),
        ac_hard: count_by_difficulty(accepted, Difficulty::Hard),
    }
}

/// Build the language-stats rows for `username`
///
/// Reads `matchedUser.languageProblemCount`. Entries keep their API order.
pub fn extract_languages(username: &str, result: &FetchResult) -> Vec<LanguageRecord> {
    let entries = result
        .payload()
        .and_then(|p| p.get("matchedUser"))
        .and_then(|u| u.get("languageProblemCount"))
        .and_then(Value::as_array);

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| LanguageRecord {
            username: username.to_string(),
            language_name: entry
                .get("languageName")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_LANGUAGE)
                .to_string(),
            problems_solved: entry.get("problemsSolved").map_or(0, as_count),
        })
        .collect()
}

fn count_by_difficulty(collection: Option<&Value>, difficulty: Difficulty) -> i64 {
    collection
        .and_then(Value::as_array)
        .and_then(|items| {
            items.iter().find(|item| {
                item.get("difficulty").and_then(Value::as_str) == Some(difficulty.as_str())
            })
        })
        .and_then(|item| item.get("count"))
        .map_or(0, as_count)
}

// Integral floats (e.g. 5.0) are accepted; anything else counts as 0
fn as_count(value: &Value) -> i64 {
    if let Some(n) = value.as_i64() {
        return n;
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
        _ => 0,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solved_payload() -> FetchResult {
        FetchResult::Payload(json!({
            "solvedProblem": 321,
            "totalSubmissionNum": [
                {"difficulty": "All", "count": 400, "submissions": 900},
                {"difficulty": "Easy", "count": 150, "submissions": 300},
                {"difficulty": "Medium", "count": 200, "submissions": 500},
                {"difficulty": "Hard", "count": 50, "submissions": 100}
            ],
            "acSubmissionNum": [
                {"difficulty": "All", "count": 321, "submissions": 600},
                {"difficulty": "Easy", "count": 140, "submissions": 200},
                {"difficulty": "Medium", "count": 150, "submissions": 330},
                {"difficulty": "Hard", "count": 31, "submissions": 70}
            ]
        }))
    }

    #[test]
    fn solved_reads_both_collections() {
        let record = extract_solved("alice", &solved_payload());
        assert_eq!(
            record,
            SolvedRecord {
                username: "alice".to_string(),
                easy: 150,
                medium: 200,
                hard: 50,
                ac_easy: 140,
                ac_medium: 150,
                ac_hard: 31,
            }
        );
    }

    #[test]
    fn solved_missing_difficulties_are_zero() {
        let result = FetchResult::Payload(json!({
            "acSubmissionNum": [{"difficulty": "Easy", "count": 5}]
        }));
        let record = extract_solved("bob", &result);
        assert_eq!(record.ac_easy, 5);
        assert_eq!(record.ac_medium, 0);
        assert_eq!(record.ac_hard, 0);
        assert_eq!((record.easy, record.medium, record.hard), (0, 0, 0));
    }

    #[test]
    fn solved_absent_is_all_zero() {
        assert_eq!(
            extract_solved("carol", &FetchResult::Absent),
            SolvedRecord::zeroed("carol")
        );
    }

    #[test]
    fn solved_tolerates_unexpected_shapes() {
        let cases = [
            json!(null),
            json!([]),
            json!("error"),
            json!({"totalSubmissionNum": "nope", "acSubmissionNum": 3}),
            json!({"acSubmissionNum": [null, 1, {"difficulty": 7}]}),
            json!({"acSubmissionNum": [{"difficulty": "Easy", "count": "12"}]}),
        ];
        for payload in cases {
            let record = extract_solved("dave", &FetchResult::Payload(payload.clone()));
            assert_eq!(record, SolvedRecord::zeroed("dave"), "payload: {payload}");
        }
    }

    #[test]
    fn solved_first_matching_entry_wins() {
        let result = FetchResult::Payload(json!({
            "acSubmissionNum": [
                {"difficulty": "Hard", "count": 2},
                {"difficulty": "Hard", "count": 9}
            ]
        }));
        assert_eq!(extract_solved("erin", &result).ac_hard, 2);
    }

    #[test]
    fn solved_accepts_integral_floats() {
        let result = FetchResult::Payload(json!({
            "totalSubmissionNum": [
                {"difficulty": "Easy", "count": 4.0},
                {"difficulty": "Medium", "count": 2.5}
            ]
        }));
        let record = extract_solved("frank", &result);
        assert_eq!(record.easy, 4);
        assert_eq!(record.medium, 0);
    }

    #[test]
    fn languages_keep_api_order() {
        let result = FetchResult::Payload(json!({
            "matchedUser": {
                "languageProblemCount": [
                    {"languageName": "C++", "problemsSolved": 300},
                    {"languageName": "Python3", "problemsSolved": 42}
                ]
            }
        }));
        let records = extract_languages("alice", &result);
        assert_eq!(
            records,
            vec![
                LanguageRecord {
                    username: "alice".to_string(),
                    language_name: "C++".to_string(),
                    problems_solved: 300,
                },
                LanguageRecord {
                    username: "alice".to_string(),
                    language_name: "Python3".to_string(),
                    problems_solved: 42,
                },
            ]
        );
    }

    #[test]
    fn languages_fill_missing_fields() {
        let result = FetchResult::Payload(json!({
            "matchedUser": {
                "languageProblemCount": [
                    {"problemsSolved": 3},
                    {"languageName": "Rust"},
                    {"languageName": null, "problemsSolved": null}
                ]
            }
        }));
        let records = extract_languages("bob", &result);
        let pairs: Vec<(&str, i64)> = records
            .iter()
            .map(|r| (r.language_name.as_str(), r.problems_solved))
            .collect();
        assert_eq!(
            pairs,
            vec![(UNKNOWN_LANGUAGE, 3), ("Rust", 0), (UNKNOWN_LANGUAGE, 0)]
        );
    }

    #[test]
    fn languages_absent_or_missing_are_empty() {
        assert!(extract_languages("carol", &FetchResult::Absent).is_empty());
        assert!(extract_languages("carol", &FetchResult::Payload(json!({}))).is_empty());
        assert!(
            extract_languages("carol", &FetchResult::Payload(json!({"matchedUser": null})))
                .is_empty()
        );
        assert!(
            extract_languages(
                "carol",
                &FetchResult::Payload(json!({"matchedUser": {"languageProblemCount": {}}}))
            )
            .is_empty()
        );
    }
}
