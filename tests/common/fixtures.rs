//! API payload fixtures and mock server setup

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `/{user}/solved` body with the given attempted and accepted counts (easy, medium, hard)
pub fn solved_payload(attempted: [i64; 3], accepted: [i64; 3]) -> Value {
    let collection = |counts: [i64; 3]| {
        json!([
            { "difficulty": "All", "count": counts.iter().sum::<i64>(), "submissions": 0 },
            { "difficulty": "Easy", "count": counts[0], "submissions": 0 },
            { "difficulty": "Medium", "count": counts[1], "submissions": 0 },
            { "difficulty": "Hard", "count": counts[2], "submissions": 0 },
        ])
    };
    json!({
        "solvedProblem": accepted.iter().sum::<i64>(),
        "totalSubmissionNum": collection(attempted),
        "acSubmissionNum": collection(accepted),
    })
}

/// `/languageStats` body listing `(languageName, problemsSolved)` pairs
pub fn language_payload(languages: &[(&str, i64)]) -> Value {
    let entries: Vec<Value> = languages
        .iter()
        .map(|(name, solved)| json!({ "languageName": name, "problemsSolved": solved }))
        .collect();
    json!({ "matchedUser": { "languageProblemCount": entries } })
}

/// Serve both endpoints for `user`
pub async fn mount_user(server: &MockServer, user: &str, solved: Value, languages: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{user}/solved")))
        .respond_with(ResponseTemplate::new(200).set_body_json(solved))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/languageStats"))
        .and(query_param("username", user))
        .respond_with(ResponseTemplate::new(200).set_body_json(languages))
        .mount(server)
        .await;
}

/// Make both endpoints for `user` fail with 503, expecting exactly `attempts` calls each
pub async fn mount_unavailable_user(server: &MockServer, user: &str, attempts: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{user}/solved")))
        .respond_with(ResponseTemplate::new(503))
        .expect(attempts)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/languageStats"))
        .and(query_param("username", user))
        .respond_with(ResponseTemplate::new(503))
        .expect(attempts)
        .mount(server)
        .await;
}

/// Three users with distinct stats
pub async fn mount_standard_users(server: &MockServer) {
    mount_user(
        server,
        "alice",
        solved_payload([120, 80, 10], [100, 60, 4]),
        language_payload(&[("C++", 150), ("Python3", 20)]),
    )
    .await;
    mount_user(
        server,
        "bob",
        solved_payload([30, 5, 0], [28, 2, 0]),
        language_payload(&[("Python3", 30)]),
    )
    .await;
    mount_user(
        server,
        "carol",
        solved_payload([50, 50, 20], [45, 30, 5]),
        language_payload(&[("Rust", 60), ("C++", 20)]),
    )
    .await;
}
