//! Recovery and normalization of the model's JSON answer
//!
//! Models are asked for a bare JSON object but regularly wrap it in markdown
//! fences, add prose around it, or return it as a JSON string literal. The
//! parser tries, in order: fence stripping, direct decode (unwrapping one
//! level of string encoding), then the slice between the first `{` and the
//! last `}`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::error::ApiError;
use super::types::{PostContext, SearchHit, SummaryAnswer, MAX_RESULTS};

/// Shown when the model returned JSON without a usable `answer_html`
pub const NO_ANSWER_HTML: &str = "<p>No valid answer was produced. Please try rephrasing your search.</p>";

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?```$").expect("fence pattern is valid")
    })
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match fence_regex().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse raw model text into a JSON object
pub fn parse_model_output(raw: &str) -> Result<Map<String, Value>, ApiError> {
    let text = strip_code_fences(raw);

    if let Some(object) = decode_object(text) {
        return Ok(object);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Some(object) = decode_object(&text[start..=end]) {
                tracing::debug!("Recovered JSON object from surrounding text");
                return Ok(object);
            }
        }
    }

    tracing::warn!(
        chars = raw.chars().count(),
        "Model output is not a JSON object"
    );
    Err(ApiError::MalformedOutput)
}

fn decode_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(object) => Some(object),
        // Double-encoded: the object arrived as a JSON string literal
        Value::String(inner) => match serde_json::from_str::<Value>(strip_code_fences(&inner)).ok()? {
            Value::Object(object) => Some(object),
            _ => None,
        },
        _ => None,
    }
}

/// Turn a decoded object into a `SummaryAnswer`
///
/// Missing `answer_html` becomes [`NO_ANSWER_HTML`], missing `results`
/// becomes empty. Entries that are not objects are dropped, the list is
/// capped at [`MAX_RESULTS`], and empty `title`/`url`/`type` fields are
/// filled from the matching post.
pub fn normalize(object: Map<String, Value>, posts: &[PostContext]) -> SummaryAnswer {
    let answer_html = match object.get("answer_html").and_then(Value::as_str) {
        Some(html) if !html.trim().is_empty() => html.to_string(),
        _ => NO_ANSWER_HTML.to_string(),
    };

    let results = match object.get("results") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| search_hit(item, posts))
            .take(MAX_RESULTS)
            .collect(),
        _ => Vec::new(),
    };

    SummaryAnswer { answer_html, results }
}

fn search_hit(item: &Map<String, Value>, posts: &[PostContext]) -> SearchHit {
    let id = item.get("id").and_then(parse_id).unwrap_or(0);
    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut hit = SearchHit {
        id,
        title: text("title"),
        url: text("url"),
        excerpt: text("excerpt"),
        post_type: text("type"),
    };

    if let Some(post) = posts.iter().find(|p| p.id == id) {
        if hit.title.is_empty() {
            hit.title = post.title.clone();
        }
        if hit.url.is_empty() {
            hit.url = post.url.clone();
        }
        if hit.post_type.is_empty() {
            hit.post_type = post.post_type.as_str().to_string();
        }
    }

    if hit.post_type.is_empty() {
        hit.post_type = "post".to_string();
    }

    hit
}

fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::PostType;
    use serde_json::json;

    const PAYLOAD: &str = r#"{"answer_html":"<p>Range drops about 20%.</p>","results":[{"id":1,"title":"Winter Range Test","url":"https://x/1","excerpt":"We drove in -10C.","type":"post"}]}"#;

    fn posts() -> Vec<PostContext> {
        vec![PostContext {
            id: 1,
            title: "Winter Range Test".to_string(),
            url: "https://x/1".to_string(),
            post_type: PostType::Post,
            content: "...".to_string(),
            date: None,
        }]
    }

    #[test]
    fn test_strip_code_fences() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert_eq!(strip_code_fences(&fenced), PAYLOAD);
        assert_eq!(strip_code_fences(strip_code_fences(&fenced)), PAYLOAD);
        assert_eq!(strip_code_fences(&format!("```{PAYLOAD}```")), PAYLOAD);
        assert_eq!(strip_code_fences(PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_fenced_and_bare_parse_equal() {
        let bare = parse_model_output(PAYLOAD).unwrap();
        let fenced = parse_model_output(&format!("```json\n{PAYLOAD}\n```")).unwrap();
        assert_eq!(bare, fenced);
    }

    #[test]
    fn test_double_encoded_output() {
        let encoded = serde_json::to_string(PAYLOAD).unwrap();
        let object = parse_model_output(&encoded).unwrap();
        assert_eq!(object["answer_html"], "<p>Range drops about 20%.</p>");
    }

    #[test]
    fn test_prose_around_object() {
        let text = format!("Sure! Here is the answer:\n{PAYLOAD}\nHope that helps.");
        let object = parse_model_output(&text).unwrap();
        assert_eq!(object["results"][0]["id"], 1);
    }

    #[test]
    fn test_unparseable_output() {
        assert_eq!(parse_model_output("no json here"), Err(ApiError::MalformedOutput));
        assert_eq!(parse_model_output("{\"answer_html\": \"<p>trunc"), Err(ApiError::MalformedOutput));
        assert_eq!(parse_model_output("} backwards {"), Err(ApiError::MalformedOutput));
        assert_eq!(parse_model_output("[1, 2]"), Err(ApiError::MalformedOutput));
    }

    #[test]
    fn test_normalize_round_trip() {
        let object = parse_model_output(PAYLOAD).unwrap();
        let answer = normalize(object, &posts());
        let expected: SummaryAnswer = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(answer, expected);
    }

    #[test]
    fn test_normalize_defaults() {
        let answer = normalize(Map::new(), &[]);
        assert_eq!(answer.answer_html, NO_ANSWER_HTML);
        assert!(answer.results.is_empty());

        let object = json!({"answer_html": "   ", "results": "nope"});
        let answer = normalize(object.as_object().unwrap().clone(), &[]);
        assert_eq!(answer.answer_html, NO_ANSWER_HTML);
        assert!(answer.results.is_empty());
    }

    #[test]
    fn test_normalize_keeps_answer_whitespace() {
        let object = json!({"answer_html": "\n<p>Range drops.</p>\n", "results": []});
        let answer = normalize(object.as_object().unwrap().clone(), &[]);
        assert_eq!(answer.answer_html, "\n<p>Range drops.</p>\n");
    }

    #[test]
    fn test_normalize_caps_and_backfills() {
        let results: Vec<Value> = (1..=8)
            .map(|i| json!({"id": i.to_string(), "excerpt": "e"}))
            .chain(std::iter::once(json!("junk")))
            .collect();
        let object = json!({"answer_html": "<p>x</p>", "results": results});

        let answer = normalize(object.as_object().unwrap().clone(), &posts());
        assert_eq!(answer.results.len(), MAX_RESULTS);
        assert_eq!(answer.results[0].title, "Winter Range Test");
        assert_eq!(answer.results[0].url, "https://x/1");
        assert_eq!(answer.results[0].post_type, "post");
        assert_eq!(answer.results[1].id, 2);
        assert!(answer.results[1].title.is_empty());
        assert_eq!(answer.results[1].post_type, "post");
    }
}
