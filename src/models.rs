use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired shape of the answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Answer,
    Summary,
    Email,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Answer => "answer",
            Mode::Summary => "summary",
            Mode::Email => "email",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single retrieved document, as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub query: String,
    /// Mode declared by the client; the query text may override it
    #[serde(default)]
    pub mode: Option<Mode>,
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub mode: Mode,
    pub answer: String,
    pub citations: Vec<String>,
}

/// Upload response
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serializes_to_snake_case() {
        let json = serde_json::to_value(Mode::Email).unwrap();
        assert_eq!(json, "email");
    }

    #[test]
    fn test_ask_request_mode_is_optional() {
        let req: AskRequest = serde_json::from_str(r#"{"query": "hello"}"#).unwrap();
        assert_eq!(req.query, "hello");
        assert!(req.mode.is_none());

        let req: AskRequest =
            serde_json::from_str(r#"{"query": "hello", "mode": "summary"}"#).unwrap();
        assert_eq!(req.mode, Some(Mode::Summary));
    }

    #[test]
    fn test_ask_request_rejects_unknown_mode() {
        let res = serde_json::from_str::<AskRequest>(r#"{"query": "x", "mode": "poem"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_ask_response_shape() {
        let resp = AskResponse {
            mode: Mode::Answer,
            answer: "42".into(),
            citations: vec!["notes.txt".into()],
        };
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["mode"], "answer");
        assert_eq!(json["citations"][0], "notes.txt");
    }
}
