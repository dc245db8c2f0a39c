use serde::Serialize;
use std::fmt;

use crate::models::Mode;

/// Logical category of a question. Drives retrieval depth and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionProfile {
    #[serde(rename = "chitchat")]
    ChitChat,
    /// Has its own row in [`configure`] but no classification rule produces it.
    ShortSummary,
    NormalExplanation,
    DeepExplanation,
    Brainstorm,
}

impl QuestionProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionProfile::ChitChat => "chitchat",
            QuestionProfile::ShortSummary => "short_summary",
            QuestionProfile::NormalExplanation => "normal_explanation",
            QuestionProfile::DeepExplanation => "deep_explanation",
            QuestionProfile::Brainstorm => "brainstorm",
        }
    }
}

impl fmt::Display for QuestionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval and sampling parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub use_retrieval: bool,
    pub retrieval_depth: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

const SMALLTALK_PHRASES: &[&str] = &[
    "מה קורה",
    "מה המצב",
    "מה נשמע",
    "מה העניינים",
    "היי",
    "שלום",
    "הי",
    "hi",
    "hello",
    "hey",
    "sup",
    "how are you",
];

/// Small talk only counts when the whole query is at most this many chars.
const SMALLTALK_MAX_CHARS: usize = 40;

const SUMMARY_KEYWORDS: &[&str] = &["סכם", "summary", "בקצרה"];

const EXPLANATION_KEYWORDS: &[&str] = &[
    "למה",
    "תסביר",
    "explain",
    "why",
    "step by step",
    "שלב אחרי שלב",
];

const BRAINSTORM_KEYWORDS: &[&str] = &["רעיונות", "brainstorm", "suggest", "דוגמאות נוספות", "ideas"];

/// One routing rule. `query` is already lower-cased.
struct Rule {
    name: &'static str,
    matches: fn(query: &str, mode: Mode) -> bool,
    profile: QuestionProfile,
}

fn contains_any(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| query.contains(n))
}

/// Evaluated top to bottom; the first match wins.
const RULES: &[Rule] = &[
    Rule {
        name: "smalltalk",
        matches: |q, _| {
            contains_any(q, SMALLTALK_PHRASES) && q.chars().count() <= SMALLTALK_MAX_CHARS
        },
        profile: QuestionProfile::ChitChat,
    },
    // Summary requests route to the normal profile, not ShortSummary.
    Rule {
        name: "summary",
        matches: |q, mode| mode == Mode::Summary || contains_any(q, SUMMARY_KEYWORDS),
        profile: QuestionProfile::NormalExplanation,
    },
    Rule {
        name: "explanation",
        matches: |q, _| contains_any(q, EXPLANATION_KEYWORDS),
        profile: QuestionProfile::DeepExplanation,
    },
    Rule {
        name: "brainstorm",
        matches: |q, _| contains_any(q, BRAINSTORM_KEYWORDS),
        profile: QuestionProfile::Brainstorm,
    },
    Rule {
        name: "email",
        matches: |_, mode| mode == Mode::Email,
        profile: QuestionProfile::NormalExplanation,
    },
];

/// Map a query and its mode to a question profile.
pub fn classify(query: &str, mode: Mode) -> QuestionProfile {
    let q = query.to_lowercase();

    for rule in RULES {
        if (rule.matches)(&q, mode) {
            tracing::debug!(rule = rule.name, profile = %rule.profile, "routing rule matched");
            return rule.profile;
        }
    }

    QuestionProfile::NormalExplanation
}

/// Fixed policy table from profile to generation parameters.
pub fn configure(profile: QuestionProfile) -> GenerationConfig {
    let (use_retrieval, retrieval_depth, temperature, max_output_tokens) = match profile {
        QuestionProfile::ChitChat => (false, 0, 0.7, 120),
        QuestionProfile::ShortSummary => (true, 4, 0.2, 400),
        QuestionProfile::NormalExplanation => (true, 6, 0.2, 800),
        QuestionProfile::DeepExplanation => (true, 8, 0.2, 1200),
        QuestionProfile::Brainstorm => (true, 6, 0.4, 800),
    };

    GenerationConfig {
        use_retrieval,
        retrieval_depth,
        temperature,
        max_output_tokens,
    }
}
