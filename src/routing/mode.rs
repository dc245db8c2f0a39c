use crate::models::Mode;

/// Substrings that mark a request for an email draft.
const EMAIL_KEYWORDS: &[&str] = &["מייל", "email", "אמייל", "תנסח מייל", "תכתוב מייל"];

/// Pick the output mode for a query.
///
/// Email keywords in the text win over whatever the client declared; otherwise
/// the declared mode is kept, falling back to [`Mode::Answer`].
pub fn infer_mode(query: &str, declared: Option<Mode>) -> Mode {
    let q = query.to_lowercase();

    if EMAIL_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Mode::Email;
    }

    declared.unwrap_or_default()
}
