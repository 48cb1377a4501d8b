//! Extraction of action requests from free-text model output.
//!
//! The model requests a tool by embedding
//!
//! ```text
//! <TOOL name="tool_name">
//! { "key": "value" }
//! </TOOL>
//! ```
//!
//! anywhere in its reply. Only the first envelope is honored. Output without
//! an envelope is a plain conversational message, not an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::ActionRequest;

static ENVELOPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<TOOL name="([^"]+)">(.*?)</TOOL>"#).expect("envelope regex is valid")
});

/// Return the first action request embedded in `text`, if any.
pub fn parse_action_request(text: &str) -> Option<ActionRequest> {
    let caps = ENVELOPE_RE.captures(text)?;
    let tool_name = caps.get(1)?.as_str().trim();
    if tool_name.is_empty() {
        return None;
    }
    let payload = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    Some(ActionRequest {
        tool_name: tool_name.to_string(),
        raw_arguments: strip_code_fences(payload),
    })
}

/// Remove markdown fence markers the model sometimes wraps around a payload.
///
/// The opening and closing fences are stripped independently.
fn strip_code_fences(payload: &str) -> String {
    let mut body = payload.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (e.g. "json") on the opening fence line.
        body = match rest.split_once('\n') {
            Some((info, after)) if !info.trim_start().starts_with('{') => after,
            _ => rest,
        };
    }
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Heuristic used when a reply carries no action: does the model claim the
/// goal was reached?
pub fn signals_completion(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("verified") && lower.contains("success")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_envelope_surrounded_by_prose() {
        let text = "I'll write the file now.\n\n<TOOL name=\"file_system\">\n{\"action\": \"list\", \"path\": \".\"}\n</TOOL>\n\nThen compile.";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.tool_name, "file_system");
        assert_eq!(request.raw_arguments, r#"{"action": "list", "path": "."}"#);
    }

    #[test]
    fn payload_may_span_lines() {
        let text = "<TOOL name=\"file_system\">\n{\n  \"action\": \"write\",\n  \"path\": \"A.lean\",\n  \"content\": \"theorem a : True := by\\n  trivial\"\n}\n</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert!(request.raw_arguments.starts_with('{'));
        assert!(request.raw_arguments.ends_with('}'));
        assert!(request.raw_arguments.contains("\"path\": \"A.lean\""));
    }

    #[test]
    fn only_first_envelope_is_honored() {
        let text = "<TOOL name=\"lean_tool\">{\"command\": \"lake_build\"}</TOOL>\n<TOOL name=\"project_search\">{\"query\": \"x\"}</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.tool_name, "lean_tool");
        assert_eq!(request.raw_arguments, r#"{"command": "lake_build"}"#);
    }

    #[test]
    fn strips_json_code_fence() {
        let text = "<TOOL name=\"project_search\">\n```json\n{\"query\": \"Nat.add_comm\"}\n```\n</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.raw_arguments, r#"{"query": "Nat.add_comm"}"#);
    }

    #[test]
    fn strips_bare_code_fence() {
        let text = "<TOOL name=\"project_search\">```\n{\"query\": \"foo\"}\n```</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.raw_arguments, r#"{"query": "foo"}"#);
    }

    #[test]
    fn fence_on_same_line_as_payload() {
        let text = "<TOOL name=\"project_search\">```{\"query\": \"foo\"}```</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.raw_arguments, r#"{"query": "foo"}"#);
    }

    #[test]
    fn strips_trailing_fence_without_opening_fence() {
        let text = "<TOOL name=\"project_search\">\n{\"query\": \"x\"}\n```\n</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.raw_arguments, r#"{"query": "x"}"#);
    }

    #[test]
    fn strips_opening_fence_without_closing_fence() {
        let text = "<TOOL name=\"project_search\">```json\n{\"query\": \"x\"}\n</TOOL>";
        let request = parse_action_request(text).expect("request");
        assert_eq!(request.raw_arguments, r#"{"query": "x"}"#);
    }

    #[test]
    fn text_without_envelope_is_none() {
        assert_eq!(parse_action_request("Here is my plan: prove it by induction."), None);
        assert_eq!(parse_action_request(""), None);
    }

    #[test]
    fn unterminated_envelope_is_none() {
        assert_eq!(
            parse_action_request("<TOOL name=\"file_system\">{\"action\": \"list\"}"),
            None
        );
    }

    #[test]
    fn empty_name_is_none() {
        assert_eq!(parse_action_request("<TOOL name=\"\">{}</TOOL>"), None);
    }

    #[test]
    fn completion_requires_both_words() {
        assert!(signals_completion("The proof was Verified. Success!"));
        assert!(!signals_completion("The proof is verified."));
        assert!(!signals_completion("Success on the first lemma."));
    }
}
