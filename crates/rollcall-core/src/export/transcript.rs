//! Transcript assembly from session turns.

use rollcall_types::chat::Turn;

/// Title paragraph of an exported document.
pub const DEFAULT_TITLE: &str = "Chat Transcript";

/// Section heading above the answer block.
pub const DEFAULT_SECTION_HEADING: &str = "Answers";

/// Download name stem for exported documents; the exporter's file
/// extension completes it.
pub const DEFAULT_EXPORT_FILE_STEM: &str = "transcript";

/// An assembled transcript ready for export.
///
/// The body is the assistant-authored content in turn order, separated
/// by exactly one blank line each; questions are not part of the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub title: String,
    pub heading: String,
    pub body: String,
}

impl Transcript {
    /// Assemble a transcript from the session's turns.
    pub fn from_turns(turns: &[Turn]) -> Self {
        let body = turns
            .iter()
            .map(|turn| turn.answer.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            title: DEFAULT_TITLE.to_string(),
            heading: DEFAULT_SECTION_HEADING.to_string(),
            body,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(answer: &str) -> Turn {
        Turn {
            question: "q".to_string(),
            answer: answer.to_string(),
            asked_at: "2025-08-10 14:02:33".to_string(),
        }
    }

    #[test]
    fn test_body_joins_answers_with_one_blank_line() {
        let transcript = Transcript::from_turns(&[turn("first"), turn("second"), turn("third")]);
        assert_eq!(transcript.body, "first\n\nsecond\n\nthird");
    }

    #[test]
    fn test_body_preserves_turn_order() {
        let turns: Vec<Turn> = (1..=5).map(|n| turn(&format!("answer {n}"))).collect();
        let transcript = Transcript::from_turns(&turns);
        assert_eq!(
            transcript.body,
            "answer 1\n\nanswer 2\n\nanswer 3\n\nanswer 4\n\nanswer 5"
        );
    }

    #[test]
    fn test_empty_session_yields_empty_body() {
        let transcript = Transcript::from_turns(&[]);
        assert_eq!(transcript.body, "");
        assert_eq!(transcript.title, DEFAULT_TITLE);
        assert_eq!(transcript.heading, DEFAULT_SECTION_HEADING);
    }

    #[test]
    fn test_multiline_answer_survives_assembly() {
        let transcript = Transcript::from_turns(&[turn("line one\nline two"), turn("next")]);
        assert_eq!(transcript.body, "line one\nline two\n\nnext");
    }

    #[test]
    fn test_builder_overrides() {
        let transcript = Transcript::from_turns(&[])
            .with_title("Midterm Review")
            .with_heading("Collected Answers");
        assert_eq!(transcript.title, "Midterm Review");
        assert_eq!(transcript.heading, "Collected Answers");
    }
}
