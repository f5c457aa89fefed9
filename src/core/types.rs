// src/core/types.rs - Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infra::errors::TutorError;

/// Whether the tutor explains freely or solves a specific exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Mode {
    #[default]
    Assistant,
    ProblemSolving,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Assistant => "assistant",
            Mode::ProblemSolving => "problem_solving",
        }
    }

    /// Vietnamese label used inside prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Assistant => "trợ lý",
            Mode::ProblemSolving => "giải bài tập",
        }
    }

    /// Lenient parse. The web client sends the Vietnamese labels; anything
    /// unrecognised is treated as assistant mode.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "problem_solving" | "problem-solving" | "giải bài tập" | "giai_bai_tap" => {
                Mode::ProblemSolving
            }
            _ => Mode::Assistant,
        }
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        Mode::parse(&s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level of detail for a problem-solving answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SolutionMode {
    #[default]
    Full,
    StepByStep,
    Hint,
}

impl SolutionMode {
    pub const ALL: [SolutionMode; 3] = [
        SolutionMode::Full,
        SolutionMode::StepByStep,
        SolutionMode::Hint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionMode::Full => "full",
            SolutionMode::StepByStep => "step_by_step",
            SolutionMode::Hint => "hint",
        }
    }

    /// Lenient parse; unknown values fall back to a full solution.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "step_by_step" | "step-by-step" | "step" | "stepbystep" => SolutionMode::StepByStep,
            "hint" => SolutionMode::Hint,
            _ => SolutionMode::Full,
        }
    }
}

impl From<String> for SolutionMode {
    fn from(s: String) -> Self {
        SolutionMode::parse(&s)
    }
}

impl fmt::Display for SolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the composer needs for one exchange. Never persisted.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub message: String,
    pub subject: String,
    pub mode: Mode,
    pub solution_mode: SolutionMode,
    pub image_reference: Option<String>,
}

impl PromptRequest {
    pub fn new(message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            subject: subject.into(),
            mode: Mode::default(),
            solution_mode: SolutionMode::default(),
            image_reference: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode, solution_mode: SolutionMode) -> Self {
        self.mode = mode;
        self.solution_mode = solution_mode;
        self
    }

    pub fn with_image(mut self, reference: impl Into<String>) -> Self {
        self.image_reference = Some(reference.into());
        self
    }
}

/// One completed exchange in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    pub bot_text: String,
    pub subject: String,
    pub mode: Mode,
    pub solution_mode: SolutionMode,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(request: &PromptRequest, bot_text: impl Into<String>) -> Self {
        Self {
            user_text: request.message.clone(),
            user_image: request.image_reference.clone(),
            bot_text: bot_text.into(),
            subject: request.subject.clone(),
            mode: request.mode,
            solution_mode: request.solution_mode,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a provider call, flattened for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub text: String,
}

impl From<Result<String, TutorError>> for DispatchResult {
    fn from(result: Result<String, TutorError>) -> Self {
        match result {
            Ok(text) => Self {
                success: true,
                text,
            },
            Err(e) => Self {
                success: false,
                text: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_vietnamese_labels() {
        assert_eq!(Mode::parse("giải bài tập"), Mode::ProblemSolving);
        assert_eq!(Mode::parse("trợ lý"), Mode::Assistant);
        assert_eq!(Mode::parse("problem_solving"), Mode::ProblemSolving);
        assert_eq!(Mode::parse("whatever"), Mode::Assistant);
    }

    #[test]
    fn test_solution_mode_aliases() {
        assert_eq!(SolutionMode::parse("step-by-step"), SolutionMode::StepByStep);
        assert_eq!(SolutionMode::parse("STEP"), SolutionMode::StepByStep);
        assert_eq!(SolutionMode::parse(" hint "), SolutionMode::Hint);
        assert_eq!(SolutionMode::parse(""), SolutionMode::Full);
    }

    #[test]
    fn test_serde_lenient_in_snake_case_out() {
        let mode: Mode = serde_json::from_str("\"giải bài tập\"").unwrap();
        assert_eq!(mode, Mode::ProblemSolving);
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"problem_solving\"");

        let sm: SolutionMode = serde_json::from_str("\"step-by-step\"").unwrap();
        assert_eq!(serde_json::to_string(&sm).unwrap(), "\"step_by_step\"");
    }

    #[test]
    fn test_turn_copies_request_fields() {
        let req = PromptRequest::new("2 + 2 = ?", "Toán học")
            .with_mode(Mode::ProblemSolving, SolutionMode::Hint)
            .with_image("bai_tap.png");
        let turn = ConversationTurn::new(&req, "Gợi ý: hãy đếm trên ngón tay.");
        assert_eq!(turn.user_text, "2 + 2 = ?");
        assert_eq!(turn.user_image.as_deref(), Some("bai_tap.png"));
        assert_eq!(turn.mode, Mode::ProblemSolving);
        assert_eq!(turn.solution_mode, SolutionMode::Hint);
    }

    #[test]
    fn test_dispatch_result_from_error() {
        let r = DispatchResult::from(Err(TutorError::MissingCredential));
        assert!(!r.success);
        assert!(r.text.contains("khóa API"));

        let ok = DispatchResult::from(Ok("4".to_string()));
        assert!(ok.success);
        assert_eq!(ok.text, "4");
    }
}
