//! Parser for the ReAct output grammar.
//!
//! A reasoning output is exactly one of:
//!
//! ```text
//! <thought>
//! Action: <tool name>
//! Action Input: <input>
//! ```
//!
//! or
//!
//! ```text
//! <thought>
//! Final Answer: <answer>
//! ```
//!
//! Anything else is a [`ParseFailure`].

use serde::Serialize;

pub const ACTION: &str = "Action:";
pub const ACTION_INPUT: &str = "Action Input:";
pub const FINAL_ANSWER: &str = "Final Answer:";
pub const OBSERVATION: &str = "Observation:";

/// One well-formed reasoning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningStep {
    Action {
        thought: String,
        tool: String,
        input: String,
    },
    FinalAnswer {
        thought: String,
        answer: String,
    },
}

/// Why a reasoning output could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseFailure {
    /// The output contains both an action and a final answer.
    BothActionAndAnswer,
    /// The output contains neither an action nor a final answer.
    NoActionOrAnswer,
    /// `Action:` without a following `Action Input:`.
    MissingActionInput,
    /// `Final Answer:` with nothing after it.
    EmptyFinalAnswer,
    /// The action names a tool that is not registered.
    UnknownTool(String),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BothActionAndAnswer => f.write_str("it contained both an Action and a Final Answer"),
            Self::NoActionOrAnswer => f.write_str("it contained neither an Action nor a Final Answer"),
            Self::MissingActionInput => f.write_str("the Action was not followed by an Action Input line"),
            Self::EmptyFinalAnswer => f.write_str("the Final Answer was empty"),
            Self::UnknownTool(name) => write!(f, "'{name}' is not one of the available tools"),
        }
    }
}

/// Parse one reasoning output.
pub fn parse_reasoning(text: &str) -> Result<ReasoningStep, ParseFailure> {
    let action = find_action(text);
    let final_pos = text.find(FINAL_ANSWER);

    match (action, final_pos) {
        (Some(_), Some(_)) => Err(ParseFailure::BothActionAndAnswer),
        (Some(action), None) => action,
        (None, Some(pos)) => {
            let answer = text[pos + FINAL_ANSWER.len()..].trim();
            if answer.is_empty() {
                return Err(ParseFailure::EmptyFinalAnswer);
            }
            Ok(ReasoningStep::FinalAnswer {
                thought: clean_thought(&text[..pos]),
                answer: answer.to_string(),
            })
        }
        (None, None) => Err(ParseFailure::NoActionOrAnswer),
    }
}

/// Locate an `Action:` line. `None` if there is none; `Some(Err)` if it is
/// malformed.
fn find_action(text: &str) -> Option<Result<ReasoningStep, ParseFailure>> {
    let mut offset = 0;
    let mut action: Option<(usize, &str)> = None;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(ACTION) {
            action = Some((offset, rest.trim()));
            offset += line.len();
            break;
        }
        offset += line.len();
    }

    let (action_start, tool) = action?;
    let after = &text[offset..];

    let Some(input_pos) = after.find(ACTION_INPUT) else {
        return Some(Err(ParseFailure::MissingActionInput));
    };

    let mut input = &after[input_pos + ACTION_INPUT.len()..];
    if let Some(obs) = input.find(&format!("\n{OBSERVATION}")) {
        input = &input[..obs];
    }

    Some(Ok(ReasoningStep::Action {
        thought: clean_thought(&text[..action_start]),
        tool: tool.to_string(),
        input: strip_quotes(input.trim()).to_string(),
    }))
}

fn clean_thought(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("Thought:").unwrap_or(text).trim().to_string()
}

fn strip_quotes(s: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}
