//! ReAct prompt rendering.

use crate::parser::{ACTION, ACTION_INPUT, FINAL_ANSWER, OBSERVATION, ParseFailure};
use crate::session::ScratchpadEntry;
use railsage_core::tool::ToolRegistry;
use std::fmt::Write;

/// Reasoning stops before the model invents its own observation.
pub const STOP_SEQUENCE: &str = "\nObservation:";

/// Render the zero-shot ReAct prompt for the next Thinking step.
///
/// `correction` is set when the previous reasoning output was unusable; it is
/// shown once and is not part of the scratchpad.
pub fn build_prompt(
    tools: &ToolRegistry,
    question: &str,
    scratchpad: &[ScratchpadEntry],
    correction: Option<&ParseFailure>,
) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str("Answer the following questions as best you can. You have access to the following tools:\n\n");
    for (name, description) in tools.descriptions() {
        let _ = writeln!(out, "{name}: {description}");
    }

    let names = tools.names().join(", ");
    let _ = write!(
        out,
        "\nUse the following format:\n\n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         {ACTION} the action to take, should be one of [{names}]\n\
         {ACTION_INPUT} the input to the action\n\
         {OBSERVATION} the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         {FINAL_ANSWER} the final answer to the original input question\n\n\
         Begin!\n\n"
    );

    if let Some(failure) = correction {
        let _ = write!(
            out,
            "(Your previous reply could not be used because {failure}. Reply with either an \
             \"{ACTION}\" line followed by an \"{ACTION_INPUT}\" line, or a single \
             \"{FINAL_ANSWER}\" line, never both. The action must be one of [{names}].)\n\n"
        );
    }

    let _ = write!(out, "Question: {question}\nThought:");
    for entry in scratchpad {
        let _ = write!(
            out,
            " {}\n{ACTION} {}\n{ACTION_INPUT} {}\n{OBSERVATION} {}\nThought:",
            entry.thought, entry.action, entry.action_input, entry.observation
        );
    }

    out
}
