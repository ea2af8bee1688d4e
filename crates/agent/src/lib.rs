//! The RailSage agent: a ReAct loop that routes each question between the
//! registered tools until it can give a final answer.
//!
//! 1. **Think**: render the prompt (tools, question, scratchpad) and ask the
//!    reasoning provider for one step
//! 2. **Act**: if the step names a tool, invoke it
//! 3. **Observe**: append the observation to the scratchpad and think again
//!
//! The loop ends on a `Final Answer:` or on a bounded failure
//! (step budget, unusable reasoning, provider error, timeout).

pub mod parser;
pub mod prompt;
pub mod react;
pub mod session;

pub use parser::{ParseFailure, ReasoningStep, parse_reasoning};
pub use prompt::{STOP_SEQUENCE, build_prompt};
pub use react::ReactAgent;
pub use session::{AgentSession, ScratchpadEntry, SessionOutcome, SessionStatus};

#[cfg(test)]
pub(crate) mod test_helpers;
