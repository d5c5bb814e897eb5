//! ReAct text protocol parsing.
//!
//! The model writes `Thought:` / `Action:` / `Action Input:` lines, or a
//! `Final Answer:` line when it is done.

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "\nObservation";

pub const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
pub const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";

/// One parsed model turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactStep {
    /// Call a tool. `log` is the model text up to the end of the input.
    Action {
        tool: String,
        input: String,
        log: String,
    },
    Finish {
        output: String,
        log: String,
    },
}

/// Parse one model turn.
///
/// An action that appears before any final answer wins, so a model that
/// hallucinates its own observation and answer still runs the tool first.
/// Malformed text is an `Err` carrying the message to feed back to the model.
pub fn parse_react_output(text: &str) -> Result<ReactStep, String> {
    let answer_at = text.find(FINAL_ANSWER);
    let action_at = text.find(ACTION);

    if let Some(action_at) = action_at {
        if answer_at.map_or(true, |answer_at| action_at < answer_at) {
            return parse_action(text, action_at);
        }
    }

    match answer_at {
        Some(at) => Ok(ReactStep::Finish {
            output: text[at + FINAL_ANSWER.len()..].trim().to_string(),
            log: text.to_string(),
        }),
        None => Err(MISSING_ACTION.to_string()),
    }
}

fn parse_action(text: &str, action_at: usize) -> Result<ReactStep, String> {
    let after_action = action_at + ACTION.len();
    let input_at = match text[after_action..].find(ACTION_INPUT) {
        Some(offset) => after_action + offset,
        None => return Err(MISSING_ACTION_INPUT.to_string()),
    };

    let tool = text[after_action..input_at].trim().to_string();
    if tool.is_empty() {
        return Err(MISSING_ACTION.to_string());
    }

    let after_input = input_at + ACTION_INPUT.len();
    let end = text[after_input..]
        .find(OBSERVATION)
        .map_or(text.len(), |offset| after_input + offset);
    let input = strip_quotes(text[after_input..end].trim()).to_string();

    Ok(ReactStep::Action {
        tool,
        input,
        log: text[..end].trim_end().to_string(),
    })
}

/// Drop one pair of enclosing double quotes, leaving quoted identifiers inside
fn strip_quotes(input: &str) -> &str {
    match input.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner.trim(),
        None => input,
    }
}
