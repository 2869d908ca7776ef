use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

use policyrag_answer::{CompletionRequest, CompletionService};

use crate::agent::{Decision, Orchestrator, Step};
use crate::tool::Tool;
use crate::AgentError;

const STOP_SEQUENCE: &str = "\nObservation:";
const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";

/// Zero-shot ReAct controller: the completion model picks tools by name
/// from their descriptions.
pub struct ReactOrchestrator {
    completion: Arc<dyn CompletionService>,
    temperature: f32,
    max_tokens: u32,
}

impl ReactOrchestrator {
    pub fn new(completion: Arc<dyn CompletionService>, temperature: f32) -> Self {
        Self { completion, temperature, max_tokens: 500 }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Orchestrator for ReactOrchestrator {
    async fn decide(&self, question: &str, tools: &[Arc<dyn Tool>], steps: &[Step]) -> Result<Decision, AgentError> {
        let prompt = react_prompt(question, tools, steps);
        let request = CompletionRequest::new(prompt, self.max_tokens, self.temperature).with_stop(STOP_SEQUENCE);
        let reply = self.completion.complete(&request).await?;
        Ok(parse_reply(&reply))
    }
}

pub fn react_prompt(question: &str, tools: &[Arc<dyn Tool>], steps: &[Step]) -> String {
    let mut p = String::from("Answer the following questions as best you can. You have access to the following tools:\n\n");
    for t in tools {
        let _ = writeln!(p, "{}: {}", t.name(), t.description());
    }
    let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
    let _ = write!(
        p,
        "\nUse the following format:\n\n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, should be one of [{}]\n\
         Action Input: the input to the action\n\
         Observation: the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Final Answer: the final answer to the original input question\n\n\
         Begin!\n\n\
         Question: {}\n\
         Thought:",
        names.join(", "),
        question
    );
    for s in steps {
        let _ = write!(p, "{}\nObservation: {}\nThought: ", s.log, s.observation);
    }
    p
}

/// A reply with `Final Answer:` finishes; otherwise the last `Action:` /
/// `Action Input:` pair is invoked. Replies with neither are taken as the answer.
pub fn parse_reply(reply: &str) -> Decision {
    if let Some(pos) = reply.find(FINAL_ANSWER) {
        return Decision::Finish(reply[pos + FINAL_ANSWER.len()..].trim().to_string());
    }

    let mut tool: Option<String> = None;
    let mut input = String::new();
    for (i, line) in reply.lines().enumerate() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(ACTION_INPUT) {
            let tail: Vec<&str> = reply.lines().skip(i + 1).collect();
            let mut full = rest.trim().to_string();
            if !tail.is_empty() {
                full = format!("{}\n{}", full, tail.join("\n")).trim().to_string();
            }
            input = full.trim_matches('"').to_string();
            break;
        } else if let Some(rest) = line.strip_prefix(ACTION) {
            tool = Some(rest.trim().to_string());
        }
    }

    match tool {
        Some(tool) => Decision::Invoke { tool, input, log: reply.trim_end().to_string() },
        None => Decision::Finish(reply.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_and_input() {
        let reply = "I should check the travel rules.\nAction: travel_policy\nAction Input: \"hotel allowance\"";
        assert_eq!(
            parse_reply(reply),
            Decision::Invoke { tool: "travel_policy".into(), input: "hotel allowance".into(), log: reply.into() }
        );
    }

    #[test]
    fn final_answer_wins() {
        let reply = " I now know the final answer\nFinal Answer: 120 EUR per night.\n";
        assert_eq!(parse_reply(reply), Decision::Finish("120 EUR per night.".into()));
    }

    #[test]
    fn free_text_is_treated_as_answer() {
        assert_eq!(parse_reply("  just words "), Decision::Finish("just words".into()));
    }

    #[test]
    fn scratchpad_carries_previous_steps() {
        let steps = vec![Step {
            tool: "leave_policy".into(),
            input: "annual leave".into(),
            observation: "20 days (page 1, dist 0.100)".into(),
            log: " look it up\nAction: leave_policy\nAction Input: annual leave".into(),
        }];
        let p = react_prompt("How much leave?", &[], &steps);
        assert!(p.ends_with(
            "Question: How much leave?\nThought: look it up\nAction: leave_policy\nAction Input: annual leave\nObservation: 20 days (page 1, dist 0.100)\nThought: "
        ));
    }
}
