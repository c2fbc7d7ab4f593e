// Conversation transcript for a single run
//
// Append-only. The transcript tracks which tool requests of the last
// assistant turn are still unanswered and rejects any turn that would break
// request/result pairing.

use std::collections::HashSet;

use waypoint_abstraction::{ContentBlock, ConversationTurn, Role};

use crate::error::{OrchestrationError, Result};

/// Ordered conversation history exchanged with the model.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
    /// Request ids of the last assistant turn awaiting results, in request order.
    outstanding: Vec<String>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript holding a single user turn
    pub fn with_user_message(text: impl Into<String>) -> Self {
        Self { turns: vec![ConversationTurn::user(text)], outstanding: Vec::new() }
    }

    /// Append a turn.
    ///
    /// # Errors
    /// Returns `ProtocolViolation` when the turn does not fit the request/result
    /// pairing: results must answer exactly the outstanding request ids, in
    /// order, and nothing else may be appended while requests are outstanding.
    pub fn append(&mut self, turn: ConversationTurn) -> Result<()> {
        match turn.role {
            Role::User => {
                self.ensure_nothing_outstanding(&turn.role)?;
                reject_blocks(&turn, |b| !matches!(b, ContentBlock::Text { .. }))?;
            }
            Role::Assistant => {
                self.ensure_nothing_outstanding(&turn.role)?;
                reject_blocks(&turn, |b| matches!(b, ContentBlock::ToolResult { .. }))?;

                let mut seen = HashSet::new();
                let mut ids = Vec::new();
                for request in turn.tool_requests() {
                    if !seen.insert(request.id.as_str()) {
                        return Err(violation(format!(
                            "duplicate tool request id '{}' in assistant turn",
                            request.id
                        )));
                    }
                    ids.push(request.id.clone());
                }
                self.outstanding = ids;
            }
            Role::ToolResult => {
                if self.outstanding.is_empty() {
                    return Err(violation("tool_result turn with no outstanding tool requests"));
                }
                reject_blocks(&turn, |b| !matches!(b, ContentBlock::ToolResult { .. }))?;

                let answered: Vec<&str> = turn
                    .content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolResult { request_id, .. } => Some(request_id.as_str()),
                        _ => None,
                    })
                    .collect();
                if answered != self.outstanding {
                    return Err(violation(format!(
                        "tool results {:?} do not match outstanding requests {:?}",
                        answered, self.outstanding
                    )));
                }
                self.outstanding.clear();
            }
        }

        self.turns.push(turn);
        Ok(())
    }

    /// Immutable view of the turns so far
    pub fn snapshot(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Request ids still waiting for results
    pub fn outstanding_requests(&self) -> &[String] {
        &self.outstanding
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript has no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Consume the transcript, returning its turns
    pub fn into_turns(self) -> Vec<ConversationTurn> {
        self.turns
    }

    fn ensure_nothing_outstanding(&self, role: &Role) -> Result<()> {
        if self.outstanding.is_empty() {
            Ok(())
        } else {
            Err(violation(format!(
                "{role} turn appended while {} tool request(s) are unanswered",
                self.outstanding.len()
            )))
        }
    }
}

fn reject_blocks(turn: &ConversationTurn, invalid: impl Fn(&ContentBlock) -> bool) -> Result<()> {
    match turn.content.iter().find(|b| invalid(b)) {
        Some(ContentBlock::ToolRequest(_)) => {
            Err(violation(format!("tool_request block in a {} turn", turn.role)))
        }
        Some(ContentBlock::ToolResult { .. }) => {
            Err(violation(format!("tool_result block in a {} turn", turn.role)))
        }
        Some(ContentBlock::Text { .. }) => Err(violation(format!("text block in a {} turn", turn.role))),
        None => Ok(()),
    }
}

fn violation(message: impl Into<String>) -> OrchestrationError {
    OrchestrationError::ProtocolViolation(message.into())
}
