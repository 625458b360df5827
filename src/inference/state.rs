use super::types::FailureKind;
use crate::{Error, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardState {
    Idle,
    Sending,
    Succeeded,
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardEvent {
    Send,
    Responded,
    Faulted(FailureKind),
}

/// Lifecycle of a single outbound inference call. Terminal states are final.
#[derive(Debug)]
pub struct ForwardStateMachine {
    state: ForwardState,
}

impl ForwardStateMachine {
    pub fn new() -> Self {
        Self {
            state: ForwardState::Idle,
        }
    }

    pub fn current_state(&self) -> ForwardState {
        self.state
    }

    pub fn transition(&mut self, event: ForwardEvent) -> Result<ForwardState> {
        let new_state = match (self.state, event) {
            (ForwardState::Idle, ForwardEvent::Send) => ForwardState::Sending,
            (ForwardState::Sending, ForwardEvent::Responded) => ForwardState::Succeeded,
            (ForwardState::Sending, ForwardEvent::Faulted(kind)) => ForwardState::Failed(kind),
            (state, event) => {
                warn!("Invalid forward transition from {:?} with {:?}", state, event);
                return Err(Error::internal(format!(
                    "Invalid transition from {state:?} with event {event:?}"
                )));
            }
        };

        debug!("Forward state: {:?} -> {:?}", self.state, new_state);
        self.state = new_state;
        Ok(new_state)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ForwardState::Succeeded | ForwardState::Failed(_)
        )
    }
}

impl Default for ForwardStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
