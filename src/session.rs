//! Per-connection protocol state machine.
//!
//! Transitions are pure: they take the current [`WorkflowState`] and one
//! inbound response and return the next state plus a [`Step`] describing
//! what the driver has to do (send one request, finish, or nothing).

use crate::action::{Plan, RemoteCommand};
use crate::messages::{CorrelationTag, Request, Response, ResponseOutcome};
use crate::report::SessionOutcome;

/// Start failure that OBS reports when the buffer is already running
pub const REPLAY_ALREADY_ACTIVE: &str = "replay buffer already active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Init,
    AwaitSingle(RemoteCommand),
    AwaitStatus,
    AwaitStart,
    AwaitSave,
    Terminal,
}

impl WorkflowState {
    /// Tag of the request this state is waiting on
    pub fn expected_tag(&self) -> Option<CorrelationTag> {
        match self {
            Self::AwaitSingle(_) => Some(CorrelationTag::SingleStep),
            Self::AwaitStatus => Some(CorrelationTag::CheckStatus),
            Self::AwaitStart => Some(CorrelationTag::StartReplay),
            Self::AwaitSave => Some(CorrelationTag::SaveReplay),
            Self::Init | Self::Terminal => None,
        }
    }
}

/// Request to dispatch next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub request: Request,
    /// Wait for the settle interval before sending
    pub settle: bool,
}

impl Outgoing {
    fn now(command: RemoteCommand, tag: CorrelationTag) -> Self {
        Self {
            request: Request::new(command, tag),
            settle: false,
        }
    }

    fn after_settle(command: RemoteCommand, tag: CorrelationTag) -> Self {
        Self {
            request: Request::new(command, tag),
            settle: true,
        }
    }
}

/// Work produced by one transition. `send` and `finish` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub send: Option<Outgoing>,
    pub finish: Option<SessionOutcome>,
}

impl Step {
    fn idle() -> Self {
        Self::default()
    }

    fn send(outgoing: Outgoing) -> Self {
        Self {
            send: Some(outgoing),
            finish: None,
        }
    }

    fn finish(outcome: SessionOutcome) -> Self {
        Self {
            send: None,
            finish: Some(outcome),
        }
    }
}

pub fn on_open(plan: Plan) -> (WorkflowState, Step) {
    match plan {
        Plan::Single(command) => (
            WorkflowState::AwaitSingle(command),
            Step::send(Outgoing::now(command, CorrelationTag::SingleStep)),
        ),
        Plan::EnsuredSave => (
            WorkflowState::AwaitStatus,
            Step::send(Outgoing::now(
                RemoteCommand::GetStreamingStatus,
                CorrelationTag::CheckStatus,
            )),
        ),
    }
}

pub fn on_response(state: &WorkflowState, response: &Response) -> (WorkflowState, Step) {
    let Some(expected) = state.expected_tag() else {
        return (*state, Step::idle());
    };
    if !response.is_tagged(expected) {
        tracing::warn!(
            "Ignoring response tagged {:?} while waiting for {}",
            response.message_id,
            expected.as_str()
        );
        return (*state, Step::idle());
    }

    match (state, response.outcome()) {
        (WorkflowState::AwaitSingle(command), outcome) => {
            (WorkflowState::Terminal, Step::finish(conclude(*command, outcome)))
        }

        (WorkflowState::AwaitStatus, ResponseOutcome::Success { fields }) => {
            tracing::debug!("Status: {:?}", fields);
            if response.replay_buffer_active() {
                tracing::debug!("Replay buffer already running, saving");
                (WorkflowState::AwaitSave, Step::send(save_replay(false)))
            } else {
                tracing::debug!("Replay buffer inactive, starting it");
                (
                    WorkflowState::AwaitStart,
                    Step::send(Outgoing::now(
                        RemoteCommand::StartReplayBuffer,
                        CorrelationTag::StartReplay,
                    )),
                )
            }
        }
        (WorkflowState::AwaitStatus, ResponseOutcome::Failure { error }) => (
            WorkflowState::Terminal,
            Step::finish(rejected(RemoteCommand::GetStreamingStatus, error)),
        ),

        (WorkflowState::AwaitStart, ResponseOutcome::Success { .. }) => {
            (WorkflowState::AwaitSave, Step::send(save_replay(true)))
        }
        (WorkflowState::AwaitStart, ResponseOutcome::Failure { error })
            if error == REPLAY_ALREADY_ACTIVE =>
        {
            tracing::debug!("Replay buffer was already active, saving without settling");
            (WorkflowState::AwaitSave, Step::send(save_replay(false)))
        }
        (WorkflowState::AwaitStart, ResponseOutcome::Failure { error }) => (
            WorkflowState::Terminal,
            Step::finish(rejected(RemoteCommand::StartReplayBuffer, error)),
        ),

        (WorkflowState::AwaitSave, outcome) => (
            WorkflowState::Terminal,
            Step::finish(conclude(RemoteCommand::SaveReplayBuffer, outcome)),
        ),

        (WorkflowState::Init | WorkflowState::Terminal, _) => (*state, Step::idle()),
    }
}

fn save_replay(settle: bool) -> Outgoing {
    if settle {
        Outgoing::after_settle(RemoteCommand::SaveReplayBuffer, CorrelationTag::SaveReplay)
    } else {
        Outgoing::now(RemoteCommand::SaveReplayBuffer, CorrelationTag::SaveReplay)
    }
}

fn conclude(command: RemoteCommand, outcome: ResponseOutcome<'_>) -> SessionOutcome {
    match outcome {
        ResponseOutcome::Success { .. } => SessionOutcome::Succeeded { command },
        ResponseOutcome::Failure { error } => rejected(command, error),
    }
}

fn rejected(command: RemoteCommand, error: &str) -> SessionOutcome {
    SessionOutcome::Rejected {
        command,
        error: error.to_string(),
    }
}

/// Owns the current state for the driver
#[derive(Debug)]
pub struct Session {
    state: WorkflowState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Init,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn open(&mut self, plan: Plan) -> Step {
        if self.state != WorkflowState::Init {
            return Step::idle();
        }
        let (next, step) = on_open(plan);
        self.state = next;
        step
    }

    pub fn handle(&mut self, response: &Response) -> Step {
        let (next, step) = on_response(&self.state, response);
        tracing::debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
        step
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
