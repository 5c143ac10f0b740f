use crate::action::RemoteCommand;
use std::fmt;
use std::process::ExitCode;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Succeeded { command: RemoteCommand },
    /// OBS answered with an error
    Rejected { command: RemoteCommand, error: String },
    /// The connection failed before the workflow finished
    TransportFailed(String),
    Interrupted,
}

impl SessionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::TransportFailed(_))
    }

    /// Failures only map to a nonzero code when `nonzero_on_failure` is set;
    /// an interrupt is always a clean exit.
    pub fn exit_code(&self, nonzero_on_failure: bool) -> ExitCode {
        if nonzero_on_failure && self.is_failure() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { command } => write!(f, "{} completed successfully", command),
            Self::Rejected { error, .. } => write!(f, "Error from OBS: {}", error),
            Self::TransportFailed(reason) => write!(f, "WebSocket error: {}", reason),
            Self::Interrupted => f.write_str("Terminated by user"),
        }
    }
}

/// Print the single terminal line of a session
pub fn print(outcome: &SessionOutcome) {
    println!("{}", outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_lines() {
        let ok = SessionOutcome::Succeeded {
            command: RemoteCommand::SaveReplayBuffer,
        };
        assert_eq!(ok.to_string(), "SaveReplayBuffer completed successfully");

        let rejected = SessionOutcome::Rejected {
            command: RemoteCommand::GetStreamingStatus,
            error: "disconnected".to_string(),
        };
        assert_eq!(rejected.to_string(), "Error from OBS: disconnected");

        let transport = SessionOutcome::TransportFailed("Connection refused".to_string());
        assert_eq!(transport.to_string(), "WebSocket error: Connection refused");

        assert_eq!(SessionOutcome::Interrupted.to_string(), "Terminated by user");
    }

    #[test]
    fn test_exit_codes() {
        let rejected = SessionOutcome::Rejected {
            command: RemoteCommand::SaveReplayBuffer,
            error: "no replay buffer".to_string(),
        };
        assert_eq!(rejected.exit_code(true), ExitCode::FAILURE);
        assert_eq!(rejected.exit_code(false), ExitCode::SUCCESS);

        assert_eq!(SessionOutcome::Interrupted.exit_code(true), ExitCode::SUCCESS);
        assert_eq!(
            SessionOutcome::TransportFailed("closed".to_string()).exit_code(true),
            ExitCode::FAILURE
        );
    }
}
