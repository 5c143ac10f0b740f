use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions selectable with `--action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "camelCase")]
pub enum ActionName {
    StartRecording,
    StopRecording,
    ToggleRecording,
    StartReplayBuffer,
    StopReplayBuffer,
    ToggleReplayBuffer,
    SaveReplay,
    /// Start the replay buffer if needed, then save it
    SaveReplayEnsured,
}

/// obs-websocket 4.x request types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    StartRecording,
    StopRecording,
    StartStopRecording,
    StartReplayBuffer,
    StopReplayBuffer,
    StartStopReplayBuffer,
    SaveReplayBuffer,
    GetStreamingStatus,
}

impl RemoteCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartRecording => "StartRecording",
            Self::StopRecording => "StopRecording",
            Self::StartStopRecording => "StartStopRecording",
            Self::StartReplayBuffer => "StartReplayBuffer",
            Self::StopReplayBuffer => "StopReplayBuffer",
            Self::StartStopReplayBuffer => "StartStopReplayBuffer",
            Self::SaveReplayBuffer => "SaveReplayBuffer",
            Self::GetStreamingStatus => "GetStreamingStatus",
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session has to do for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// One request, one response
    Single(RemoteCommand),
    /// Make sure the replay buffer is running, then save it
    EnsuredSave,
}

pub fn resolve(action: ActionName) -> Plan {
    match action {
        ActionName::StartRecording => Plan::Single(RemoteCommand::StartRecording),
        ActionName::StopRecording => Plan::Single(RemoteCommand::StopRecording),
        ActionName::ToggleRecording => Plan::Single(RemoteCommand::StartStopRecording),
        ActionName::StartReplayBuffer => Plan::Single(RemoteCommand::StartReplayBuffer),
        ActionName::StopReplayBuffer => Plan::Single(RemoteCommand::StopReplayBuffer),
        ActionName::ToggleReplayBuffer => Plan::Single(RemoteCommand::StartStopReplayBuffer),
        ActionName::SaveReplay => Plan::Single(RemoteCommand::SaveReplayBuffer),
        ActionName::SaveReplayEnsured => Plan::EnsuredSave,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> Result<ActionName, String> {
        ActionName::from_str(name, false)
    }

    #[test]
    fn test_cli_names_are_camel_case() {
        assert_eq!(parse("saveReplay"), Ok(ActionName::SaveReplay));
        assert_eq!(parse("saveReplayEnsured"), Ok(ActionName::SaveReplayEnsured));
        assert_eq!(parse("toggleReplayBuffer"), Ok(ActionName::ToggleReplayBuffer));
        assert_eq!(parse("toggleRecording"), Ok(ActionName::ToggleRecording));
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(parse("save-replay").is_err());
        assert!(parse("SaveReplayBuffer").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_single_step_mapping() {
        assert_eq!(
            resolve(ActionName::SaveReplay),
            Plan::Single(RemoteCommand::SaveReplayBuffer)
        );
        assert_eq!(
            resolve(ActionName::ToggleRecording),
            Plan::Single(RemoteCommand::StartStopRecording)
        );
        assert_eq!(
            resolve(ActionName::ToggleReplayBuffer),
            Plan::Single(RemoteCommand::StartStopReplayBuffer)
        );
        assert_eq!(
            resolve(ActionName::StartReplayBuffer),
            Plan::Single(RemoteCommand::StartReplayBuffer)
        );
    }

    #[test]
    fn test_only_ensured_save_is_compound() {
        for action in ActionName::value_variants() {
            let plan = resolve(*action);
            assert_eq!(
                plan == Plan::EnsuredSave,
                *action == ActionName::SaveReplayEnsured,
                "{:?}",
                action
            );
        }
    }

    #[test]
    fn test_command_serializes_as_request_type() {
        let json = serde_json::to_string(&RemoteCommand::SaveReplayBuffer).unwrap();
        assert_eq!(json, "\"SaveReplayBuffer\"");
        assert_eq!(RemoteCommand::GetStreamingStatus.to_string(), "GetStreamingStatus");
    }
}
