//! Closed catalogs of trigger and action kinds.
//!
//! The serialised names match the document format used by exported
//! workflows, so they are spelled out per variant rather than derived.

use serde::{Deserialize, Serialize};

use crate::KindError;

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

/// How a trigger task starts a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Schedule,
    WebHook,
    Event,
    UserAction,
}

impl TriggerType {
    pub const ALL: [TriggerType; 4] = [
        TriggerType::Schedule,
        TriggerType::WebHook,
        TriggerType::Event,
        TriggerType::UserAction,
    ];

    /// Display label used when a task is created without an explicit name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Schedule   => "Scheduled Trigger",
            Self::WebHook    => "Webhook Trigger",
            Self::Event      => "Event Trigger",
            Self::UserAction => "Manual Trigger",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule   => write!(f, "Schedule"),
            Self::WebHook    => write!(f, "WebHook"),
            Self::Event      => write!(f, "Event"),
            Self::UserAction => write!(f, "UserAction"),
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = KindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Schedule"   => Ok(Self::Schedule),
            "WebHook"    => Ok(Self::WebHook),
            "Event"      => Ok(Self::Event),
            "UserAction" => Ok(Self::UserAction),
            other        => Err(KindError::UnknownTriggerType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// The closed catalog of things an action task can do.
///
/// `HttpRequest` also accepts the legacy spelling `HTTP` on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(alias = "HTTP")]
    HttpRequest,
    DataProcessing,
    ScriptExecution,
    WebCrawling,
    #[serde(rename = "AICompletion")]
    AiCompletion,
    FileOperation,
    DatabaseOperation,
    MessageQueue,
    Notification,
    Email,
    Custom,
    DummyAction,
}

impl ActionType {
    pub const ALL: [ActionType; 12] = [
        ActionType::HttpRequest,
        ActionType::DataProcessing,
        ActionType::ScriptExecution,
        ActionType::WebCrawling,
        ActionType::AiCompletion,
        ActionType::FileOperation,
        ActionType::DatabaseOperation,
        ActionType::MessageQueue,
        ActionType::Notification,
        ActionType::Email,
        ActionType::Custom,
        ActionType::DummyAction,
    ];

    /// Display label used when a task is created without an explicit name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::HttpRequest       => "HTTP Request",
            Self::DataProcessing    => "Data Processing",
            Self::ScriptExecution   => "Script Execution",
            Self::WebCrawling       => "Web Crawling",
            Self::AiCompletion      => "AI Completion",
            Self::FileOperation     => "File Operation",
            Self::DatabaseOperation => "Database Operation",
            Self::MessageQueue      => "Message Queue",
            Self::Notification      => "Notification",
            Self::Email             => "Email",
            Self::Custom            => "Custom Action",
            Self::DummyAction       => "Dummy Action",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::HttpRequest       => "HttpRequest",
            Self::DataProcessing    => "DataProcessing",
            Self::ScriptExecution   => "ScriptExecution",
            Self::WebCrawling       => "WebCrawling",
            Self::AiCompletion      => "AICompletion",
            Self::FileOperation     => "FileOperation",
            Self::DatabaseOperation => "DatabaseOperation",
            Self::MessageQueue      => "MessageQueue",
            Self::Notification      => "Notification",
            Self::Email             => "Email",
            Self::Custom            => "Custom",
            Self::DummyAction       => "DummyAction",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ActionType {
    type Err = KindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP" | "HttpRequest" => Ok(Self::HttpRequest),
            "DataProcessing"       => Ok(Self::DataProcessing),
            "ScriptExecution"      => Ok(Self::ScriptExecution),
            "WebCrawling"          => Ok(Self::WebCrawling),
            "AICompletion"         => Ok(Self::AiCompletion),
            "FileOperation"        => Ok(Self::FileOperation),
            "DatabaseOperation"    => Ok(Self::DatabaseOperation),
            "MessageQueue"         => Ok(Self::MessageQueue),
            "Notification"         => Ok(Self::Notification),
            "Email"                => Ok(Self::Email),
            "Custom"               => Ok(Self::Custom),
            "DummyAction"          => Ok(Self::DummyAction),
            other                  => Err(KindError::UnknownActionType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_from_str_agree() {
        for action in ActionType::ALL {
            assert_eq!(action.to_string().parse::<ActionType>(), Ok(action));
        }
        for trigger in TriggerType::ALL {
            assert_eq!(trigger.to_string().parse::<TriggerType>(), Ok(trigger));
        }
    }

    #[test]
    fn legacy_http_spelling_is_accepted() {
        assert_eq!("HTTP".parse::<ActionType>(), Ok(ActionType::HttpRequest));
        let parsed: ActionType = serde_json::from_str("\"HTTP\"").unwrap();
        assert_eq!(parsed, ActionType::HttpRequest);
    }

    #[test]
    fn ai_completion_serialises_with_upper_case_prefix() {
        let json = serde_json::to_string(&ActionType::AiCompletion).unwrap();
        assert_eq!(json, "\"AICompletion\"");
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "Teleport".parse::<ActionType>(),
            Err(KindError::UnknownActionType("Teleport".into()))
        );
        assert!("Cron".parse::<TriggerType>().is_err());
    }
}
