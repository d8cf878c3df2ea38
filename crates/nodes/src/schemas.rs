//! Default parameter shapes for every task kind.
//!
//! Every surface that creates or re-types a task seeds its `parameters`
//! from these functions, so the required sub-fields checked by validation
//! always exist with a sane baseline value.

use serde_json::{json, Value};

use crate::{ActionType, Parameters, TriggerType};

fn object(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

/// Default parameters for a newly created or re-typed action task.
pub fn action_defaults(action: ActionType) -> Parameters {
    object(match action {
        ActionType::HttpRequest => json!({
            "method": "GET",
            "url": "",
            "headers": {},
            "body": "",
            "timeout": 30000,
        }),
        ActionType::DataProcessing => json!({
            "dataSource": "",
            "operation": "transform",
            "outputFormat": "json",
            "validation": false,
            "validationRules": [],
        }),
        ActionType::ScriptExecution => json!({
            "language": "javascript",
            "script": "",
            "timeout": 30000,
        }),
        ActionType::WebCrawling => json!({
            "url": "",
            "depth": 1,
            "maxPages": 10,
            "selectors": [],
            "followLinks": false,
        }),
        ActionType::AiCompletion => json!({
            "model": "gpt-4",
            "prompt": "",
            "systemPrompt": "",
            "temperature": 0.7,
            "maxTokens": 1000,
        }),
        ActionType::FileOperation => json!({
            "operation": "read",
            "path": "",
            "encoding": "utf-8",
        }),
        ActionType::DatabaseOperation => json!({
            "connectionString": "",
            "operation": "select",
            "query": "",
        }),
        ActionType::MessageQueue => json!({
            "queueName": "",
            "operation": "publish",
            "message": "",
        }),
        ActionType::Notification => json!({
            "channel": "slack",
            "recipient": "",
            "message": "",
        }),
        ActionType::Email => json!({
            "to": "",
            "cc": "",
            "subject": "",
            "body": "",
        }),
        ActionType::Custom => json!({}),
        ActionType::DummyAction => json!({
            "delay": 1000,
            "shouldFail": false,
        }),
    })
}

/// Default parameters for a newly created or re-typed trigger task.
pub fn trigger_defaults(trigger: TriggerType) -> Parameters {
    object(match trigger {
        TriggerType::Schedule => json!({ "cron": "0 * * * *", "timezone": "UTC" }),
        TriggerType::WebHook => json!({ "path": "", "method": "POST" }),
        TriggerType::Event => json!({ "eventName": "", "source": "" }),
        TriggerType::UserAction => json!({}),
    })
}

/// Condition tasks carry their logic on the task itself; parameters start empty.
pub fn condition_defaults() -> Parameters {
    Parameters::new()
}

/// Sub-workflow tasks reference the child workflow through `workflowId`.
pub fn sub_workflow_defaults() -> Parameters {
    object(json!({ "workflowId": "" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_type_has_an_object_shape() {
        for action in ActionType::ALL {
            // Custom is legitimately empty; everything else seeds fields.
            let defaults = action_defaults(action);
            if action != ActionType::Custom {
                assert!(!defaults.is_empty(), "{action} has no defaults");
            }
        }
    }

    #[test]
    fn validated_action_kinds_seed_their_checked_fields() {
        let dp = action_defaults(ActionType::DataProcessing);
        assert!(dp.contains_key("dataSource"));
        assert!(dp.contains_key("outputFormat"));

        let crawl = action_defaults(ActionType::WebCrawling);
        assert_eq!(crawl["depth"], 1);
        assert_eq!(crawl["maxPages"], 10);

        let ai = action_defaults(ActionType::AiCompletion);
        assert_eq!(ai["model"], "gpt-4");
        assert_eq!(ai["maxTokens"], 1000);
    }

    #[test]
    fn sub_workflow_defaults_carry_a_workflow_reference() {
        assert_eq!(sub_workflow_defaults()["workflowId"], "");
    }
}
