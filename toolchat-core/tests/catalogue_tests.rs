//! Catalogue loading and error reporting through the public API


use std::sync::Arc;

use serde_json::json;
use test_utils::*;
use toolchat_core::tools::ToolChoice;
use toolchat_core::{
    CancellationToken, ChatSession, ContentItem, HandlerRegistry, LoopConfig, ToolCatalogue,
    ToolChatError, ValidationError,
};

const CATALOGUE: &str = r#"{
    "tools": [
        {
            "name": "get_weather",
            "description": "Gets current weather for a specified location",
            "input_schema": {
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }
        }
    ],
    "tool_choice": {"type": "tool", "name": "get_weather", "disable_parallel_tool_use": true}
}"#;

#[tokio::test]
async fn test_json_catalogue_drives_session() -> anyhow::Result<()> {
    let catalogue = ToolCatalogue::from_json_str(CATALOGUE)?;
    let policy = catalogue.policy.clone().expect("policy present");
    assert_eq!(
        policy.choice,
        ToolChoice::Forced {
            tool_name: "get_weather".to_string()
        }
    );
    assert!(!policy.allow_parallel_calls);

    let registry = HandlerRegistry::new()
        .register_fn("get_weather", |_ctx, _args| async { Ok("cloudy".to_string()) })
        .with_declarations(&catalogue.tools);
    let endpoint = Arc::new(ScriptedEndpoint::new(vec![
        tool_use_response(vec![tool_call("toolu_1", "get_weather", json!({"location": "Bern"}))]),
        final_response("Cloudy in Bern."),
    ]));

    let mut session = ChatSession::new(
        endpoint.clone(),
        Arc::new(catalogue),
        Arc::new(registry),
        sampling(),
        LoopConfig::default(),
    )?;
    let outcome = session.send("weather in Bern?", &CancellationToken::new()).await?;

    assert_eq!(outcome.text(), "Cloudy in Bern.");
    let sent = serde_json::to_value(endpoint.requests()[0].tool_choice.as_ref())?;
    assert_eq!(
        sent,
        json!({"type": "tool", "name": "get_weather", "disable_parallel_tool_use": true})
    );
    Ok(())
}

#[tokio::test]
async fn test_schema_mismatch_is_reported_in_band() -> anyhow::Result<()> {
    let catalogue = ToolCatalogue::from_json_str(CATALOGUE)?;
    let registry = HandlerRegistry::new()
        .register_fn("get_weather", |_ctx, _args| async { Ok("cloudy".to_string()) })
        .with_declarations(&catalogue.tools);
    let endpoint = Arc::new(ScriptedEndpoint::new(vec![
        tool_use_response(vec![tool_call("toolu_1", "get_weather", json!({"city": "Bern"}))]),
        final_response("Sorry."),
    ]));

    let mut session = ChatSession::new(
        endpoint,
        Arc::new(catalogue),
        Arc::new(registry),
        sampling(),
        LoopConfig::default(),
    )?;
    session.send("weather?", &CancellationToken::new()).await?;

    let result = session
        .transcript()
        .tool_results()
        .next()
        .cloned()
        .expect("one tool result");
    if cfg!(feature = "validation") {
        assert!(result.is_error);
        assert!(result.payload.starts_with("Error executing tool: invalid arguments:"));
    } else {
        assert_eq!(result.payload, "cloudy");
    }
    Ok(())
}

fn weather_catalogue_json(description: &str, tool_choice: serde_json::Value) -> String {
    json!({
        "tools": [{
            "name": "get_weather",
            "description": description,
            "input_schema": {
                "type": "object",
                "properties": {"location": {"type": "string"}}
            }
        }],
        "tool_choice": tool_choice
    })
    .to_string()
}

#[test]
fn test_unknown_policy_type_is_rejected() {
    let json = weather_catalogue_json("weather", json!({"type": "any"}));
    let err = ToolCatalogue::from_json_str(&json).unwrap_err();
    assert!(matches!(
        err,
        ToolChatError::Validation(ValidationError::UnknownPolicyType { ref kind }) if kind == "any"
    ));
    assert_eq!(err.to_string(), "Validation error: unknown policy type: 'any'");
}

#[test]
fn test_validation_messages() {
    let blank = weather_catalogue_json(" ", json!({"type": "auto"}));
    assert!(ToolCatalogue::from_json_str(&blank).unwrap().validate().is_ok());

    let empty = weather_catalogue_json("", json!({"type": "auto"}));
    let catalogue = ToolCatalogue::from_json_str(&empty).unwrap();
    let err = catalogue.validate().unwrap_err();
    assert_eq!(
        err,
        ValidationError::MissingDescription {
            tool_name: "get_weather".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "tool 'get_weather' missing required field 'description'"
    );

    let forced = weather_catalogue_json("weather", json!({"type": "tool"}));
    let forced = ToolCatalogue::from_json_str(&forced).unwrap();
    assert_eq!(forced.validate(), Err(ValidationError::ForcedWithoutName));
}

#[test]
fn test_tool_turn_wire_shape() {
    let content = vec![
        ContentItem::text("checking"),
        tool_call("toolu_1", "get_weather", json!({"location": "Bern"})),
    ];
    let value = serde_json::to_value(&content).unwrap();
    assert_eq!(
        value,
        json!([
            {"type": "text", "text": "checking"},
            {
                "type": "tool_use",
                "id": "toolu_1",
                "name": "get_weather",
                "input": {"location": "Bern"}
            }
        ])
    );
}
