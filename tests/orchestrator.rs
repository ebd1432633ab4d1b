mod common;

use chain_voice_assistant::chat::ChatMessage;
use chain_voice_assistant::config::Config;
use chain_voice_assistant::orchestrator::Orchestrator;
use chain_voice_assistant::tools::ToolRegistry;
use chain_voice_assistant::Error;
use common::*;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_registry() -> ToolRegistry {
    ToolRegistry::new()
        .with(SlowTool {
            name: "slow_lookup",
            delay: Duration::from_millis(80),
            output: json!({"value": "slow"}),
        })
        .with(SlowTool {
            name: "fast_lookup",
            delay: Duration::from_millis(1),
            output: json!({"value": "fast"}),
        })
        .with(BrokenTool { name: "broken_lookup" })
}

fn decode(content: &str) -> Value {
    serde_json::from_str(content).unwrap()
}

#[tokio::test]
async fn test_reply_without_tool_calls_is_final() {
    let chat = ScriptedChat::new(vec![Ok(text_reply("Hello there."))]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let outcome = orchestrator
        .run(vec![ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(outcome.final_content, "Hello there.");
    assert!(outcome.tool_calls.is_empty());
    assert!(outcome.tool_results.is_empty());
    assert_eq!(chat.requests().len(), 1);
    assert_eq!(chat.tool_counts(), vec![3]);
}

#[tokio::test]
async fn test_one_result_per_call_matched_by_id() {
    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[
            ("call_slow", "slow_lookup", json!({})),
            ("call_fast", "fast_lookup", json!({})),
        ])),
        Ok(text_reply("Both done.")),
    ]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let conversation = vec![ChatMessage::system("be brief"), ChatMessage::user("look both up")];
    let outcome = orchestrator.run(conversation.clone()).await.unwrap();

    assert_eq!(outcome.final_content, "Both done.");
    assert_eq!(outcome.tool_calls.len(), 2);
    assert_eq!(outcome.tool_results.len(), 2);

    for result in &outcome.tool_results {
        let expected = match result.tool_call_id.as_str() {
            "call_slow" => json!({"value": "slow"}),
            "call_fast" => json!({"value": "fast"}),
            other => panic!("unexpected call id {}", other),
        };
        assert_eq!(decode(&result.content), expected);
    }

    let requests = chat.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], conversation);
    assert_eq!(requests[1].len(), conversation.len() + 1 + 2);
    assert_eq!(&requests[1][..conversation.len()], conversation.as_slice());
    assert!(matches!(
        &requests[1][conversation.len()],
        ChatMessage::Assistant { tool_calls, .. } if tool_calls.len() == 2
    ));
    assert_eq!(chat.tool_counts(), vec![3, 3]);
}

#[tokio::test]
async fn test_tool_calls_run_concurrently() {
    let registry = ToolRegistry::new()
        .with(SlowTool {
            name: "a",
            delay: Duration::from_millis(300),
            output: json!(1),
        })
        .with(SlowTool {
            name: "b",
            delay: Duration::from_millis(300),
            output: json!(2),
        })
        .with(SlowTool {
            name: "c",
            delay: Duration::from_millis(300),
            output: json!(3),
        });
    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[
            ("1", "a", json!({})),
            ("2", "b", json!({})),
            ("3", "c", json!({})),
        ])),
        Ok(text_reply("done")),
    ]);
    let orchestrator = Orchestrator::new(chat, executor(registry, &Config::default()));

    let started = std::time::Instant::now();
    let outcome = orchestrator.run(vec![ChatMessage::user("go")]).await.unwrap();

    assert_eq!(outcome.tool_results.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(850));
}

#[tokio::test]
async fn test_partial_failure_still_completes() {
    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[
            ("ok_1", "fast_lookup", json!({})),
            ("bad_1", "broken_lookup", json!({})),
        ])),
        Ok(text_reply("One lookup failed.")),
    ]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let outcome = orchestrator.run(vec![ChatMessage::user("go")]).await.unwrap();

    assert_eq!(outcome.final_content, "One lookup failed.");
    assert_eq!(outcome.tool_results.len(), 2);

    let ok = outcome.tool_results.iter().find(|r| r.tool_call_id == "ok_1").unwrap();
    assert_eq!(decode(&ok.content), json!({"value": "fast"}));

    let bad = outcome.tool_results.iter().find(|r| r.tool_call_id == "bad_1").unwrap();
    let error = decode(&bad.content);
    assert!(error["error"].as_str().unwrap().contains("503"));

    let second = &chat.requests()[1];
    let tool_turns = second
        .iter()
        .filter(|m| matches!(m, ChatMessage::Tool { .. }))
        .count();
    assert_eq!(tool_turns, 2);
}

#[tokio::test]
async fn test_unknown_tool_and_bad_arguments_become_error_turns() {
    let chat = ScriptedChat::new(vec![
        Ok(serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "u1", "type": "function", "function": {"name": "get_weather", "arguments": "{}"}},
                        {"id": "u2", "type": "function", "function": {"name": "fast_lookup", "arguments": "{oops"}}
                    ]
                }
            }]
        }))
        .unwrap()),
        Ok(text_reply("Sorry.")),
    ]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let outcome = orchestrator.run(vec![ChatMessage::user("weather?")]).await.unwrap();

    assert_eq!(outcome.tool_results.len(), 2);
    assert_eq!(outcome.tool_results[0].tool_call_id, "u1");
    assert!(decode(&outcome.tool_results[0].content)["error"]
        .as_str()
        .unwrap()
        .contains("Unknown tool: get_weather"));
    assert_eq!(outcome.tool_results[1].tool_call_id, "u2");
    assert!(decode(&outcome.tool_results[1].content)["error"].is_string());
    assert_eq!(chat.requests().len(), 2);
}

#[tokio::test]
async fn test_first_round_failure_is_fatal() {
    let chat = ScriptedChat::new(vec![Err(Error::upstream("chat", Some(401), "bad key"))]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let err = orchestrator.run(vec![ChatMessage::user("hi")]).await.unwrap_err();

    assert_eq!(err.upstream_status(), Some(401));
    assert_eq!(chat.requests().len(), 1);
}

#[tokio::test]
async fn test_second_round_failure_is_fatal() {
    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[("c1", "fast_lookup", json!({}))])),
        Err(Error::upstream("chat", Some(500), "overloaded")),
    ]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let err = orchestrator.run(vec![ChatMessage::user("hi")]).await.unwrap_err();

    assert_eq!(err.upstream_status(), Some(500));
    assert_eq!(chat.requests().len(), 2);
}

#[tokio::test]
async fn test_tool_calls_in_final_round_are_not_executed() {
    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[("c1", "fast_lookup", json!({}))])),
        Ok(serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Checking more...",
                    "tool_calls": [
                        {"id": "c2", "type": "function", "function": {"name": "slow_lookup", "arguments": "{}"}}
                    ]
                }
            }]
        }))
        .unwrap()),
    ]);
    let orchestrator = Orchestrator::new(chat.clone(), executor(test_registry(), &Config::default()));

    let outcome = orchestrator.run(vec![ChatMessage::user("hi")]).await.unwrap();

    assert_eq!(outcome.final_content, "Checking more...");
    assert_eq!(outcome.tool_results.len(), 1);
    assert_eq!(chat.requests().len(), 2);
}

#[tokio::test]
async fn test_balance_question_end_to_end() {
    let explorer = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "balance"))
        .and(query_param("address", WALLET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": "500000000000000"
        })))
        .expect(1)
        .mount(&explorer)
        .await;

    let chat = ScriptedChat::new(vec![
        Ok(tool_call_reply(&[(
            "call_balance",
            "get_native_token_balance",
            json!({ "address": WALLET }),
        )])),
        Ok(text_reply("Your balance is 0.0005 ETH.")),
    ]);
    let config = config_with_explorer(&explorer.uri());
    let orchestrator = Orchestrator::new(chat.clone(), executor(ToolRegistry::standard(), &config));

    let outcome = orchestrator
        .run(vec![ChatMessage::user("what's my balance")])
        .await
        .unwrap();

    assert_eq!(outcome.tool_results.len(), 1);
    let result = &outcome.tool_results[0];
    assert_eq!(result.name, "get_native_token_balance");
    assert_eq!(decode(&result.content), json!("0.0005"));
    assert!(outcome.final_content.contains("0.0005"));

    let second = &chat.requests()[1];
    assert_eq!(second.len(), 3);
    assert_eq!(
        second[2],
        ChatMessage::Tool {
            tool_call_id: "call_balance".into(),
            name: "get_native_token_balance".into(),
            content: "\"0.0005\"".into(),
        }
    );
}
