//! End-to-end tests for the tool-use loop
//!
//! A scripted model drives the engine against the flight tools backed by
//! in-memory stores.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{request, DelayedStore, HangingStore, ScriptedModel, SearchOutageStore};
use serde_json::json;
use tokio::sync::broadcast;
use waypoint_abstraction::{
    ContentBlock, ConverseModel, ConverseResponse, ModelError, Role, StopReason, ToolPayload,
};
use waypoint_orchestrator::{
    flight_registry, EngineConfig, OrchestrationEngine, OrchestrationError, OrchestrationEvent, Termination,
    ToolError, ToolErrorPolicy, ToolExecutionConfig,
};
use waypoint_store::{FlightStore, InMemoryFlightStore};

fn engine_with(model: Arc<ScriptedModel>, store: Arc<dyn FlightStore>, config: EngineConfig) -> OrchestrationEngine {
    OrchestrationEngine::new(model as Arc<dyn ConverseModel>, Arc::new(flight_registry(store)), config)
}

fn engine(model: Arc<ScriptedModel>, store: Arc<dyn FlightStore>) -> OrchestrationEngine {
    engine_with(model, store, EngineConfig::default())
}

fn seeded() -> Arc<dyn FlightStore> {
    Arc::new(InMemoryFlightStore::seeded())
}

fn search_waw_cdg(id: &str) -> ConverseResponse {
    ConverseResponse::tool_use(vec![request(
        id,
        "searchFlights",
        json!({"origin": "WAW", "destination": "CDG", "date": "2025-03-15"}),
    )])
}

#[tokio::test]
async fn test_immediate_answer() {
    let model = ScriptedModel::responses(vec![ConverseResponse::end_turn("Hi, how can I help?")]);
    let engine = engine(Arc::clone(&model), seeded());

    let record = engine.run("Hello", 5, 0.0).await.unwrap();

    assert_eq!(record.final_answer, "Hi, how can I help?");
    assert_eq!(record.iteration_count, 1);
    assert!(record.tool_invocations.is_empty());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_single_search_then_answer() {
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![request(
            "tu-1",
            "searchFlights",
            json!({"origin": "WAW", "destination": "FCO", "date": "2025-03-16"}),
        )]),
        ConverseResponse::end_turn("Ryanair FR8821 departs at 06:00 for 120."),
    ]);
    let engine = engine(Arc::clone(&model), seeded());

    let record = engine.run("Find flights WAW to FCO on 2025-03-16", 5, 0.0).await.unwrap();

    assert_eq!(record.iteration_count, 2);
    assert_eq!(record.tool_invocations.len(), 1);
    let invocation = &record.tool_invocations[0];
    assert_eq!(invocation.tool_name, "searchFlights");
    assert_eq!(invocation.request_id, "tu-1");
    assert_eq!(invocation.iteration, 0);
    let args: serde_json::Value = serde_json::from_str(&invocation.serialized_arguments).unwrap();
    assert_eq!(args["destination"], "FCO");

    // The second model call sees the single flight record
    let transcript = model.transcript(1);
    let ContentBlock::ToolResult { request_id, payload } = &transcript[2].content[0] else {
        panic!("expected tool result, got {:?}", transcript[2]);
    };
    assert_eq!(request_id, "tu-1");
    let flights: Vec<serde_json::Value> = serde_json::from_str(payload.as_text()).unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["flightId"], "FR8821");
}

#[tokio::test]
async fn test_budget_of_one_fails_after_one_call() {
    let model = ScriptedModel::responses(vec![search_waw_cdg("tu-1"), ConverseResponse::end_turn("never reached")]);
    let engine = engine(Arc::clone(&model), seeded());

    let err = engine.run("Find flights WAW to CDG on 2025-03-15", 1, 0.0).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::BudgetExceeded { max_iterations: 1 }));
    assert!(err.is_budget_exhausted());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_budget_of_one_ignores_failing_tool() {
    let model = ScriptedModel::responses(vec![search_waw_cdg("tu-1"), ConverseResponse::end_turn("never reached")]);
    let engine = engine(Arc::clone(&model), SearchOutageStore::new());

    let err = engine.run("Find flights WAW to CDG on 2025-03-15", 1, 0.0).await.unwrap_err();

    assert_eq!(err.code(), "MAX_ITERATIONS_EXCEEDED");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_budget_of_one_ignores_unknown_tool() {
    let model = ScriptedModel::responses(vec![ConverseResponse::tool_use(vec![request(
        "tu-1",
        "unknownTool",
        json!({}),
    )])]);
    let engine = engine(Arc::clone(&model), seeded());

    let err = engine.run("Do something odd", 1, 0.0).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::BudgetExceeded { max_iterations: 1 }));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_budget_stops_after_exactly_n_calls() {
    for n in 1..=4 {
        let model = ScriptedModel::always(search_waw_cdg("loop"));
        let engine = engine(Arc::clone(&model), seeded());

        let err = engine.run("loop forever", n, 0.0).await.unwrap_err();

        assert_eq!(err.code(), "MAX_ITERATIONS_EXCEEDED");
        assert_eq!(model.calls(), n as usize);
    }
}

#[tokio::test]
async fn test_unknown_tool_is_fatal() {
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![request("tu-1", "unknownTool", json!({}))]),
        ConverseResponse::end_turn("never reached"),
    ]);
    let engine = engine(Arc::clone(&model), seeded());

    let err = engine.run("Do something odd", 5, 0.0).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::UnknownTool { ref name, .. } if name == "unknownTool"));
    assert!(!err.is_budget_exhausted());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_unknown_tool_is_fatal_even_when_returning_errors_to_model() {
    let model = ScriptedModel::responses(vec![ConverseResponse::tool_use(vec![request(
        "tu-1",
        "unknownTool",
        json!({}),
    )])]);
    let config = EngineConfig {
        tool_execution: ToolExecutionConfig { error_policy: ToolErrorPolicy::ReturnToModel, ..Default::default() },
        ..Default::default()
    };
    let engine = engine_with(Arc::clone(&model), seeded(), config);

    let err = engine.run("q", 5, 0.0).await.unwrap_err();
    assert_eq!(err.code(), "TOOL_NOT_FOUND");
}

#[tokio::test]
async fn test_store_failure_fails_the_iteration() {
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![
            request("tu-1", "searchFlights", json!({"origin": "WAW", "destination": "CDG", "date": "2025-03-15"})),
            request("tu-2", "getFlightDetails", json!({"flightId": "LO335"})),
        ]),
        ConverseResponse::end_turn("never reached"),
    ]);
    let engine = engine(Arc::clone(&model), SearchOutageStore::new());

    let err = engine.run("Find flights", 5, 0.0).await.unwrap_err();

    match &err {
        OrchestrationError::ToolFailure { tool, source } => {
            assert_eq!(tool, "searchFlights");
            assert!(matches!(source, ToolError::Store(_)));
        }
        other => panic!("expected ToolFailure, got {other:?}"),
    }
    assert!(err.is_dependency_failure());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_store_failure_returned_to_model() {
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![
            request("tu-1", "searchFlights", json!({"origin": "WAW", "destination": "CDG", "date": "2025-03-15"})),
            request("tu-2", "getFlightDetails", json!({"flightId": "LO335"})),
        ]),
        ConverseResponse::end_turn("Search is down, but LO335 departs at 06:45."),
    ]);
    let config = EngineConfig {
        tool_execution: ToolExecutionConfig { error_policy: ToolErrorPolicy::ReturnToModel, ..Default::default() },
        ..Default::default()
    };
    let engine = engine_with(Arc::clone(&model), SearchOutageStore::new(), config);

    let record = engine.run("Find flights", 5, 0.0).await.unwrap();
    assert_eq!(record.iteration_count, 2);

    let results = &model.transcript(1)[2];
    assert_eq!(results.role, Role::ToolResult);
    let payloads: Vec<&ToolPayload> = results
        .content
        .iter()
        .map(|b| match b {
            ContentBlock::ToolResult { payload, .. } => payload,
            other => panic!("unexpected block {other:?}"),
        })
        .collect();
    assert!(payloads[0].is_error());
    assert!(!payloads[1].is_error());
}

#[tokio::test]
async fn test_results_follow_request_order_not_completion_order() {
    // B completes first, then A, then C
    let store = DelayedStore::new(&[("LO335", 40), ("AF1145", 5), ("LH1234", 80)]);
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![
            request("A", "getFlightDetails", json!({"flightId": "LO335"})),
            request("B", "getFlightDetails", json!({"flightId": "AF1145"})),
            request("C", "getFlightDetails", json!({"flightId": "LH1234"})),
        ]),
        ConverseResponse::end_turn("Three flights found."),
    ]);
    let engine = engine(Arc::clone(&model), store);

    let record = engine.run("Compare three flights", 5, 0.0).await.unwrap();

    let recorded: Vec<&str> = record.tool_invocations.iter().map(|i| i.request_id.as_str()).collect();
    assert_eq!(recorded, vec!["A", "B", "C"]);

    let results = &model.transcript(1)[2];
    let placed: Vec<(&str, String)> = results
        .content
        .iter()
        .map(|b| match b {
            ContentBlock::ToolResult { request_id, payload } => {
                let flights: Vec<serde_json::Value> = serde_json::from_str(payload.as_text()).unwrap();
                (request_id.as_str(), flights[0]["flightId"].as_str().unwrap().to_string())
            }
            other => panic!("unexpected block {other:?}"),
        })
        .collect();
    assert_eq!(
        placed,
        vec![("A", "LO335".to_string()), ("B", "AF1145".to_string()), ("C", "LH1234".to_string())]
    );
}

#[tokio::test]
async fn test_empty_result_is_distinct_from_failure() {
    let model = ScriptedModel::responses(vec![
        ConverseResponse::tool_use(vec![request(
            "tu-1",
            "searchFlights",
            json!({"origin": "WAW", "destination": "CDG", "date": "2026-01-01"}),
        )]),
        ConverseResponse::end_turn("No flights that day."),
    ]);
    let engine = engine(Arc::clone(&model), seeded());

    let record = engine.run("Flights on 2026-01-01?", 5, 0.0).await.unwrap();
    assert_eq!(record.final_answer, "No flights that day.");

    let results = &model.transcript(1)[2];
    assert_eq!(results.content[0], ContentBlock::tool_result("tu-1", ToolPayload::Output("[]".to_string())));
}

#[tokio::test]
async fn test_upstream_failure_is_surfaced() {
    let model = ScriptedModel::new(vec![Err(ModelError::QuotaExceeded {
        provider: "anthropic".to_string(),
        message: Some("rate limited".to_string()),
    })]);
    let engine = engine(Arc::clone(&model), seeded());

    let err = engine.run("Hello", 5, 0.0).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Upstream(_)));
    assert_eq!(err.code(), "THROTTLING");
    assert!(err.is_dependency_failure());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_unrecognized_stop_reason_degrades_to_answer() {
    let model = ScriptedModel::responses(vec![ConverseResponse {
        stop_reason: StopReason::Other("max_tokens".to_string()),
        content: vec![ContentBlock::text("The cheapest flight is")],
        usage: None,
    }]);
    let engine = engine(Arc::clone(&model), seeded());

    let record = engine.run("Cheapest flight?", 5, 0.0).await.unwrap();

    assert_eq!(record.final_answer, "The cheapest flight is");
    assert_eq!(record.termination, Termination::Unrecognized { stop_reason: "max_tokens".to_string() });
    assert!(record.is_degraded());
}

#[tokio::test]
async fn test_timeout_cancels_in_flight_tools() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let store = Arc::new(HangingStore { cancelled: Arc::clone(&cancelled) });
    let model = ScriptedModel::responses(vec![search_waw_cdg("tu-1")]);
    let engine = engine(Arc::clone(&model), store);

    let err = engine.run_with_timeout("Find flights", 5, 0.0, Duration::from_millis(50)).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Timeout(d) if d == Duration::from_millis(50)));
    assert!(err.is_budget_exhausted());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cancelled.load(Ordering::SeqCst), "in-flight tool call was not cancelled");
}

#[tokio::test]
async fn test_event_stream_for_tool_run() {
    let model = ScriptedModel::responses(vec![search_waw_cdg("tu-1"), ConverseResponse::end_turn("LO335 at 06:45")]);
    let (tx, mut rx) = broadcast::channel(64);
    let mut engine = engine(Arc::clone(&model), seeded());
    engine.set_event_sender(Some(tx));

    let record = engine.run("Find flights", 5, 0.0).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.correlation_id(), record.run_id);
        kinds.push(match event {
            OrchestrationEvent::RunStarted { .. } => "started",
            OrchestrationEvent::ModelInvoked { .. } => "model",
            OrchestrationEvent::ToolCallRequested { .. } => "requested",
            OrchestrationEvent::ToolCallFinished { is_error, .. } => {
                assert!(!is_error);
                "finished"
            }
            OrchestrationEvent::FinalAnswer { .. } => "answer",
            OrchestrationEvent::RunFailed { .. } => "failed",
        });
    }
    assert_eq!(kinds, vec!["started", "model", "requested", "finished", "model", "answer"]);
}

#[tokio::test]
async fn test_failed_run_emits_failure_event() {
    let model = ScriptedModel::always(search_waw_cdg("loop"));
    let (tx, mut rx) = broadcast::channel(64);
    let mut engine = engine(Arc::clone(&model), seeded());
    engine.set_event_sender(Some(tx));

    engine.run("loop", 2, 0.0).await.unwrap_err();

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    match last {
        Some(OrchestrationEvent::RunFailed { code, .. }) => assert_eq!(code, "MAX_ITERATIONS_EXCEEDED"),
        other => panic!("expected RunFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_runs_share_engine() {
    let model = ScriptedModel::always(ConverseResponse::end_turn("ok"));
    let engine = Arc::new(engine(Arc::clone(&model), seeded()));

    let (a, b) = tokio::join!(engine.run("first", 3, 0.0), engine.run("second", 3, 0.0));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.run_id, b.run_id);
    assert_eq!(model.calls(), 2);
}
