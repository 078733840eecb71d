//! Integration tests for the task graph builder.

use flightdeck_graph::{GraphBuilder, GraphConfig, NodeKind, TaskGraph};
use flightdeck_types::{AgentEvent, EventKind, NodeStatus};
use serde_json::json;

fn ev(id: &str, kind: EventKind) -> AgentEvent {
    AgentEvent::new(id, "r1", kind)
}

fn scenario_events() -> Vec<AgentEvent> {
    vec![
        ev("m1", EventKind::MessageUser).with_payload(json!({
            "text": "ship the release",
            "session_key": "sess-9",
        })),
        ev("t1", EventKind::TaskStarted).with_payload(json!({"name": "T1"})),
        ev("s1", EventKind::StepStarted).with_payload(json!({"name": "S1"})),
        ev("c1", EventKind::ToolCall).with_payload(json!({"tool": "echo"})),
        ev("res1", EventKind::ToolResult).with_payload(json!({"result": "ok"})),
        ev("t1end", EventKind::TaskCompleted).with_payload(json!({"status": "completed"})),
    ]
}

#[test]
fn test_canonical_scenario() {
    let graph = GraphBuilder::default().build("r1", &scenario_events());

    let goal = graph.goal();
    assert_eq!(goal.name, "ship the release");
    assert_eq!(goal.status, NodeStatus::Completed);
    match &goal.kind {
        NodeKind::Goal {
            prompt,
            session_key,
            ..
        } => {
            assert_eq!(prompt.as_deref(), Some("ship the release"));
            assert_eq!(session_key.as_deref(), Some("sess-9"));
        }
        other => panic!("goal node has kind {other:?}"),
    }

    let task = graph.node("task:t1").unwrap();
    assert_eq!(task.name, "T1");
    assert_eq!(task.status, NodeStatus::Completed);
    assert_eq!(task.parent.as_deref(), Some(graph.goal_id.as_str()));
    assert!(task.duration_ms.is_some());

    let step = graph.node("step:s1").unwrap();
    assert_eq!(step.name, "S1");
    assert_eq!(step.parent.as_deref(), Some("task:t1"));

    let call = graph.node("tool:c1").unwrap();
    assert_eq!(call.name, "echo");
    assert_eq!(call.status, NodeStatus::Completed);
    assert_eq!(call.parent.as_deref(), Some("step:s1"));
    match &call.kind {
        NodeKind::ToolCall { result, error, .. } => {
            assert_eq!(result.as_ref(), Some(&json!("ok")));
            assert!(error.is_none());
        }
        other => panic!("tool node has kind {other:?}"),
    }
}

#[test]
fn test_builder_is_pure() {
    let events = scenario_events();
    let builder = GraphBuilder::default();
    let first = builder.build("r1", &events);
    let second = builder.build("r1", &events);
    assert_eq!(first, second);
}

#[test]
fn test_serialization_roundtrip() {
    let graph = GraphBuilder::default().build("r1", &scenario_events());
    let json = serde_json::to_string(&graph).unwrap();
    let back: TaskGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(graph, back);
}

#[test]
fn test_missing_wake_signal_yields_untitled_goal() {
    let events = vec![ev("t1", EventKind::TaskStarted)];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(graph.goal().name, "Untitled Goal");
}

#[test]
fn test_goal_fails_when_a_direct_child_fails() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("t1end", EventKind::TaskFailed),
        ev("t2", EventKind::TaskStarted),
        ev("t2end", EventKind::TaskCompleted),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(graph.goal().status, NodeStatus::Failed);
    assert_eq!(
        graph.node("task:t1").unwrap().status,
        NodeStatus::Failed
    );
    assert_eq!(
        graph.node("task:t2").unwrap().status,
        NodeStatus::Completed
    );
}

#[test]
fn test_explicit_payload_status_wins_over_kind() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        // Kind says failed; explicit valid status says skipped.
        ev("t1end", EventKind::TaskFailed).with_payload(json!({"status": "skipped"})),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(graph.node("task:t1").unwrap().status, NodeStatus::Skipped);
    // A skipped child is not a failed child.
    assert_eq!(graph.goal().status, NodeStatus::Completed);
}

#[test]
fn test_invalid_payload_status_falls_back_to_kind_keywords() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("t1end", EventKind::TaskFailed).with_payload(json!({"status": "exploded"})),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(graph.node("task:t1").unwrap().status, NodeStatus::Failed);
}

#[test]
fn test_step_outside_task_is_dropped() {
    let events = vec![
        ev("s1", EventKind::StepStarted),
        ev("t1", EventKind::TaskStarted),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert!(graph.node("step:s1").is_none());
    assert!(graph.node("task:t1").is_some());
}

#[test]
fn test_tool_call_parent_fallback_chain() {
    // No step, no task: parents to the goal.
    let events = vec![ev("c1", EventKind::ToolCall)];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(
        graph.node("tool:c1").unwrap().parent.as_deref(),
        Some(graph.goal_id.as_str())
    );

    // Task open, no step: parents to the task.
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("c1", EventKind::ToolCall),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(
        graph.node("tool:c1").unwrap().parent.as_deref(),
        Some("task:t1")
    );
}

#[test]
fn test_tool_result_completes_most_recent_open_call() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("c1", EventKind::ToolCall),
        ev("c2", EventKind::ToolCall),
        ev("res1", EventKind::ToolResult).with_payload(json!({"result": "second"})),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    let first = graph.node("tool:c1").unwrap();
    let second = graph.node("tool:c2").unwrap();
    assert!(first.completed_at.is_none());
    assert!(second.completed_at.is_some());
    match &second.kind {
        NodeKind::ToolCall { result, .. } => assert_eq!(result.as_ref(), Some(&json!("second"))),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn test_tool_result_with_error_fails_the_call() {
    let events = vec![
        ev("c1", EventKind::ToolCall),
        ev("res1", EventKind::ToolResult).with_payload(json!({"error": "timeout"})),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    let call = graph.node("tool:c1").unwrap();
    assert_eq!(call.status, NodeStatus::Failed);
    match &call.kind {
        NodeKind::ToolCall { error, .. } => assert_eq!(error.as_deref(), Some("timeout")),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn test_stray_tool_result_is_ignored() {
    let events = vec![ev("res1", EventKind::ToolResult)];
    let graph = GraphBuilder::default().build("r1", &events);
    // Only the goal exists.
    assert_eq!(graph.nodes.len(), 1);
}

#[test]
fn test_non_structural_events_are_absent_by_default() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("f1", EventKind::FileWrite),
        ev("k1", EventKind::CheckpointCreated),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(graph.nodes.len(), 2); // goal + task
}

#[test]
fn test_raw_event_passthrough_when_enabled() {
    let builder = GraphBuilder::new(GraphConfig {
        include_raw_events: true,
        ..GraphConfig::default()
    });
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("f1", EventKind::FileWrite),
    ];
    let graph = builder.build("r1", &events);
    let raw = graph.node("event:f1").unwrap();
    assert_eq!(raw.parent.as_deref(), Some("task:t1"));
    assert!(matches!(raw.kind, NodeKind::Event));
}

#[test]
fn test_new_task_resets_step_cursor() {
    let events = vec![
        ev("t1", EventKind::TaskStarted),
        ev("s1", EventKind::StepStarted),
        ev("t2", EventKind::TaskStarted),
        // Step cursor was reset: this call parents to the new task.
        ev("c1", EventKind::ToolCall),
    ];
    let graph = GraphBuilder::default().build("r1", &events);
    assert_eq!(
        graph.node("tool:c1").unwrap().parent.as_deref(),
        Some("task:t2")
    );
}

#[test]
fn test_only_child_edges_are_emitted() {
    let graph = GraphBuilder::default().build("r1", &scenario_events());
    assert!(!graph.edges.is_empty());
    assert!(graph
        .edges
        .iter()
        .all(|edge| edge.kind == flightdeck_graph::EdgeKind::Child));
}
