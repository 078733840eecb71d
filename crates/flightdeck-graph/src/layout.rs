//! Deterministic tree layout.
//!
//! Leaves are stacked vertically at a fixed gap; each parent is centered
//! over the vertical midpoint of its children; horizontal position is
//! purely a function of tree depth. No randomness, so layout output is
//! byte-stable for identical graphs.

use std::collections::HashMap;

use crate::node::{Position, TaskGraph};

const X_GAP: f64 = 240.0;
const Y_GAP: f64 = 90.0;

/// Assign positions to every node reachable from the Goal.
pub(crate) fn apply_tree_layout(graph: &mut TaskGraph) {
    let children: HashMap<String, Vec<String>> = graph
        .nodes
        .iter()
        .map(|node| (node.id.clone(), node.children.clone()))
        .collect();

    let mut positions: HashMap<String, Position> = HashMap::new();
    let mut next_leaf_y = 0.0;
    place(
        &graph.goal_id.clone(),
        0,
        &children,
        &mut positions,
        &mut next_leaf_y,
    );

    for node in &mut graph.nodes {
        if let Some(position) = positions.get(&node.id) {
            node.position = Some(*position);
        }
    }
}

/// Place a subtree; returns the node's y. Leaves take the next slot,
/// parents center over their children.
fn place(
    id: &str,
    depth: usize,
    children: &HashMap<String, Vec<String>>,
    positions: &mut HashMap<String, Position>,
    next_leaf_y: &mut f64,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let x = depth as f64 * X_GAP;
    let child_ids = children.get(id).map(Vec::as_slice).unwrap_or_default();

    let y = if child_ids.is_empty() {
        let y = *next_leaf_y;
        *next_leaf_y += Y_GAP;
        y
    } else {
        let mut first = 0.0;
        let mut last = 0.0;
        for (i, child_id) in child_ids.iter().enumerate() {
            let child_y = place(child_id, depth + 1, children, positions, next_leaf_y);
            if i == 0 {
                first = child_y;
            }
            last = child_y;
        }
        (first + last) / 2.0
    };

    positions.insert(id.to_string(), Position { x, y });
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{GraphBuilder, GraphConfig};
    use flightdeck_types::{AgentEvent, EventKind};

    fn events() -> Vec<AgentEvent> {
        vec![
            AgentEvent::new("t1", "r1", EventKind::TaskStarted),
            AgentEvent::new("c1", "r1", EventKind::ToolCall),
            AgentEvent::new("c2", "r1", EventKind::ToolCall),
        ]
    }

    #[test]
    fn test_depth_drives_x() {
        let graph = GraphBuilder::default().build("r1", &events());
        let goal = graph.goal().position.unwrap();
        let task = graph.node("task:t1").unwrap().position.unwrap();
        let call = graph.node("tool:c1").unwrap().position.unwrap();
        assert!((goal.x - 0.0).abs() < f64::EPSILON);
        assert!((task.x - X_GAP).abs() < f64::EPSILON);
        assert!((call.x - 2.0 * X_GAP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parent_centered_over_children() {
        let graph = GraphBuilder::default().build("r1", &events());
        let task = graph.node("task:t1").unwrap().position.unwrap();
        let first = graph.node("tool:c1").unwrap().position.unwrap();
        let second = graph.node("tool:c2").unwrap().position.unwrap();
        assert!((second.y - first.y - Y_GAP).abs() < f64::EPSILON);
        assert!((task.y - (first.y + second.y) / 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_layout_can_be_disabled() {
        let builder = GraphBuilder::new(GraphConfig {
            auto_layout: false,
            ..GraphConfig::default()
        });
        let graph = builder.build("r1", &events());
        assert!(graph.nodes.iter().all(|node| node.position.is_none()));
    }
}
