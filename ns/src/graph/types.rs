//! Plain data carried between the graph, its collaborators and the coordinator

use serde::{Deserialize, Serialize};

/// A point or direction in scene space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Camera position plus the point it looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    #[serde(rename = "look-at")]
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }
}

/// A node in the navigation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,

    /// Hierarchical group the layout engine keeps together when asked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

/// The full node/link set shown by the visualization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphData {
    /// Build a chain of `count` nodes spread over three groups
    pub fn with_nodes(count: usize) -> Self {
        let nodes: Vec<Node> = (0..count)
            .map(|i| Node {
                id: format!("node-{}", i),
                group: Some(format!("group-{}", i % 3)),
            })
            .collect();

        let links = nodes
            .windows(2)
            .map(|pair| Link {
                source: pair[0].id.clone(),
                target: pair[1].id.clone(),
            })
            .collect();

        Self { nodes, links }
    }

    /// No nodes and no links
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Viewport dimensions reported after a resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportChange {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_nodes_builds_chain() {
        let data = GraphData::with_nodes(4);
        assert_eq!(data.nodes.len(), 4);
        assert_eq!(data.links.len(), 3);
        assert_eq!(data.links[0].source, "node-0");
        assert_eq!(data.links[2].target, "node-3");
        assert_eq!(data.nodes[3].group.as_deref(), Some("group-0"));
    }

    #[test]
    fn test_empty_graph_data() {
        assert!(GraphData::default().is_empty());
        assert!(GraphData::with_nodes(0).is_empty());
        assert!(!GraphData::with_nodes(1).is_empty());
    }

    #[test]
    fn test_camera_pose_serialization() {
        let pose = CameraPose::new(Vec3::new(0.0, 0.0, 200.0), Vec3::ZERO);
        let json = serde_json::to_string(&pose).unwrap();
        assert!(json.contains("look-at"));

        let back: CameraPose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }
}
