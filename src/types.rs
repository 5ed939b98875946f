use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol identifier of a DOM node in the currently loaded document.
///
/// Ids are only valid until the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id of the document node after `DOM.getDocument`.
    pub const DOCUMENT_ROOT: NodeId = NodeId(1);

    /// The protocol reports "no match" as node id 0.
    pub fn from_protocol(raw: u32) -> Option<NodeId> {
        (raw != 0).then_some(NodeId(raw))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl NodeDescriptor {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            backend_node_id: None,
            object_id: None,
        }
    }

    pub fn with_backend_node_id(mut self, backend_node_id: u32) -> Self {
        self.backend_node_id = Some(backend_node_id);
        self
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }
}

/// Anything a node-targeted operation accepts: a bare id or a descriptor
/// carrying extra backend fields. Deserializes from either `7` or
/// `{"nodeId": 7, "backendNodeId": 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeTarget {
    Raw(NodeId),
    Descriptor(NodeDescriptor),
}

impl NodeTarget {
    pub fn node_id(&self) -> NodeId {
        match self {
            NodeTarget::Raw(id) => *id,
            NodeTarget::Descriptor(descriptor) => descriptor.node_id,
        }
    }

    pub fn into_descriptor(self) -> NodeDescriptor {
        match self {
            NodeTarget::Raw(id) => NodeDescriptor::new(id),
            NodeTarget::Descriptor(descriptor) => descriptor,
        }
    }
}

impl From<NodeId> for NodeTarget {
    fn from(id: NodeId) -> Self {
        NodeTarget::Raw(id)
    }
}

impl From<NodeDescriptor> for NodeTarget {
    fn from(descriptor: NodeDescriptor) -> Self {
        NodeTarget::Descriptor(descriptor)
    }
}

impl From<&NodeDescriptor> for NodeTarget {
    fn from(descriptor: &NodeDescriptor) -> Self {
        NodeTarget::Descriptor(descriptor.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Rendered geometry of an element. `content` is the content-box quad:
/// four corner points, clockwise from top-left, as eight numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxModel {
    pub content: Vec<f64>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    /// Protocol bit field: Alt=1, Ctrl=2, Meta/Command=4, Shift=8.
    pub fn bits(&self) -> u32 {
        (self.alt as u32)
            | ((self.ctrl as u32) << 1)
            | ((self.meta as u32) << 2)
            | ((self.shift as u32) << 3)
    }

    pub fn is_empty(&self) -> bool {
        self.bits() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    None,
    #[default]
    Left,
    Middle,
    Right,
    Back,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventType {
    #[serde(rename = "keyDown")]
    KeyDown,
    #[serde(rename = "keyUp")]
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventType {
    #[serde(rename = "mousePressed")]
    MousePressed,
    #[serde(rename = "mouseReleased")]
    MouseReleased,
}

/// Options merged into every key event of a text entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyOptions {
    pub modifiers: Modifiers,
    pub auto_repeat: Option<bool>,
    pub is_keypad: Option<bool>,
    pub location: Option<u32>,
}

/// Options for a click. Unset coordinates fall back to the centre of the
/// node's content box, each axis independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClickOptions {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub button: MouseButton,
    pub click_count: u32,
    pub modifiers: Modifiers,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            button: MouseButton::Left,
            click_count: 1,
            modifiers: Modifiers::default(),
        }
    }
}

impl ClickOptions {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub kind: KeyEventType,
    pub text: String,
    pub options: KeyOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub kind: MouseEventType,
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
    pub click_count: u32,
    pub modifiers: Modifiers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_no_match() {
        assert_eq!(NodeId::from_protocol(0), None);
        assert_eq!(NodeId::from_protocol(12), Some(NodeId(12)));
    }

    #[test]
    fn node_target_accepts_bare_id_or_descriptor() {
        let raw: NodeTarget = serde_json::from_str("7").unwrap();
        assert_eq!(raw, NodeTarget::Raw(NodeId(7)));

        let described: NodeTarget =
            serde_json::from_str(r#"{"nodeId": 7, "backendNodeId": 3}"#).unwrap();
        assert_eq!(described.node_id(), NodeId(7));
        assert_eq!(
            described.into_descriptor(),
            NodeDescriptor::new(NodeId(7)).with_backend_node_id(3)
        );
    }

    #[test]
    fn raw_target_normalizes_to_bare_descriptor() {
        let descriptor = NodeTarget::from(NodeId(9)).into_descriptor();
        assert_eq!(descriptor.node_id, NodeId(9));
        assert!(descriptor.backend_node_id.is_none());
        assert!(descriptor.object_id.is_none());
    }

    #[test]
    fn modifier_bits() {
        assert_eq!(Modifiers::default().bits(), 0);
        assert_eq!(Modifiers::shift().bits(), 8);
        let all = Modifiers {
            alt: true,
            ctrl: true,
            meta: true,
            shift: true,
        };
        assert_eq!(all.bits(), 15);
    }

    #[test]
    fn click_defaults() {
        let options: ClickOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ClickOptions::default());
        assert_eq!(options.button, MouseButton::Left);
        assert_eq!(options.click_count, 1);
        assert!(options.x.is_none() && options.y.is_none());
    }
}
