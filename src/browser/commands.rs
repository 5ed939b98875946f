//! Wire shapes of the DevTools commands the session issues.
//!
//! Each command is its own serializable type implementing headless_chrome's
//! [`Method`], so the JSON sent is exactly the protocol's camelCase form.

use crate::errors::BrowserError;
use crate::types::{KeyEventType, MouseButton, MouseEventType, NodeDescriptor, NodeId};
use headless_chrome::protocol::cdp::types::Method;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Deserialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct PageEnable {}

impl Method for PageEnable {
    const NAME: &'static str = "Page.enable";
    type ReturnObject = Empty;
}

#[derive(Debug, Serialize)]
pub struct DomEnable {}

impl Method for DomEnable {
    const NAME: &'static str = "DOM.enable";
    type ReturnObject = Empty;
}

#[derive(Debug, Serialize)]
pub struct Navigate {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateReturn {
    pub frame_id: String,
    pub error_text: Option<String>,
}

impl Method for Navigate {
    const NAME: &'static str = "Page.navigate";
    type ReturnObject = NavigateReturn;
}

#[derive(Debug, Serialize)]
pub struct GetDocument {
    pub depth: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub node_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct GetDocumentReturn {
    pub root: DocumentNode,
}

impl Method for GetDocument {
    const NAME: &'static str = "DOM.getDocument";
    type ReturnObject = GetDocumentReturn;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelector {
    pub node_id: u32,
    pub selector: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorReturn {
    pub node_id: u32,
}

impl Method for QuerySelector {
    const NAME: &'static str = "DOM.querySelector";
    type ReturnObject = QuerySelectorReturn;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAll {
    pub node_id: u32,
    pub selector: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAllReturn {
    pub node_ids: Vec<u32>,
}

impl Method for QuerySelectorAll {
    const NAME: &'static str = "DOM.querySelectorAll";
    type ReturnObject = QuerySelectorAllReturn;
}

/// Node addressing shared by focus, box model and outer HTML.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeParams {
    pub node_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl From<&NodeDescriptor> for NodeParams {
    fn from(node: &NodeDescriptor) -> Self {
        Self {
            node_id: node.node_id.0,
            backend_node_id: node.backend_node_id,
            object_id: node.object_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Focus(pub NodeParams);

impl Method for Focus {
    const NAME: &'static str = "DOM.focus";
    type ReturnObject = Empty;
}

#[derive(Debug, Serialize)]
pub struct GetBoxModel(pub NodeParams);

#[derive(Debug, Deserialize)]
pub struct WireBoxModel {
    pub content: Vec<f64>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct GetBoxModelReturn {
    pub model: WireBoxModel,
}

impl Method for GetBoxModel {
    const NAME: &'static str = "DOM.getBoxModel";
    type ReturnObject = GetBoxModelReturn;
}

#[derive(Debug, Serialize)]
pub struct GetOuterHtml(pub NodeParams);

#[derive(Debug, Deserialize)]
pub struct GetOuterHtmlReturn {
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
}

impl Method for GetOuterHtml {
    const NAME: &'static str = "DOM.getOuterHTML";
    type ReturnObject = GetOuterHtmlReturn;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEvent {
    #[serde(rename = "type")]
    pub kind: KeyEventType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_repeat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_keypad: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
}

impl Method for DispatchKeyEvent {
    const NAME: &'static str = "Input.dispatchKeyEvent";
    type ReturnObject = Empty;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEvent {
    #[serde(rename = "type")]
    pub kind: MouseEventType,
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
    pub click_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
}

impl Method for DispatchMouseEvent {
    const NAME: &'static str = "Input.dispatchMouseEvent";
    type ReturnObject = Empty;
}

/// Chrome signals a node without layout (the document, `display: none`,
/// detached nodes) only through the error message of `DOM.getBoxModel`.
pub fn box_model_error(node: NodeId, detail: impl Display) -> BrowserError {
    let detail = detail.to_string();
    if detail.contains("Could not compute box model") {
        BrowserError::NoBoxModel(node)
    } else {
        BrowserError::protocol(GetBoxModel::NAME, detail)
    }
}
