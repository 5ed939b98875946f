//! In-memory protocol session for exercising the driver without a browser.
//!
//! [`FakeSession`] parses the markup of a [`FakePage`] on every call and
//! numbers its nodes in document order, so the document node is id 1 just
//! as after `DOM.getDocument`. Every element gets its own synthetic box,
//! laid out side by side, which lets mouse presses be hit-tested back to
//! the element they landed on.

use crate::core::{LoadNotification, Session};
use crate::errors::{BrowserError, Result};
use crate::types::{
    BoxModel, KeyEvent, KeyEventType, MouseEvent, MouseEventType, NodeDescriptor, NodeId,
};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

const BOX_PITCH: f64 = 100.0;
const BOX_WIDTH: f64 = 50.0;
const BOX_TOP: f64 = 20.0;
const BOX_HEIGHT: f64 = 17.0;

const UNRENDERED: &[&str] = &["html", "head", "title", "meta", "link", "script", "style"];
const FOCUSABLE: &[&str] = &["input", "textarea", "select", "button", "a"];

/// A page served by [`FakeSession`]. Re-rendered on every protocol call.
pub trait FakePage: Send {
    fn render(&self) -> String;

    /// A key-down with text while `focused` has input focus.
    fn key_down(&mut self, _focused: ElementRef<'_>, _text: &str) {}

    /// A mouse press that landed on `target`.
    fn mouse_pressed(&mut self, _target: ElementRef<'_>) {}
}

/// Markup that never reacts to input.
#[derive(Debug, Clone)]
pub struct StaticPage(String);

impl StaticPage {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }
}

impl FakePage for StaticPage {
    fn render(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub text: String,
    pub done: bool,
}

/// The todo-list sample from the AngularJS home page: a text field, an
/// "add" button and one checkbox per item.
#[derive(Debug, Clone)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub draft: String,
}

impl Default for TodoPage {
    fn default() -> Self {
        Self {
            todos: vec![
                Todo {
                    text: "learn AngularJS".to_string(),
                    done: true,
                },
                Todo {
                    text: "build an AngularJS app".to_string(),
                    done: false,
                },
            ],
            draft: String::new(),
        }
    }
}

impl FakePage for TodoPage {
    fn render(&self) -> String {
        let remaining = self.todos.iter().filter(|todo| !todo.done).count();
        let items: String = self
            .todos
            .iter()
            .map(|todo| {
                format!(
                    r#"<li ng-repeat="todo in todoList.todos"><label class="checkbox"><input type="checkbox" ng-model="todo.done"{}><span class="done-{}">{}</span></label></li>"#,
                    if todo.done { " checked" } else { "" },
                    todo.done,
                    escape(&todo.text)
                )
            })
            .collect();
        format!(
            r#"<!DOCTYPE html><html><head><title>AngularJS</title></head><body><div class="container"><div app-run="todo.html"><div ng-controller="TodoListController as todoList"><span>{} of {} remaining</span><ul class="unstyled">{}</ul><form ng-submit="todoList.addTodo()"><input type="text" ng-model="todoList.todoText" size="30" placeholder="add new todo here" value="{}"><input class="btn-primary" type="submit" value="add"></form></div></div></div></body></html>"#,
            remaining,
            self.todos.len(),
            items,
            escape(&self.draft)
        )
    }

    fn key_down(&mut self, focused: ElementRef<'_>, text: &str) {
        if focused.value().name() == "input" && focused.value().attr("type") == Some("text") {
            self.draft.push_str(text);
        }
    }

    fn mouse_pressed(&mut self, target: ElementRef<'_>) {
        let element = target.value();
        if element.name() != "input" {
            return;
        }
        match element.attr("type") {
            Some("submit") => {
                let text = self.draft.trim().to_string();
                if !text.is_empty() {
                    self.todos.push(Todo { text, done: false });
                }
                self.draft.clear();
            }
            Some("checkbox") => {
                let item = target.ancestors().find(|node| {
                    node.value()
                        .as_element()
                        .map_or(false, |element| element.name() == "li")
                });
                if let Some(item) = item {
                    let index = item
                        .prev_siblings()
                        .filter(|node| {
                            node.value()
                                .as_element()
                                .map_or(false, |element| element.name() == "li")
                        })
                        .count();
                    if let Some(todo) = self.todos.get_mut(index) {
                        todo.done = !todo.done;
                    }
                }
            }
            _ => {}
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A protocol call as the fake saw it. Node-targeted calls record only the
/// node id, whichever target form the caller used.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolCall {
    EnablePage,
    EnableDom,
    Navigate(String),
    GetDocument,
    QuerySelector { scope: NodeId, selector: String },
    QuerySelectorAll { scope: NodeId, selector: String },
    Focus(NodeId),
    GetBoxModel(NodeId),
    GetOuterHtml(NodeId),
    KeyEvent(KeyEvent),
    MouseEvent(MouseEvent),
    Close,
}

struct FakeState<P> {
    page: P,
    loaded: bool,
    page_enabled: bool,
    focused: Option<NodeId>,
    pending_load: Option<oneshot::Sender<()>>,
    // load subscriptions not yet released
    load_listeners: Arc<AtomicUsize>,
    calls: Vec<ProtocolCall>,
    // method name -> successful calls left before it starts failing
    failures: HashMap<String, usize>,
}

pub struct FakeSession<P: FakePage> {
    state: Mutex<FakeState<P>>,
}

impl<P: FakePage> FakeSession<P> {
    /// A session whose document loads on the first navigation.
    pub fn new(page: P) -> Self {
        Self {
            state: Mutex::new(FakeState {
                page,
                loaded: false,
                page_enabled: false,
                focused: None,
                pending_load: None,
                load_listeners: Arc::new(AtomicUsize::new(0)),
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    /// A session with the document already loaded.
    pub fn loaded(page: P) -> Self {
        let session = Self::new(page);
        session.state().loaded = true;
        session
    }

    /// Make every call to `method` fail, e.g. `"DOM.focus"`.
    pub fn fail_on(self, method: &str) -> Self {
        self.fail_after(method, 0)
    }

    /// Let `method` succeed `successes` times, then fail.
    pub fn fail_after(self, method: &str, successes: usize) -> Self {
        self.state().failures.insert(method.to_string(), successes);
        self
    }

    pub fn calls(&self) -> Vec<ProtocolCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ProtocolCall::KeyEvent(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn mouse_events(&self) -> Vec<MouseEvent> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ProtocolCall::MouseEvent(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// The box the fake reports for `node`, if it has one.
    pub fn box_model_of(&self, node: NodeId) -> Option<BoxModel> {
        let state = self.state();
        let html = Html::parse_document(&state.page.render());
        let rendered = element_at(&html, node).filter(is_rendered).is_some();
        rendered.then(|| synthetic_box(node))
    }

    /// Load subscriptions handed out and not yet released.
    pub fn load_listeners(&self) -> usize {
        self.state().load_listeners.load(Ordering::SeqCst)
    }

    pub fn with_page<T>(&self, f: impl FnOnce(&P) -> T) -> T {
        f(&self.state().page)
    }

    fn state(&self) -> MutexGuard<'_, FakeState<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the failure check, then records `call` once it is allowed through.
    fn begin(&self, method: &str, call: ProtocolCall) -> Result<MutexGuard<'_, FakeState<P>>> {
        let mut state = self.state();
        if let Some(left) = state.failures.get_mut(method) {
            if *left == 0 {
                return Err(BrowserError::protocol(method, "injected failure"));
            }
            *left -= 1;
        }
        state.calls.push(call);
        Ok(state)
    }
}

impl<P> FakeState<P> {
    fn require_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(BrowserError::DocumentNotLoaded)
        }
    }
}

fn element_at(html: &Html, node: NodeId) -> Option<ElementRef<'_>> {
    let index = (node.0 as usize).checked_sub(1)?;
    html.tree.root().descendants().nth(index).and_then(ElementRef::wrap)
}

fn text_at(html: &Html, node: NodeId) -> Option<String> {
    let index = (node.0 as usize).checked_sub(1)?;
    let found = html.tree.root().descendants().nth(index)?;
    found.value().as_text().map(|text| text.to_string())
}

fn node_id_of(html: &Html, element: &ElementRef<'_>) -> Option<NodeId> {
    html.tree
        .root()
        .descendants()
        .position(|node| node.id() == element.id())
        .map(|index| NodeId(index as u32 + 1))
}

fn is_rendered(element: &ElementRef<'_>) -> bool {
    !UNRENDERED.contains(&element.value().name())
}

fn synthetic_box(node: NodeId) -> BoxModel {
    let left = node.0 as f64 * BOX_PITCH;
    let right = left + BOX_WIDTH;
    let bottom = BOX_TOP + BOX_HEIGHT;
    BoxModel {
        content: vec![left, BOX_TOP, right, BOX_TOP, right, bottom, left, bottom],
        width: BOX_WIDTH as u32,
        height: BOX_HEIGHT as u32,
    }
}

fn hit_test(x: f64, y: f64) -> Option<NodeId> {
    if !(BOX_TOP..=BOX_TOP + BOX_HEIGHT).contains(&y) || x < 0.0 {
        return None;
    }
    let node = NodeId((x / BOX_PITCH).floor() as u32);
    let offset = x - node.0 as f64 * BOX_PITCH;
    (offset <= BOX_WIDTH).then_some(node)
}

fn select(html: &Html, method: &str, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
    let parsed = Selector::parse(selector)
        .map_err(|e| BrowserError::protocol(method, format!("DOM Error while querying: {:?}", e)))?;
    let matches: Vec<ElementRef<'_>> = if scope == NodeId::DOCUMENT_ROOT {
        html.select(&parsed).collect()
    } else {
        let element = element_at(html, scope).ok_or_else(|| {
            let detail = format!("Could not find element with given id {}", scope);
            BrowserError::protocol(method, detail)
        })?;
        element
            .select(&parsed)
            .filter(|found| found.id() != element.id())
            .collect()
    };
    Ok(matches
        .iter()
        .filter_map(|element| node_id_of(html, element))
        .collect())
}

#[async_trait]
impl<P: FakePage> Session for FakeSession<P> {
    async fn enable_page(&self) -> Result<()> {
        let mut state = self.begin("Page.enable", ProtocolCall::EnablePage)?;
        state.page_enabled = true;
        Ok(())
    }

    async fn enable_dom(&self) -> Result<()> {
        self.begin("DOM.enable", ProtocolCall::EnableDom).map(drop)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.begin("Page.navigate", ProtocolCall::Navigate(url.to_string()))?;
        state.loaded = true;
        state.focused = None;
        if state.page_enabled {
            if let Some(sender) = state.pending_load.take() {
                let _ = sender.send(());
            }
        }
        Ok(())
    }

    fn load_event(&self) -> Result<LoadNotification> {
        let (sender, notification) = LoadNotification::channel();
        let mut state = self.state();
        state.pending_load = Some(sender);
        let listeners = Arc::clone(&state.load_listeners);
        listeners.fetch_add(1, Ordering::SeqCst);
        Ok(notification.on_release(move || {
            listeners.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    async fn get_document(&self) -> Result<NodeId> {
        let state = self.begin("DOM.getDocument", ProtocolCall::GetDocument)?;
        state.require_loaded()?;
        Ok(NodeId::DOCUMENT_ROOT)
    }

    async fn query_selector(&self, scope: NodeId, selector: &str) -> Result<u32> {
        let method = "DOM.querySelector";
        let call = ProtocolCall::QuerySelector {
            scope,
            selector: selector.to_string(),
        };
        let state = self.begin(method, call)?;
        state.require_loaded()?;
        let html = Html::parse_document(&state.page.render());
        let found = select(&html, method, scope, selector)?;
        Ok(found.first().map_or(0, |node| node.0))
    }

    async fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<u32>> {
        let method = "DOM.querySelectorAll";
        let call = ProtocolCall::QuerySelectorAll {
            scope,
            selector: selector.to_string(),
        };
        let state = self.begin(method, call)?;
        state.require_loaded()?;
        let html = Html::parse_document(&state.page.render());
        let found = select(&html, method, scope, selector)?;
        Ok(found.into_iter().map(|node| node.0).collect())
    }

    async fn focus(&self, node: &NodeDescriptor) -> Result<()> {
        let method = "DOM.focus";
        let mut state = self.begin(method, ProtocolCall::Focus(node.node_id))?;
        state.require_loaded()?;
        let html = Html::parse_document(&state.page.render());
        let focusable = element_at(&html, node.node_id).map_or(false, |element| {
            FOCUSABLE.contains(&element.value().name())
                || element.value().attr("tabindex").is_some()
        });
        if !focusable {
            return Err(BrowserError::protocol(method, "Element is not focusable"));
        }
        state.focused = Some(node.node_id);
        Ok(())
    }

    async fn get_box_model(&self, node: &NodeDescriptor) -> Result<BoxModel> {
        let state = self.begin("DOM.getBoxModel", ProtocolCall::GetBoxModel(node.node_id))?;
        state.require_loaded()?;
        let html = Html::parse_document(&state.page.render());
        element_at(&html, node.node_id)
            .filter(is_rendered)
            .map(|_| synthetic_box(node.node_id))
            .ok_or(BrowserError::NoBoxModel(node.node_id))
    }

    async fn get_outer_html(&self, node: &NodeDescriptor) -> Result<String> {
        let method = "DOM.getOuterHTML";
        let state = self.begin(method, ProtocolCall::GetOuterHtml(node.node_id))?;
        state.require_loaded()?;
        let html = Html::parse_document(&state.page.render());
        if node.node_id == NodeId::DOCUMENT_ROOT {
            return Ok(html.html());
        }
        if let Some(element) = element_at(&html, node.node_id) {
            return Ok(element.html());
        }
        text_at(&html, node.node_id).ok_or_else(|| {
            BrowserError::protocol(
                method,
                format!("Could not find node with given id {}", node.node_id),
            )
        })
    }

    async fn dispatch_key_event(&self, event: &KeyEvent) -> Result<()> {
        let call = ProtocolCall::KeyEvent(event.clone());
        let mut state = self.begin("Input.dispatchKeyEvent", call)?;
        if event.kind != KeyEventType::KeyDown || event.text.is_empty() {
            return Ok(());
        }
        let Some(focused) = state.focused else {
            return Ok(());
        };
        let html = Html::parse_document(&state.page.render());
        if let Some(element) = element_at(&html, focused) {
            state.page.key_down(element, &event.text);
        }
        Ok(())
    }

    async fn dispatch_mouse_event(&self, event: &MouseEvent) -> Result<()> {
        let mut state = self.begin(
            "Input.dispatchMouseEvent",
            ProtocolCall::MouseEvent(event.clone()),
        )?;
        if event.kind != MouseEventType::MousePressed {
            return Ok(());
        }
        let Some(target) = hit_test(event.x, event.y) else {
            return Ok(());
        };
        let html = Html::parse_document(&state.page.render());
        if let Some(element) = element_at(&html, target).filter(is_rendered) {
            state.page.mouse_pressed(element);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.begin("Target.closeTarget", ProtocolCall::Close)?;
        state.loaded = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_inverts_synthetic_box() {
        let model = synthetic_box(NodeId(12));
        let x = model.content[0] + 25.0;
        let y = model.content[1] + 8.0;
        assert_eq!(hit_test(x, y), Some(NodeId(12)));
        assert_eq!(hit_test(x + 40.0, y), None);
        assert_eq!(hit_test(x, 0.0), None);
    }

    #[test]
    fn todo_page_adds_and_toggles() {
        let mut page = TodoPage::default();
        page.draft = "ship it".to_string();
        let html = Html::parse_document(&page.render());
        let add = Selector::parse(r#"input[value="add"]"#).unwrap();
        page.mouse_pressed(html.select(&add).next().unwrap());
        assert_eq!(page.todos.len(), 3);
        assert!(page.draft.is_empty());

        let html = Html::parse_document(&page.render());
        let boxes = Selector::parse(r#"input[type="checkbox"]"#).unwrap();
        let third = html.select(&boxes).nth(2).unwrap();
        page.mouse_pressed(third);
        assert!(page.todos[2].done);
    }

    #[tokio::test]
    async fn load_fires_only_with_page_domain_enabled() {
        let session = FakeSession::new(StaticPage::new("<p></p>"));
        let notification = session.load_event().unwrap();
        session.navigate("about:blank").await.unwrap();
        // without Page.enable the sender is kept, so nothing arrives yet
        assert!(session.state().pending_load.is_some());
        drop(notification);

        session.enable_page().await.unwrap();
        let notification = session.load_event().unwrap();
        session.navigate("about:blank").await.unwrap();
        tokio_test::assert_ok!(notification.wait().await);
    }

    #[tokio::test]
    async fn fail_after_counts_successes() {
        let session =
            FakeSession::loaded(StaticPage::new("<p></p>")).fail_after("DOM.getDocument", 1);
        tokio_test::assert_ok!(session.get_document().await);
        tokio_test::assert_err!(session.get_document().await);
        assert_eq!(session.calls(), vec![ProtocolCall::GetDocument]);
    }
}
