use super::commands::{
    box_model_error, DispatchKeyEvent, DispatchMouseEvent, DomEnable, Focus, GetBoxModel,
    GetDocument, GetOuterHtml, Navigate, NodeParams, PageEnable, QuerySelector, QuerySelectorAll,
};
use crate::core::config::ConnectionConfig;
use crate::core::{LoadNotification, Session};
use crate::errors::{BrowserError, Result};
use crate::types::{BoxModel, KeyEvent, MouseEvent, NodeDescriptor, NodeId};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// A page target of a Chrome instance driven through headless_chrome.
pub struct ChromeSession {
    // keeps the connection (and a launched process) alive
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    /// Attach to `connection.ws_url` when set, otherwise let headless_chrome
    /// launch a browser, then open a fresh tab.
    pub fn open(connection: &ConnectionConfig) -> Result<Self> {
        let browser = match &connection.ws_url {
            Some(ws_url) => {
                info!(ws_url = %ws_url, "connecting to running browser");
                Browser::connect(ws_url.clone())
                    .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?
            }
            None => launch(connection)?,
        };

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

fn launch(connection: &ConnectionConfig) -> Result<Browser> {
    let window_size_arg = format!(
        "--window-size={},{}",
        connection.viewport.width, connection.viewport.height
    );

    let mut args = vec![
        OsStr::new("--no-sandbox"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new(&window_size_arg),
    ];

    for arg in &connection.args {
        args.push(OsStr::new(arg));
    }

    let launch_options = LaunchOptions::default_builder()
        .headless(connection.headless)
        .args(args)
        .build()
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    info!(headless = connection.headless, "launching browser");
    Browser::new(launch_options).map_err(|e| BrowserError::LaunchFailed(e.to_string()))
}

#[async_trait]
impl Session for ChromeSession {
    async fn enable_page(&self) -> Result<()> {
        self.tab
            .call_method(PageEnable {})
            .map_err(|e| BrowserError::protocol("Page.enable", e))?;
        Ok(())
    }

    async fn enable_dom(&self) -> Result<()> {
        self.tab
            .call_method(DomEnable {})
            .map_err(|e| BrowserError::protocol("DOM.enable", e))?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let reply = self
            .tab
            .call_method(Navigate {
                url: url.to_string(),
            })
            .map_err(|e| BrowserError::protocol("Page.navigate", e))?;

        if let Some(error_text) = reply.error_text {
            return Err(BrowserError::NavigationFailed(error_text));
        }
        debug!(url, frame = %reply.frame_id, "navigation started");
        Ok(())
    }

    fn load_event(&self) -> Result<LoadNotification> {
        let (sender, notification) = LoadNotification::channel();
        let sender = Mutex::new(Some(sender));

        let listener = self
            .tab
            .add_event_listener(Arc::new(move |event: &Event| {
                if let Event::PageLoadEventFired(_) = event {
                    let pending = sender.lock().unwrap_or_else(PoisonError::into_inner).take();
                    if let Some(sender) = pending {
                        let _ = sender.send(());
                    }
                }
            }))
            .map_err(|e| BrowserError::protocol("Page.loadEventFired", e))?;

        let tab = Arc::clone(&self.tab);
        Ok(notification.on_release(move || {
            if let Err(e) = tab.remove_event_listener(&listener) {
                warn!(error = %e, "failed to remove load listener");
            }
        }))
    }

    async fn get_document(&self) -> Result<NodeId> {
        let reply = self
            .tab
            .call_method(GetDocument { depth: 0 })
            .map_err(|e| BrowserError::protocol("DOM.getDocument", e))?;
        Ok(NodeId(reply.root.node_id))
    }

    async fn query_selector(&self, scope: NodeId, selector: &str) -> Result<u32> {
        let reply = self
            .tab
            .call_method(QuerySelector {
                node_id: scope.0,
                selector: selector.to_string(),
            })
            .map_err(|e| BrowserError::protocol("DOM.querySelector", e))?;
        Ok(reply.node_id)
    }

    async fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<u32>> {
        let reply = self
            .tab
            .call_method(QuerySelectorAll {
                node_id: scope.0,
                selector: selector.to_string(),
            })
            .map_err(|e| BrowserError::protocol("DOM.querySelectorAll", e))?;
        Ok(reply.node_ids)
    }

    async fn focus(&self, node: &NodeDescriptor) -> Result<()> {
        self.tab
            .call_method(Focus(NodeParams::from(node)))
            .map_err(|e| BrowserError::protocol("DOM.focus", e))?;
        Ok(())
    }

    async fn get_box_model(&self, node: &NodeDescriptor) -> Result<BoxModel> {
        let reply = self
            .tab
            .call_method(GetBoxModel(NodeParams::from(node)))
            .map_err(|e| box_model_error(node.node_id, e))?;
        Ok(BoxModel {
            content: reply.model.content,
            width: reply.model.width,
            height: reply.model.height,
        })
    }

    async fn get_outer_html(&self, node: &NodeDescriptor) -> Result<String> {
        let reply = self
            .tab
            .call_method(GetOuterHtml(NodeParams::from(node)))
            .map_err(|e| BrowserError::protocol("DOM.getOuterHTML", e))?;
        Ok(reply.outer_html)
    }

    async fn dispatch_key_event(&self, event: &KeyEvent) -> Result<()> {
        let modifiers = event.options.modifiers;
        self.tab
            .call_method(DispatchKeyEvent {
                kind: event.kind,
                text: event.text.clone(),
                modifiers: (!modifiers.is_empty()).then(|| modifiers.bits()),
                auto_repeat: event.options.auto_repeat,
                is_keypad: event.options.is_keypad,
                location: event.options.location,
            })
            .map_err(|e| BrowserError::protocol("Input.dispatchKeyEvent", e))?;
        Ok(())
    }

    async fn dispatch_mouse_event(&self, event: &MouseEvent) -> Result<()> {
        self.tab
            .call_method(DispatchMouseEvent {
                kind: event.kind,
                x: event.x,
                y: event.y,
                button: event.button,
                click_count: event.click_count,
                modifiers: (!event.modifiers.is_empty()).then(|| event.modifiers.bits()),
            })
            .map_err(|e| BrowserError::protocol("Input.dispatchMouseEvent", e))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.tab
            .close(true)
            .map_err(|e| BrowserError::protocol("Page.close", e))?;
        Ok(())
    }
}
