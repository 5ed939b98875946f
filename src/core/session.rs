use crate::errors::{BrowserError, Result};
use crate::types::{BoxModel, KeyEvent, MouseEvent, NodeDescriptor, NodeId};
use async_trait::async_trait;
use std::fmt;
use tokio::sync::oneshot;

/// Protocol capabilities the driver needs from a connected browser.
///
/// Every method is a single remote round-trip. Implementations perform no
/// retries and never time out on their own.
#[async_trait]
pub trait Session: Send + Sync {
    /// Enable the Page domain so load events are emitted.
    async fn enable_page(&self) -> Result<()>;

    /// Enable the DOM domain so node ids stay stable.
    async fn enable_dom(&self) -> Result<()>;

    /// Start navigating the page. Does not wait for the load.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Subscribe to the next `Page.loadEventFired`. Subscribe before
    /// navigating, or the event may be missed.
    fn load_event(&self) -> Result<LoadNotification>;

    /// Fetch the document and return its root node id.
    async fn get_document(&self) -> Result<NodeId>;

    /// Raw protocol id of the first match under `scope`, 0 if none.
    async fn query_selector(&self, scope: NodeId, selector: &str) -> Result<u32>;

    /// Raw protocol ids of every match under `scope`, in document order.
    async fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<u32>>;

    async fn focus(&self, node: &NodeDescriptor) -> Result<()>;

    async fn get_box_model(&self, node: &NodeDescriptor) -> Result<BoxModel>;

    async fn get_outer_html(&self, node: &NodeDescriptor) -> Result<String>;

    async fn dispatch_key_event(&self, event: &KeyEvent) -> Result<()>;

    async fn dispatch_mouse_event(&self, event: &MouseEvent) -> Result<()>;

    /// Close the page target. The handle is unusable afterwards.
    async fn close(&self) -> Result<()>;
}

/// One-shot "document loaded" notification.
///
/// A release hook, if set, runs exactly once when the notification is
/// consumed by [`wait`](Self::wait) or dropped unawaited.
pub struct LoadNotification {
    receiver: oneshot::Receiver<()>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LoadNotification {
    /// Returns the notification and the sender the session fires once.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (sender, receiver) = oneshot::channel();
        let notification = Self {
            receiver,
            release: None,
        };
        (sender, notification)
    }

    /// Run `release` once this notification is finished with, e.g. to
    /// unregister the listener feeding it.
    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub async fn wait(mut self) -> Result<()> {
        (&mut self.receiver).await.map_err(|_| {
            BrowserError::NavigationFailed("session closed before the page loaded".to_string())
        })
    }
}

impl fmt::Debug for LoadNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadNotification")
            .field("released", &self.release.is_none())
            .finish()
    }
}

impl Drop for LoadNotification {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
