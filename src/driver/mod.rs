//! Selector queries and simulated input on top of a protocol [`Session`].
//!
//! The driver is a thin borrowed view: it keeps no state of its own, so
//! one can be built wherever a session is at hand.

mod input;
mod query;

pub use input::click_point;

use crate::core::Session;
use crate::errors::Result;
use crate::types::{NodeId, NodeTarget};
use tracing::debug;

pub struct AutomationDriver<'s, S: Session + ?Sized> {
    session: &'s S,
}

impl<'s, S: Session + ?Sized> AutomationDriver<'s, S> {
    pub fn new(session: &'s S) -> Self {
        Self { session }
    }

    /// Fetch the document and return its root. Call after the load event,
    /// before the first scoped query.
    pub async fn document_root(&self) -> Result<NodeId> {
        let root = self.session.get_document().await?;
        debug!(root = %root, "document fetched");
        Ok(root)
    }

    /// Outer markup of a node, for assertions on the caller's side.
    pub async fn outer_html(&self, target: impl Into<NodeTarget>) -> Result<String> {
        let node = target.into().into_descriptor();
        self.session.get_outer_html(&node).await
    }
}

impl<S: Session + ?Sized> Clone for AutomationDriver<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Session + ?Sized> Copy for AutomationDriver<'_, S> {}
