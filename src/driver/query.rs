use super::AutomationDriver;
use crate::core::Session;
use crate::errors::{BrowserError, Result};
use crate::types::NodeId;
use tracing::debug;

impl<S: Session + ?Sized> AutomationDriver<'_, S> {
    /// First element matching `selector` under `scope`, or the whole
    /// document when `scope` is `None`. No match is `Ok(None)`.
    pub async fn query_selector(
        &self,
        selector: &str,
        scope: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        let scope = scope.unwrap_or(NodeId::DOCUMENT_ROOT);
        let raw = self.session.query_selector(scope, selector).await?;
        let found = NodeId::from_protocol(raw);
        debug!(selector, scope = %scope, found = ?found, "querySelector");
        Ok(found)
    }

    /// Every element matching `selector` under `scope`, in document order.
    pub async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<NodeId>,
    ) -> Result<Vec<NodeId>> {
        let scope = scope.unwrap_or(NodeId::DOCUMENT_ROOT);
        let raw = self.session.query_selector_all(scope, selector).await?;
        let nodes = raw
            .into_iter()
            .map(|id| {
                NodeId::from_protocol(id).ok_or_else(|| {
                    BrowserError::MalformedResponse(format!(
                        "querySelectorAll({}) returned node id 0",
                        selector
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(selector, scope = %scope, count = nodes.len(), "querySelectorAll");
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::AutomationDriver;
    use crate::errors::BrowserError;
    use crate::testing::{FakeSession, ProtocolCall, StaticPage};
    use crate::types::NodeId;

    const LIST: &str = r#"<html><body>
        <ul id="first"><li class="item">a</li><li class="item">b</li></ul>
        <ul id="second"><li class="item">c</li></ul>
    </body></html>"#;

    fn session() -> FakeSession<StaticPage> {
        FakeSession::loaded(StaticPage::new(LIST))
    }

    #[tokio::test]
    async fn no_match_is_absent_and_empty() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        assert_eq!(driver.query_selector("table", None).await.unwrap(), None);
        assert!(driver.query_selector_all("table", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_matches_in_document_order_and_first_is_query_selector() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        let all = driver.query_selector_all("li.item", None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));

        let first = driver.query_selector("li.item", None).await.unwrap();
        assert_eq!(first, Some(all[0]));
    }

    #[tokio::test]
    async fn scope_limits_to_descendants() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        let second = driver.query_selector("#second", None).await.unwrap().unwrap();
        let scoped = driver.query_selector_all("li", Some(second)).await.unwrap();
        assert_eq!(scoped.len(), 1);

        let html = driver.outer_html(scoped[0]).await.unwrap();
        assert_eq!(html, r#"<li class="item">c</li>"#);
    }

    #[tokio::test]
    async fn missing_scope_defaults_to_document_root() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        driver.query_selector("ul", None).await.unwrap();
        driver.query_selector_all("ul", None).await.unwrap();

        assert_eq!(
            session.calls(),
            vec![
                ProtocolCall::QuerySelector {
                    scope: NodeId::DOCUMENT_ROOT,
                    selector: "ul".to_string(),
                },
                ProtocolCall::QuerySelectorAll {
                    scope: NodeId::DOCUMENT_ROOT,
                    selector: "ul".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn repeated_query_all_is_stable() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        let once = driver.query_selector_all("li", None).await.unwrap();
        let twice = driver.query_selector_all("li", None).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn query_before_load_is_protocol_error() {
        let session = FakeSession::new(StaticPage::new(LIST));
        let driver = AutomationDriver::new(&session);

        let err = driver.query_selector("li", None).await.unwrap_err();
        assert!(matches!(err, BrowserError::DocumentNotLoaded));
        assert!(err.is_protocol());
    }

    #[tokio::test]
    async fn protocol_failure_propagates_unchanged() {
        let session = session().fail_on("DOM.querySelectorAll");
        let driver = AutomationDriver::new(&session);

        let err = driver.query_selector_all("li", None).await.unwrap_err();
        assert!(matches!(
            err,
            BrowserError::Protocol { ref method, .. } if method == "DOM.querySelectorAll"
        ));
    }

    #[tokio::test]
    async fn unknown_scope_node_is_protocol_error() {
        let session = session();
        let driver = AutomationDriver::new(&session);

        let err = driver.query_selector("li", Some(NodeId(9_999))).await.unwrap_err();
        assert!(err.is_protocol());
    }
}
