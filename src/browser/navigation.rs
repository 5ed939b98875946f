use crate::core::Session;
use crate::errors::{BrowserError, Result};
use std::time::Instant;
use tracing::info;
use url::Url;

pub struct NavigationManager;

impl NavigationManager {
    /// Enable the Page and DOM domains. The two are independent, so both
    /// requests go out together; both must succeed before returning.
    pub async fn prepare<S: Session + ?Sized>(session: &S) -> Result<()> {
        tokio::try_join!(session.enable_page(), session.enable_dom())?;
        Ok(())
    }

    /// Navigate to `url` and wait for the page's load event. The
    /// subscription is made before the navigation starts. There is no
    /// timeout: a page that never loads keeps the caller waiting.
    pub async fn navigate_and_wait<S: Session + ?Sized>(
        session: &S,
        url: &str,
    ) -> Result<NavigationResult> {
        let target = Url::parse(url)
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {}", url, e)))?;
        let start_time = Instant::now();

        let loaded = session.load_event()?;
        session.navigate(target.as_str()).await?;
        loaded.wait().await?;

        let result = NavigationResult {
            url: target.to_string(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(url = %result.url, duration_ms = result.duration_ms, "page loaded");
        Ok(result)
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSession, ProtocolCall, StaticPage};

    #[tokio::test]
    async fn prepare_enables_both_domains() {
        let session = FakeSession::new(StaticPage::new("<p></p>"));
        NavigationManager::prepare(&session).await.unwrap();

        let calls = session.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&ProtocolCall::EnablePage));
        assert!(calls.contains(&ProtocolCall::EnableDom));
    }

    #[tokio::test]
    async fn prepare_fails_if_either_domain_fails() {
        let session = FakeSession::new(StaticPage::new("<p></p>")).fail_on("DOM.enable");
        let err = NavigationManager::prepare(&session).await.unwrap_err();
        assert!(err.is_protocol());
    }

    #[tokio::test]
    async fn waits_for_load_after_navigating() {
        let session = FakeSession::new(StaticPage::new("<p></p>"));
        NavigationManager::prepare(&session).await.unwrap();

        let result = NavigationManager::navigate_and_wait(&session, "https://example.test")
            .await
            .unwrap();

        assert_eq!(result.url, "https://example.test/");
        assert_eq!(
            session.calls().last(),
            Some(&ProtocolCall::Navigate("https://example.test/".to_string()))
        );
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_the_browser() {
        let session = FakeSession::new(StaticPage::new("<p></p>"));
        let err = NavigationManager::navigate_and_wait(&session, "not a url")
            .await
            .unwrap_err();

        assert!(matches!(err, BrowserError::NavigationFailed(_)));
        assert!(session.calls().is_empty());
    }

    #[tokio::test]
    async fn repeated_navigations_release_their_load_listeners() {
        let session = FakeSession::new(StaticPage::new("<p></p>"));
        NavigationManager::prepare(&session).await.unwrap();

        for url in ["https://example.test/a", "https://example.test/b"] {
            tokio_test::assert_ok!(NavigationManager::navigate_and_wait(&session, url).await);
        }
        assert_eq!(session.load_listeners(), 0);
    }

    #[tokio::test]
    async fn failed_navigation_releases_its_load_listener() {
        let session = FakeSession::new(StaticPage::new("<p></p>")).fail_on("Page.navigate");
        NavigationManager::prepare(&session).await.unwrap();

        let err = NavigationManager::navigate_and_wait(&session, "https://example.test")
            .await
            .unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(session.load_listeners(), 0);
    }
}
