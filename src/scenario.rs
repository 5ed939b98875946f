//! End-to-end check of the todo-list sample on the AngularJS home page.

use crate::browser::NavigationManager;
use crate::core::config::ScenarioConfig;
use crate::core::Session;
use crate::dom::Markup;
use crate::driver::AutomationDriver;
use crate::errors::{BrowserError, Result};
use crate::types::{ClickOptions, KeyOptions, NodeId};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

const CONTAINER: &str = r#"div[app-run="todo.html"]"#;
const TEXT_FIELD: &str = r#"input[type="text"]"#;
const ADD_BUTTON: &str = r#"input[value="add"]"#;
const TODO_ITEMS: &str = r#"li[ng-repeat="todo in todoList.todos"]"#;
const COMPLETED: &str = ".done-true";

const EXPECTED_ITEMS: usize = 3;
const EXPECTED_COMPLETED: usize = 2;

#[derive(Debug, Clone)]
pub struct TodoScenario {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: String,
    pub url: String,
    pub item_count: usize,
    pub added_text: String,
    pub completed_count: usize,
    pub load_ms: u64,
}

impl Default for TodoScenario {
    fn default() -> Self {
        Self::from(&ScenarioConfig::default())
    }
}

impl From<&ScenarioConfig> for TodoScenario {
    fn from(config: &ScenarioConfig) -> Self {
        Self {
            url: config.url.clone(),
            text: config.todo_text.clone(),
        }
    }
}

impl TodoScenario {
    pub async fn run<S: Session + ?Sized>(&self, session: &S) -> Result<ScenarioReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("todo_scenario", run_id = %run_id, url = %self.url);
        self.steps(session, run_id).instrument(span).await
    }

    /// Run, then close the page and drop `session` whatever the outcome, so
    /// a launched browser is shut down before the caller reports.
    pub async fn run_and_close<S: Session>(&self, session: S) -> Result<ScenarioReport> {
        let outcome = self.run(&session).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close page");
        }
        drop(session);
        outcome
    }

    async fn steps<S: Session + ?Sized>(
        &self,
        session: &S,
        run_id: String,
    ) -> Result<ScenarioReport> {
        NavigationManager::prepare(session).await?;
        let navigation = NavigationManager::navigate_and_wait(session, &self.url).await?;

        let driver = AutomationDriver::new(session);
        let root = driver.document_root().await?;
        let todo = require(driver.query_selector(CONTAINER, Some(root)).await?, CONTAINER)?;
        let field = require(driver.query_selector(TEXT_FIELD, Some(todo)).await?, TEXT_FIELD)?;
        let button = require(driver.query_selector(ADD_BUTTON, Some(todo)).await?, ADD_BUTTON)?;

        driver.send_keys(field, &self.text, &KeyOptions::default()).await?;
        driver.click(button, &ClickOptions::default()).await?;
        info!(text = %self.text, "todo submitted");

        let items = driver.query_selector_all(TODO_ITEMS, Some(todo)).await?;
        expect_count("todo items", items.len(), EXPECTED_ITEMS)?;
        let third = items[EXPECTED_ITEMS - 1];

        let markup = Markup::parse_fragment(&driver.outer_html(third).await?);
        let added_text = markup.text("span")?.unwrap_or_default();
        if added_text != self.text {
            return Err(BrowserError::AssertionFailed(format!(
                "third item reads {:?}, expected {:?}",
                added_text, self.text
            )));
        }

        let checkbox = require(driver.query_selector("input", Some(third)).await?, "input")?;
        driver.click(checkbox, &ClickOptions::default()).await?;
        let checked = Markup::parse_fragment(&driver.outer_html(third).await?);
        expect_count("completion marks on the new item", checked.count(COMPLETED)?, 1)?;

        let completed = driver.query_selector_all(COMPLETED, None).await?;
        expect_count("completed items", completed.len(), EXPECTED_COMPLETED)?;
        info!(completed = completed.len(), "todo scenario passed");

        Ok(ScenarioReport {
            run_id,
            url: navigation.url,
            item_count: items.len(),
            added_text,
            completed_count: completed.len(),
            load_ms: navigation.duration_ms,
        })
    }
}

fn require(node: Option<NodeId>, selector: &str) -> Result<NodeId> {
    node.ok_or_else(|| BrowserError::AssertionFailed(format!("no element matches {}", selector)))
}

fn expect_count(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(BrowserError::AssertionFailed(format!(
            "expected {} {}, found {}",
            expected, what, actual
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, FakeSession, ProtocolCall, StaticPage, Todo, TodoPage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct TrackedPage {
        page: StaticPage,
        released: Arc<AtomicBool>,
    }

    impl FakePage for TrackedPage {
        fn render(&self) -> String {
            self.page.render()
        }
    }

    impl Drop for TrackedPage {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn todo_scenario_passes_against_todo_page() {
        let session = FakeSession::new(TodoPage::default());
        let scenario = TodoScenario::default();

        let report = scenario.run(&session).await.unwrap();

        assert_eq!(report.item_count, 3);
        assert_eq!(report.added_text, "write first protractor test");
        assert_eq!(report.completed_count, 2);
        assert_eq!(report.url, "https://angularjs.org/");
        session.with_page(|page| {
            assert_eq!(
                page.todos[2],
                Todo {
                    text: "write first protractor test".to_string(),
                    done: true,
                }
            );
        });
    }

    #[tokio::test]
    async fn typing_is_one_key_pair_per_character() {
        let session = FakeSession::new(TodoPage::default());
        let scenario = TodoScenario {
            text: "ab".to_string(),
            ..Default::default()
        };

        scenario.run(&session).await.unwrap();

        let keys: Vec<_> = session.key_events().into_iter().map(|e| e.text).collect();
        assert_eq!(keys, vec!["a", "a", "b", "b"]);
        // add button, then the new item's checkbox
        assert_eq!(session.mouse_events().len(), 4);
    }

    #[tokio::test]
    async fn domains_enabled_before_navigation() {
        let session = FakeSession::new(TodoPage::default());
        TodoScenario::default().run(&session).await.unwrap();

        let calls = session.calls();
        let navigate = calls
            .iter()
            .position(|call| matches!(call, ProtocolCall::Navigate(_)))
            .unwrap();
        assert!(calls[..navigate].contains(&ProtocolCall::EnablePage));
        assert!(calls[..navigate].contains(&ProtocolCall::EnableDom));
    }

    #[tokio::test]
    async fn missing_container_fails_the_scenario() {
        let session = FakeSession::new(StaticPage::new("<html><body><p>moved</p></body></html>"));
        let err = TodoScenario::default().run(&session).await.unwrap_err();

        assert!(matches!(err, BrowserError::AssertionFailed(ref msg) if msg.contains("app-run")));
    }

    #[tokio::test]
    async fn unexpected_item_count_fails_the_scenario() {
        let mut page = TodoPage::default();
        page.todos.pop();
        let session = FakeSession::new(page);

        let err = TodoScenario::default().run(&session).await.unwrap_err();
        assert!(matches!(
            err,
            BrowserError::AssertionFailed(ref msg) if msg.contains("todo items")
        ));
    }

    #[tokio::test]
    async fn protocol_failure_aborts_the_scenario() {
        let session = FakeSession::new(TodoPage::default()).fail_on("DOM.getBoxModel");
        let err = TodoScenario::default().run(&session).await.unwrap_err();

        assert!(err.is_protocol());
        session.with_page(|page| assert_eq!(page.todos.len(), 2));
    }

    #[tokio::test]
    async fn failed_run_still_releases_the_session() {
        let released = Arc::new(AtomicBool::new(false));
        let session = FakeSession::new(TrackedPage {
            page: StaticPage::new("<html><body><p>moved</p></body></html>"),
            released: released.clone(),
        });

        let err = TodoScenario::default()
            .run_and_close(session)
            .await
            .unwrap_err();

        assert!(matches!(err, BrowserError::AssertionFailed(_)));
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn new_item_is_marked_done_in_its_own_markup() {
        let session = FakeSession::new(TodoPage::default());
        TodoScenario::default().run(&session).await.unwrap();

        let reads = session
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ProtocolCall::GetOuterHtml(node) => Some(node),
                _ => None,
            })
            .collect::<Vec<_>>();
        // read once for the text, once more after the checkbox click
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0], reads[1]);
    }
}
