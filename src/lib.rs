pub mod browser;
pub mod core;
pub mod dom;
pub mod driver;
pub mod errors;
pub mod scenario;
pub mod testing;
pub mod types;

#[cfg(feature = "chrome")]
pub use crate::browser::ChromeSession;
pub use crate::browser::{NavigationManager, NavigationResult};
pub use crate::core::{Config, LoadNotification, Session};
pub use crate::dom::Markup;
pub use crate::driver::AutomationDriver;
pub use crate::errors::{BrowserError, Result};
pub use crate::scenario::{ScenarioReport, TodoScenario};
pub use crate::types::*;
