#[cfg(feature = "chrome")]
pub mod chrome;
#[cfg(feature = "chrome")]
mod commands;
pub mod navigation;

#[cfg(feature = "chrome")]
pub use chrome::ChromeSession;
pub use navigation::{NavigationManager, NavigationResult};
