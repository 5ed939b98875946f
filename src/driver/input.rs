use super::AutomationDriver;
use crate::core::Session;
use crate::errors::{BrowserError, Result};
use crate::types::{
    BoxModel, ClickOptions, KeyEvent, KeyEventType, KeyOptions, MouseEvent, MouseEventType,
    NodeTarget, Point,
};
use tracing::debug;

/// Where a click lands: the centre of the content box, floored to whole
/// pixels from the top-left corner, unless `options` pins an axis.
pub fn click_point(model: &BoxModel, options: &ClickOptions) -> Result<Point> {
    let quad = &model.content;
    if quad.len() < 8 {
        return Err(BrowserError::MalformedResponse(format!(
            "content quad has {} numbers, expected 8",
            quad.len()
        )));
    }
    let (left, top, right, bottom) = (quad[0], quad[1], quad[2], quad[5]);
    Ok(Point {
        x: options.x.unwrap_or(left + ((right - left) / 2.0).floor()),
        y: options.y.unwrap_or(top + ((bottom - top) / 2.0).floor()),
    })
}

impl<S: Session + ?Sized> AutomationDriver<'_, S> {
    /// Focus `target`, then type `text` one character at a time: key-down
    /// and key-up per character, each awaited before the next.
    ///
    /// Not atomic: on failure some leading characters may already have
    /// been delivered.
    pub async fn send_keys(
        &self,
        target: impl Into<NodeTarget>,
        text: &str,
        options: &KeyOptions,
    ) -> Result<()> {
        let node = target.into().into_descriptor();
        self.session.focus(&node).await?;
        debug!(node = %node.node_id, chars = text.chars().count(), "typing");

        for ch in text.chars() {
            let mut event = KeyEvent {
                kind: KeyEventType::KeyDown,
                text: ch.to_string(),
                options: options.clone(),
            };
            self.session.dispatch_key_event(&event).await?;
            event.kind = KeyEventType::KeyUp;
            self.session.dispatch_key_event(&event).await?;
        }
        Ok(())
    }

    /// Press and release the mouse over `target`.
    pub async fn click(&self, target: impl Into<NodeTarget>, options: &ClickOptions) -> Result<()> {
        let node = target.into().into_descriptor();
        let model = self.session.get_box_model(&node).await?;
        let point = click_point(&model, options)?;
        debug!(node = %node.node_id, x = point.x, y = point.y, "clicking");

        let mut event = MouseEvent {
            kind: MouseEventType::MousePressed,
            x: point.x,
            y: point.y,
            button: options.button,
            click_count: options.click_count,
            modifiers: options.modifiers,
        };
        self.session.dispatch_mouse_event(&event).await?;
        event.kind = MouseEventType::MouseReleased;
        self.session.dispatch_mouse_event(&event).await
    }
}
