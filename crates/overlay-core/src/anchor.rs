//! Positions a menu at a page coordinate.
//!
//! Renders a zero-size, absolutely positioned anchor at `(x, y)` with the
//! dropdown attached to it. The dropdown is always visible; closing is the
//! dismissal controller's job, not the dropdown's own click toggle.

use crate::config::OverlayConfig;
use crate::dom::{Position, Style, View};
use crate::menu::{ClickHandler, Menu};

/// A point in page coordinates (`MouseEvent.pageX/pageY`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

impl PagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub struct AnchoredMenu {
    pub menu: Menu,
    pub at: PagePoint,
    /// Runs after any item's own handlers when an item is selected.
    pub after_select: Option<ClickHandler>,
}

impl AnchoredMenu {
    pub fn new(menu: Menu, at: PagePoint) -> Self {
        Self {
            menu,
            at,
            after_select: None,
        }
    }

    pub fn after_select(mut self, handler: ClickHandler) -> Self {
        self.after_select = Some(handler);
        self
    }

    pub fn render(&self, config: &OverlayConfig) -> View {
        let anchor_style = Style {
            position: Some(Position::Absolute),
            left: Some(self.at.x),
            top: Some(self.at.y),
            width: Some(0.0),
            height: Some(0.0),
            z_index: None,
        };
        View::new("div")
            .class(&config.anchor_class)
            .style(anchor_style)
            .child(
                View::new("div")
                    .class("ant-dropdown")
                    .class(&config.overlay_class)
                    .child(self.menu.render(self.after_select.clone())),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuItem;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchor_sits_at_page_point_with_zero_size() {
        let config = OverlayConfig::default();
        let view = AnchoredMenu::new(
            Menu::new().item(MenuItem::action("copy", "Copy")),
            PagePoint::new(120.0, 48.0),
        )
        .render(&config);

        assert!(view.has_class("context-menu-anchor"));
        assert_eq!(view.style.position, Some(Position::Absolute));
        assert_eq!((view.style.left, view.style.top), (Some(120.0), Some(48.0)));
        assert_eq!((view.style.width, view.style.height), (Some(0.0), Some(0.0)));

        let dropdown = &view.children[0];
        assert!(dropdown.has_class("context-menu-overlay"));
        assert_eq!(dropdown.children[0].children[0].text.as_deref(), Some("Copy"));
    }
}
