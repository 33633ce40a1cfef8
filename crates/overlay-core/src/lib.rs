pub mod anchor;
pub mod config;
pub mod context_menu;
pub mod dismiss;
pub mod dom;
pub mod gate;
pub mod headless;
pub mod host;
pub mod menu;
pub mod wrapper;

pub use anchor::{AnchoredMenu, PagePoint};
pub use config::OverlayConfig;
pub use context_menu::{
    AnchorOverride, maybe_show_context_menu, open_context_menu_at, use_context_menu,
};
pub use dismiss::{DismissState, Dismissal, DismissalController};
pub use dom::{DomEvent, EventKind, Listener, ListenerTarget, NodeId, Phase, Platform, View};
pub use gate::GlobalMenuGate;
pub use headless::HeadlessDocument;
pub use host::{OverlayHandle, OverlayHost};
pub use menu::{ClickHandler, Menu, MenuClick, MenuDescriptor, MenuItem};
pub use wrapper::WithContextMenu;
