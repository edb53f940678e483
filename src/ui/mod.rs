// UI module - view loading, page controllers and the Slint front-end
//
// This module contains:
// - Router: mounts one page at a time (markup, style, controller)
// - ProjectCleanser / QuickFind: the page controllers
// - Session: turns UI events into page actions, independent of any window
// - GuiController / WindowSurface: the Slint window the session drives
// - EventLoopBridge: coordinates between tokio and the Slint event loop

pub mod bridge;
pub mod controller;
pub mod loader;
pub mod pages;
pub mod session;
pub mod window;

pub use bridge::{ActionSet, EventLoopBridge, EventLoopBridgeHandle, PageBridge};
pub use controller::GuiController;
pub use loader::{LoaderError, Route, Router, StyleHandle, Surface, TemplateError, TemplateSource, Templates};
pub use pages::{ActionOutcome, ConfirmTicket, ProjectCleanser, QuickFind};
pub use session::{ActivePage, FrontEnd, PageRenderer, Session, UiEvent, build_router, templates};
pub use window::{WindowRenderer, WindowSurface};
