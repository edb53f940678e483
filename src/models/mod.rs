//! Data models for the Pandorust front-end.
//!
//! This module contains all the core data structures used throughout the application:
//! - [`rpc`]: the backend request/response contract ([`RpcRequest`], [`RpcResponse`], [`RowRecord`])
//! - [`CleanserState`]: view-model of the project cleanser page (rows, selection, confirmation)
//! - [`QuickFindState`]: view-model of the quick-find page
//! - [`AppSettings`] and [`Preferences`]: settings loaded at startup and the persisted theme
//!
//! Page state is never shared between pages; each mounted page owns its state through a
//! [`StateManager`](crate::state::StateManager).

pub mod cleanser;
pub mod config;
pub mod quick_find;
pub mod rpc;

pub use cleanser::{
    CleanPhase, CleanserChange, CleanserControls, CleanserState, PendingConfirmation, ScanPhase,
    Summary, Tone,
};
pub use config::{AppSettings, BackendSettings, LoggingSettings, Preferences, Theme};
pub use quick_find::{QuickFindChange, QuickFindControls, QuickFindState};
pub use rpc::{
    ProjectType, QuickFindRequest, QuickFindResponse, RowRecord, RpcRequest, RpcResponse,
    ScanRequest, ScanResponse,
};
