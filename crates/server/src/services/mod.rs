//! Business services on top of the repositories.

pub mod flow;
pub mod notify;

pub use flow::OrderFlowService;
pub use notify::Notifier;
