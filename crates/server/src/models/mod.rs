//! Domain models backed by the three persistent tables.

pub mod message;
pub mod order;
pub mod user;

pub use message::StoredMessage;
pub use order::Order;
pub use user::User;
