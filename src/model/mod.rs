//! Plain data: coordinates, orders, records and notification payloads.

pub mod geo;
pub mod notification;
pub mod order;

pub use geo::*;
pub use notification::*;
pub use order::*;
