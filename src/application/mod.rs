// Application layer - the meeting ledger and the views it hands to clients.

pub mod error;
pub mod report;
pub mod service;

pub use error::*;
pub use report::*;
pub use service::*;
