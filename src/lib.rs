pub mod capability;
pub mod config;
pub mod intake;
pub mod observability;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod transport;
