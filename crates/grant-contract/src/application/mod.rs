//! Application layer: orchestration of domain logic over the ports.

pub mod service;

pub use service::GrantContractService;
