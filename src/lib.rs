// src/lib.rs
pub mod arena;
pub mod buffer;
pub mod config;
pub mod conn;
pub mod error;
pub mod http;
pub mod logging;
pub mod module;
pub mod parser;
pub mod reactor;
pub mod response;
pub mod signal;
pub mod slab;
pub mod supervisor;
pub mod syscalls;
pub mod worker;

// Re-exports for users
pub use config::Config;
pub use error::{CrateError, Result};
pub use http::{Method, Request, Version};
pub use module::{EchoModule, Module, ModuleChain, Outcome};
pub use response::Response;
pub use supervisor::Supervisor;
