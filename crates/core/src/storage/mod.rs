//! Object storage for audit price screenshots, using Apache OpenDAL.
//!
//! Providers:
//! - Aliyun OSS (production)
//! - Local filesystem (development, tests)
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                Apache OpenDAL                 │
//! ├───────────────────────────────────────────────┤
//! │ op.read("key")         │ op.stat("key")       │
//! └───────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
