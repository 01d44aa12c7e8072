//! 应用层 - 查询（读操作）

mod provider_queries;

pub mod handlers;

pub use provider_queries::*;
