//! Provider Queries

/// 查询 provider 可用性
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckProviderHealth;
