mod stats;
mod table;
#[cfg(test)]
mod tests;

pub use stats::{RegistryStats, RegistryStatsSnapshot};
pub use table::{EngineRegistry, EngineRegistryBuilder};
