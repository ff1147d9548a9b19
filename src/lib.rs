pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod mock;
pub mod registry;
pub mod session;
pub mod types;

pub use config::CcaConfig;
pub use engine::{AlgoEngine, EngineFactory};
pub use error::{CcaError, IaErr, Result};
pub use facade::{EngineFacade, FacadeHandle, FacadeState, PalStatus, ScratchBuffer};
pub use mock::{MockEngine, MockEngineFactory, MockProbe};
pub use registry::{EngineRegistry, EngineRegistryBuilder, RegistryStatsSnapshot};
pub use session::{DrySession, PairReport};
pub use types::{DeviceId, TuningMode};
