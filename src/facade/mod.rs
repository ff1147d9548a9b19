mod core;
mod handle;
mod memory;

pub use self::core::{EngineFacade, FacadeState, PalStatus};
pub use handle::FacadeHandle;
pub use memory::ScratchBuffer;
