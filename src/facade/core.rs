use super::memory::ScratchBuffer;
use crate::engine::{AlgoEngine, EngineFactory};
use crate::error::{CcaError, IaErr, Result};
use crate::types::{
    AeInputParams, AeResults, AiqParams, AiqResults, Aiqd, BinaryData, Cmc, DeviceId, DvsZoom,
    InitParams, LardInputParams, LtmInputParams, Mkn, MknTarget, Nvm, OutStats, PalInputParams,
    ProgramGroup, StatsParams, StatsQueryResults, TuningMode,
};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Lifecycle of the engine behind a facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeState {
    /// No engine exists yet, or it was torn down by `deinit`
    Unconstructed,
    /// Engine exists and accepts operations
    Active,
    /// Facade was dropped from the registry; terminal
    Released,
}

/// Outcome of PAL generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalStatus {
    Ran { size: u32 },
    /// Engine skipped PAL this cycle; output size was reset to zero
    NotRun,
}

/// Owner of the single algorithm engine for one (device, tuning mode) pair.
///
/// The engine is created on first use through the registry's factory and
/// every operation is a validated forward to it. Required output arguments are
/// `Option`s so that a missing destination is rejected with
/// [`CcaError::InvalidArgument`] before the engine is touched.
pub struct EngineFacade {
    device: DeviceId,
    mode: TuningMode,
    factory: Arc<dyn EngineFactory>,
    engine: Option<Box<dyn AlgoEngine>>,
    released: bool,
    engines_constructed: u64,
    operations_forwarded: u64,
}

impl EngineFacade {
    pub fn new(device: DeviceId, mode: TuningMode, factory: Arc<dyn EngineFactory>) -> Self {
        debug!("Creating engine facade for device {} mode {:?}", device, mode);
        Self {
            device,
            mode,
            factory,
            engine: None,
            released: false,
            engines_constructed: 0,
            operations_forwarded: 0,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device
    }

    pub fn tuning_mode(&self) -> TuningMode {
        self.mode
    }

    pub fn state(&self) -> FacadeState {
        if self.released {
            FacadeState::Released
        } else if self.engine.is_some() {
            FacadeState::Active
        } else {
            FacadeState::Unconstructed
        }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Number of engines this facade has built over its lifetime
    pub fn engine_constructions(&self) -> u64 {
        self.engines_constructed
    }

    /// Number of calls that reached an engine
    pub fn operations_forwarded(&self) -> u64 {
        self.operations_forwarded
    }

    pub fn init(&mut self, params: &InitParams) -> Result<()> {
        const OP: &str = "init";
        debug!(
            "Initializing engine for device {} mode {:?}, bitmap: {:#x}",
            self.device, self.mode, params.bitmap
        );

        let engine = self.engine(OP)?;
        let code = engine.init(params);
        let version = engine.version();
        info!(
            "Engine init for device {} mode {:?} returned {}, version: {}",
            self.device, self.mode, code, version
        );

        self.check(OP, code)
    }

    pub fn set_stats_params(
        &mut self,
        params: &StatsParams,
        out_stats: Option<&mut OutStats>,
    ) -> Result<()> {
        const OP: &str = "set_stats_params";
        let out_stats = self.require(OP, "out_stats", out_stats)?;

        let code = self.engine(OP)?.set_stats_params(params, out_stats);
        self.check(OP, code)
    }

    pub fn run_aec(
        &mut self,
        frame_id: u64,
        params: &AeInputParams,
        results: Option<&mut AeResults>,
    ) -> Result<()> {
        const OP: &str = "run_aec";
        let results = self.require(OP, "results", results)?;

        let code = self.engine(OP)?.run_aec(frame_id, params, results);
        self.check(OP, code)
    }

    pub fn run_aiq(
        &mut self,
        frame_id: u64,
        params: &AiqParams,
        results: Option<&mut AiqResults>,
    ) -> Result<()> {
        const OP: &str = "run_aiq";
        let results = self.require(OP, "results", results)?;

        let code = self.engine(OP)?.run_aiq(frame_id, params, results);
        self.check(OP, code)
    }

    pub fn run_ltm(&mut self, frame_id: u64, params: &LtmInputParams) -> Result<()> {
        const OP: &str = "run_ltm";
        let code = self.engine(OP)?.run_ltm(frame_id, params);
        self.check(OP, code)
    }

    pub fn update_zoom(&mut self, params: &DvsZoom) -> Result<()> {
        const OP: &str = "update_zoom";
        let code = self.engine(OP)?.update_zoom(params);
        self.check(OP, code)
    }

    pub fn run_dvs(&mut self, frame_id: u64) -> Result<()> {
        const OP: &str = "run_dvs";
        let code = self.engine(OP)?.run_dvs(frame_id);
        self.check(OP, code)
    }

    /// Generate PAL data for a frame.
    ///
    /// When the engine reports `NotRun`, `pal.size` is forced to zero so a
    /// skipped cycle looks the same as an empty one.
    pub fn run_aic(
        &mut self,
        frame_id: u64,
        params: Option<&PalInputParams>,
        pal: Option<&mut BinaryData>,
    ) -> Result<PalStatus> {
        const OP: &str = "run_aic";
        let params = self.require(OP, "params", params)?;
        let pal = self.require(OP, "pal", pal)?;

        let code = self.engine(OP)?.run_aic(frame_id, params, pal);
        if code == IaErr::NotRun {
            pal.size = 0;
            debug!(
                "PAL not run for device {} mode {:?} frame {}",
                self.device, self.mode, frame_id
            );
            return Ok(PalStatus::NotRun);
        }

        self.check(OP, code)?;
        debug!("PAL result size: {}", pal.size);
        Ok(PalStatus::Ran { size: pal.size })
    }

    pub fn get_cmc(&mut self, cmc: Option<&mut Cmc>) -> Result<()> {
        const OP: &str = "get_cmc";
        let cmc = self.require(OP, "cmc", cmc)?;

        let code = self.engine(OP)?.get_cmc(cmc);
        self.check(OP, code)
    }

    pub fn get_mkn(&mut self, target: MknTarget, mkn: Option<&mut Mkn>) -> Result<()> {
        const OP: &str = "get_mkn";
        let mkn = self.require(OP, "mkn", mkn)?;

        let code = self.engine(OP)?.get_mkn(target, mkn);
        self.check(OP, code)
    }

    pub fn get_aiqd(&mut self, aiqd: Option<&mut Aiqd>) -> Result<()> {
        const OP: &str = "get_aiqd";
        let aiqd = self.require(OP, "aiqd", aiqd)?;

        let code = self.engine(OP)?.get_aiqd(aiqd);
        self.check(OP, code)
    }

    pub fn update_tuning(
        &mut self,
        lard_tags: u8,
        lard_params: &LardInputParams,
        nvm: &Nvm,
    ) -> Result<()> {
        const OP: &str = "update_tuning";
        let code = self.engine(OP)?.update_tuning(lard_tags, lard_params, nvm);
        self.check(OP, code)
    }

    /// Deinitialize and destroy the engine. The next operation builds a new one.
    pub fn deinit(&mut self) -> Result<()> {
        self.ensure_live()?;

        match self.engine.take() {
            Some(mut engine) => {
                engine.deinit();
                self.operations_forwarded += 1;
                info!(
                    "Engine for device {} mode {:?} deinitialized and destroyed",
                    self.device, self.mode
                );
            }
            None => debug!(
                "deinit on device {} mode {:?} with no engine, nothing to do",
                self.device, self.mode
            ),
        }

        Ok(())
    }

    /// Decode a raw statistics buffer. `stats` carries both address and size.
    pub fn decode_stats(
        &mut self,
        stats: &[u8],
        results: Option<&mut StatsQueryResults>,
    ) -> Result<()> {
        const OP: &str = "decode_stats";
        trace!(
            "Decoding stats at {:p}, size: {}",
            stats.as_ptr(),
            stats.len()
        );
        let results = self.require(OP, "results", results)?;

        let code = self.engine(OP)?.decode_stats(stats, results);
        self.check(OP, code)
    }

    /// Size of the PAL output for `program_group`. Not a result code.
    pub fn pal_data_size(&mut self, program_group: &ProgramGroup) -> Result<u32> {
        let size = self.engine("pal_data_size")?.pal_size(program_group);
        debug!("PAL data size: {}", size);
        Ok(size)
    }

    /// Zero-initialized scratch memory owned by the caller.
    pub fn alloc_mem(&self, stream_id: i32, name: &str, index: i32, size: usize) -> ScratchBuffer {
        debug!(
            "Allocating {} bytes for {} (stream {}, index {}) on device {}",
            size, name, stream_id, index, self.device
        );
        ScratchBuffer::zeroed(stream_id, name, index, size)
    }

    /// Return scratch memory. `None` is accepted and ignored.
    pub fn free_mem(&self, buffer: Option<ScratchBuffer>) {
        match buffer {
            Some(buffer) => {
                trace!("Freeing scratch buffer {} ({} bytes)", buffer.name(), buffer.len());
                drop(buffer);
            }
            None => trace!("free_mem called without a buffer"),
        }
    }

    /// Destroy the engine without deinit and refuse all later operations.
    pub(crate) fn retire(&mut self) {
        if let Some(engine) = self.engine.take() {
            drop(engine);
            debug!(
                "Destroyed engine for device {} mode {:?}",
                self.device, self.mode
            );
        }
        self.released = true;
    }

    /// Get-or-create accessor for the engine
    fn engine(&mut self, operation: &'static str) -> Result<&mut Box<dyn AlgoEngine>> {
        self.ensure_live()?;

        let (device, mode) = (self.device, self.mode);
        let factory = &self.factory;
        let constructed = &mut self.engines_constructed;
        let engine = self.engine.get_or_insert_with(|| {
            info!(
                "Constructing engine for device {} mode {:?} on {}",
                device, mode, operation
            );
            *constructed += 1;
            factory.create(device, mode)
        });

        self.operations_forwarded += 1;
        Ok(engine)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            warn!(
                "Operation on released facade for device {} mode {:?}",
                self.device, self.mode
            );
            return Err(CcaError::Released {
                device: self.device,
                mode: self.mode,
            });
        }
        Ok(())
    }

    fn require<R>(
        &self,
        operation: &'static str,
        argument: &'static str,
        value: Option<R>,
    ) -> Result<R> {
        value.ok_or_else(|| {
            warn!("{}: {} is missing", operation, argument);
            CcaError::invalid_argument(operation, argument)
        })
    }

    fn check(&self, operation: &'static str, code: IaErr) -> Result<()> {
        debug!(
            "{} on device {} mode {:?} returned {}",
            operation, self.device, self.mode, code
        );
        if code.is_ok() {
            Ok(())
        } else {
            warn!(
                "{} failed on device {} mode {:?}: {}",
                operation, self.device, self.mode, code
            );
            Err(CcaError::Engine { operation, code })
        }
    }
}
