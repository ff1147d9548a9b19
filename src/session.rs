use crate::config::CcaConfig;
use crate::error::Result;
use crate::facade::{FacadeHandle, PalStatus};
use crate::registry::EngineRegistry;
use crate::types::{
    AeInputParams, AeResults, AiqParams, AiqResults, BinaryData, DeviceId, LtmInputParams,
    OutStats, PalInputParams, ProgramGroup, StatsParams, StatsQueryResults, TuningMode,
};
use serde::Serialize;
use tracing::{debug, info};

/// Per-pair summary of a dry run
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub device: DeviceId,
    pub mode: TuningMode,
    pub frames: u64,
    pub pal_runs: u64,
    pub pal_skipped: u64,
    pub pal_bytes: u64,
    pub engines_constructed: u64,
}

/// Drives configured (device, mode) pairs through a frame loop against a registry.
pub struct DrySession<'a> {
    registry: &'a EngineRegistry,
    config: &'a CcaConfig,
}

impl<'a> DrySession<'a> {
    pub fn new(registry: &'a EngineRegistry, config: &'a CcaConfig) -> Self {
        Self { registry, config }
    }

    /// Acquire, init, run every frame, deinit, for each configured pair
    pub fn run(&self) -> Result<Vec<PairReport>> {
        let init_params = self.config.init_params()?;
        let mut reports = Vec::new();

        for &device in &self.config.pipeline.devices {
            for &mode in &self.config.pipeline.modes {
                let handle = self.registry.acquire(device, mode);
                handle.lock().init(&init_params)?;
                reports.push(self.drive(&handle)?);
                handle.lock().deinit()?;
            }
        }

        info!("Dry run finished for {} pairs", reports.len());
        Ok(reports)
    }

    fn drive(&self, handle: &FacadeHandle) -> Result<PairReport> {
        let pipeline = &self.config.pipeline;
        let mut facade = handle.lock();

        let program_group = ProgramGroup {
            kernel_uuids: vec![1, 2, 3],
        };
        let pal_capacity = facade.pal_data_size(&program_group)? as usize;
        let pal_params = PalInputParams {
            stream_id: 0,
            program_group,
            manual_sharpness: None,
        };

        let mut report = PairReport {
            device: handle.device_id(),
            mode: handle.tuning_mode(),
            frames: 0,
            pal_runs: 0,
            pal_skipped: 0,
            pal_bytes: 0,
            engines_constructed: 0,
        };

        for frame_id in 0..pipeline.frames {
            let stats_params = StatsParams {
                frame_id,
                frame_timestamp: frame_id * 33_333,
                sensor_width: 1920,
                sensor_height: 1080,
            };
            let mut out_stats = OutStats::default();
            facade.set_stats_params(&stats_params, Some(&mut out_stats))?;

            let mut ae = AeResults::default();
            facade.run_aec(frame_id, &AeInputParams::default(), Some(&mut ae))?;

            let mut aiq = AiqResults::default();
            facade.run_aiq(frame_id, &AiqParams::default(), Some(&mut aiq))?;
            facade.run_ltm(frame_id, &LtmInputParams::default())?;
            facade.run_dvs(frame_id)?;

            let mut pal = BinaryData::with_capacity(pal_capacity);
            match facade.run_aic(frame_id, Some(&pal_params), Some(&mut pal))? {
                PalStatus::Ran { size } => {
                    report.pal_runs += 1;
                    report.pal_bytes += size as u64;
                }
                PalStatus::NotRun => report.pal_skipped += 1,
            }

            let mut scratch = facade.alloc_mem(0, "stats", frame_id as i32, pipeline.scratch_bytes);
            scratch.fill(0x5a);
            let mut query = StatsQueryResults::default();
            facade.decode_stats(&scratch, Some(&mut query))?;
            facade.free_mem(Some(scratch));

            report.frames += 1;
        }

        report.engines_constructed = facade.engine_constructions();
        debug!(
            "Drove {} frames on device {} mode {:?}",
            report.frames, report.device, report.mode
        );
        Ok(report)
    }
}
