use crate::error::IaErr;
use crate::types::{
    AeInputParams, AeResults, AiqParams, AiqResults, Aiqd, BinaryData, Cmc, DeviceId, DvsZoom,
    InitParams, LardInputParams, LtmInputParams, Mkn, MknTarget, Nvm, OutStats, PalInputParams,
    ProgramGroup, StatsParams, StatsQueryResults, TuningMode,
};

/// Contract of a camera control algorithm (CCA) engine.
///
/// Implementations are heavyweight and stateful. Each call reports an
/// [`IaErr`] status; `IaErr::NotRun` is a legitimate outcome of
/// [`run_aic`](AlgoEngine::run_aic). Destroying the engine is `Drop`.
pub trait AlgoEngine: Send {
    fn init(&mut self, params: &InitParams) -> IaErr;

    /// Engine build/version string for logging
    fn version(&self) -> String;

    fn set_stats_params(&mut self, params: &StatsParams, out_stats: &mut OutStats) -> IaErr;

    fn run_aec(&mut self, frame_id: u64, params: &AeInputParams, results: &mut AeResults)
        -> IaErr;

    fn run_aiq(&mut self, frame_id: u64, params: &AiqParams, results: &mut AiqResults) -> IaErr;

    fn run_ltm(&mut self, frame_id: u64, params: &LtmInputParams) -> IaErr;

    fn update_zoom(&mut self, params: &DvsZoom) -> IaErr;

    fn run_dvs(&mut self, frame_id: u64) -> IaErr;

    /// Generate PAL data for the frame into `pal`, setting `pal.size`
    fn run_aic(&mut self, frame_id: u64, params: &PalInputParams, pal: &mut BinaryData) -> IaErr;

    fn get_cmc(&mut self, cmc: &mut Cmc) -> IaErr;

    fn get_mkn(&mut self, target: MknTarget, mkn: &mut Mkn) -> IaErr;

    fn get_aiqd(&mut self, aiqd: &mut Aiqd) -> IaErr;

    fn update_tuning(&mut self, lard_tags: u8, lard_params: &LardInputParams, nvm: &Nvm)
        -> IaErr;

    fn deinit(&mut self);

    fn decode_stats(&mut self, stats: &[u8], results: &mut StatsQueryResults) -> IaErr;

    /// Size in bytes of the PAL output for a program group
    fn pal_size(&mut self, program_group: &ProgramGroup) -> u32;
}

/// Constructs engines on behalf of the registry.
pub trait EngineFactory: Send + Sync {
    fn create(&self, device: DeviceId, mode: TuningMode) -> Box<dyn AlgoEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(DeviceId, TuningMode) -> Box<dyn AlgoEngine> + Send + Sync,
{
    fn create(&self, device: DeviceId, mode: TuningMode) -> Box<dyn AlgoEngine> {
        self(device, mode)
    }
}
