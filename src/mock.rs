use crate::engine::{AlgoEngine, EngineFactory};
use crate::error::IaErr;
use crate::types::{
    AeInputParams, AeResults, AiqParams, AiqResults, Aiqd, BinaryData, Cmc, DeviceId, DvsZoom,
    Exposure, InitParams, LardInputParams, LtmInputParams, Mkn, MknTarget, Nvm, OutStats,
    PalInputParams, ProgramGroup, StatsParams, StatsQueryResults, TuningMode,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Shared record of everything the mock engines built by one factory did.
#[derive(Debug, Default)]
pub struct MockProbe {
    calls: Mutex<HashMap<&'static str, u64>>,
    responses: Mutex<HashMap<&'static str, IaErr>>,
    events: Mutex<Vec<String>>,
    constructed: AtomicU64,
    dropped: AtomicU64,
    pal_size: AtomicU64,
}

impl MockProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every engine return `code` from `operation` until changed
    pub fn set_response(&self, operation: &'static str, code: IaErr) {
        self.responses.lock().insert(operation, code);
    }

    pub fn set_pal_size(&self, size: u32) {
        self.pal_size.store(size as u64, Ordering::Relaxed);
    }

    /// Number of times `operation` reached an engine
    pub fn calls(&self, operation: &str) -> u64 {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.lock().values().sum()
    }

    pub fn constructed(&self) -> u64 {
        self.constructed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Engines currently alive
    pub fn live(&self) -> u64 {
        self.constructed().saturating_sub(self.dropped())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, operation: &'static str) -> IaErr {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        self.responses
            .lock()
            .get(operation)
            .copied()
            .unwrap_or(IaErr::None)
    }

    fn push_event(&self, event: String) {
        self.events.lock().push(event);
    }
}

/// Deterministic stand-in for a real CCA engine.
pub struct MockEngine {
    id: u64,
    device: DeviceId,
    mode: TuningMode,
    probe: Arc<MockProbe>,
    initialized: bool,
    frames_processed: u64,
    zoom_ratio: f32,
}

impl MockEngine {
    pub fn new(device: DeviceId, mode: TuningMode, probe: Arc<MockProbe>) -> Self {
        let id = probe.constructed.fetch_add(1, Ordering::Relaxed);
        probe.push_event(format!("create:{}:{}:{:?}", id, device, mode));
        Self {
            id,
            device,
            mode,
            probe,
            initialized: false,
            frames_processed: 0,
            zoom_ratio: 1.0,
        }
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.probe.dropped.fetch_add(1, Ordering::Relaxed);
        self.probe.push_event(format!("drop:{}", self.id));
    }
}

impl AlgoEngine for MockEngine {
    fn init(&mut self, params: &InitParams) -> IaErr {
        let code = self.probe.record("init");
        self.probe
            .push_event(format!("init:{}:{:#x}", self.id, params.bitmap));
        if code.is_ok() {
            self.initialized = true;
        }
        code
    }

    fn version(&self) -> String {
        format!("mock-cca-{}", env!("CARGO_PKG_VERSION"))
    }

    fn set_stats_params(&mut self, params: &StatsParams, out_stats: &mut OutStats) -> IaErr {
        let code = self.probe.record("set_stats_params");
        let cells = (params.sensor_width / 64) as usize * (params.sensor_height / 64) as usize;
        out_stats.rgbs_grid = vec![0x80; cells];
        out_stats.hdr_rgbs = false;
        code
    }

    fn run_aec(&mut self, frame_id: u64, params: &AeInputParams, results: &mut AeResults) -> IaErr {
        let code = self.probe.record("run_aec");
        trace!("mock engine {} AEC frame {}", self.id, frame_id);
        let count = params.num_exposures.max(1) as usize;
        let exposure = Exposure {
            exposure_time_us: params.manual_exposure_time_us.unwrap_or(10_000),
            analog_gain: 1.0,
            digital_gain: 1.0,
            iso: params.manual_iso.unwrap_or(100),
        };
        results.exposures = vec![exposure; count];
        results.converged = self.frames_processed > 0;
        code
    }

    fn run_aiq(&mut self, frame_id: u64, params: &AiqParams, results: &mut AiqResults) -> IaErr {
        let code = self.probe.record("run_aiq");
        self.frames_processed += 1;
        results.frame_id = frame_id;
        results.awb_cct = params.manual_color_temperature.unwrap_or(5000);
        results.af_lens_position = params.manual_focus_distance_mm.unwrap_or(0) as i32;
        results.lsc_valid = params.lens_shading_enabled;
        results.gbce_valid = true;
        code
    }

    fn run_ltm(&mut self, _frame_id: u64, _params: &LtmInputParams) -> IaErr {
        self.probe.record("run_ltm")
    }

    fn update_zoom(&mut self, params: &DvsZoom) -> IaErr {
        let code = self.probe.record("update_zoom");
        self.zoom_ratio = params.digital_zoom_ratio;
        code
    }

    fn run_dvs(&mut self, _frame_id: u64) -> IaErr {
        self.probe.record("run_dvs")
    }

    fn run_aic(&mut self, frame_id: u64, params: &PalInputParams, pal: &mut BinaryData) -> IaErr {
        let code = self.probe.record("run_aic");
        // Even when it declines to run, the engine leaves its scratch size behind.
        let size = self.probe.pal_size.load(Ordering::Relaxed) as usize;
        if pal.data.len() < size {
            pal.data.resize(size, 0);
        }
        let fill = (frame_id as u8) ^ (params.stream_id as u8);
        pal.data[..size].iter_mut().for_each(|b| *b = fill);
        pal.size = size as u32;
        code
    }

    fn get_cmc(&mut self, cmc: &mut Cmc) -> IaErr {
        let code = self.probe.record("get_cmc");
        cmc.base_iso = 100;
        cmc.lsc_grid_size = (64, 48);
        cmc.color_temperatures = vec![2850, 4000, 5000, 6500];
        code
    }

    fn get_mkn(&mut self, target: MknTarget, mkn: &mut Mkn) -> IaErr {
        let code = self.probe.record("get_mkn");
        let tag = match target {
            MknTarget::Section1 => 1u8,
            MknTarget::Section2 => 2u8,
        };
        mkn.data = vec![tag, self.device as u8, self.mode as u8];
        code
    }

    fn get_aiqd(&mut self, aiqd: &mut Aiqd) -> IaErr {
        let code = self.probe.record("get_aiqd");
        aiqd.data = self.frames_processed.to_le_bytes().to_vec();
        code
    }

    fn update_tuning(&mut self, lard_tags: u8, _lard_params: &LardInputParams, _nvm: &Nvm) -> IaErr {
        let code = self.probe.record("update_tuning");
        self.probe
            .push_event(format!("update_tuning:{}:{:#x}", self.id, lard_tags));
        code
    }

    fn deinit(&mut self) {
        self.probe.record("deinit");
        self.probe.push_event(format!("deinit:{}", self.id));
        self.initialized = false;
    }

    fn decode_stats(&mut self, stats: &[u8], results: &mut StatsQueryResults) -> IaErr {
        let code = self.probe.record("decode_stats");
        results.rgbs_grid = !stats.is_empty();
        results.af_grid = stats.len() >= 64;
        results.histograms = stats.len() >= 256;
        results.y_histogram = results.histograms;
        code
    }

    fn pal_size(&mut self, program_group: &ProgramGroup) -> u32 {
        self.probe.record("pal_size");
        let configured = self.probe.pal_size.load(Ordering::Relaxed) as u32;
        configured.max(program_group.kernel_uuids.len() as u32 * 256)
    }
}

/// Factory handing out [`MockEngine`]s that all report into one probe.
#[derive(Clone)]
pub struct MockEngineFactory {
    probe: Arc<MockProbe>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::with_probe(MockProbe::new())
    }

    pub fn with_probe(probe: Arc<MockProbe>) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> Arc<MockProbe> {
        Arc::clone(&self.probe)
    }
}

impl Default for MockEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self, device: DeviceId, mode: TuningMode) -> Box<dyn AlgoEngine> {
        Box::new(MockEngine::new(device, mode, Arc::clone(&self.probe)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_counts_and_responses() {
        let factory = MockEngineFactory::new();
        let probe = factory.probe();
        let mut engine = factory.create(0, TuningMode::Video);

        assert_eq!(engine.init(&InitParams::default()), IaErr::None);
        probe.set_response("run_ltm", IaErr::Data);
        assert_eq!(engine.run_ltm(1, &LtmInputParams::default()), IaErr::Data);

        assert_eq!(probe.calls("init"), 1);
        assert_eq!(probe.calls("run_ltm"), 1);
        assert_eq!(probe.calls("run_dvs"), 0);
        assert_eq!(probe.total_calls(), 2);
    }

    #[test]
    fn test_mock_lifecycle_events() {
        let factory = MockEngineFactory::new();
        let probe = factory.probe();

        {
            let mut engine = factory.create(2, TuningMode::StillCapture);
            engine.deinit();
            assert_eq!(probe.live(), 1);
        }

        assert_eq!(probe.constructed(), 1);
        assert_eq!(probe.dropped(), 1);
        assert_eq!(
            probe.events(),
            vec![
                "create:0:2:StillCapture".to_string(),
                "deinit:0".to_string(),
                "drop:0".to_string()
            ]
        );
    }
}
