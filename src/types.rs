//! Identifiers and the typed request/response structures exchanged with an
//! algorithm engine. The registry never interprets these; they are carried
//! through to the engine untouched.

use serde::{Deserialize, Serialize};

/// Capture device identifier
pub type DeviceId = i32;

/// Tuning mode selecting the calibration and algorithm profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TuningMode {
    Video,
    VideoUll,
    VideoCustomAic,
    VideoLl,
    VideoRearView,
    VideoHitchView,
    StillCapture,
}

impl TuningMode {
    pub const ALL: [TuningMode; 7] = [
        TuningMode::Video,
        TuningMode::VideoUll,
        TuningMode::VideoCustomAic,
        TuningMode::VideoLl,
        TuningMode::VideoRearView,
        TuningMode::VideoHitchView,
        TuningMode::StillCapture,
    ];

    pub fn is_video(&self) -> bool {
        !matches!(self, TuningMode::StillCapture)
    }
}

/// Engine initialization parameters
#[derive(Debug, Clone, Default)]
pub struct InitParams {
    /// Bitmap of algorithms to enable
    pub bitmap: u32,
    pub frame_use: u32,
    /// Tuning (AIQB) blob
    pub aiqb: Vec<u8>,
    /// Sensor NVM calibration data
    pub nvm: Nvm,
    /// Streams the PAL stage will be run for
    pub aic_stream_ids: Vec<i32>,
}

/// Statistics configuration for the next frames
#[derive(Debug, Clone, Default)]
pub struct StatsParams {
    pub frame_id: u64,
    pub frame_timestamp: u64,
    pub sensor_width: u32,
    pub sensor_height: u32,
}

/// Statistics produced while applying stats parameters
#[derive(Debug, Clone, Default)]
pub struct OutStats {
    pub rgbs_grid: Vec<u8>,
    pub hdr_rgbs: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AeInputParams {
    pub frame_use: u32,
    pub num_exposures: u8,
    pub ev_shift: f32,
    pub manual_exposure_time_us: Option<u32>,
    pub manual_iso: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Exposure {
    pub exposure_time_us: u32,
    pub analog_gain: f32,
    pub digital_gain: f32,
    pub iso: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AeResults {
    pub exposures: Vec<Exposure>,
    pub converged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AiqParams {
    pub frame_use: u32,
    pub manual_color_temperature: Option<u32>,
    pub manual_focus_distance_mm: Option<u32>,
    pub lens_shading_enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AiqResults {
    pub frame_id: u64,
    pub af_lens_position: i32,
    pub awb_cct: u32,
    pub lsc_valid: bool,
    pub gbce_valid: bool,
}

/// Local tone mapping inputs
#[derive(Debug, Clone, Default)]
pub struct LtmInputParams {
    pub frame_use: u32,
    pub ev_shift: f32,
    pub ltm_strength: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Digital zoom update for video stabilization
#[derive(Debug, Clone, Default)]
pub struct DvsZoom {
    pub digital_zoom_ratio: f32,
    pub zoom_region: Rect,
    pub zoom_center: (i32, i32),
}

/// Kernel set the PAL stage generates parameters for
#[derive(Debug, Clone, Default)]
pub struct ProgramGroup {
    pub kernel_uuids: Vec<u32>,
}

/// Inputs for parameter abstraction layer (PAL) generation
#[derive(Debug, Clone, Default)]
pub struct PalInputParams {
    pub stream_id: i32,
    pub program_group: ProgramGroup,
    pub manual_sharpness: Option<u8>,
}

/// Output buffer with a valid-bytes count, as written by the engine
#[derive(Debug, Clone, Default)]
pub struct BinaryData {
    pub data: Vec<u8>,
    pub size: u32,
}

impl BinaryData {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            size: 0,
        }
    }

    /// Bytes the engine marked as valid
    pub fn valid(&self) -> &[u8] {
        let len = (self.size as usize).min(self.data.len());
        &self.data[..len]
    }
}

/// Camera module calibration (CMC) summary
#[derive(Debug, Clone, Default)]
pub struct Cmc {
    pub base_iso: u32,
    pub lsc_grid_size: (u16, u16),
    pub color_temperatures: Vec<u32>,
}

/// Makernote section to retrieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MknTarget {
    Section1,
    Section2,
}

/// Makernote blob
#[derive(Debug, Clone, Default)]
pub struct Mkn {
    pub data: Vec<u8>,
}

/// AIQ persistent data blob
#[derive(Debug, Clone, Default)]
pub struct Aiqd {
    pub data: Vec<u8>,
}

/// Mode tags for a LARD tuning update
#[derive(Debug, Clone, Copy, Default)]
pub struct LardInputParams {
    pub cmc_mode_tag: u32,
    pub aiq_mode_tag: u32,
    pub isp_mode_tag: u32,
    pub others_mode_tag: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Nvm {
    pub data: Vec<u8>,
}

/// Which statistics a decoded buffer contained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQueryResults {
    pub rgbs_grid: bool,
    pub af_grid: bool,
    pub histograms: bool,
    pub y_histogram: bool,
}
