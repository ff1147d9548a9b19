use crate::types::{DeviceId, InitParams, TuningMode};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CcaConfig {
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Bitmap of algorithms to enable at init
    #[serde(default = "default_init_bitmap")]
    pub init_bitmap: u32,

    /// Frame use passed at init
    #[serde(default = "default_frame_use")]
    pub frame_use: u32,

    /// Path to the AIQB tuning file (optional)
    pub aiqb_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    /// Devices to drive
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceId>,

    /// Tuning modes to drive on every device
    #[serde(default = "default_modes")]
    pub modes: Vec<TuningMode>,

    /// Frames to run per (device, mode)
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// Scratch allocation per frame in bytes
    #[serde(default = "default_scratch_bytes")]
    pub scratch_bytes: usize,
}

impl CcaConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("cca.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("engine.init_bitmap", default_init_bitmap() as i64)?
            .set_default("engine.frame_use", default_frame_use() as i64)?
            .set_default(
                "pipeline.devices",
                default_devices()
                    .into_iter()
                    .map(i64::from)
                    .collect::<Vec<_>>(),
            )?
            .set_default(
                "pipeline.modes",
                default_modes()
                    .iter()
                    .map(|mode| format!("{:?}", mode))
                    .collect::<Vec<_>>(),
            )?
            .set_default("pipeline.frames", default_frames() as i64)?
            .set_default("pipeline.scratch_bytes", default_scratch_bytes() as i64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with CCA_ prefix
            .add_source(
                Environment::with_prefix("CCA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: CcaConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.init_bitmap == 0 {
            return Err(ConfigError::Message(
                "Engine init_bitmap must enable at least one algorithm".to_string(),
            ));
        }

        if self.pipeline.devices.is_empty() {
            return Err(ConfigError::Message(
                "Pipeline devices must not be empty".to_string(),
            ));
        }

        if self.pipeline.devices.iter().any(|device| *device < 0) {
            return Err(ConfigError::Message(
                "Pipeline device ids must not be negative".to_string(),
            ));
        }

        if self.pipeline.modes.is_empty() {
            return Err(ConfigError::Message(
                "Pipeline modes must not be empty".to_string(),
            ));
        }

        if self.pipeline.frames == 0 {
            return Err(ConfigError::Message(
                "Pipeline frames must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build engine init parameters, reading the AIQB file if one is configured
    pub fn init_params(&self) -> std::io::Result<InitParams> {
        let aiqb = match &self.engine.aiqb_path {
            Some(path) => {
                debug!("Reading AIQB tuning data from {}", path);
                std::fs::read(path)?
            }
            None => Vec::new(),
        };

        Ok(InitParams {
            bitmap: self.engine.init_bitmap,
            frame_use: self.engine.frame_use,
            aiqb,
            ..Default::default()
        })
    }
}

impl Default for CcaConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                init_bitmap: default_init_bitmap(),
                frame_use: default_frame_use(),
                aiqb_path: None,
            },
            pipeline: PipelineConfig {
                devices: default_devices(),
                modes: default_modes(),
                frames: default_frames(),
                scratch_bytes: default_scratch_bytes(),
            },
        }
    }
}

// Default value functions
fn default_init_bitmap() -> u32 {
    0x3f
}
fn default_frame_use() -> u32 {
    1
}

fn default_devices() -> Vec<DeviceId> {
    vec![0]
}
fn default_modes() -> Vec<TuningMode> {
    vec![TuningMode::Video]
}
fn default_frames() -> u64 {
    30
}
fn default_scratch_bytes() -> usize {
    4096
}
