//! Processing and worker configuration

use ow_frame::{validate_std, Dimensions, Interpolation, Result, IDENTITY_MEAN, IDENTITY_STD};
use ow_jpeg::EncodeConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inference preprocessing settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PreprocessConfig {
    /// Output geometry; `None` keeps the source size
    pub target: Option<Dimensions>,
    /// Scale to [0, 1] floats and apply mean/std
    pub normalize: bool,
    /// Swap BGR to RGB (3-channel frames only)
    pub rgb_conversion: bool,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub interpolation: Interpolation,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target: Some(Dimensions::new(640, 640)),
            normalize: true,
            rgb_conversion: true,
            mean: IDENTITY_MEAN,
            std: IDENTITY_STD,
            interpolation: Interpolation::Linear,
        }
    }
}

impl PreprocessConfig {
    /// Resize-only settings: no color swap, 8-bit output
    pub fn resize_only(width: i32, height: i32) -> Self {
        Self {
            target: Some(Dimensions::new(width, height)),
            normalize: false,
            rgb_conversion: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.target {
            target.validate()?;
        }
        if self.normalize {
            validate_std(&self.std)?;
        }
        Ok(())
    }
}

/// Frame processor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcessorConfig {
    /// Batch map workers; 0 = available parallelism, 1 = sequential batches
    pub num_threads: usize,
    /// Idle encoders kept for reuse; 0 = one per worker
    pub encoder_pool_capacity: usize,
}

impl ProcessorConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    pub fn resolved_threads(&self) -> usize {
        resolve_threads(self.num_threads)
    }

    pub fn resolved_encoder_capacity(&self) -> usize {
        if self.encoder_pool_capacity > 0 {
            self.encoder_pool_capacity
        } else {
            self.resolved_threads()
        }
    }
}

/// Thread pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Worker threads; 0 = available parallelism
    pub num_threads: usize,
    /// Maximum queued (not yet running) tasks; `None` = unbounded
    pub queue_capacity: Option<usize>,
}

impl PoolConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            queue_capacity: None,
        }
    }

    pub fn resolved_threads(&self) -> usize {
        resolve_threads(self.num_threads)
    }
}

/// One frame operation, as applied by the batch entry points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    Resize {
        width: i32,
        height: i32,
        interpolation: Interpolation,
    },
    Preprocess(PreprocessConfig),
    Encode(EncodeConfig),
    PreprocessAndEncode(PreprocessConfig, EncodeConfig),
}

impl Operation {
    /// Whether the operation needs an encoder
    pub fn encodes(&self) -> bool {
        matches!(
            self,
            Operation::Encode(_) | Operation::PreprocessAndEncode(..)
        )
    }
}

fn resolve_threads(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ow_frame::FrameError;

    #[test]
    fn test_preprocess_defaults() {
        let config = PreprocessConfig::default();
        assert_eq!(config.target, Some(Dimensions::new(640, 640)));
        assert!(config.normalize);
        assert!(config.rgb_conversion);
        assert_eq!(config.interpolation, Interpolation::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preprocess_validation() {
        let bad_target = PreprocessConfig {
            target: Some(Dimensions::new(0, 320)),
            ..PreprocessConfig::default()
        };
        assert!(matches!(
            bad_target.validate(),
            Err(FrameError::Configuration(_))
        ));

        let bad_std = PreprocessConfig {
            std: [1.0, 1.0, 0.0],
            ..PreprocessConfig::default()
        };
        assert!(matches!(bad_std.validate(), Err(FrameError::Configuration(_))));

        // std is unused without normalization
        let unused_std = PreprocessConfig {
            normalize: false,
            ..bad_std
        };
        assert!(unused_std.validate().is_ok());
    }

    #[test]
    fn test_thread_resolution() {
        assert_eq!(ProcessorConfig::with_threads(3).resolved_threads(), 3);
        assert!(ProcessorConfig::default().resolved_threads() >= 1);
        assert_eq!(ProcessorConfig::with_threads(3).resolved_encoder_capacity(), 3);

        let config = ProcessorConfig {
            num_threads: 2,
            encoder_pool_capacity: 8,
        };
        assert_eq!(config.resolved_encoder_capacity(), 8);
        assert!(PoolConfig::default().resolved_threads() >= 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: PreprocessConfig =
            serde_json::from_str(r#"{ "target": { "width": 320, "height": 240 }, "normalize": false }"#)
                .unwrap();
        assert_eq!(config.target, Some(Dimensions::new(320, 240)));
        assert!(!config.normalize);
        assert!(config.rgb_conversion);

        let pool: PoolConfig = serde_json::from_str(r#"{ "queue_capacity": 16 }"#).unwrap();
        assert_eq!(pool.queue_capacity, Some(16));
    }
}
