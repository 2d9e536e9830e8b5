//! Compute device selection.
//!
//! The walkthrough makes one placement decision: run on an accelerator when
//! one is available, otherwise on the CPU. Tensors that leave the model (for
//! example to be written to disk) are moved back to the CPU first.

use crate::error::EmbeddingError;
use candle_core::{Device, Tensor};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Which device a caller wants inference to run on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DevicePreference {
    /// Use CUDA or Metal when available, falling back to CPU
    #[default]
    Auto,
    /// Always use the CPU
    Cpu,
}

/// Kind of device inference actually runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Cpu,
    Cuda,
    Metal,
}

impl DeviceType {
    pub fn of(device: &Device) -> Self {
        if device.is_cuda() {
            DeviceType::Cuda
        } else if device.is_metal() {
            DeviceType::Metal
        } else {
            DeviceType::Cpu
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "cpu"),
            DeviceType::Cuda => write!(f, "cuda"),
            DeviceType::Metal => write!(f, "metal"),
        }
    }
}

/// Selects the best available compute device.
///
/// `Auto` tries CUDA -> Metal -> CPU. Accelerator backends are only
/// compiled in with the `cuda` / `metal` crate features; without them the
/// constructors fail and the CPU is used.
pub fn select_device(preference: DevicePreference) -> Device {
    if preference == DevicePreference::Cpu {
        info!("Using CPU (requested)");
        return Device::Cpu;
    }

    if let Ok(cuda_device) = Device::new_cuda(0) {
        info!("Using CUDA GPU");
        return cuda_device;
    }

    if let Ok(metal_device) = Device::new_metal(0) {
        info!("Using Metal GPU");
        return metal_device;
    }

    info!("Using CPU");
    Device::Cpu
}

/// Copies a tensor to host memory. A no-op for tensors already on the CPU.
pub fn to_cpu(tensor: &Tensor) -> Result<Tensor, EmbeddingError> {
    tensor.to_device(&Device::Cpu).map_err(|e| {
        EmbeddingError::TensorCreation(format!("Failed to move tensor to CPU: {}", e))
    })
}
