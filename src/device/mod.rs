//! Compute device selection
//!
//! Evaluation runs are deterministic on CPU; CUDA/Metal are opt-in via
//! cargo features and fall back to CPU when unavailable.

use anyhow::Result;
use candle_core::Device;
use serde::{Deserialize, Serialize};

/// Device preference for an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePreference {
    Cuda,
    Metal,
    Cpu,
    Auto,
}

impl Default for DevicePreference {
    fn default() -> Self {
        Self::Auto
    }
}

impl std::str::FromStr for DevicePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" => Ok(Self::Metal),
            "cpu" => Ok(Self::Cpu),
            "auto" => Ok(Self::Auto),
            _ => Err(anyhow::anyhow!(
                "Invalid device preference: {}. Valid options: cuda, metal, cpu, auto",
                s
            )),
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cuda => write!(f, "cuda"),
            Self::Metal => write!(f, "metal"),
            Self::Cpu => write!(f, "cpu"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Select a device based on preference
pub fn select_device(preference: DevicePreference) -> Result<Device> {
    match preference {
        DevicePreference::Cuda => {
            #[cfg(feature = "cuda")]
            {
                match Device::new_cuda(0) {
                    Ok(device) => {
                        tracing::info!("CUDA device selected");
                        Ok(device)
                    }
                    Err(e) => {
                        tracing::warn!("CUDA initialization failed: {}", e);
                        tracing::warn!("Falling back to CPU");
                        Ok(Device::Cpu)
                    }
                }
            }
            #[cfg(not(feature = "cuda"))]
            {
                tracing::warn!("CUDA requested but not compiled with 'cuda' feature");
                tracing::warn!("Falling back to CPU");
                Ok(Device::Cpu)
            }
        }

        DevicePreference::Metal => {
            #[cfg(feature = "metal")]
            {
                match Device::new_metal(0) {
                    Ok(device) => {
                        tracing::info!("Metal device selected");
                        Ok(device)
                    }
                    Err(e) => {
                        tracing::warn!("Metal initialization failed: {}", e);
                        tracing::warn!("Falling back to CPU");
                        Ok(Device::Cpu)
                    }
                }
            }
            #[cfg(not(feature = "metal"))]
            {
                tracing::warn!("Metal requested but not compiled with 'metal' feature");
                tracing::warn!("Falling back to CPU");
                Ok(Device::Cpu)
            }
        }

        DevicePreference::Cpu => {
            tracing::info!("CPU device selected");
            Ok(Device::Cpu)
        }

        DevicePreference::Auto => {
            #[cfg(feature = "cuda")]
            {
                if let Ok(device) = Device::new_cuda(0) {
                    tracing::info!("Auto-selected: CUDA GPU");
                    return Ok(device);
                }
            }

            #[cfg(feature = "metal")]
            {
                if let Ok(device) = Device::new_metal(0) {
                    tracing::info!("Auto-selected: Metal GPU");
                    return Ok(device);
                }
            }

            tracing::info!("Auto-selected: CPU");
            Ok(Device::Cpu)
        }
    }
}

/// Check if CUDA is available
pub fn is_cuda_available() -> bool {
    #[cfg(feature = "cuda")]
    {
        Device::new_cuda(0).is_ok()
    }
    #[cfg(not(feature = "cuda"))]
    {
        false
    }
}

/// Check if Metal is available
pub fn is_metal_available() -> bool {
    #[cfg(feature = "metal")]
    {
        Device::new_metal(0).is_ok()
    }
    #[cfg(not(feature = "metal"))]
    {
        false
    }
}

/// Print available devices
pub fn print_available_devices() {
    println!("Available devices:");
    println!("  CPU: always available");

    #[cfg(feature = "cuda")]
    {
        if is_cuda_available() {
            println!("  CUDA: available");
        } else {
            println!("  CUDA: not available");
        }
    }
    #[cfg(not(feature = "cuda"))]
    {
        println!("  CUDA: not compiled (use --features cuda)");
    }

    #[cfg(feature = "metal")]
    {
        if is_metal_available() {
            println!("  Metal: available");
        } else {
            println!("  Metal: not available");
        }
    }
    #[cfg(not(feature = "metal"))]
    {
        println!("  Metal: not compiled (use --features metal)");
    }
}
