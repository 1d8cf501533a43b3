use candle_core::Device;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::{info, warn};

#[cfg(not(any(feature = "metal", feature = "cuda")))]
use tracing::debug;

/// Picks the compute device for the encoder and scorer.
///
/// Tries Metal, then CUDA (when compiled in), and falls back to CPU. Never fails: a missing
/// accelerator only costs throughput.
pub fn select_device() -> Device {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Using Metal acceleration");
            return device;
        }
        Err(e) => failures.push(format!("metal: {e}")),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Using CUDA acceleration");
            return device;
        }
        Err(e) => failures.push(format!("cuda: {e}")),
    }

    #[cfg(any(feature = "metal", feature = "cuda"))]
    warn!(reason = %failures.join("; "), "Accelerator unavailable, falling back to CPU");

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    debug!("No accelerator features enabled, using CPU");

    Device::Cpu
}
