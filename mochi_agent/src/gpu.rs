// gpu.rs
use gfxinfo::active_gpu;
use once_cell::sync::OnceCell;

use crate::metrics::SourceError;
use crate::types::{GpuInfo, Reading};

// Runtime toggle (read once)
pub fn gpu_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("MOCHI_AGENT_GPU")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}

pub fn probe_gpu() -> Result<GpuInfo, SourceError> {
    let gpu = active_gpu().map_err(|e| SourceError::Gpu(e.to_string()))?;
    let info = gpu.info();

    Ok(GpuInfo {
        name: gpu.model().to_string(),
        load_percent: Reading::Value((info.load_pct() as f64).clamp(0.0, 100.0)),
    })
}
