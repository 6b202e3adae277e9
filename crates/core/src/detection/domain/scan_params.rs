use serde::{Deserialize, Serialize};

/// Multi-scale scan settings for one detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanParams {
    pub scale_factor: f64,
    pub min_neighbors: usize,
    pub min_size: u32,
    pub max_size: u32,
}

/// Strict pass, then a permissive retry when the strict pass finds nothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceScanPasses {
    pub strict: ScanParams,
    pub permissive: ScanParams,
}

impl Default for FaceScanPasses {
    fn default() -> Self {
        Self {
            strict: ScanParams {
                scale_factor: 1.1,
                min_neighbors: 2,
                min_size: 20,
                max_size: 400,
            },
            permissive: ScanParams {
                scale_factor: 1.2,
                min_neighbors: 1,
                min_size: 15,
                max_size: 500,
            },
        }
    }
}
