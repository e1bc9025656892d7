//! Engine configuration

/// Execution backend for MatMult and Norm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// Row-parallel host loops
    #[default]
    Cpu,
    /// Grid-launched kernels over device-resident buffers
    Device,
}

impl Backend {
    /// Human-readable backend name
    pub const fn name(self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Device => "device",
        }
    }
}

/// Configuration for building shell operators
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellConfig {
    /// Which engine applies the operator
    pub backend: Backend,
    /// Number of parallel execution groups per device launch
    pub block_num: usize,
    /// Number of lanes cooperating inside one group
    pub block_size: usize,
    /// Shrink the group count to the number of local rows
    pub adaptive_grid: bool,
    /// Largest tolerated magnitude for the vanishing coefficient component
    pub coeff_tolerance: f64,
}

impl ShellConfig {
    /// Host backend with default settings
    pub fn cpu() -> Self {
        Self::default()
    }

    /// Device backend with the default 128x128 grid
    pub fn device() -> Self {
        Self::default().with_backend(Backend::Device)
    }

    /// Select the backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the device grid shape
    pub fn with_grid(mut self, block_num: usize, block_size: usize) -> Self {
        self.block_num = block_num;
        self.block_size = block_size;
        self
    }

    /// Enable or disable adaptive group count
    pub fn with_adaptive_grid(mut self, adaptive: bool) -> Self {
        self.adaptive_grid = adaptive;
        self
    }

    /// Set the coefficient tolerance
    pub fn with_coeff_tolerance(mut self, tolerance: f64) -> Self {
        self.coeff_tolerance = tolerance;
        self
    }

    /// Launch shape for `rows` local rows, never zero in either dimension
    pub fn grid(&self, rows: usize) -> (usize, usize) {
        let mut block_num = self.block_num.max(1);
        if self.adaptive_grid {
            block_num = block_num.min(rows.max(1));
        }
        (block_num, self.block_size.max(1))
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cpu,
            block_num: 128,
            block_size: 128,
            adaptive_grid: false,
            coeff_tolerance: 1e-12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ShellConfig::device().with_grid(4, 0).with_adaptive_grid(true);
        assert_eq!(config.backend, Backend::Device);
        assert_eq!(config.grid(2), (2, 1));
        assert_eq!(config.grid(0), (1, 1));
        assert_eq!(ShellConfig::default().grid(3), (128, 128));
        assert_eq!(ShellConfig::cpu().coeff_tolerance, 1e-12);
    }
}
