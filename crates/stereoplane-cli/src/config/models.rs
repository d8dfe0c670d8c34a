use nalgebra::Vector3;
use stereoplane::engine::config::AlignmentConfig;
use stereoplane::workflows::spin::SpinSettings;

/// Fully merged settings for one `align` or `spin` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub alignment: AlignmentConfig,
    /// `None` when camera alignment is disabled.
    pub viewer_forward: Option<Vector3<f64>>,
    pub spin: SpinSettings,
}

/// Values given directly on the command line, which win over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub depth_factor: Option<f64>,
    pub no_viewer: bool,
    pub speed: Option<f64>,
    pub duration: Option<f64>,
    pub fps: Option<f64>,
}
