pub struct DefaultsConfig {
    pub depth_threshold_factor: f64,
    pub target_normal: [f64; 3],
    pub up_axis: [f64; 3],
    pub auto_rotation: bool,
    pub rotation_speed: f64,
    pub pause_duration: f64,
    pub bond_refresh_interval: f64,
    pub resume_after_inactivity: f64,
    pub viewer_enabled: bool,
    pub viewer_forward: [f64; 3],
    pub spin_duration: f64,
    pub spin_fps: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            depth_threshold_factor: 1.0,
            target_normal: [0.0, 0.0, 1.0],
            up_axis: [0.0, 1.0, 0.0],
            auto_rotation: true,
            rotation_speed: 30.0,
            pause_duration: 1.0,
            bond_refresh_interval: 0.1,
            resume_after_inactivity: 5.0,
            viewer_enabled: true,
            viewer_forward: [0.0, 0.0, 1.0],
            spin_duration: 14.0,
            spin_fps: 60.0,
        }
    }
}
