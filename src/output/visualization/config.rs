//! Plot configuration

/// Sentinel for plots without a title.
pub const NO_TITLE: &str = "";

/// Appearance settings shared by all plots.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Plot title ([`NO_TITLE`] to omit)
    pub title: String,
    /// X-axis label
    pub x_label: String,
    /// Y-axis label
    pub y_label: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 640,
            title: "Plasma concentration".to_string(),
            x_label: "Time (min)".to_string(),
            y_label: "Concentration (ug/mL)".to_string(),
        }
    }
}

impl PlotConfig {
    /// Builder: set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set the output dimensions.
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
