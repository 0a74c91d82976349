//! Chart styling configuration.
//! Theme options are passed explicitly to the renderer instead of living in
//! ambient global state.

use plotters::style::RGBColor;

// Accent colors per chart.
pub const HIST_BLUE: RGBColor = RGBColor(0x2E, 0x86, 0xC1);
pub const SCATTER_PURPLE: RGBColor = RGBColor(0x8E, 0x44, 0xAD);
pub const REGRESSION_GREEN: RGBColor = RGBColor(0x27, 0xAE, 0x60);
pub const SUMMARY_BLUE: RGBColor = RGBColor(0x1F, 0x77, 0xB4);
pub const SUMMARY_ORANGE: RGBColor = RGBColor(0xD3, 0x54, 0x00);
pub const MONTHLY_GREEN: RGBColor = RGBColor(0x2E, 0xCC, 0x71);

/// Pastel fill palette for grouped boxplots.
pub const PASTEL: [RGBColor; 6] = [
    RGBColor(0xA1, 0xC9, 0xF4),
    RGBColor(0xFF, 0xB4, 0x82),
    RGBColor(0x8D, 0xE5, 0xA1),
    RGBColor(0xFF, 0x9F, 0x9B),
    RGBColor(0xD0, 0xBB, 0xFF),
    RGBColor(0xDE, 0xBB, 0x9B),
];

/// Rendering options shared by every chart step of a run.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    /// Pixel size of each standalone figure.
    pub figure: (u32, u32),
    /// Pixel size of the correlation heatmap.
    pub heatmap: (u32, u32),
    /// Pixel size of the combined summary figure.
    pub summary: (u32, u32),
    /// Bin count for the standalone sales histogram.
    pub hist_bins: usize,
    /// Bin count for the summary-panel histogram.
    pub summary_hist_bins: usize,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            figure: (700, 400),
            heatmap: (600, 500),
            summary: (1200, 800),
            hist_bins: 40,
            summary_hist_bins: 35,
        }
    }
}
