//! Charts module - chart rendering and styling

mod renderer;
mod style;

pub use renderer::ChartRenderer;
pub use style::ChartStyle;
