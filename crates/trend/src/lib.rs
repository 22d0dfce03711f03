pub mod chart;
pub mod summarize;

pub use chart::TrendChartRenderer;
pub use summarize::summarize;
