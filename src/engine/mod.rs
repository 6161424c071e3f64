//! Date-range classification and metrics aggregation

pub mod assembler;
pub mod bucketer;
pub mod classifier;
pub mod labels;
pub mod palette;
pub mod seen;

pub use assembler::{ChartData, MetricsAssembler};
pub use classifier::classify;
pub use labels::axis_labels;
pub use palette::Palette;
pub use seen::SeenSeries;
