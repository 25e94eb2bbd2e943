pub mod axes;
pub mod margins;
pub mod stats_box;
