pub mod circular;
pub mod descriptive;
pub mod monthly;

pub use circular::mean_bearing;
pub use descriptive::{frequency_count, summarize, truncated, StatisticsSummary};
pub use monthly::{monthly_aggregates, monthly_climatology, monthly_means};
