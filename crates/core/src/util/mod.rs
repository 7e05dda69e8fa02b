pub mod time_source;

pub use time_source::{InstantTimeSrc, SharedMockTimeSource, TimeSource};
