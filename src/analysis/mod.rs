pub mod pipeline;
pub mod types;

pub use pipeline::ObservationPipeline;
pub use types::*;
