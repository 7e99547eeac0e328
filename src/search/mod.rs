//! Search over derivation tasks
//!
//! - `engine`: the worklist loop, expansion and success propagation
//! - `worklist`: priority queue with FIFO tie-break
//! - `cost`: priority estimates
//! - `events`: observers receiving structured run events
//! - `config` / `result`: run parameters, outcome and statistics

pub mod config;
pub mod cost;
pub mod engine;
pub mod events;
pub mod result;
pub mod worklist;

pub use config::SearchConfig;
pub use cost::{CostMetric, priority};
pub use engine::{SearchEngine, synthesize};
pub use events::{
    Budget, NullObserver, RecordingObserver, SearchEvent, SearchObserver, TracingObserver,
};
pub use result::{SearchOutcome, SearchStatistics, SynthesisResult};
pub use worklist::Worklist;
