pub mod aggregator;
pub mod engagement;
pub mod orchestrator;
pub mod report;
pub mod scheduler;

pub use aggregator::{summarize, Aggregator};
pub use engagement::{rejection_reason, EngagementGate};
pub use orchestrator::{
    NoDataReason, Pipeline, PipelineRun, PipelineSettings, RunOutcome, RunReport, RunState,
};
pub use report::render_history;
pub use scheduler::BackgroundService;
