//! Backend commands queued from UI to backend worker.

use shared::{domain::DroppedFile, protocol::AnalysisRequest};

pub enum BackendCommand {
    /// Read a file dropped on the question box.
    ReadPlanFile { file: DroppedFile },
    /// Post one analysis request.
    Analyze { request: AnalysisRequest },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadPlanFile { .. } => "read_plan_file",
            Self::Analyze { .. } => "analyze",
        }
    }
}
