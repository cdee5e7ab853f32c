use cav_core::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingCase,
    PreparingState,
    Solving,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingCase => "Loading case",
            RunStage::PreparingState => "Preparing initial state",
            RunStage::Solving => "Solving",
            RunStage::SavingResults => "Saving results",
            RunStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    /// Set while solving
    pub iteration: Option<usize>,
    pub ratio: Option<Real>,
    pub residuals: Option<[Real; 3]>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            iteration: None,
            ratio: None,
            residuals: None,
        }
    }
}
