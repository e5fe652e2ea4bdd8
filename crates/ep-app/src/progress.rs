use ep_sim::SimProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    CheckingCache,
    LoadingCachedResult,
    Assembling,
    Integrating,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntegrationProgress {
    pub sim_time: f64,
    pub t_end: f64,
    pub fraction_complete: f64,
    pub step: usize,
}

impl From<&SimProgress> for IntegrationProgress {
    fn from(p: &SimProgress) -> Self {
        Self {
            sim_time: p.t,
            t_end: p.t_end,
            fraction_complete: p.fraction(),
            step: p.steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub integration: Option<IntegrationProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            integration: None,
        }
    }
}
