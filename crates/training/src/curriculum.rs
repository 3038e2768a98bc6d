//! Staged target-rank schedule: 49 (10k steps) → 46 → 45.
//!
//! Stages only move on an explicit [`Curriculum::advance`]; the step argument
//! of [`Curriculum::get_target_rank`] does not trigger staging.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub target_rank: usize,
    /// Step budget for the stage, if any.
    pub steps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCurriculum")]
pub struct Curriculum {
    stages: Vec<Stage>,
    current_stage: usize,
}

#[derive(Deserialize)]
struct RawCurriculum {
    stages: Vec<Stage>,
    current_stage: usize,
}

impl TryFrom<RawCurriculum> for Curriculum {
    type Error = String;

    fn try_from(raw: RawCurriculum) -> Result<Self, Self::Error> {
        if raw.stages.is_empty() {
            return Err("curriculum needs at least one stage".into());
        }
        if raw.current_stage >= raw.stages.len() {
            return Err(format!(
                "current_stage {} out of range for {} stage(s)",
                raw.current_stage,
                raw.stages.len()
            ));
        }
        Ok(Self {
            stages: raw.stages,
            current_stage: raw.current_stage,
        })
    }
}

impl Curriculum {
    pub fn new() -> Self {
        Self {
            stages: vec![
                Stage {
                    target_rank: 49,
                    steps: Some(10_000),
                },
                Stage {
                    target_rank: 46,
                    steps: None,
                },
                Stage {
                    target_rank: 45,
                    steps: None,
                },
            ],
            current_stage: 0,
        }
    }

    pub fn with_stages(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            bail!("curriculum needs at least one stage");
        }
        Ok(Self {
            stages,
            current_stage: 0,
        })
    }

    /// Target rank of the current stage. `step` does not move the stage.
    pub fn get_target_rank(&self, _step: u64) -> usize {
        self.stage().target_rank
    }

    /// Move to the next stage. Returns `false` at the last stage.
    pub fn advance(&mut self) -> bool {
        if self.current_stage + 1 < self.stages.len() {
            self.current_stage += 1;
            true
        } else {
            false
        }
    }

    pub fn current_stage(&self) -> usize {
        self.current_stage
    }

    pub fn stage(&self) -> &Stage {
        &self.stages[self.current_stage]
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_final(&self) -> bool {
        self.current_stage + 1 == self.stages.len()
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::new()
    }
}
