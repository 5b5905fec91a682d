use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems with what the user typed or dropped. The display text is the
/// alert shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputError {
    #[error("Please enter an analysis plan or question.")]
    EmptyQuestion,
    #[error("Please drop a text file for the analysis plan.")]
    NonTextPlanDrop,
}
