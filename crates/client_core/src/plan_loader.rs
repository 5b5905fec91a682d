//! Populating the question box from a dropped text file.

use anyhow::{anyhow, Context, Result};
use shared::{domain::DroppedFile, error::InputError};

/// Picks the file a question-box drop refers to. Only the first item counts;
/// it must declare a `text/*` content type.
pub fn select_plan_file(dropped: &[DroppedFile]) -> Result<&DroppedFile, InputError> {
    match dropped.first() {
        Some(file) if file.is_text() => Ok(file),
        _ => Err(InputError::NonTextPlanDrop),
    }
}

/// Reads a plan file as text. Invalid UTF-8 is replaced rather than rejected.
pub async fn read_plan_text(file: &DroppedFile) -> Result<String> {
    if let Some(bytes) = &file.bytes {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }
    let path = file
        .path
        .as_ref()
        .ok_or_else(|| anyhow!("plan file '{}' has neither path nor bytes", file.name))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read plan file '{}'", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[path = "tests/plan_loader_tests.rs"]
mod tests;
