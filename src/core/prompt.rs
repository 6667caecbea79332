//! Confirmation before writing into an existing destination

use crate::core::error::{OrganizeError, Result};
use dialoguer::Confirm;
use std::path::Path;

/// Decides whether to continue when the destination folder already exists
pub trait ContinuePrompt {
    fn confirm_existing(&self, destination: &Path) -> Result<bool>;
}

/// Ask on the terminal, defaulting to "no"
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl ContinuePrompt for TerminalPrompt {
    fn confirm_existing(&self, destination: &Path) -> Result<bool> {
        Confirm::new()
            .with_prompt(format!(
                "Destination folder {} exists, do you want to continue?",
                destination.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| OrganizeError::Io(format!("Failed to read input: {}", e)))
    }
}

/// Always continue (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ContinuePrompt for AssumeYes {
    fn confirm_existing(&self, _destination: &Path) -> Result<bool> {
        Ok(true)
    }
}

impl<F> ContinuePrompt for F
where
    F: Fn(&Path) -> bool,
{
    fn confirm_existing(&self, destination: &Path) -> Result<bool> {
        Ok(self(destination))
    }
}
