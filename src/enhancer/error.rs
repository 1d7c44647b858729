use thiserror::Error;

/// Faults raised by an enhancer definition. None of them are fatal: the engine
/// logs the fault and treats the enhancer as non-matching for the current pass.
#[derive(Debug, Error)]
pub enum EnhancerError {
    #[error("enhancer {id}: detect failed: {reason}")]
    Detect { id: String, reason: String },

    #[error("enhancer {id}: resolve failed: {reason}")]
    Resolve { id: String, reason: String },

    #[error("enhancer {id}: apply failed: {reason}")]
    Apply { id: String, reason: String },

    #[error("enhancer {id}: panicked during {stage}")]
    Panicked { id: String, stage: &'static str },

    #[error("offset {offset} is outside text of {len} chars")]
    OutOfBounds { offset: usize, len: usize },
}
