use thiserror::Error;

/// Runtime lookup and pass failures. Most call sites treat these as
/// recoverable: a miss is logged and the surrounding operation degrades
/// to a no-op rather than aborting play.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("storage device '{0}' not found")]
    DeviceNotFound(String),
    #[error("object '{object}' not found in storage device '{device}'")]
    ObjectNotFound { device: String, object: String },
    #[error("activation pass already running on storage device '{0}'")]
    PassInProgress(String),
    #[error(transparent)]
    Script(#[from] bag_script::ScriptError),
}
