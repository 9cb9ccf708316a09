use std::error::Error;
use std::path::PathBuf;
use std::sync::OnceLock;

use service::{DriveState, DriveStateSetupError};

use crate::state::{AppState, StateError};

/// Shared by every op. The drive is only built when an op needs one, so
///  `init` and `version` work without any configuration.
pub struct OpContext {
    pub config_dir: Option<PathBuf>,
    drive: OnceLock<DriveState>,
}

impl OpContext {
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        Self {
            config_dir,
            drive: OnceLock::new(),
        }
    }

    /// The drive, built from the config directory on first use. Without a
    ///  config file the public endpoints and environment token are used.
    pub fn drive(&self) -> Result<DriveState, ContextError> {
        if let Some(drive) = self.drive.get() {
            return Ok(drive.clone());
        }

        let config = match AppState::load(self.config_dir.clone()) {
            Ok(state) => state.service_config(),
            Err(StateError::NotInitialized) => {
                tracing::debug!("no config directory, using defaults");
                AppState::default_service_config()
            }
            Err(e) => return Err(e.into()),
        };
        let drive = DriveState::from_config(&config)?;
        Ok(self.drive.get_or_init(|| drive).clone())
    }

    /// Ask a running op to stop. False if no drive was ever built.
    pub fn request_stop(&self) -> bool {
        match self.drive.get() {
            Some(drive) => {
                drive.request_stop();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("config error: {0}")]
    State(#[from] StateError),
    #[error("drive setup error: {0}")]
    Setup(#[from] DriveStateSetupError),
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
