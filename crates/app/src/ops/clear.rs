use clap::Args;

use service::drive_ops::{self, DriveOpsError};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Clear {
    /// Object whose content is emptied
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClearError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
}

#[async_trait::async_trait]
impl crate::op::Op for Clear {
    type Error = ClearError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        drive_ops::clear_content(&self.path, &drive).await?;
        Ok(format!("cleared {}", self.path))
    }
}
