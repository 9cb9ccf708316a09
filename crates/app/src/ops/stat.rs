use clap::Args;

use service::drive_ops::{self, DriveOpsError};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Drive path of a bucket, folder or object
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
    #[error("failed to render item: {0}")]
    Render(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Stat {
    type Error = StatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let item = drive_ops::get_item(&self.path, &drive).await?;
        Ok(serde_json::to_string_pretty(&item)?)
    }
}
