use clap::Args;

use service::drive_ops::{self, CopyOptions, DriveOpsError};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// Object, folder or bucket to copy
    pub source: String,

    /// Destination bucket, folder or object key
    pub destination: String,

    #[command(flatten)]
    pub options: CopyOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum CpError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
}

#[async_trait::async_trait]
impl crate::op::Op for Cp {
    type Error = CpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let copied =
            drive_ops::copy_item(&self.source, &self.destination, self.options, &drive).await?;
        Ok(format!("copied {} objects", copied.len()))
    }
}
