use std::path::PathBuf;

use clap::Args;

use service::drive_ops::{self, DriveOpsError};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Object to print
    pub path: String,
}

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination object, as `bucket/key`
    pub path: String,

    /// Content type (default: the existing object's, else guessed from the key)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait::async_trait]
impl crate::op::Op for Cat {
    type Error = ContentError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let reader = drive_ops::get_content_reader(&self.path, &drive).await?;
        Ok(reader.text().trim_end_matches('\n').to_string())
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Put {
    type Error = ContentError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let data = tokio::fs::read(&self.file)
            .await
            .map_err(|source| ContentError::Read {
                path: self.file.clone(),
                source,
            })?;

        let mut writer = drive_ops::get_content_writer(&self.path, &drive).await?;
        if let Some(content_type) = &self.content_type {
            writer = writer.with_content_type(content_type.clone());
        }
        writer.write(&data);
        let record = writer.close().await?;
        Ok(format!(
            "uploaded {} bytes to {}",
            record.size.unwrap_or(data.len() as u64),
            self.path
        ))
    }
}
