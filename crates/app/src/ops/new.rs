use clap::Args;

use common::prelude::{PathKind, VirtualPath};
use service::drive_ops::{self, DriveOpsError, NewItemOptions, NewObjectOptions};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct New {
    /// `bucket` to create a bucket, `bucket/key` to create an object
    pub path: String,

    /// Project for a new bucket (default: the configured project)
    #[arg(long)]
    pub project: Option<String>,

    /// Content of a new object
    #[arg(long, default_value = "")]
    pub content: String,

    /// Content type of a new object (default: guessed from the key)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Folder to create, as `bucket/folder`
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NewError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
}

#[async_trait::async_trait]
impl crate::op::Op for New {
    type Error = NewError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let options = match VirtualPath::parse(&self.path).kind() {
            PathKind::Bucket => NewItemOptions::bucket(self.project.clone()),
            _ => NewItemOptions::Object(NewObjectOptions::File {
                content: self.content.clone().into_bytes().into(),
                content_type: self.content_type.clone(),
            }),
        };
        let item = drive_ops::new_item(&self.path, options, &drive).await?;
        Ok(format!("created {}", item.path()))
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Mkdir {
    type Error = NewError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let item = drive_ops::new_item(&self.path, NewItemOptions::folder(), &drive).await?;
        Ok(format!("created {}", item.path()))
    }
}
