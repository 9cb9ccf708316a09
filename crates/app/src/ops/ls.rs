use clap::Args;

use service::drive_ops::{self, DriveItem, DriveOpsError, ListOptions};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Drive path: empty for every bucket, `bucket` or `bucket/folder`
    #[arg(default_value = "")]
    pub path: String,

    #[command(flatten)]
    pub options: ListOptions,

    /// Show kind, size and update time
    #[arg(short, long)]
    pub long: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        if !self.long {
            let names = drive_ops::get_child_names(&self.path, self.options, &drive).await?;
            return Ok(names.join("\n"));
        }

        let items = drive_ops::get_child_items(&self.path, self.options, &drive).await?;
        Ok(items.iter().map(long_line).collect::<Vec<_>>().join("\n"))
    }
}

fn long_line(item: &DriveItem) -> String {
    match item {
        DriveItem::Drive => String::new(),
        DriveItem::Bucket { project, bucket } => format!(
            "bucket  {:>12}  {:<20}  {}",
            project.as_deref().unwrap_or("-"),
            bucket.location.as_deref().unwrap_or("-"),
            bucket.name
        ),
        DriveItem::Object(record) => {
            let kind = if record.is_folder() { "folder" } else { "object" };
            let updated = record
                .updated
                .map(|at| at.date().to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{:<6}  {:>12}  {:<20}  {}",
                kind,
                record.size.unwrap_or(0),
                updated,
                item.path()
            )
        }
    }
}
