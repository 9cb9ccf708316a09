use std::io::{self, BufRead, Write};

use clap::Args;

use service::confirm::{Confirm, Confirmation};
use service::drive_ops::{self, DriveOpsError, RemoveOptions};

use crate::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Bucket, folder or object to remove
    pub path: String,

    #[command(flatten)]
    pub options: RemoveOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Drive(#[from] DriveOpsError),
}

/// Prompts on stderr and reads the answer from stdin. Anything that is not
///  a recognised answer, including end of input, counts as no.
struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, query: &str, caption: &str) -> Confirmation {
        let mut stderr = io::stderr().lock();
        let _ = write!(
            stderr,
            "{}\n{}\n[y] Yes  [a] Yes to All  [n] No  [l] No to All (default is \"n\"): ",
            caption, query
        );
        let _ = stderr.flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return Confirmation::No;
        }
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> Confirmation {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Confirmation::Yes,
        "a" => Confirmation::YesToAll,
        "l" => Confirmation::NoToAll,
        _ => Confirmation::No,
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let drive = ctx.drive()?;
        let mut prompt = TerminalPrompt;
        let outcome = drive_ops::remove_item(&self.path, self.options, &mut prompt, &drive).await?;

        let mut output = format!("removed {} objects", outcome.objects_removed);
        if outcome.objects_skipped > 0 {
            output.push_str(&format!(", skipped {}", outcome.objects_skipped));
        }
        if outcome.bucket_removed {
            output.push_str(&format!(", removed bucket {}", self.path.trim_matches('/')));
        }
        Ok(output)
    }
}
