use clap::Args;

use common::prelude::build_info;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Print every build detail
    #[arg(long)]
    pub verbose: bool,
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = std::convert::Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let info = build_info();
        if !self.verbose {
            return Ok(info.to_string());
        }
        Ok(format!(
            "{}\n\
             - Git: {}\n\
             - Profile: {}\n\
             - Features: {}\n\
             - Built: {}\n\
             - Rust: {}\n\
             - Target: {}",
            info.version,
            info.git_hash,
            info.build_profile,
            info.build_features,
            info.build_timestamp,
            info.rust_version,
            info.target
        ))
    }
}
