mod args;
mod op;
mod ops;
mod state;

use std::sync::Arc;

use args::Args;
use clap::{Parser, Subcommand};
use op::{Op, OpContext};
use ops::{Cat, Clear, Cp, Init, Ls, Mkdir, New, Put, Rm, Stat, Test, Version};

command_enum! {
    (Ls, Ls),
    (Stat, Stat),
    (Test, Test),
    (New, New),
    (Mkdir, Mkdir),
    (Cp, Cp),
    (Rm, Rm),
    (Cat, Cat),
    (Put, Put),
    (Clear, Clear),
    (Init, Init),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = service::logging::init(args.log_level);

    let ctx = Arc::new(OpContext::new(args.config_dir.clone()));
    spawn_interrupt_handler(ctx.clone());

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}

/// First Ctrl-C asks the running op to stop at the next page; a second
///  one exits immediately.
fn spawn_interrupt_handler(ctx: Arc<OpContext>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if ctx.request_stop() {
            tracing::warn!("stopping after the current request, press Ctrl-C again to abort");
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
        }
        std::process::exit(130);
    });
}
