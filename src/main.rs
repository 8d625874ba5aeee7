use clap::Parser;
use ftptree::config::{Args, Direction};
use ftptree::engine::SyncEngine;
use ftptree::transport::ssh::SshSession;
use ftptree::transport::Session;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // stdout is left to the progress bar.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = run(&args) {
        error!("Transfer failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let direction = args.direction()?;
    let remote = direction.remote();

    info!("Connecting to {}@{}...", remote.user, remote.host);
    let mut session = SshSession::connect(&args.ssh_config(remote))?;
    info!("Connected.");

    let mut engine = SyncEngine::new(&mut session).with_options(args.sync_options()?);
    if args.progress && !args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")?);
        engine = engine.with_progress(pb);
    }

    let summary = match &direction {
        Direction::Download { remote, local } => engine.download_directory(&remote.path, local),
        Direction::Upload { local, remote } => engine.upload_directory(local, &remote.path),
    };

    // Disconnect politely either way; a transfer error takes precedence.
    if let Err(e) = session.quit() {
        warn!("{}", e);
    }
    let summary = summary?;

    info!(
        "Done: {} files, {} bytes, {} directories created",
        summary.files_transferred, summary.bytes_transferred, summary.directories_created
    );
    Ok(())
}
