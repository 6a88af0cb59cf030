use anyhow::Context;
use clap::Parser;

use sshmirror::cli::Cli;
use sshmirror::config::Settings;
use sshmirror::core::engine::{with_backoff, EngineOptions, SyncEngine};
use sshmirror::remote::{ConnectOptions, SshRemote};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    sshmirror::logging::init(&settings.log_level);

    let options = EngineOptions {
        pull: settings.pull,
        dry_run: settings.dry_run,
        max_retries: settings.max_retries,
        retry_base_delay: settings.retry_base_delay,
    };

    let connect = ConnectOptions {
        host: settings.host.clone(),
        user: settings.user.clone(),
        key_path: settings.key.clone(),
        root: settings.target.clone(),
        timeout: settings.op_timeout,
    };
    let remote = with_backoff(&options, "connect", || SshRemote::connect(&connect))
        .with_context(|| format!("failed to connect to {}", settings.host))?;

    let mut engine = SyncEngine::with_options(&settings.source, remote, options);
    let report = engine
        .run_with(|plan| print!("{plan}"))
        .context("sync run failed")?;

    if settings.dry_run {
        println!("dry run: nothing transferred");
    } else {
        println!(
            "pushed {} file(s), pulled {} file(s) in {:.1?}",
            report.pushed, report.pulled, report.duration
        );
    }

    Ok(())
}
