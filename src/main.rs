use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_dl::{utils, Cli, Config, DownloadPipeline};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_dl=debug"
    } else {
        "video_dl=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), render_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?.with_converter(cli.converter.clone());
    config.validate()?;

    // Missing tools only warn; the converter may still be found at run time
    let missing_deps = utils::check_dependencies(&config.converter, cli.audio).await;
    if !missing_deps.is_empty() {
        eprintln!("{} Dependency check warnings:", style("warning:").yellow().bold());
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
    }

    let job = cli.job();
    let pipeline = DownloadPipeline::new(&config)?;
    let saved = pipeline.run(&job).await?;

    for path in saved {
        println!("Saved {}", style(path.display()).green());
    }

    Ok(())
}

/// Join the error chain, skipping causes already spelled out by their parent
fn render_error(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}
