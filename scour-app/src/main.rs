use anyhow::Result;
use clap::Parser;
use cli::Cli;
use plan::RunPlan;
use scour_common::observability::init_logging;
use scour_config::ScourConfigLoader;
use scour_runtime::ScourRuntime;
use scour_web::{Scanner, build_fetcher};
use std::io::Write;
use std::time::Duration;
mod cli;
mod plan;
mod report;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config: defaults < file(s) < SCOUR__* env < flags
    let mut loader = ScourConfigLoader::new().with_default_file();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let plan = RunPlan::resolve(loader.load()?, &cli)?;

    let log_path = init_logging(plan.log.clone())?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let runtime = ScourRuntime::build("scour-worker", None)?;
    let handle = runtime.handle();
    let _ctrl_c = handle.cancel_on_ctrl_c();

    let RunPlan {
        urls,
        keywords,
        concurrency,
        fetcher,
        output,
        ..
    } = plan;

    let report = runtime.block_on(async move {
        let fetcher = build_fetcher(fetcher)?;
        let scanner = Scanner::new(fetcher, keywords, concurrency)?
            .with_cancellation(handle.cancellation());
        anyhow::Ok(scanner.run(&urls).await)
    })?;

    let rendered = report::render(&report, output)?;
    std::io::stdout().lock().write_all(rendered.as_bytes())?;

    runtime.shutdown(Duration::from_secs(1));
    Ok(())
}
