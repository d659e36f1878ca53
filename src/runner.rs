//! Run orchestration.
//!
//! [`run`] is what the binary calls: it wires up the client, statistics,
//! and optional browser, then dispatches to single-URL or batch mode
//! based on the input. Batch mode streams seeds from a file or stdin,
//! resolves them concurrently under a semaphore, and writes one JSONL
//! result per URL as tasks finish.

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, warn};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::app::logging::log_progress;
use crate::app::statistics::print_outcome_statistics;
use crate::app::url::validate_and_normalize_url;
use crate::config::constants::{LOGGING_INTERVAL, RENDERED_SESSION_LIMIT};
use crate::config::{Config, Strategy};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::initialization::init_probe_client;
use crate::output::{print_pretty, ResultWriter};
use crate::resolve::types::ResolveRequest;
use crate::resolve::{resolve_url, RenderedChainResolver, ResolverContext};

/// Closing tallies for one invocation.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Seeds considered: resolved, failed, and skipped together.
    pub total: usize,
    /// Chains resolved to a result, including loops, caps, and blocks.
    pub succeeded: usize,
    /// Seeds whose resolution errored or timed out.
    pub failed: usize,
    /// Seeds rejected before resolution started.
    pub skipped: usize,
    /// Wall-clock duration of the run.
    pub elapsed_seconds: f64,
}

/// Whether an input argument is a URL rather than a seed-list path.
pub fn input_is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolves the configured input and returns the closing tallies.
///
/// A URL input resolves that one URL and pretty-prints the chain. Any
/// other input is treated as a seed-list path (`-` for stdin) and run in
/// batch mode. The browser is launched once up front when the rendered
/// strategy is configured, and concurrency is clamped to what one
/// browser instance can serve.
pub async fn run(config: Config) -> Result<RunReport> {
    let start_time = Instant::now();
    let stats = Arc::new(ProcessingStats::new());
    let client = init_probe_client(&config).context("Failed to initialize HTTP client")?;
    let mut ctx = ResolverContext::new(client, Arc::clone(&stats));

    let mut concurrency = config.max_concurrency.max(1);
    if config.strategy == Strategy::Rendered {
        let renderer = RenderedChainResolver::launch(Arc::clone(&stats))
            .await
            .context("Failed to launch browser for the rendered strategy")?;
        ctx = ctx.with_renderer(Arc::new(renderer));
        concurrency = concurrency.min(RENDERED_SESSION_LIMIT);
    }
    let ctx = Arc::new(ctx);

    if input_is_url(&config.input) {
        run_single(&config, &ctx, start_time).await
    } else {
        run_batch(&config, &ctx, concurrency, start_time).await
    }
}

async fn run_single(
    config: &Config,
    ctx: &Arc<ResolverContext>,
    start_time: Instant,
) -> Result<RunReport> {
    let mut report = RunReport {
        total: 1,
        succeeded: 0,
        failed: 0,
        skipped: 0,
        elapsed_seconds: 0.0,
    };

    let Some(normalized) = validate_and_normalize_url(config.input.trim()) else {
        anyhow::bail!("Invalid URL: {}", config.input);
    };
    let request = ResolveRequest {
        url: normalized,
        method: config.method,
        max_redirects: config.max_redirects,
        strategy: config.strategy,
    };

    let budget = Duration::from_secs(config.timeout_seconds);
    match timeout(budget, resolve_url(ctx, &request)).await {
        Ok(Ok(result)) => {
            report.succeeded = 1;
            match &config.output {
                Some(path) => {
                    let mut writer = ResultWriter::to_file(path).await?;
                    writer.write_result(&result)?;
                    writer.flush()?;
                }
                None => print_pretty(&result)?,
            }
        }
        Ok(Err(resolve_error)) => {
            report.failed = 1;
            ctx.stats.increment_error(resolve_error.classify());
            error!("Failed to resolve {}: {}", request.url, resolve_error);
        }
        Err(_) => {
            report.failed = 1;
            ctx.stats.increment_error(ErrorType::ResolveTimeout);
            error!(
                "Resolution of {} exceeded the {}s budget",
                request.url, config.timeout_seconds
            );
        }
    }

    print_outcome_statistics(&ctx.stats);
    report.elapsed_seconds = start_time.elapsed().as_secs_f64();
    Ok(report)
}

async fn run_batch(
    config: &Config,
    ctx: &Arc<ResolverContext>,
    concurrency: usize,
    start_time: Instant,
) -> Result<RunReport> {
    let from_stdin = config.input == "-";
    let total_seeds = if from_stdin {
        0
    } else {
        count_seeds(Path::new(&config.input)).await?
    };

    let reader: Box<dyn AsyncRead + Unpin + Send> = if from_stdin {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(
            tokio::fs::File::open(&config.input)
                .await
                .with_context(|| format!("Failed to open seed list {}", config.input))?,
        )
    };
    let mut lines = BufReader::new(reader).lines();

    let mut writer = match &config.output {
        Some(path) => ResultWriter::to_file(path).await?,
        None => ResultWriter::to_stdout(),
    };

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let resolved = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let mut skipped: usize = 0;

    let cancel = CancellationToken::new();
    {
        let interrupt_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; finishing in-flight resolutions");
                interrupt_cancel.cancel();
            }
        });
    }

    let logging_task = {
        let cancel = cancel.clone();
        let resolved = Arc::clone(&resolved);
        let failed = Arc::clone(&failed);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log_progress(start_time, &resolved, &failed, total_seeds);
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        })
    };

    let budget = Duration::from_secs(config.timeout_seconds);
    let mut tasks = FuturesUnordered::new();
    loop {
        if cancel.is_cancelled() {
            warn!("Stopping seed intake");
            break;
        }
        let Some(line) = lines.next_line().await.context("Failed to read seed list")? else {
            break;
        };
        let Some(seed) = seed_from_line(&line) else {
            continue;
        };
        let Some(normalized) = validate_and_normalize_url(seed) else {
            ctx.stats.increment_error(ErrorType::InvalidSeedUrl);
            skipped += 1;
            continue;
        };

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Semaphore unexpectedly closed")?;
        let ctx = Arc::clone(ctx);
        let resolved = Arc::clone(&resolved);
        let failed = Arc::clone(&failed);
        let request = ResolveRequest {
            url: normalized,
            method: config.method,
            max_redirects: config.max_redirects,
            strategy: config.strategy,
        };
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let outcome = timeout(budget, resolve_url(&ctx, &request)).await;
            match &outcome {
                Ok(Ok(_)) => {
                    resolved.fetch_add(1, Ordering::SeqCst);
                }
                Ok(Err(_)) | Err(_) => {
                    failed.fetch_add(1, Ordering::SeqCst);
                }
            }
            (request, outcome)
        }));
    }

    while let Some(joined) = tasks.next().await {
        match joined {
            Ok((request, outcome)) => match outcome {
                Ok(Ok(result)) => {
                    if let Err(e) = writer.write_result(&result) {
                        error!("Failed to write result for {}: {}", request.url, e);
                    }
                }
                Ok(Err(resolve_error)) => {
                    ctx.stats.increment_error(resolve_error.classify());
                    warn!("Failed to resolve {}: {}", request.url, resolve_error);
                }
                Err(_) => {
                    ctx.stats.increment_error(ErrorType::ResolveTimeout);
                    warn!(
                        "Resolution of {} exceeded the {}s budget",
                        request.url, config.timeout_seconds
                    );
                }
            },
            Err(join_error) => {
                failed.fetch_add(1, Ordering::SeqCst);
                error!("Resolution task failed: {}", join_error);
            }
        }
    }

    writer.flush()?;
    cancel.cancel();
    if let Err(e) = logging_task.await {
        error!("Progress logging task failed: {}", e);
    }
    log_progress(start_time, &resolved, &failed, total_seeds);
    print_outcome_statistics(&ctx.stats);

    let succeeded = resolved.load(Ordering::SeqCst);
    let failed_count = failed.load(Ordering::SeqCst);
    Ok(RunReport {
        total: succeeded + failed_count + skipped,
        succeeded,
        failed: failed_count,
        skipped,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    })
}

/// Extracts the seed from one list line. Blank lines and `#` comments
/// yield nothing.
fn seed_from_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed)
}

async fn count_seeds(path: &Path) -> Result<usize> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed list {}", path.display()))?;
    Ok(contents.lines().filter_map(seed_from_line).count())
}
