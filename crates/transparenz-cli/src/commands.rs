//! Command implementations

use crate::cli::{ImportArgs, QueryArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use transparenz_domain::traits::{DocumentStore, RecordFilter};
use transparenz_domain::{DocumentFormat, JobConfig};
use transparenz_extract::{Extractor, ExtractorConfig};
use transparenz_factcheck::{Answer, CheckerConfig, FactChecker};
use transparenz_ingest::{FileUpload, IngestEvent, IngestService, ProgressSnapshot};
use transparenz_monitor::{IngestObservation, QualityMonitor};
use transparenz_ocr::HttpOcr;
use transparenz_store::SqliteStore;

/// Run a bulk import
pub async fn execute_import(args: ImportArgs, config: &Config) -> Result<()> {
    let files = collect_uploads(&args.path, args.recursive)?;
    if files.is_empty() {
        return Err(CliError::Empty(format!(
            "No supported files found under {}",
            args.path.display()
        )));
    }
    println!("Found {} file(s) to import", files.len());

    let job_config = JobConfig {
        chunk_size: args.chunk_size.unwrap_or(config.job.chunk_size),
        per_file_timeout_secs: args.timeout.unwrap_or(config.job.per_file_timeout_secs),
        max_retries: args.max_retries.unwrap_or(config.job.max_retries),
        skip_on_failure: if args.abort_on_failure {
            false
        } else {
            config.job.skip_on_failure
        },
    };

    let store = SqliteStore::new(&config.store_path).map_err(|e| CliError::Store(e.to_string()))?;
    let extractor = Extractor::new(HttpOcr::new(&config.ocr_endpoint), ExtractorConfig::default());

    let monitor = Arc::new(QualityMonitor::new(config.quality.clone()));
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let observer = tokio::spawn(observe_events(event_rx, Arc::clone(&monitor)));

    let service = IngestService::new(extractor, store).with_event_sink(event_tx);

    let job_id = service.submit(files, job_config)?;
    println!("Job {} submitted", job_id);

    // Live progress until the job reaches a terminal status
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        ticker.tick().await;
        let snapshot = service.progress(job_id)?;
        println!(
            "  chunk {}/{}: {} processed, {} succeeded, {} failed, {} skipped",
            snapshot.current_chunk + 1,
            snapshot.chunk_count,
            snapshot.processed,
            snapshot.succeeded,
            snapshot.failed,
            snapshot.skipped
        );
        if snapshot.status.is_terminal() {
            break;
        }
    }

    let status = service.wait(job_id).await?;
    let snapshot = service.progress(job_id)?;
    drop(service);
    let _ = observer.await;

    for alert in monitor.sweep(now_ms()) {
        eprintln!("ALERT: {}", alert.message);
    }

    let report = render_import_report(&snapshot, status.as_str(), &monitor);
    println!("\n{}", report);

    if let Some(output) = args.output {
        std::fs::write(&output, &report)?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}

/// Answer a question against the document store
pub async fn execute_query(args: QueryArgs, config: &Config) -> Result<()> {
    let store = SqliteStore::new(&config.store_path).map_err(|e| CliError::Store(e.to_string()))?;

    let mut checker_config = CheckerConfig::default();
    checker_config.scoring.high_threshold = config.verification.high_threshold;
    checker_config.scoring.low_threshold = config.verification.low_threshold;

    let monitor = QualityMonitor::new(config.quality.clone());
    let checker = FactChecker::new(Arc::new(std::sync::Mutex::new(store)), checker_config);

    let response = checker.answer(&args.question)?;
    for result in &response.results {
        monitor.observe_verification(result);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response.answer)?);
        return Ok(());
    }

    match response.answer {
        Answer::NoVerifiedData => {
            println!("No verified data found.");
        }
        Answer::Answered { claims } => {
            for claim in claims {
                println!(
                    "[{}] {} = {} (confidence {:.2}, {} source record(s))",
                    claim.decision.as_str(),
                    claim.subject,
                    claim.value,
                    claim.confidence,
                    claim.cited_record_ids.len()
                );
                for id in claim.cited_record_ids {
                    println!("    cited: {}", id);
                }
            }
        }
    }

    Ok(())
}

/// Validate stored records and print a quality summary
pub async fn execute_validate(config: &Config) -> Result<()> {
    let store = SqliteStore::new(&config.store_path).map_err(|e| CliError::Store(e.to_string()))?;
    let records = store
        .query(&RecordFilter::default())
        .map_err(|e| CliError::Store(e.to_string()))?;

    if records.is_empty() {
        println!("Document store is empty.");
        return Ok(());
    }

    let mut by_category: std::collections::BTreeMap<&str, usize> = Default::default();
    let mut ocr_records = 0usize;
    let mut confidence_sum = 0.0f64;
    let mut missing_year = 0usize;

    for record in &records {
        *by_category.entry(record.category.as_str()).or_insert(0) += 1;
        if record.is_ocr() {
            ocr_records += 1;
        }
        confidence_sum += record.mean_confidence();
        if record.year.is_none() {
            missing_year += 1;
        }
    }

    println!("Validation Report");
    println!("=================");
    println!("Records: {}", records.len());
    for (category, count) in &by_category {
        println!("  {}: {}", category, count);
    }
    println!("OCR records: {}", ocr_records);
    println!(
        "Mean extraction confidence: {:.2}",
        confidence_sum / records.len() as f64
    );
    if missing_year > 0 {
        println!("Records without a year: {}", missing_year);
    }

    Ok(())
}

/// Collect uploads from a file or directory
fn collect_uploads(path: &Path, recursive: bool) -> Result<Vec<FileUpload>> {
    let mut uploads = Vec::new();

    if path.is_file() {
        uploads.push(read_upload(path)?);
        return Ok(uploads);
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    for entry in walkdir::WalkDir::new(path)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if DocumentFormat::detect(&name).is_some() {
            uploads.push(read_upload(entry.path())?);
        }
    }

    Ok(uploads)
}

fn read_upload(path: &Path) -> Result<FileUpload> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)?;
    Ok(FileUpload { filename, bytes })
}

/// Forward ingestion events into the quality monitor
async fn observe_events(
    mut rx: mpsc::UnboundedReceiver<IngestEvent>,
    monitor: Arc<QualityMonitor>,
) {
    while let Some(event) = rx.recv().await {
        if let IngestEvent::FileFinished {
            success, duration, ..
        } = event
        {
            monitor.observe_ingest(IngestObservation {
                success,
                latency: duration,
            });
        }
    }
}

/// Render the plain-text import report
fn render_import_report(
    snapshot: &ProgressSnapshot,
    status: &str,
    monitor: &QualityMonitor,
) -> String {
    let mut lines = vec![
        "=".repeat(60),
        "IMPORT REPORT".to_string(),
        "=".repeat(60),
        format!("Status: {}", status),
        format!("Total files: {}", snapshot.total),
        format!("Succeeded: {}", snapshot.succeeded),
        format!("Failed: {}", snapshot.failed),
        format!("Skipped: {}", snapshot.skipped),
        format!("Chunks processed: {}/{}", snapshot.current_chunk + 1, snapshot.chunk_count),
        String::new(),
        "DETAILS:".to_string(),
        "-".repeat(40),
    ];

    for file in &snapshot.files {
        let marker = match file.state {
            transparenz_domain::TaskState::Succeeded => "OK ",
            transparenz_domain::TaskState::Skipped => "-- ",
            _ => "ERR",
        };
        lines.push(format!("{} {}", marker, file.filename));
        if let Some(error) = &file.last_error {
            lines.push(format!("      {}", error));
        }
    }

    lines.push(String::new());
    lines.push(monitor.report(now_ms()));
    lines.push("=".repeat(60));

    lines.join("\n")
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
