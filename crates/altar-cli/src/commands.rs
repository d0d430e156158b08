//! Subcommand implementations.

use altar_core::validation::{
    format_file_size, sanitize_food_description, validate_file, validate_food_description, ValidationError,
};
use altar_core::{AltarConfig, AltarId, AltarRecord, CreateAltarRequest, PhotoUpload};
use altar_pipeline::{AltarPipeline, PipelineStage, PipelineState};
use altar_remote::{AlwaysOnline, RemoteClient, ReqwestTransport};
use altar_store::{FileStorage, LocalStore};
use anyhow::Context;
use std::fs;
use std::path::Path;
use tokio::sync::watch;

pub(crate) async fn create(config: &AltarConfig, photo: &Path, description: &str) -> anyhow::Result<()> {
    let bytes = fs::read(photo).with_context(|| format!("failed to read {}", photo.display()))?;
    validate_file(&bytes)?;
    let description = prepared_description(description)?;
    let file_name = photo
        .file_name()
        .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());

    let transport = ReqwestTransport::new(&config.api.base_url)?;
    let client = RemoteClient::new(transport, AlwaysOnline, &config.api);
    let mut pipeline =
        AltarPipeline::new(client, LocalStore::from_config(&config.storage)).with_retry_config(&config.retry);
    pipeline.load_from_storage();

    let reporter = tokio::spawn(report_progress(pipeline.subscribe()));
    let request = CreateAltarRequest::new(PhotoUpload::new(file_name, bytes), description);
    let result = pipeline.create_altar(request).await;
    let warning = pipeline.state().warning;
    // closes the channel so the reporter finishes
    drop(pipeline);
    if let Err(e) = reporter.await {
        tracing::debug!(error = %e, "progress reporter stopped");
    }

    let record = result?;
    if let Some(warning) = warning {
        eprintln!("warning: {warning}");
    }
    println!("{}", describe(&record));
    Ok(())
}

/// Sanitized description, validated as it will be sent
fn prepared_description(raw: &str) -> Result<String, ValidationError> {
    let description = sanitize_food_description(raw);
    validate_food_description(&description)?;
    Ok(description)
}

async fn report_progress(mut rx: watch::Receiver<PipelineState>) {
    let mut last = None;
    while rx.changed().await.is_ok() {
        let (stage, percent) = {
            let state = rx.borrow_and_update();
            (state.stage, state.progress_percent)
        };
        if last != Some(stage) && stage != PipelineStage::Idle {
            eprintln!("[{percent:>3}%] {stage}");
            last = Some(stage);
        }
    }
}

pub(crate) fn list(config: &AltarConfig, json: bool) -> anyhow::Result<()> {
    let records = open_store(config).get_all()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No altars saved yet.");
        return Ok(());
    }
    for record in &records {
        println!("{}  {}  {}", record.id(), record.created_at_iso(), summary(record.food_description()));
    }
    Ok(())
}

pub(crate) fn show(config: &AltarConfig, id: &str) -> anyhow::Result<()> {
    let record = open_store(config)
        .get(&AltarId::from(id))?
        .with_context(|| format!("no altar with id {id}"))?;
    println!("{}", describe(&record));
    Ok(())
}

pub(crate) fn delete(config: &AltarConfig, id: &str) -> anyhow::Result<()> {
    open_store(config).delete(&AltarId::from(id))?;
    println!("Deleted {id}");
    Ok(())
}

pub(crate) fn clear(config: &AltarConfig) -> anyhow::Result<()> {
    open_store(config).clear()?;
    println!("All altars deleted");
    Ok(())
}

pub(crate) fn validate(photo: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(photo).with_context(|| format!("failed to read {}", photo.display()))?;
    let kind = validate_file(&bytes)?;
    println!(
        "{}: {} ({})",
        photo.display(),
        kind.mime_type(),
        format_file_size(bytes.len() as u64)
    );
    Ok(())
}

fn open_store(config: &AltarConfig) -> LocalStore<FileStorage> {
    LocalStore::from_config(&config.storage)
}

fn describe(record: &AltarRecord) -> String {
    format!(
        "id:          {}\ncreated:     {}\ndescription: {}\nphoto:       {}\naltar:       {}",
        record.id(),
        record.created_at_iso(),
        record.food_description(),
        record.photo_url(),
        record.generated_image_url(),
    )
}

fn summary(text: &str) -> String {
    const WIDTH: usize = 48;
    if text.chars().count() <= WIDTH {
        return text.to_string();
    }
    let head: String = text.chars().take(WIDTH - 1).collect();
    format!("{head}…")
}
