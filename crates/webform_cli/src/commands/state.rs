//! `watermark`.

use miette::Result;
use webform_core::WatermarkStore;

use crate::output::Output;

/// Show the watermark, or reset it so the next run starts from the first
/// submission.
pub async fn watermark(store: &dyn WatermarkStore, reset: bool, output: &Output) -> Result<()> {
    let current = store.load().await?;
    if reset {
        store.store(0).await?;
        output.success(&format!("Watermark reset (was {current})"));
    } else {
        output.kv("Last migrated submission", &current.to_string());
    }
    Ok(())
}
