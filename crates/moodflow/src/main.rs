mod bootstrap;
mod render;

use std::sync::Arc;

use anyhow::Result;
use moodflow_core::clock::SystemClock;
use moodflow_core::settings::Settings;
use moodflow_data::reader::{load_snapshot, write_snapshot};
use moodflow_data::store::MemoryMoodStore;
use moodflow_runtime::mood_aggregator::MoodAggregator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("MoodFlow v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Timezone: {}, Locale: {}",
        settings.view,
        settings.timezone,
        settings.locale
    );

    let policy = settings.day_policy();

    let data_file = bootstrap::discover_data_file(settings.data_file.as_deref());
    let entries = match &data_file {
        Some(path) => {
            let snapshot = load_snapshot(path)?;
            if snapshot.skipped > 0 {
                tracing::warn!(
                    "{} records in {} were skipped",
                    snapshot.skipped,
                    path.display()
                );
            }
            snapshot.entries
        }
        None => {
            tracing::info!("No mood data file found; starting with an empty journal");
            Vec::new()
        }
    };

    let store = Arc::new(MemoryMoodStore::with_entries(policy, entries));
    let moods = MoodAggregator::new(store, Arc::new(SystemClock), policy);

    if let Some(date) = settings.reference_date(&policy)? {
        moods.set_week(date);
    }

    moods.fetch_entries(None, None).await;
    if let Some(message) = moods.error() {
        anyhow::bail!(message);
    }

    let output = match settings.view.as_str() {
        "week" => {
            let mut text = render::render_week(&moods.week_moods(), moods.today(), policy.locale());
            if let Some(quote) = moods.today_quote() {
                text.push_str(&format!("\n{quote}\n"));
            } else if !moods.has_entry_today() {
                text.push_str("\nNothing logged today yet.\n");
            }
            text
        }
        "month" => render::render_month(&moods.month_moods(), moods.reference_date(), &policy),
        "stats" => render::render_stats(&moods.stats(), policy.locale()),
        "cleanup" => {
            tracing::info!("Removing duplicate mood entries...");
            let report = moods.cleanup_duplicates().await;
            match &data_file {
                Some(path) if report.deleted_count() > 0 => {
                    write_snapshot(path, &moods.entries())?;
                    tracing::info!("Saved consolidated journal to {}", path.display());
                }
                _ => {}
            }
            render::render_cleanup(&report)
        }
        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
            return Ok(());
        }
    };

    print!("{output}");
    Ok(())
}
