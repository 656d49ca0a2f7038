use std::collections::HashMap;

use tracing::info;

use crate::errors::AppError;
use crate::models::{Quote, WatchlistEntry, WatchlistEntryResponse};
use crate::services::remote_writer::{watchlist_table, RemoteWriter};

/// Entries joined with the latest quotes the dashboard holds.
pub fn list(writer: &RemoteWriter, quotes: &HashMap<String, Quote>) -> Vec<WatchlistEntryResponse> {
    writer
        .store()
        .watchlist
        .entries()
        .into_iter()
        .map(|entry| WatchlistEntryResponse {
            quote: quotes.get(&entry.symbol).cloned(),
            symbol: entry.symbol,
            added_at: entry.added_at,
        })
        .collect()
}

pub async fn add(writer: &RemoteWriter, symbol: &str) -> Result<WatchlistEntry, AppError> {
    let watchlist = &writer.store().watchlist;
    let mutation = watchlist.add(symbol)?;
    let mutation = writer.commit(mutation, watchlist.collection(), watchlist_table).await?;

    let entry = mutation.record().clone();
    info!("Added {} to watchlist", entry.symbol);
    Ok(entry)
}

pub async fn remove(writer: &RemoteWriter, symbol: &str) -> Result<(), AppError> {
    let watchlist = &writer.store().watchlist;
    let mutation = watchlist.remove(symbol)?;
    let mutation = writer.commit(mutation, watchlist.collection(), watchlist_table).await?;
    info!("Removed {} from watchlist", mutation.record().symbol);
    Ok(())
}
