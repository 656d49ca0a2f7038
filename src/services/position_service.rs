use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreatePosition, PortfolioSummary, Position, UpdatePosition};
use crate::services::remote_writer::{positions_table, RemoteWriter};

pub fn list(writer: &RemoteWriter) -> (Vec<Position>, PortfolioSummary) {
    let portfolio = &writer.store().portfolio;
    (portfolio.positions(), portfolio.summary())
}

pub async fn create(writer: &RemoteWriter, input: CreatePosition) -> Result<Position, AppError> {
    let portfolio = &writer.store().portfolio;
    let mutation = portfolio.add(&input)?;
    let mutation = writer.commit(mutation, portfolio.collection(), positions_table).await?;

    let position = mutation.record().clone();
    info!("Added position {} ({} units of {})", position.id, position.units(), position.symbol);
    Ok(position)
}

pub async fn update(writer: &RemoteWriter, id: Uuid, input: UpdatePosition) -> Result<Position, AppError> {
    let portfolio = &writer.store().portfolio;
    let mutation = portfolio.update(id, &input)?;
    let mutation = writer.commit(mutation, portfolio.collection(), positions_table).await?;
    Ok(mutation.record().clone())
}

pub async fn delete(writer: &RemoteWriter, id: Uuid) -> Result<(), AppError> {
    let portfolio = &writer.store().portfolio;
    let mutation = portfolio.remove(id)?;
    writer.commit(mutation, portfolio.collection(), positions_table).await?;
    info!("Removed position {}", id);
    Ok(())
}
