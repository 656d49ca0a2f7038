pub mod alerts;
pub mod health;
pub mod notifications;
pub mod positions;
pub mod quotes;
pub mod recommendations;
pub mod session;
pub mod views;
pub mod watchlist;
