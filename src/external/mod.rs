pub mod multi_provider;
pub mod quote_provider;
pub mod twelvedata;
pub mod yahoo;
