//! Price store port trait.

use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;

/// Source of price bars for a symbol. Implementations return bars in
/// ascending `id` order.
pub trait PricePort {
    /// The first `count` bars with `id >= from_id`.
    fn fetch_prices_from_id(
        &self,
        symbol: &str,
        from_id: u64,
        count: usize,
    ) -> Result<Vec<PriceBar>, BarchartError>;

    fn fetch_all_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError>;

    fn list_symbols(&self) -> Result<Vec<String>, BarchartError>;
}
