//! News/text source port trait.

use crate::domain::error::SpitraderError;
use crate::domain::sentiment::NewsItem;

pub trait NewsPort {
    /// Recent articles for `symbol`, in source order.
    fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, SpitraderError>;
}
