//! Harvest stage: discover trending tickers, collect recent posts for each,
//! merge them into the day's partition without duplicates, and overwrite the
//! partition file.

pub mod accounts;
pub mod collector;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod search;
pub mod writer;

pub use accounts::{AccountPool, Credentials};
pub use collector::{merge_posts, CollectOutcome, Collector};
pub use discovery::{parse_trending_tickers, FinderDiscovery, TickerSource};
pub use error::{DiscoveryError, HarvestError, SearchError};
pub use orchestrator::{HarvestReport, HarvestSettings, Harvester, TickerFailure, WrittenPartition};
pub use search::{BirdSearch, ResultTier, SearchHit, SearchRequest, SocialSearch};
pub use writer::PartitionWriter;
