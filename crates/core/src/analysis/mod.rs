//! Display-ready figures derived from a single quote. Every function here is pure.

pub mod confidence;
pub mod market_cap;
pub mod rounding;
pub mod shareholding;
pub mod targets;

pub use confidence::{classify, confidence_percent, recommend};
pub use market_cap::format_market_cap;
pub use rounding::{pct_change, round_to};
pub use shareholding::{public_percent, shareholding_split};
pub use targets::{analyst_consensus, refined_targets};
