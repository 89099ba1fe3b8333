pub mod decision;
pub mod normalize;
pub mod risk;

pub use decision::{decide, recommend, Thresholds};
pub use normalize::{canonicalize, normalize_sentiment, normalize_volatility};
pub use risk::compose_risk;
