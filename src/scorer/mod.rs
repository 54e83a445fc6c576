pub mod deal_scorer;

pub use deal_scorer::compute_insight;
