pub mod media_item;
pub mod portfolio;
pub mod row_model;

pub use media_item::*;
pub use portfolio::{flatten_sets, load_sets, select_sets, PortfolioImage, PortfolioSet};
pub use row_model::*;
