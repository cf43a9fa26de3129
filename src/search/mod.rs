pub mod common;
pub mod driver;
pub mod history;
pub mod orderer;
pub mod time;
pub mod tt;

pub use common::{SearchConfig, SearchResult, SearchStats};
pub use driver::Searcher;
pub use history::{MoveHistory, SearchStackEntry};
pub use orderer::MoveOrderer;
