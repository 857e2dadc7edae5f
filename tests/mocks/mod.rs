pub mod mock_query;

pub use mock_query::{MockQuery, MockQueryState};
