pub mod dates;
pub mod errors;

pub use dates::parse_date_like;
pub use errors::{ChartError, ErrorKind};
