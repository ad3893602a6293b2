pub mod pagination;
pub mod response;

pub use pagination::{Paginated, Pagination};
pub use response::{ApiResponse, ApiResult};
