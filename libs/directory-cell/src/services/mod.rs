pub mod profile;
pub mod rates;
pub mod reviews;
pub mod search;

pub use profile::ProfileService;
pub use rates::RateService;
pub use reviews::ReviewService;
pub use search::SearchService;
