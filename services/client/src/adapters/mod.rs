pub mod http_api;
pub mod token_file;

pub use http_api::HttpApi;
pub use token_file::FileTokenStore;
