mod api_path;
mod base_url;
mod credential;
mod query;

pub use api_path::{ApiPath, ApiPathError, MAX_SEGMENT_LENGTH};
pub use base_url::{BaseUrl, BaseUrlError};
pub use credential::ApiKey;
pub use query::{ALL_SENTINEL, Filter, ParamValue, Query};
