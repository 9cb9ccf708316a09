use std::time::Duration;

use url::Url;

use common::prelude::DEFAULT_STALENESS;

pub const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com/";
pub const RESOURCE_MANAGER_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com/";

#[derive(Debug, Clone)]
pub struct Config {
    // remote configuration
    /// base url of the storage JSON API
    pub storage_endpoint: Url,
    /// base url of the resource manager API, used to
    ///  enumerate projects when listing the drive root
    pub resource_manager_endpoint: Url,
    /// OAuth2 bearer token sent with every request.
    ///  if not set requests are sent unauthenticated
    pub access_token: Option<String>,
    /// project new buckets are created in when
    ///  none is given explicitly
    pub project: Option<String>,

    // cache configuration
    /// how long a bucket listing is trusted
    pub staleness: Duration,
    /// page size of the listing a bucket model is built from.
    ///  if not set the service default (1000) applies
    pub list_page_size: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_endpoint: Url::parse(STORAGE_ENDPOINT).expect("valid storage endpoint"),
            resource_manager_endpoint: Url::parse(RESOURCE_MANAGER_ENDPOINT)
                .expect("valid resource manager endpoint"),
            access_token: None,
            project: None,
            staleness: DEFAULT_STALENESS,
            list_page_size: None,
        }
    }
}
