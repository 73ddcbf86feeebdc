//! Remote release metadata and dependency list

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::Error;

/// Source of the data the installer downloads before doing any work
pub trait Remote {
    /// Tag name of the latest firmware release
    fn latest_tag(&self, url: &str) -> Result<String, Error>;
    /// Raw newline separated dependency list
    fn dependency_list(&self, url: &str) -> Result<String, Error>;
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// [Remote] backed by blocking HTTP requests
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self, Error> {
        // GitHub's API rejects requests without a user agent.
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self { client })
    }
}

impl Remote for HttpRemote {
    fn latest_tag(&self, url: &str) -> Result<String, Error> {
        debug!("Fetching latest release from {url}");

        let release: Release = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json())
            .map_err(Error::FetchTag)?;

        Ok(release.tag_name)
    }

    fn dependency_list(&self, url: &str) -> Result<String, Error> {
        debug!("Fetching dependency list from {url}");

        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(Error::FetchDependencies)
    }
}
