//! Emby API client for the movie catalog
//!
//! Only one endpoint is used: `GET {base}/emby/Items`, asking for every movie
//! in every library with just the fields we key on.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;

const TOKEN_HEADER: &str = "X-Emby-Token";

/// Movie item as returned by Emby
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbyItem {
    #[serde(default)]
    pub name: String,
    /// Path of the media file on the server
    pub path: Option<String>,
    pub production_year: Option<i32>,
}

/// Response envelope for `/emby/Items`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbyItemsResponse {
    #[serde(default)]
    pub items: Vec<EmbyItem>,
    pub total_record_count: Option<i64>,
}

/// Emby API client
pub struct EmbyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EmbyClient {
    /// Create a new client. Trailing slashes on `base_url` are ignored.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Request)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn items_url(&self) -> String {
        format!("{}/emby/Items", self.base_url)
    }

    /// Fetch every movie item the server knows about
    pub async fn fetch_movies(&self) -> Result<Vec<EmbyItem>, CatalogError> {
        let url = self.items_url();
        debug!(url = %url, "Fetching Emby movie catalog");

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_key)
            .query(&[
                ("Recursive", "true"),
                ("IncludeItemTypes", "Movie"),
                ("Fields", "Path,Name,ProductionYear"),
            ])
            .send()
            .await
            .map_err(CatalogError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: EmbyItemsResponse = response.json().await.map_err(CatalogError::Decode)?;

        debug!(
            count = body.items.len(),
            total = ?body.total_record_count,
            "Emby catalog received"
        );
        Ok(body.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_url_trims_trailing_slash() {
        let client = EmbyClient::new("http://emby:8096/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(client.items_url(), "http://emby:8096/emby/Items");
    }

    #[test]
    fn test_items_response_parsing() {
        let json = r#"{
            "Items": [
                {"Name": "Alien", "Path": "/media/Alien (1979)/Alien.mkv", "ProductionYear": 1979, "Id": "12"},
                {"Name": "Unknown"}
            ],
            "TotalRecordCount": 2
        }"#;
        let parsed: EmbyItemsResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].name, "Alien");
        assert_eq!(parsed.items[0].production_year, Some(1979));
        assert_eq!(parsed.items[1].path, None);
        assert_eq!(parsed.total_record_count, Some(2));
    }
}
