//! Drive v2 document source
//!
//! Talks to the Drive v2 REST API with an already-authorized bearer token.
//! Obtaining and refreshing that token is the login flow's job, not ours.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::error::{FetchError, FetchResult};
use super::{DocumentSource, FileRef, RevisionRef};
use crate::stats::{parse_timestamp, ParseError};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v2";
const PLAIN_TEXT: &str = "text/plain";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    items: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mime_type: String,
    modified_date: String,
}

#[derive(Debug, Deserialize)]
struct RevisionList {
    #[serde(default)]
    items: Vec<DriveRevision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveRevision {
    id: String,
    modified_date: String,
    #[serde(default)]
    last_modifying_user_name: String,
    #[serde(default)]
    export_links: HashMap<String, String>,
}

impl TryFrom<DriveFile> for FileRef {
    type Error = ParseError;

    fn try_from(file: DriveFile) -> Result<Self, ParseError> {
        Ok(Self {
            modified_date: parse_timestamp(&file.modified_date)?,
            id: file.id,
            title: file.title,
            mime_type: file.mime_type,
        })
    }
}

impl TryFrom<DriveRevision> for RevisionRef {
    type Error = ParseError;

    fn try_from(mut rev: DriveRevision) -> Result<Self, ParseError> {
        Ok(Self {
            modified_date: parse_timestamp(&rev.modified_date)?,
            export_uri: rev.export_links.remove(PLAIN_TEXT).unwrap_or_default(),
            id: rev.id,
            author_name: rev.last_modifying_user_name,
        })
    }
}

/// Drive v2 client
pub struct DriveSource {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl DriveSource {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> FetchResult<Self> {
        let api_base = api_base.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FetchError::request(&api_base, e))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    async fn get(&self, uri: &str, query: &[(&str, &str)]) -> FetchResult<reqwest::Response> {
        let response = self
            .client
            .get(uri)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::request(uri, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, uri: &str, query: &[(&str, &str)]) -> FetchResult<T> {
        self.get(uri, query)
            .await?
            .json::<T>()
            .await
            .map_err(|e| FetchError::decode(uri, e))
    }
}

#[async_trait]
impl DocumentSource for DriveSource {
    fn name(&self) -> &str {
        "drive"
    }

    async fn list_files(&self, query: &str) -> FetchResult<Vec<FileRef>> {
        let uri = format!("{}/files", self.api_base);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0usize;

        loop {
            debug!("Fetching page {} of file listing", page);
            page += 1;

            let mut params = vec![("spaces", "drive"), ("q", query)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let listing: FileList = self.get_json(&uri, &params).await?;
            for item in listing.items {
                files.push(FileRef::try_from(item)?);
            }

            match listing.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    async fn list_revisions(&self, file_id: &str) -> FetchResult<Vec<RevisionRef>> {
        let uri = format!("{}/files/{}/revisions", self.api_base, file_id);
        let listing: RevisionList = self.get_json(&uri, &[]).await?;
        let revisions = listing
            .items
            .into_iter()
            .map(RevisionRef::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(revisions)
    }

    async fn export_revision_text(&self, revision: &RevisionRef) -> FetchResult<Vec<u8>> {
        if revision.export_uri.is_empty() {
            return Err(FetchError::Missing(format!("plain text export of revision {}", revision.id)));
        }
        let bytes = self
            .get(&revision.export_uri, &[])
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::decode(&revision.export_uri, e))?;
        Ok(bytes.to_vec())
    }
}
