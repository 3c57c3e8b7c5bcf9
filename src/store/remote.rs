//! RemoteStore - client for an HTTP JSON document store.
//!
//! Each operation is exactly one request against `{base_url}/{collection}`:
//!
//! - `GET /{collection}` and `GET /{collection}?q=` - list and search
//! - `GET /{collection}/{reg_number}` - point lookup, 404 when absent
//! - `POST /{collection}` - insert, 409 when the key is taken
//! - `PUT /{collection}/{reg_number}` - replace, 404 when absent
//! - `DELETE /{collection}/{reg_number}` - remove, 404 when absent
//!
//! Nothing is cached locally. The client is blocking; async callers must run
//! it on a blocking thread.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use tracing::{debug, error, info, warn};

use super::{RecordStore, StoreError};
use crate::config::RemoteConfig;
use crate::student::StudentRecord;

/// Record store backed by a remote document database.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    collection_url: Url,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let mut collection_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::unavailable(format!("invalid base url: {e}")))?;
        collection_url
            .path_segments_mut()
            .map_err(|()| StoreError::unavailable("base url cannot carry a path"))?
            .pop_if_empty()
            .push(&config.collection);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::unavailable(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            collection_url,
        })
    }

    /// URL of the collection this store reads and writes.
    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn record_url(&self, reg_number: &str) -> Url {
        let mut url = self.collection_url.clone();
        // The collection URL was built from path segments, so it can be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(reg_number);
        }
        url
    }

    fn fetch_list(&self, url: Url) -> Result<Vec<StudentRecord>, StoreError> {
        let response = send(self.client.get(url))?;
        match response.status() {
            StatusCode::OK => decode(response),
            status => Err(unexpected(status)),
        }
    }
}

fn send(request: reqwest::blocking::RequestBuilder) -> Result<Response, StoreError> {
    request.send().map_err(|e| {
        error!(%e, "document store request failed");
        StoreError::unavailable(format!("document store request failed: {e}"))
    })
}

fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    response.json().map_err(|e| {
        error!(%e, "document store returned an undecodable body");
        StoreError::unavailable(format!("undecodable document store response: {e}"))
    })
}

fn unexpected(status: StatusCode) -> StoreError {
    error!(%status, "unexpected document store status");
    StoreError::unavailable(format!("document store answered {status}"))
}

impl RecordStore for RemoteStore {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.fetch_list(self.collection_url.clone())
    }

    fn get(&self, reg_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        let response = send(self.client.get(self.record_url(reg_number)))?;
        match response.status() {
            StatusCode::OK => decode(response).map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(unexpected(status)),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut().append_pair("q", query);
        let found = self.fetch_list(url)?;
        debug!(query, hits = found.len(), "search");
        Ok(found)
    }

    fn add(&self, record: StudentRecord) -> Result<(), StoreError> {
        let response = send(self.client.post(self.collection_url.clone()).json(&record))?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!(reg_number = %record.reg_number, "student added");
                Ok(())
            }
            StatusCode::CONFLICT => {
                warn!(reg_number = %record.reg_number, "duplicate registration number");
                Err(StoreError::conflict(record.reg_number))
            }
            status => Err(unexpected(status)),
        }
    }

    fn update(&self, reg_number: &str, record: StudentRecord) -> Result<(), StoreError> {
        let record = record.rekeyed(reg_number);
        let response = send(self.client.put(self.record_url(reg_number)).json(&record))?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                info!(reg_number, "student updated");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(reg_number)),
            status => Err(unexpected(status)),
        }
    }

    fn delete(&self, reg_number: &str) -> Result<(), StoreError> {
        let response = send(self.client.delete(self.record_url(reg_number)))?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                info!(reg_number, "student deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(reg_number)),
            status => Err(unexpected(status)),
        }
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
