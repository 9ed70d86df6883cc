use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// REST client for the hosted record store. Collections are addressed by
/// name; reads and conditional writes are scoped with equality filters
/// (`field=eq.value`), the only filter kind the scheduling core relies on.
pub struct RecordStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RecordStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.api_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
            );
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Conflict: {}", error_text),
                _ => anyhow!("Store error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn filter_path(collection: &str, filters: &[(&str, String)]) -> String {
        let mut path = format!("/rest/v1/{}", collection);
        let mut sep = '?';
        for (field, value) in filters {
            path.push(sep);
            path.push_str(&format!("{}=eq.{}", field, value));
            sep = '&';
        }
        path
    }

    /// Fetch all records matching the equality filters, optionally ordered
    /// by a store-side column (`order=column.asc` syntax).
    pub async fn query(&self, collection: &str, filters: &[(&str, String)],
                       order: Option<&str>, auth_token: &str) -> Result<Vec<Value>> {
        let mut path = Self::filter_path(collection, filters);
        if let Some(order) = order {
            path.push(if filters.is_empty() { '?' } else { '&' });
            path.push_str(&format!("order={}", order));
        }

        self.request(Method::GET, &path, Some(auth_token), None).await
    }

    /// Insert a record and return the stored representation.
    pub async fn create(&self, collection: &str, record: Value,
                        auth_token: &str) -> Result<Value> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.request_with_headers(
            Method::POST,
            &format!("/rest/v1/{}", collection),
            Some(auth_token),
            Some(record),
            Some(headers),
        ).await?;

        result.into_iter().next()
            .ok_or_else(|| anyhow!("Create returned no record for {}", collection))
    }

    /// Partially update a record by id and return the stored representation.
    pub async fn update(&self, collection: &str, id: &str, partial: Value,
                        auth_token: &str) -> Result<Value> {
        let result = self.update_where(
            collection,
            &[("id", id.to_string())],
            partial,
            auth_token,
        ).await?;

        result.into_iter().next()
            .ok_or_else(|| anyhow!("No {} record with id {}", collection, id))
    }

    /// Conditionally update every record matching the equality filters and
    /// return the rows actually written. An empty result means no record
    /// satisfied the filters at write time, which is how compare-and-swap
    /// callers detect a lost race.
    pub async fn update_where(&self, collection: &str, filters: &[(&str, String)],
                              partial: Value, auth_token: &str) -> Result<Vec<Value>> {
        let path = Self::filter_path(collection, filters);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(partial),
            Some(headers),
        ).await
    }
}
