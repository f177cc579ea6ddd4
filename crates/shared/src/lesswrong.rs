use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::Post;

const GRAPHQL_ENDPOINT: &str = "https://www.lesswrong.com/graphql";

/// Request configuration read from `lesswrong.json`: extra HTTP headers
/// plus the opaque GraphQL body that asks for the latest posts.
#[derive(Debug, Deserialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub last_posts_request: serde_json::Value,
}

impl RequestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse request config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: PostsData,
}

#[derive(Debug, Deserialize)]
struct PostsData {
    posts: PostsResults,
}

#[derive(Debug, Deserialize)]
struct PostsResults {
    results: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(rename = "_id")]
    id: String,
    slug: String,
    title: String,
    contents: Option<RawContents>,
}

#[derive(Debug, Deserialize)]
struct RawContents {
    html: String,
}

pub struct LesswrongClient {
    client: Client,
    request: RequestConfig,
}

impl LesswrongClient {
    pub fn new(request: RequestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, request })
    }

    /// Fetch the latest posts. Posts whose `contents` field is absent are
    /// dropped unless `include_contentless` is set, in which case they come
    /// back with an empty body.
    pub async fn fetch_recent_posts(&self, include_contentless: bool) -> Result<Vec<Post>> {
        let mut request = self
            .client
            .post(GRAPHQL_ENDPOINT)
            .json(&self.request.last_posts_request);
        for (name, value) in &self.request.headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .context("Failed to query the LessWrong GraphQL endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("LessWrong API returned error: {} - {}", status, error_text);
        }

        let envelopes = response
            .json::<Vec<GraphqlEnvelope>>()
            .await
            .context("Failed to parse LessWrong GraphQL response")?;

        let results = envelopes
            .into_iter()
            .next()
            .map(|envelope| envelope.data.posts.results)
            .unwrap_or_default();

        Ok(collect_posts(results, include_contentless))
    }
}

fn post_url(id: &str, slug: &str) -> String {
    format!("https://www.lesswrong.com/posts/{}/{}", id, slug)
}

fn collect_posts(results: Vec<RawPost>, include_contentless: bool) -> Vec<Post> {
    results
        .into_iter()
        .filter_map(|raw| {
            let html = match raw.contents {
                Some(contents) => contents.html,
                None if include_contentless => String::new(),
                None => return None,
            };
            Some(Post {
                url: post_url(&raw.id, &raw.slug),
                title: raw.title,
                html,
            })
        })
        .collect()
}
