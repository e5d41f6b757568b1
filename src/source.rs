//! Loading the product photo from disk or from an allow-listed URL.

use crate::{
    config::FetchPolicy,
    error::{Result, StudioError},
    models::{ImageFormat, SourceImage},
};
use reqwest::{redirect, Client, Url};
use std::path::Path;

const MAX_REDIRECTS: usize = 10;

/// Content types servers send when they do not know better.
const GENERIC_CONTENT_TYPES: [&str; 2] = ["application/octet-stream", "binary/octet-stream"];

pub async fn from_file(path: impl AsRef<Path>) -> Result<SourceImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StudioError::Read(format!("{}: {}", path.display(), e)))?;

    let format = ImageFormat::from_magic_bytes(&bytes)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .ok_or_else(|| {
            StudioError::Read(format!("{} is not a supported image", path.display()))
        })?;

    log::info!(
        "Loaded source image {} ({}, {} bytes)",
        path.display(),
        format.mime_type(),
        bytes.len()
    );
    Ok(SourceImage::from_bytes(&bytes, format.mime_type()))
}

/// Checks scheme and host against the policy and returns the URL to
/// actually request, which goes through the relay when one is configured.
pub fn resolve_fetch_url(url: &str, policy: &FetchPolicy) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| StudioError::InvalidUrl(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(StudioError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| StudioError::InvalidUrl("URL has no host".into()))?;
    if !policy.is_allowed(host) {
        return Err(StudioError::InvalidUrl(format!(
            "host {} is not in the allowed list",
            host
        )));
    }

    match &policy.relay_url {
        Some(relay) => {
            let mut relayed = Url::parse(relay)
                .map_err(|e| StudioError::Config(format!("invalid fetch relay URL: {}", e)))?;
            relayed.query_pairs_mut().append_pair("url", parsed.as_str());
            Ok(relayed)
        }
        None => Ok(parsed),
    }
}

/// Redirects are followed only while every hop stays on an allowed host.
fn redirect_policy(policy: &FetchPolicy) -> redirect::Policy {
    let policy = policy.clone();
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let host = attempt.url().host_str().map(str::to_string);
        match host {
            Some(host) if policy.is_allowed(&host) => attempt.follow(),
            Some(host) => {
                log::warn!("Refusing redirect to {}: host is not allowed", host);
                attempt.error(format!("redirect to {} is not in the allowed list", host))
            }
            None => attempt.error("redirect target has no host"),
        }
    })
}

/// `None` means the declared type says nothing useful and the bytes decide.
fn declared_format(content_type: Option<&str>) -> Result<Option<ImageFormat>> {
    let essence = match content_type {
        Some(value) => value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
        None => return Ok(None),
    };

    if essence.is_empty() || GENERIC_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(None)
    } else if essence.starts_with("image/") {
        Ok(ImageFormat::from_mime_type(&essence))
    } else {
        Err(StudioError::Fetch(format!(
            "response is not an image (content type {})",
            essence
        )))
    }
}

fn too_large(size: u64, limit: u64) -> StudioError {
    StudioError::Fetch(format!("image is {} bytes, limit is {}", size, limit))
}

pub async fn from_url(url: &str, policy: &FetchPolicy) -> Result<SourceImage> {
    let target = resolve_fetch_url(url, policy)?;

    let client = Client::builder()
        .timeout(policy.timeout)
        .redirect(redirect_policy(policy))
        .build()
        .map_err(|e| StudioError::Fetch(e.to_string()))?;

    log::info!("Fetching source image from {}", target);
    let mut response = client
        .get(target)
        .send()
        .await
        .map_err(|e| StudioError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(StudioError::Fetch(format!(
            "server answered {}. The link may be broken or blocked; try downloading the image and loading the file instead.",
            status
        )));
    }

    if let Some(length) = response.content_length() {
        if length > policy.max_bytes {
            return Err(too_large(length, policy.max_bytes));
        }
    }

    let declared = declared_format(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    )?;

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| StudioError::Fetch(e.to_string()))?
    {
        let received = (bytes.len() + chunk.len()) as u64;
        if received > policy.max_bytes {
            return Err(too_large(received, policy.max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }

    let format = declared
        .or_else(|| ImageFormat::from_magic_bytes(&bytes))
        .ok_or_else(|| StudioError::Fetch("response is not a supported image".into()))?;

    Ok(SourceImage::from_bytes(&bytes, format.mime_type()))
}

/// Accepts a local path, an `http(s)` URL or a `data:` URL.
pub async fn load(location: &str, policy: &FetchPolicy) -> Result<SourceImage> {
    if location.starts_with("data:") {
        SourceImage::from_data_url(location)
    } else if location.starts_with("http://") || location.starts_with("https://") {
        from_url(location, policy).await
    } else {
        from_file(location).await
    }
}
