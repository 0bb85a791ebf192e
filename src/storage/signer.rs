//! Query-string URL signing.
//!
//! AWS uses SigV4 presigning with an unsigned payload; Google uses V2 HMAC signing with
//! interoperability (HMAC) keys. Both keep every caller-supplied query parameter.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use super::config::{Provider, StorageConfig};
use super::error::{StorageError, StorageResult};
use super::provider::SignRequest;
use super::url::encode_component;

/// Longest lifetime S3 accepts for a presigned URL (7 days).
pub const AWS_MAX_EXPIRES: i64 = 604_800;

const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[derive(Clone)]
pub enum UrlSigner {
    AwsV4 {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
        region: String,
    },
    GoogleV2 {
        access_id: String,
        secret: String,
    },
}

impl Debug for UrlSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlSigner::AwsV4 {
                access_key_id,
                region,
                ..
            } => write!(f, "UrlSigner::AwsV4(key_id={}, region={})", access_key_id, region),
            UrlSigner::GoogleV2 { access_id, .. } => {
                write!(f, "UrlSigner::GoogleV2(access_id={})", access_id)
            }
        }
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> StorageResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StorageError::ConfigError(format!("Invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha1(key: &[u8], data: &str) -> StorageResult<Vec<u8>> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| StorageError::ConfigError(format!("Invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn host_of(request: &SignRequest) -> StorageResult<String> {
    let host = request
        .url
        .host_str()
        .ok_or_else(|| StorageError::SignatureError {
            key: request.key.clone(),
            reason: format!("url '{}' has no host", request.url),
        })?;
    Ok(match request.url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn join_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

impl UrlSigner {
    /// Signer for the configured credentials, `None` if the provider or credentials cannot sign.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Option<Self>> {
        let option = |key: &str| {
            config
                .get_option(key)
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Ok(match config.provider()? {
            Provider::Aws => match (option("access_key_id"), option("secret_access_key")) {
                (Some(access_key_id), Some(secret_access_key)) => Some(UrlSigner::AwsV4 {
                    access_key_id,
                    secret_access_key,
                    session_token: option("session_token"),
                    region: config.region().unwrap_or("us-east-1").to_string(),
                }),
                _ => None,
            },
            Provider::Google => match (option("hmac_access_id"), option("hmac_secret")) {
                (Some(access_id), Some(secret)) => Some(UrlSigner::GoogleV2 { access_id, secret }),
                _ => None,
            },
            Provider::Local => None,
        })
    }

    pub fn sign(&self, request: &SignRequest) -> StorageResult<String> {
        match self {
            UrlSigner::AwsV4 {
                access_key_id,
                secret_access_key,
                session_token,
                region,
            } => sign_aws_v4(
                request,
                access_key_id,
                secret_access_key,
                session_token.as_deref(),
                region,
            ),
            UrlSigner::GoogleV2 { access_id, secret } => sign_google_v2(request, access_id, secret),
        }
    }
}

/// Lifetime of the signature, rounded to the nearest whole second.
///
/// `X-Amz-Date` has second resolution, so sub-second drift between the clock and a caller's
/// `expire_at` must not cost a second.
fn expires_in_seconds(request: &SignRequest) -> i64 {
    let millis = (request.expires_at - request.signed_at).num_milliseconds();
    (millis + 500).div_euclid(1000)
}

fn sign_aws_v4(
    request: &SignRequest,
    access_key_id: &str,
    secret_access_key: &str,
    session_token: Option<&str>,
    region: &str,
) -> StorageResult<String> {
    let expires = expires_in_seconds(request);
    if !(1..=AWS_MAX_EXPIRES).contains(&expires) {
        return Err(StorageError::SignatureError {
            key: request.key.clone(),
            reason: format!(
                "expiry of {}s is outside 1..={}s",
                expires, AWS_MAX_EXPIRES
            ),
        });
    }

    let amz_date = request.signed_at.format("%Y%m%dT%H%M%SZ").to_string();
    let date = request.signed_at.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/s3/aws4_request", date, region);
    let host = host_of(request)?;

    let mut params = BTreeMap::new();
    params.insert("X-Amz-Algorithm".to_string(), AWS_ALGORITHM.to_string());
    params.insert(
        "X-Amz-Credential".to_string(),
        encode_component(&format!("{}/{}", access_key_id, scope)),
    );
    params.insert("X-Amz-Date".to_string(), amz_date.clone());
    params.insert("X-Amz-Expires".to_string(), expires.to_string());
    params.insert("X-Amz-SignedHeaders".to_string(), "host".to_string());
    if let Some(token) = session_token {
        params.insert("X-Amz-Security-Token".to_string(), encode_component(token));
    }
    for (key, value) in &request.query {
        // caller parameters never replace signature parameters
        params
            .entry(encode_component(key))
            .or_insert_with(|| encode_component(value));
    }
    let query = join_query(&params);

    let canonical_request = format!(
        "GET\n{}\n{}\nhost:{}\n\nhost\n{}",
        request.url.path(),
        query,
        host,
        UNSIGNED_PAYLOAD
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_date = hmac_sha256(format!("AWS4{}", secret_access_key).as_bytes(), &date)?;
    let k_region = hmac_sha256(&k_date, region)?;
    let k_service = hmac_sha256(&k_region, "s3")?;
    let k_signing = hmac_sha256(&k_service, "aws4_request")?;
    let signature = hex::encode(hmac_sha256(&k_signing, &string_to_sign)?);

    Ok(format!(
        "{}://{}{}?{}&X-Amz-Signature={}",
        request.url.scheme(),
        host,
        request.url.path(),
        query,
        signature
    ))
}

fn sign_google_v2(request: &SignRequest, access_id: &str, secret: &str) -> StorageResult<String> {
    let expires = request.expires_at.timestamp();
    if expires <= request.signed_at.timestamp() {
        return Err(StorageError::SignatureError {
            key: request.key.clone(),
            reason: format!("expiry {} is not after signing time", request.expires_at),
        });
    }

    let string_to_sign = format!("GET\n\n\n{}\n{}", expires, request.url.path());
    let signature = BASE64.encode(hmac_sha1(secret.as_bytes(), &string_to_sign)?);

    let mut url = format!(
        "{}://{}{}?GoogleAccessId={}&Expires={}&Signature={}",
        request.url.scheme(),
        host_of(request)?,
        request.url.path(),
        encode_component(access_id),
        expires,
        encode_component(&signature)
    );
    for (key, value) in &request.query {
        if matches!(key.as_str(), "GoogleAccessId" | "Expires" | "Signature") {
            continue;
        }
        url.push('&');
        url.push_str(&encode_component(key));
        url.push('=');
        url.push_str(&encode_component(value));
    }
    Ok(url)
}
