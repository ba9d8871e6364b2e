//! Memcached Module
//!
//! [`Cache`] implementation backed by a remote memcached server through the
//! `memcache` client. Values are stored as JSON; writes use `add`, so an
//! existing entry is never replaced.
//!
//! The client is blocking, so every exchange runs on tokio's blocking pool.
//! A caller that gives up (deadline or dropped future) only stops waiting:
//! the exchange itself finishes and hands its connection back to the pool
//! with the reply fully read.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use memcache::MemcacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::cache::{Cache, Expiration};
use crate::config::MemcachedConfig;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};

// == Protocol Limits ==
/// Maximum key length accepted by memcached, in bytes
pub const MAX_KEY_LENGTH: usize = 250;

/// Default memcached item size limit, in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Memcached Store ==
/// Memcached-backed store for JSON-serializable values of type `T`.
pub struct Memcached<T> {
    /// Connection URL handed to the client
    url: String,
    /// Upper bound on one exchange, on top of the caller's deadline
    io_timeout: Duration,
    /// Expiration applied to every write
    expiration: Expiration,
    /// Connected on first use
    client: OnceCell<memcache::Client>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Memcached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memcached")
            .field("url", &self.url)
            .field("io_timeout", &self.io_timeout)
            .field("expiration", &self.expiration)
            .field("connected", &self.client.initialized())
            .finish()
    }
}

impl<T> Memcached<T> {
    // == Constructor ==
    /// Creates a store for the server at `addr` (`host:port`).
    ///
    /// No connection is made until the first request.
    pub fn new(addr: &str, io_timeout: Duration, expiration: Expiration) -> Self {
        Self {
            url: connection_url(addr, io_timeout),
            io_timeout,
            expiration,
            client: OnceCell::new(),
            _marker: PhantomData,
        }
    }

    pub fn from_config(config: &MemcachedConfig) -> Self {
        Self::new(&config.addr, config.io_timeout(), config.expiration())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    async fn client(&self) -> StoreResult<memcache::Client> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let url = self.url.clone();
                let client = tokio::task::spawn_blocking(move || memcache::Client::connect(url))
                    .await
                    .map_err(join_error)?
                    .map_err(store_error)?;
                debug!(url = %self.url, "connected to memcached");
                Ok::<_, StoreError>(client)
            })
            .await?;
        Ok(client.clone())
    }

    // == Exchange ==
    /// Runs one blocking client call under the caller's deadline and the
    /// store's I/O timeout, whichever ends first.
    async fn exchange<R, F>(&self, ctx: &Context, call: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&memcache::Client) -> Result<R, MemcacheError> + Send + 'static,
    {
        let result = ctx
            .child_with_timeout(self.io_timeout)
            .run(async {
                let client = self.client().await?;
                tokio::task::spawn_blocking(move || call(&client))
                    .await
                    .map_err(join_error)?
                    .map_err(store_error)
            })
            .await;
        if let Err(err) = &result {
            if !matches!(err, StoreError::NotStored(_)) {
                warn!(url = %self.url, error = %err, "memcached exchange failed");
            }
        }
        result
    }
}

#[async_trait]
impl<T> Cache<String, T> for Memcached<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    // == Get ==
    /// Fetches and decodes the value; a server-side miss maps to `NotFound`.
    async fn get(&self, ctx: &Context, key: &String) -> StoreResult<T> {
        validate_key(key)?;
        let key = key.clone();
        let bytes = self
            .exchange(ctx, move |client| client.get::<Vec<u8>>(&key))
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // == Set ==
    /// Encodes the value and adds it with the configured expiration.
    async fn set(&self, ctx: &Context, key: &String, value: &T) -> StoreResult<()> {
        validate_key(key)?;
        let data = serde_json::to_vec(value)?;
        if data.len() > MAX_VALUE_SIZE {
            return Err(StoreError::ValueTooLarge(data.len()));
        }
        let exptime = self.expiration.to_exptime(Utc::now());
        let key = key.clone();
        self.exchange(ctx, move |client| client.add(&key, data.as_slice(), exptime))
            .await
    }
}

// == Key Validation ==
/// Rejects keys memcached would refuse: empty, longer than 250 bytes, or
/// containing whitespace or control characters.
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if key.bytes().any(|b| b <= b' ' || b == 0x7f) {
        return Err(StoreError::InvalidKey(format!(
            "key {:?} contains whitespace or control characters",
            key
        )));
    }
    Ok(())
}

/// Client URL using the text protocol, with socket and connect timeouts.
fn connection_url(addr: &str, io_timeout: Duration) -> String {
    let secs = io_timeout.as_secs_f64();
    format!(
        "memcache://{}?protocol=ascii&timeout={}&connect_timeout={}",
        addr, secs, secs
    )
}

/// Maps client errors onto the store taxonomy.
fn store_error(err: MemcacheError) -> StoreError {
    match err {
        MemcacheError::IOError(err) => StoreError::Io(err),
        err @ MemcacheError::CommandError(_) => StoreError::NotStored(err.to_string()),
        err @ MemcacheError::ServerError(_) => StoreError::Server(err.to_string()),
        err @ MemcacheError::ClientError(_) => StoreError::InvalidKey(err.to_string()),
        err => StoreError::Protocol(err.to_string()),
    }
}

fn join_error(err: tokio::task::JoinError) -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::Other, err))
}
