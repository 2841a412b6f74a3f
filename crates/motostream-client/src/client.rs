//! HTTP client for the motostream server.
//!
//! [`MotorcycleClient`] wraps a pooled [`reqwest::Client`] and exposes the
//! primitive calls every composition strategy is built from:
//!
//! - [`fetch_motorcycle`](MotorcycleClient::fetch_motorcycle)
//! - [`fetch_specification`](MotorcycleClient::fetch_specification)
//! - [`try_fetch_motorcycle`](MotorcycleClient::try_fetch_motorcycle)
//! - [`stream_motorcycles`](MotorcycleClient::stream_motorcycles)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use motostream_core::{
    codec::LineDecoder,
    routes::{STREAM_ROUTE, motorcycle_path, specification_path},
    types::{ErrorBody, Motorcycle, MotorcycleId, Specification},
};
use reqwest::{Client, Response, StatusCode, Url};

/// Motorcycles decoded from the stream endpoint, in server order.
///
/// Dropping the stream closes the connection; the server is not told to stop
/// emitting.
pub type MotorcycleStream = BoxStream<'static, Result<Motorcycle>>;

#[derive(Clone, Debug)]
pub struct MotorcycleClient {
    http: Client,
    base_url: Url,
}

impl MotorcycleClient {
    /// Creates a client for the server at `base_url`, e.g.
    /// `http://localhost:8081`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a client reusing a preconfigured [`reqwest::Client`].
    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /motorcycle/{id}`.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-2xx status.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn fetch_motorcycle(&self, id: &MotorcycleId) -> Result<Motorcycle> {
        let response = self.get(&motorcycle_path(id)).await?;
        Ok(response.json().await?)
    }

    /// `GET /motorcycle/{id}/specification`.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-2xx status.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn fetch_specification(&self, id: &MotorcycleId) -> Result<Specification> {
        let response = self.get(&specification_path(id)).await?;
        Ok(response.json().await?)
    }

    /// `GET /motorcycle/{id}`, inspecting the status instead of failing on it.
    ///
    /// A `200 OK` is decoded; any other status is logged, its body discarded,
    /// and `None` returned.
    ///
    /// # Errors
    ///
    /// Transport failures and undecodable `200 OK` bodies.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn try_fetch_motorcycle(&self, id: &MotorcycleId) -> Result<Option<Motorcycle>> {
        let url = self.url(&motorcycle_path(id))?;
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::OK {
            return Ok(Some(response.json().await?));
        }

        tracing::warn!("Skipping motorcycle {id}: server responded {}", response.status());
        Ok(None)
    }

    /// `GET /motorcycles/stream`, decoded frame by frame as bytes arrive.
    ///
    /// The returned stream ends cleanly when the server completes. A stream
    /// the server aborts surfaces as an [`Error::Http`] item.
    ///
    /// # Errors
    ///
    /// Opening the stream fails on transport errors or a non-2xx status.
    pub async fn stream_motorcycles(&self) -> Result<MotorcycleStream> {
        let response = self.get(STREAM_ROUTE).await?;
        let frames = FrameState {
            body: response.bytes_stream().boxed(),
            decoder: LineDecoder::new(),
            ended: false,
        };
        Ok(stream::try_unfold(frames, next_frame).boxed())
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        tracing::debug!("GET {url}");
        let response = self.http.get(url.clone()).send().await?;
        check_status(url, response).await
    }
}

async fn check_status(url: Url, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.json::<ErrorBody>().await.ok().map(|body| body.error);
    Err(Error::Status {
        url: url.to_string(),
        status,
        message,
    })
}

struct FrameState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: LineDecoder,
    ended: bool,
}

async fn next_frame(mut state: FrameState) -> Result<Option<(Motorcycle, FrameState)>> {
    loop {
        if let Some(moto) = state.decoder.next_frame()? {
            return Ok(Some((moto, state)));
        }
        if state.ended {
            return Ok(None);
        }

        match state.body.next().await {
            Some(chunk) => state.decoder.push(&chunk?),
            None => {
                state.ended = true;
                if let Some(moto) = state.decoder.finish()? {
                    return Ok(Some((moto, state)));
                }
                return Ok(None);
            }
        }
    }
}
