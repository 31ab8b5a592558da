use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::trace;

/// Fit outcome as sent over the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteFit {
    pub keys: Vec<String>,
    pub feature_shape: Vec<usize>,
    pub property_shape: Vec<usize>,
    pub loss: f32,
}

pub struct MessageClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl MessageClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Sends a raw line and waits for its response.
    pub async fn send_message(&mut self, message: &str) -> Result<Response> {
        trace!("> {}", message);
        self.writer
            .write_all(format!("{}\n", message.trim_end()).as_bytes())
            .await?;
        self.writer.flush().await?;
        let line = self.lines.next_line().await?.ok_or(Error::Disconnected)?;
        trace!("< {}", line);
        line.parse()
    }

    pub async fn send(&mut self, request: &Request) -> Result<Response> {
        self.send_message(&request.to_string()).await
    }

    pub async fn predict(&mut self, linker: &str) -> Result<Vec<f32>> {
        self.estimate(Request::Predict(linker.to_string())).await
    }

    /// Prediction for a candidate linker under `possible/`.
    pub async fn predict_possible(&mut self, linker: &str) -> Result<Vec<f32>> {
        self.estimate(Request::PredictPossible(linker.to_string()))
            .await
    }

    async fn estimate(&mut self, request: Request) -> Result<Vec<f32>> {
        let payload = self.send(&request).await?.into_result()?;
        payload
            .split_whitespace()
            .map(|v| {
                v.parse::<f32>()
                    .map_err(|e| Error::Protocol(format!("bad prediction '{v}': {e}")))
            })
            .collect()
    }

    pub async fn add(&mut self, linker: &str) -> Result<usize> {
        let payload = self
            .send(&Request::Add(linker.to_string()))
            .await?
            .into_result()?;
        parse_size(&payload)
    }

    pub async fn len(&mut self) -> Result<usize> {
        let payload = self.send(&Request::Len).await?.into_result()?;
        parse_size(&payload)
    }

    /// Asks the server to write its weights to `path` on the server side.
    pub async fn save(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(&Request::Save(path.into())).await?.into_result()?;
        Ok(())
    }

    pub async fn fit(&mut self) -> Result<RemoteFit> {
        let payload = self.send(&Request::Fit).await?.into_result()?;
        Ok(serde_json::from_str(&payload)?)
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.send(&Request::Shutdown).await?.into_result()?;
        Ok(())
    }
}

fn parse_size(payload: &str) -> Result<usize> {
    payload
        .parse()
        .map_err(|e| Error::Protocol(format!("bad data set size '{payload}': {e}")))
}
