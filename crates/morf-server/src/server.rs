use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use itertools::Itertools;
use morf_core::Learner;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

type SharedLearner = Arc<Mutex<Learner>>;

/// Stops a running [`LearningServer`] from outside.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Serves one [`Learner`] to any number of connections. Requests are executed
/// one at a time.
pub struct LearningServer {
    listener: TcpListener,
    learner: SharedLearner,
    shutdown: Arc<watch::Sender<bool>>,
    stop: watch::Receiver<bool>,
}

impl LearningServer {
    pub async fn bind<A: ToSocketAddrs>(addr: A, learner: Learner) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        // subscribed here so a shutdown sent before `run` is still seen
        let (tx, stop) = watch::channel(false);
        Ok(Self {
            listener,
            learner: Arc::new(Mutex::new(learner)),
            shutdown: Arc::new(tx),
            stop,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown.clone(),
        }
    }

    /// Accepts connections until a `shutdown` request arrives or the
    /// [`ShutdownHandle`] fires.
    pub async fn run(mut self) -> Result<()> {
        info!("Learning server listening on {}", self.local_addr()?);
        while !*self.stop.borrow_and_update() {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!("connection from {}", peer);
                    let learner = self.learner.clone();
                    let shutdown = self.shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, learner, shutdown).await {
                            warn!("connection {} closed with error: {}", peer, e);
                        }
                    });
                }
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Learning server shut down");
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    learner: SharedLearner,
    shutdown: Arc<watch::Sender<bool>>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (response, stop) = match line.parse::<Request>() {
            Ok(request) => {
                let stop = request == Request::Shutdown;
                (execute(&learner, request).await, stop)
            }
            Err(e) => (Response::Err(e.to_string()), false),
        };
        debug!("{} -> {}", line.trim(), response);
        writer.write_all(format!("{response}\n").as_bytes()).await?;
        writer.flush().await?;
        if stop {
            shutdown.send_replace(true);
            break;
        }
    }
    Ok(())
}

async fn execute(learner: &SharedLearner, request: Request) -> Response {
    match request {
        Request::Time => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            Response::Ok(format!("{now:.3}"))
        }
        Request::Shutdown => Response::Ok("bye".to_string()),
        request => {
            let learner = learner.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let mut learner = learner.lock().map_err(|_| Error::Poisoned)?;
                dispatch(&mut learner, request)
            })
            .await
            .map_err(Error::from)
            .and_then(|result| result);
            match outcome {
                Ok(payload) => Response::Ok(payload),
                Err(e) => {
                    error!("request failed: {}", e);
                    Response::Err(e.to_string())
                }
            }
        }
    }
}

/// Runs a request that needs the learner.
pub fn dispatch(learner: &mut Learner, request: Request) -> Result<String> {
    let payload = match request {
        Request::Predict(linker) => learner.predict(&linker)?.iter().join(" "),
        Request::PredictPossible(linker) => learner.predict_possible(&linker)?.iter().join(" "),
        Request::Add(linker) => learner.add_data(&linker)?.to_string(),
        Request::Fit => serde_json::to_string(&learner.fit_model()?)?,
        Request::Save(path) => {
            learner.save(&path)?;
            path.display().to_string()
        }
        Request::Len => learner.len().to_string(),
        Request::Time | Request::Shutdown => {
            return Err(Error::Protocol(
                "time and shutdown are answered by the server".to_string(),
            ))
        }
    };
    Ok(payload)
}
