//! morf-server
//!
//! Keeps a [`morf_core::Learner`] alive between search steps and answers
//! requests over a local TCP socket.
//!
//! ```ignore
//! let server = LearningServer::bind(("127.0.0.1", 9996), learner).await?;
//! tokio::spawn(server.run());
//! let mut client = MessageClient::connect(("127.0.0.1", 9996)).await?;
//! let stiffness = client.predict("0042").await?;
//! ```
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::{MessageClient, RemoteFit};
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use protocol::{Request, Response};
pub use server::{LearningServer, ShutdownHandle};
