use crate::engine::Engine;
use gee_http::codec::{DEFAULT_MAX_BODY_SIZE, RequestDecoder};
use gee_http::connection::HttpConnection;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, debug, error, info, warn};

/// Server settings, e.g. read from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub max_body_size: usize,
    /// One of `trace`, `debug`, `info`, `warn` or `error`
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: "127.0.0.1:9999".to_string(), max_body_size: DEFAULT_MAX_BODY_SIZE, log_level: "info".to_string() }
    }
}

pub struct ServerBuilder {
    engine: Option<Engine>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    max_body_size: usize,
    log_level: Level,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { engine: None, address: None, max_body_size: DEFAULT_MAX_BODY_SIZE, log_level: Level::INFO }
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(|addrs| addrs.collect()));
        self
    }

    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn log_level(mut self, log_level: Level) -> Self {
        self.log_level = log_level;
        self
    }

    /// Applies every setting of `config`. An unknown log level keeps the current one.
    pub fn config(self, config: &ServerConfig) -> Self {
        let log_level = match config.log_level.parse::<Level>() {
            Ok(level) => level,
            Err(_) => {
                warn!(log_level = config.log_level.as_str(), "unknown log level, ignored");
                self.log_level
            }
        };
        self.address(config.address.as_str()).max_body_size(config.max_body_size).log_level(log_level)
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let engine = self.engine.ok_or(ServerBuildError::MissingEngine)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }

        Ok(Server { engine: Arc::new(engine), address, max_body_size: self.max_body_size, log_level: self.log_level })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("engine must be set")]
    MissingEngine,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {0}")]
    InvalidAddress(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Build(#[from] ServerBuildError),
    #[error("bind {address:?} error: {source}")]
    Bind {
        address: Vec<SocketAddr>,
        #[source]
        source: io::Error,
    },
}

pub struct Server {
    engine: Arc<Engine>,
    address: Vec<SocketAddr>,
    max_body_size: usize,
    log_level: Level,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Installs the log subscriber, binds the address and serves until the process stops.
    pub async fn start(self) -> Result<(), ServerError> {
        // keeps a subscriber the application already installed
        let _ = tracing_subscriber::fmt().with_max_level(self.log_level).try_init();

        info!("start listening at {:?}", self.address);
        let listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(listener) => listener,
            Err(source) => {
                error!(cause = %source, "bind server error");
                return Err(ServerError::Bind { address: self.address, source });
            }
        };

        self.serve(listener).await;
        Ok(())
    }

    /// Accepts connections from `listener` forever, one task per connection.
    pub async fn serve(self, listener: TcpListener) {
        for route in self.engine.router().routes() {
            debug!(%route, "serving route");
        }

        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let engine = Arc::clone(&self.engine);
            let max_body_size = self.max_body_size;

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let decoder = RequestDecoder::with_max_body_size(max_body_size);
                let connection = HttpConnection::with_decoder(reader, writer, decoder);
                match connection.process(engine).await {
                    Ok(_) => {
                        debug!(%remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(%remote_addr, "service has error, cause {}, connection shutdown", e);
                    }
                }
            });
        }
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder").field("address", &self.address).field("max_body_size", &self.max_body_size).finish_non_exhaustive()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("engine", &self.engine)
            .field("address", &self.address)
            .field("max_body_size", &self.max_body_size)
            .field("log_level", &self.log_level)
            .finish()
    }
}
