use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Encoder;
use tracing::{debug, trace, warn, Instrument, Span};
use uuid::Uuid;

use crate::codec::CommandCodec;
use crate::command::Command;
use crate::config::Config;
use crate::error::{Error, UsageError};
use crate::pubsub::Router;
use crate::reader::FrameReader;
use crate::reply::Reply;
use crate::Result;

/// Anything that can run one command and hand back its reply.
///
/// Cursor scans are written against this trait so they can be driven by a connection or by a
/// scripted executor.
pub trait Execute {
    fn execute(&self, cmd: Command) -> BoxFuture<'_, Result<Reply>>;
}

/// A client connection to a single server.
///
/// Cloning is cheap; every clone shares the same socket and serializes its requests through the
/// same lock, so each reply is read by the caller that sent the matching request.
#[derive(Clone)]
pub struct Connection {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    id: Uuid,
    addr: SocketAddr,
    pub(crate) span: Span,
    pub(crate) config: Config,
    pub(crate) state: Mutex<State>,
}

pub(crate) enum Mode {
    Normal,
    /// The read half belongs to the push receiver task.
    Subscribed(Arc<Router>),
    Broken,
}

pub(crate) struct State {
    pub(crate) reader: Option<FrameReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    // Outgoing requests are encoded here before being written in a single call.
    buffer: BytesMut,
    codec: CommandCodec,
    pub(crate) mode: Mode,
    // Set once a request is written and cleared when its replies have been read. Still set on the
    // next call means a caller gave up halfway and the stream position is lost.
    pub(crate) pending: bool,
}

impl Connection {
    /// Connects to `addr` with default settings.
    pub async fn connect(addr: impl Into<String>) -> Result<Connection> {
        Connection::connect_with(Config::new(addr)).await
    }

    pub async fn connect_with(config: Config) -> Result<Connection> {
        let connect = TcpStream::connect(config.addr.as_str());
        let stream = match config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect).await.map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connecting to {} timed out", config.addr),
                )
            })??,
            None => connect.await?,
        };

        let addr = stream.peer_addr()?;
        let id = Uuid::new_v4();
        let span = tracing::info_span!(
            "connection",
            connection_id = %id,
            server_address = %addr
        );
        span.in_scope(|| debug!("connected"));

        let (read_half, write_half) = stream.into_split();
        let reader = FrameReader::new(read_half)
            .with_limits(config.max_depth, config.max_bulk_len)
            .with_line_limit(config.max_line_len);

        let state = State {
            reader: Some(reader),
            writer: write_half,
            buffer: BytesMut::with_capacity(4096),
            codec: CommandCodec,
            mode: Mode::Normal,
            pending: false,
        };

        Ok(Connection {
            inner: Arc::new(Inner {
                id,
                addr,
                span,
                config,
                state: Mutex::new(state),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.addr
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Sends `cmd` and reads its reply.
    ///
    /// A `-` reply is returned as `Ok(Reply::Error(..))`; the typed accessors turn it into
    /// [`Error::Server`]. Dropping the returned future after the request was written leaves the
    /// connection broken.
    pub async fn run(&self, cmd: Command) -> Result<Reply> {
        let mut state = self.inner.state.lock().await;

        async move {
            state.check_usable()?;
            if let Mode::Subscribed(_) = state.mode {
                return Err(UsageError::Subscribed.into());
            }

            debug!(command = %cmd.name(), "sending command");
            state.write(&cmd).await?;
            let reply = state.read_reply().await?;
            state.pending = false;

            trace!(?reply, "reply received");
            Ok(reply)
        }
        .instrument(self.inner.span.clone())
        .await
    }

    pub async fn is_subscribed(&self) -> bool {
        matches!(self.inner.state.lock().await.mode, Mode::Subscribed(_))
    }

    /// Whether an earlier failure left the connection unusable.
    pub async fn is_broken(&self) -> bool {
        let state = self.inner.state.lock().await;
        match &state.mode {
            Mode::Broken => true,
            Mode::Subscribed(router) => router.is_closed(),
            Mode::Normal => state.pending,
        }
    }
}

impl Execute for Connection {
    fn execute(&self, cmd: Command) -> BoxFuture<'_, Result<Reply>> {
        self.run(cmd).boxed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("addr", &self.inner.addr)
            .finish()
    }
}

impl State {
    /// Fails with [`Error::ConnectionClosed`] if the connection can no longer be trusted.
    pub(crate) fn check_usable(&mut self) -> Result<()> {
        if self.pending {
            warn!("previous request was abandoned before its reply was read");
            self.mark_broken();
        }

        match &self.mode {
            Mode::Broken => Err(Error::ConnectionClosed),
            Mode::Subscribed(router) if router.is_closed() => Err(Error::ConnectionClosed),
            _ => Ok(()),
        }
    }

    /// Encodes and writes one request. Nothing is written when encoding fails.
    pub(crate) async fn write(&mut self, cmd: &Command) -> Result<()> {
        self.buffer.clear();
        self.codec.encode(cmd, &mut self.buffer)?;

        self.pending = true;
        let written = async {
            self.writer.write_all(&self.buffer).await?;
            self.writer.flush().await
        }
        .await;

        written.map_err(|err| {
            self.mark_broken();
            err.into()
        })
    }

    pub(crate) async fn read_reply(&mut self) -> Result<Reply> {
        let reader = self.reader.as_mut().ok_or(Error::ConnectionClosed)?;

        match reader.decode_one().await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                self.mark_broken();
                Err(err)
            }
        }
    }

    /// Gives up on the connection. A running push receiver is stopped and every subscription
    /// stream ends.
    pub(crate) fn mark_broken(&mut self) {
        match &self.mode {
            Mode::Broken => {}
            Mode::Subscribed(router) => {
                warn!("connection is broken");
                router.close();
            }
            Mode::Normal => warn!("connection is broken"),
        }
        self.mode = Mode::Broken;
        self.reader = None;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn connected() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let conn = Connection::connect(addr.to_string()).await.unwrap();
        let (server, _) = accept.await.unwrap().unwrap();
        (conn, server)
    }

    #[tokio::test]
    async fn breaking_a_subscribed_connection_closes_its_router() {
        let (conn, _server) = connected().await;
        let router = Arc::new(Router::default());

        let mut state = conn.inner.state.lock().await;
        state.mode = Mode::Subscribed(router.clone());
        state.mark_broken();

        assert!(router.is_closed());
        assert!(matches!(state.mode, Mode::Broken));
        assert!(state.check_usable().is_err());
    }

    #[tokio::test]
    async fn abandoned_request_is_noticed_on_next_use() {
        let (conn, _server) = connected().await;

        let mut state = conn.inner.state.lock().await;
        state.pending = true;

        assert!(matches!(state.check_usable(), Err(Error::ConnectionClosed)));
        assert!(state.reader.is_none());
    }
}
