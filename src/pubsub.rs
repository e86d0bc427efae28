//! Publish/subscribe.
//!
//! The first successful subscribe hands the read half of the connection to a receiver task that
//! decodes push frames and routes each message to the queue of the subscription that asked for
//! it. Every `subscribe`/`psubscribe` call gets its own bounded queue. A queue that is full blocks
//! the receiver task, which stalls every other subscription on the same connection until the
//! consumer catches up.
//!
//! A subscribe call returns once the server has confirmed all of its topics. Messages that arrive
//! before that are held back and handed over with the [`Subscription`], so the queue of a caller
//! that is still waiting can never fill up.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use itertools::Itertools;
use strum_macros::EnumString;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error, warn, Instrument};

use crate::command::Command;
use crate::connection::{Connection, Mode, State};
use crate::error::{Error, ProtocolError, UsageError};
use crate::reader::FrameReader;
use crate::reply::Reply;
use crate::Result;

/// What a subscription listens to: exact channel names or glob-style patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Channel,
    Pattern,
}

impl TopicKind {
    fn subscribe_command(self) -> &'static str {
        match self {
            TopicKind::Channel => "SUBSCRIBE",
            TopicKind::Pattern => "PSUBSCRIBE",
        }
    }

    fn unsubscribe_command(self) -> &'static str {
        match self {
            TopicKind::Channel => "UNSUBSCRIBE",
            TopicKind::Pattern => "PUNSUBSCRIBE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Topic {
    kind: TopicKind,
    name: String,
}

/// A published message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub channel: String,
    /// The pattern that matched, for messages received through `psubscribe`.
    pub pattern: Option<String>,
    pub payload: Bytes,
}

/// One item of a subscription stream. Errors are server errors pushed on the connection, or the
/// failure that stopped the receiver; in the latter case the stream ends right after.
pub type Event = Result<Message>;

#[derive(Debug, PartialEq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum PushKind {
    Subscribe,
    Psubscribe,
    Unsubscribe,
    Punsubscribe,
    Message,
    Pmessage,
    Pong,
}

/// A decoded push frame.
#[derive(Debug, PartialEq)]
pub(crate) enum Push {
    /// The server confirmed one topic of a subscribe request.
    Confirmed(Topic),
    Pong,
    /// An unsubscribe confirmation. `None` when the server had nothing to remove.
    Removed(Option<Topic>),
    Delivery(Topic, Message),
    ServerError(String),
}

impl TryFrom<Reply> for Push {
    type Error = Error;

    fn try_from(reply: Reply) -> Result<Push> {
        let items = match reply {
            Reply::Error(message) => return Ok(Push::ServerError(message)),
            Reply::Array(items) if !items.is_empty() => items,
            other => return Err(malformed(format!("unexpected {}", other.kind()))),
        };

        let mut items = items.into_iter();
        let kind = match items.next() {
            Some(Reply::Bulk(tag)) => String::from_utf8_lossy(&tag).into_owned(),
            Some(Reply::Simple(tag)) => tag,
            _ => return Err(malformed("missing kind tag")),
        };
        let kind =
            PushKind::from_str(&kind).map_err(|_| malformed(format!("unknown kind {:?}", kind)))?;
        let rest: Vec<Reply> = items.collect();

        match (kind, rest.as_slice()) {
            (PushKind::Pong, _) => Ok(Push::Pong),
            (PushKind::Subscribe, [name, _]) => Ok(Push::Confirmed(topic(TopicKind::Channel, name)?)),
            (PushKind::Psubscribe, [name, _]) => Ok(Push::Confirmed(topic(TopicKind::Pattern, name)?)),
            (PushKind::Unsubscribe, [name, _]) => removed(TopicKind::Channel, name),
            (PushKind::Punsubscribe, [name, _]) => removed(TopicKind::Pattern, name),
            (PushKind::Message, [channel, payload]) => {
                let channel = text(channel)?;
                let message = Message {
                    channel: channel.clone(),
                    pattern: None,
                    payload: payload_bytes(payload)?,
                };
                Ok(Push::Delivery(
                    Topic {
                        kind: TopicKind::Channel,
                        name: channel,
                    },
                    message,
                ))
            }
            (PushKind::Pmessage, [pattern, channel, payload]) => {
                let pattern = text(pattern)?;
                let message = Message {
                    channel: text(channel)?,
                    pattern: Some(pattern.clone()),
                    payload: payload_bytes(payload)?,
                };
                Ok(Push::Delivery(
                    Topic {
                        kind: TopicKind::Pattern,
                        name: pattern,
                    },
                    message,
                ))
            }
            (kind, rest) => Err(malformed(format!(
                "{:?} with {} elements",
                kind,
                rest.len() + 1
            ))),
        }
    }
}

fn malformed(detail: impl Into<String>) -> Error {
    ProtocolError::MalformedPush(detail.into()).into()
}

fn text(reply: &Reply) -> Result<String> {
    match reply {
        Reply::Bulk(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Reply::Simple(s) => Ok(s.clone()),
        other => Err(malformed(format!("expected a name, got {}", other.kind()))),
    }
}

fn payload_bytes(reply: &Reply) -> Result<Bytes> {
    match reply {
        Reply::Bulk(bytes) => Ok(bytes.clone()),
        Reply::Simple(s) => Ok(Bytes::from(s.clone())),
        other => Err(malformed(format!("expected a payload, got {}", other.kind()))),
    }
}

fn topic(kind: TopicKind, name: &Reply) -> Result<Topic> {
    Ok(Topic {
        kind,
        name: text(name)?,
    })
}

fn removed(kind: TopicKind, name: &Reply) -> Result<Push> {
    match name {
        Reply::Null => Ok(Push::Removed(None)),
        name => Ok(Push::Removed(Some(topic(kind, name)?))),
    }
}

/// Resolves once every topic of a subscribe request is confirmed, with the messages that arrived
/// in the meantime.
type Confirmation = oneshot::Receiver<Result<Vec<Message>>>;

/// A subscribe request still waiting for confirmations.
struct Pending {
    topics: Vec<Topic>,
    unconfirmed: usize,
    backlog: Vec<Message>,
    reply: oneshot::Sender<Result<Vec<Message>>>,
}

#[derive(Default)]
struct Table {
    routes: HashMap<Topic, mpsc::Sender<Event>>,
    /// In the order the requests were written, which is the order the server answers them.
    pending: VecDeque<Pending>,
    /// Unsubscribe confirmations still to come for topics already dropped from `routes`.
    leaving: HashMap<Topic, usize>,
}

impl Table {
    /// Distinct queues currently routed to.
    fn senders(&self) -> Vec<mpsc::Sender<Event>> {
        let mut senders: Vec<mpsc::Sender<Event>> = Vec::new();
        for sender in self.routes.values() {
            if !senders.iter().any(|s| s.same_channel(sender)) {
                senders.push(sender.clone());
            }
        }
        senders
    }
}

/// Routing table from topic to the queue of the subscription that registered it.
#[derive(Default)]
pub(crate) struct Router {
    table: Mutex<Table>,
    closed: AtomicBool,
    shutdown: Notify,
}

impl Router {
    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Routes `topics` to `sender` and queues a confirmation for them.
    fn register(&self, topics: &[Topic], sender: &mpsc::Sender<Event>) -> Result<Confirmation> {
        let mut table = self.table();
        if let Some(taken) = topics.iter().find(|topic| table.routes.contains_key(topic)) {
            return Err(UsageError::AlreadySubscribed(taken.name.clone()).into());
        }

        for topic in topics {
            table.routes.insert(topic.clone(), sender.clone());
        }
        let (reply, confirmation) = oneshot::channel();
        table.pending.push_back(Pending {
            topics: topics.to_vec(),
            unconfirmed: topics.len(),
            backlog: Vec::new(),
            reply,
        });
        Ok(confirmation)
    }

    /// Undoes a `register` whose request never reached the server.
    fn abandon(&self, topics: &[Topic]) {
        let mut table = self.table();
        table.pending.retain(|pending| pending.topics != topics);
        for topic in topics {
            table.routes.remove(topic);
        }
    }

    /// Drops the routes of an unsubscribe request before it is written, so the same topics can be
    /// subscribed again right away. No names means every topic of `kind`.
    fn leave(&self, kind: TopicKind, names: &[String]) {
        let mut guard = self.table();
        let table = &mut *guard;

        let topics: Vec<Topic> = if names.is_empty() {
            table
                .routes
                .keys()
                .filter(|topic| topic.kind == kind)
                .cloned()
                .collect()
        } else {
            names
                .iter()
                .map(|name| Topic {
                    kind,
                    name: name.clone(),
                })
                .collect()
        };

        for topic in topics {
            table.routes.remove(&topic);
            *table.leaving.entry(topic).or_default() += 1;
        }
    }

    async fn dispatch(&self, push: Push) {
        match push {
            Push::Pong | Push::Removed(None) => {}
            Push::Confirmed(topic) => self.confirm(&topic),
            Push::Removed(Some(topic)) => self.remove(&topic),
            Push::Delivery(topic, message) => self.deliver(&topic, message).await,
            Push::ServerError(message) => self.reject(message).await,
        }
    }

    fn confirm(&self, topic: &Topic) {
        let mut table = self.table();
        let Some(at) = table
            .pending
            .iter()
            .position(|pending| pending.topics.contains(topic))
        else {
            warn!(topic = %topic.name, "confirmation for a topic nobody asked for");
            return;
        };

        let done = {
            let pending = &mut table.pending[at];
            pending.unconfirmed = pending.unconfirmed.saturating_sub(1);
            pending.unconfirmed == 0
        };
        if done {
            if let Some(pending) = table.pending.remove(at) {
                debug!(topics = pending.topics.len(), "subscription confirmed");
                // The caller may have given up waiting.
                let _ = pending.reply.send(Ok(pending.backlog));
            }
        }
    }

    fn remove(&self, topic: &Topic) {
        let mut guard = self.table();
        let table = &mut *guard;

        if let Some(count) = table.leaving.get_mut(topic) {
            *count -= 1;
            if *count == 0 {
                table.leaving.remove(topic);
            }
            return;
        }

        debug!(topic = %topic.name, "unsubscribed by the server");
        table.routes.remove(topic);
    }

    async fn deliver(&self, topic: &Topic, message: Message) {
        // The lock is released before awaiting on the queue.
        let sender = {
            let mut guard = self.table();
            let table = &mut *guard;

            if let Some(pending) = table
                .pending
                .iter_mut()
                .find(|pending| pending.topics.contains(topic))
            {
                pending.backlog.push(message);
                return;
            }
            table.routes.get(topic).cloned()
        };

        let Some(sender) = sender else {
            warn!(topic = %topic.name, "dropping message for a topic nobody listens to");
            return;
        };

        if sender.send(Ok(message)).await.is_err() {
            warn!(topic = %topic.name, "subscription was dropped, discarding its routes");
            self.forget(&sender);
        }
    }

    /// A `-` reply answers the oldest request still waiting; without one it concerns every
    /// subscription.
    async fn reject(&self, message: String) {
        let pending = {
            let mut guard = self.table();
            let table = &mut *guard;

            let pending = table.pending.pop_front();
            if let Some(pending) = &pending {
                for topic in &pending.topics {
                    table.routes.remove(topic);
                }
            }
            pending
        };

        match pending {
            Some(pending) => {
                warn!(cause = %message, "subscribe rejected");
                let _ = pending.reply.send(Err(Error::Server(message)));
            }
            None => self.broadcast(Error::Server(message)).await,
        }
    }

    fn forget(&self, sender: &mpsc::Sender<Event>) {
        self.table().routes.retain(|_, s| !s.same_channel(sender));
    }

    async fn broadcast(&self, err: Error) {
        let senders = self.table().senders();
        for sender in senders {
            if sender.send(Err(err.clone())).await.is_err() {
                self.forget(&sender);
            }
        }
    }

    /// Answers every waiting request with `err`, delivers it to every queue, then drops all routes
    /// so each stream ends after it.
    async fn fail(&self, err: Error) {
        self.closed.store(true, Ordering::Release);

        let pending: Vec<Pending> = self.table().pending.drain(..).collect();
        for pending in pending {
            let _ = pending.reply.send(Err(err.clone()));
        }

        self.broadcast(err).await;

        let mut table = self.table();
        table.routes.clear();
        table.leaving.clear();
    }

    /// Stops the receiver task and ends every stream. Queues that have room get a
    /// [`Error::ConnectionClosed`] first.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.notify_one();

        let mut table = self.table();
        for pending in table.pending.drain(..) {
            let _ = pending.reply.send(Err(Error::ConnectionClosed));
        }
        for sender in table.senders() {
            let _ = sender.try_send(Err(Error::ConnectionClosed));
        }
        table.routes.clear();
        table.leaving.clear();
    }
}

async fn receive(mut reader: FrameReader<OwnedReadHalf>, router: Arc<Router>) {
    debug!("push receiver started");

    loop {
        let decoded = tokio::select! {
            decoded = reader.decode_one() => decoded,
            _ = router.shutdown.notified() => {
                debug!("push receiver shut down");
                return;
            }
        };

        match decoded.and_then(Push::try_from) {
            Ok(push) => router.dispatch(push).await,
            Err(err) => {
                error!(cause = %err, "push receiver stopped");
                router.fail(err).await;
                return;
            }
        }
    }
}

/// A stream of messages for the topics of one `subscribe`/`psubscribe` call.
///
/// Ends once every one of its topics has been unsubscribed, or after delivering the error that
/// stopped the connection.
#[derive(Debug)]
pub struct Subscription {
    kind: TopicKind,
    topics: Vec<String>,
    // Messages that arrived while the subscribe call was waiting for its confirmations.
    backlog: VecDeque<Message>,
    receiver: mpsc::Receiver<Event>,
    connection: Connection,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Event> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(Ok(message));
        }
        self.receiver.recv().await
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Unsubscribes exactly the topics of this subscription. Messages already queued are still
    /// delivered, then the stream ends.
    pub async fn unsubscribe(&self) -> Result<()> {
        self.connection
            .unsubscribe_from(self.kind, self.topics.clone())
            .await
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        if let Some(message) = self.backlog.pop_front() {
            return Poll::Ready(Some(Ok(message)));
        }
        self.receiver.poll_recv(cx)
    }
}

impl Connection {
    /// Subscribes to `channels`, returning a stream of the messages published to them.
    ///
    /// Returns once the server has confirmed every channel. From then on the connection only
    /// accepts subscribe and unsubscribe requests.
    pub async fn subscribe<I, S>(&self, channels: I) -> Result<Subscription>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe_to(TopicKind::Channel, channels.into_iter().map(Into::into).collect())
            .await
    }

    /// Subscribes to glob-style `patterns`.
    pub async fn psubscribe<I, S>(&self, patterns: I) -> Result<Subscription>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe_to(TopicKind::Pattern, patterns.into_iter().map(Into::into).collect())
            .await
    }

    /// Unsubscribes from `channels`, or from every channel if none is given.
    pub async fn unsubscribe<I, S>(&self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsubscribe_from(TopicKind::Channel, channels.into_iter().map(Into::into).collect())
            .await
    }

    /// Unsubscribes from `patterns`, or from every pattern if none is given.
    pub async fn punsubscribe<I, S>(&self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsubscribe_from(TopicKind::Pattern, patterns.into_iter().map(Into::into).collect())
            .await
    }

    async fn subscribe_to(&self, kind: TopicKind, names: Vec<String>) -> Result<Subscription> {
        let names: Vec<String> = names.into_iter().unique().collect();
        if names.is_empty() {
            return Err(UsageError::NoTopics(kind.subscribe_command()).into());
        }

        let topics: Vec<Topic> = names
            .iter()
            .map(|name| Topic {
                kind,
                name: name.clone(),
            })
            .collect();
        let cmd = Command::new(kind.subscribe_command()).args(&names);

        let inner = &self.inner;
        let (sender, receiver) = mpsc::channel(inner.config.subscription_capacity.max(1));

        let backlog = async {
            let mut state = inner.state.lock().await;
            state.check_usable()?;
            debug!(command = %cmd.name(), topics = ?names, "subscribing");

            let router = match &state.mode {
                Mode::Subscribed(router) => Some(router.clone()),
                Mode::Normal => None,
                Mode::Broken => return Err(Error::ConnectionClosed),
            };

            match router {
                Some(router) => {
                    let confirmation = router.register(&topics, &sender)?;
                    if let Err(err) = state.write(&cmd).await {
                        router.abandon(&topics);
                        return Err(err);
                    }
                    state.pending = false;

                    // The receiver task reads the confirmations; other callers may use the
                    // connection meanwhile.
                    drop(state);
                    confirmation.await.map_err(|_| Error::ConnectionClosed)?
                }
                None => {
                    let router = Arc::new(Router::default());
                    let confirmation = router.register(&topics, &sender)?;
                    let backlog = handshake(&mut state, &router, &cmd, confirmation).await?;

                    let reader = state.reader.take().ok_or(Error::ConnectionClosed)?;
                    tokio::spawn(receive(reader, router.clone()).instrument(inner.span.clone()));
                    state.mode = Mode::Subscribed(router);
                    Ok(backlog)
                }
            }
        }
        .instrument(inner.span.clone())
        .await?;

        Ok(Subscription {
            kind,
            topics: names,
            backlog: backlog.into(),
            receiver,
            connection: self.clone(),
        })
    }

    pub(crate) async fn unsubscribe_from(&self, kind: TopicKind, names: Vec<String>) -> Result<()> {
        let cmd = Command::new(kind.unsubscribe_command()).args(&names);

        async {
            let mut state = self.inner.state.lock().await;
            state.check_usable()?;
            debug!(command = %cmd.name(), topics = ?names, "unsubscribing");

            let router = match &state.mode {
                Mode::Subscribed(router) => Some(router.clone()),
                _ => None,
            };

            match router {
                Some(router) => {
                    // Confirmations arrive through the receiver task.
                    router.leave(kind, &names);
                    state.write(&cmd).await?;
                }
                None => {
                    state.write(&cmd).await?;
                    // An empty list still gets one confirmation.
                    for _ in 0..names.len().max(1) {
                        if let Reply::Error(message) = state.read_reply().await? {
                            state.pending = false;
                            return Err(Error::Server(message));
                        }
                    }
                }
            }

            state.pending = false;
            Ok(())
        }
        .instrument(self.inner.span.clone())
        .await
    }
}

/// Sends the first subscribe of a connection and reads replies until every topic is confirmed.
/// A `-` reply leaves the connection in normal mode.
async fn handshake(
    state: &mut State,
    router: &Router,
    cmd: &Command,
    mut confirmation: Confirmation,
) -> Result<Vec<Message>> {
    state.write(cmd).await?;

    loop {
        let reply = state.read_reply().await?;
        let push = Push::try_from(reply).map_err(|err| {
            state.mark_broken();
            err
        })?;
        router.dispatch(push).await;

        match confirmation.try_recv() {
            Ok(confirmed) => {
                state.pending = false;
                return confirmed;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                state.mark_broken();
                return Err(Error::ConnectionClosed);
            }
        }
    }
}
