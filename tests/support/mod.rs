#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use respire::reader::FrameReader;
use respire::Reply;

/// What the scripted server does with one request.
pub enum Step {
    Reply(Vec<u8>),
    /// Swallow the request and never answer it.
    Silent,
    /// Write the bytes, then close the connection.
    ReplyAndClose(Vec<u8>),
}

pub fn reply(reply: Reply) -> Step {
    Step::Reply(reply.serialize())
}

pub fn raw(bytes: &[u8]) -> Step {
    Step::Reply(bytes.to_vec())
}

pub struct Server {
    pub addr: SocketAddr,
    /// Every request received, as its list of arguments.
    pub requests: UnboundedReceiver<Vec<String>>,
}

impl Server {
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Requests received so far.
    pub fn received(&mut self) -> Vec<Vec<String>> {
        let mut received = Vec::new();
        while let Ok(request) = self.requests.try_recv() {
            received.push(request);
        }
        received
    }
}

/// Serves a single connection, answering each request with `handler(request)`.
pub async fn serve<F>(mut handler: F) -> Server
where
    F: FnMut(&[String]) -> Option<Step> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, requests) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let Ok((socket, _)) = listener.accept().await else {
            return;
        };
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = FrameReader::new(read_half);

        while let Ok(request) = reader.decode_one().await {
            let Ok(args) = request.as_string_sequence() else {
                break;
            };
            let step = handler(&args);
            let _ = tx.send(args);

            match step {
                Some(Step::Reply(bytes)) => {
                    if write_half.write_all(&bytes).await.is_err() {
                        break;
                    }
                }
                Some(Step::Silent) => {}
                Some(Step::ReplyAndClose(bytes)) => {
                    let _ = write_half.write_all(&bytes).await;
                    break;
                }
                // End of script.
                None => break,
            }
        }
    });

    Server { addr, requests }
}

/// Answers requests in order with `steps`, then hangs up.
pub async fn scripted(steps: Vec<Step>) -> Server {
    let mut steps = VecDeque::from(steps);
    serve(move |_| steps.pop_front()).await
}

/// Answers `ECHO x` with `x` and anything else with an error.
pub async fn echo_server() -> Server {
    serve(|args| match args {
        [name, message] if name.eq_ignore_ascii_case("ECHO") => {
            Some(reply(Reply::from(message.as_str())))
        }
        _ => Some(reply(Reply::Error("ERR unknown command".to_string()))),
    })
    .await
}

#[derive(Default)]
struct Client {
    channels: HashSet<String>,
    patterns: HashSet<String>,
    tx: Option<UnboundedSender<Vec<u8>>>,
}

impl Client {
    fn count(&self) -> i64 {
        (self.channels.len() + self.patterns.len()) as i64
    }

    fn send(&self, reply: Reply) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(reply.serialize());
        }
    }
}

/// A small in-process pub/sub server.
#[derive(Clone)]
pub struct Broker {
    pub addr: SocketAddr,
    clients: Arc<Mutex<HashMap<usize, Client>>>,
}

impl Broker {
    pub async fn start() -> Broker {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let broker = Broker {
            addr: listener.local_addr().unwrap(),
            clients: Arc::new(Mutex::new(HashMap::new())),
        };

        let accepting = broker.clone();
        tokio::spawn(async move {
            let mut next_id = 0;
            while let Ok((socket, _)) = listener.accept().await {
                let id = next_id;
                next_id += 1;

                let (read_half, mut write_half) = socket.into_split();
                let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
                accepting.clients.lock().unwrap().insert(
                    id,
                    Client {
                        tx: Some(tx),
                        ..Client::default()
                    },
                );

                tokio::spawn(async move {
                    while let Some(bytes) = rx.recv().await {
                        if write_half.write_all(&bytes).await.is_err() {
                            break;
                        }
                    }
                });

                let broker = accepting.clone();
                tokio::spawn(async move {
                    let mut reader = FrameReader::new(read_half);
                    while let Ok(request) = reader.decode_one().await {
                        let Ok(args) = request.as_string_sequence() else {
                            break;
                        };
                        if !broker.handle(id, &args) {
                            break;
                        }
                    }
                });
            }
        });

        broker
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Closes every client connection.
    pub fn disconnect_all(&self) {
        self.clients.lock().unwrap().clear();
    }

    fn handle(&self, id: usize, args: &[String]) -> bool {
        let mut clients = self.clients.lock().unwrap();
        let Some(name) = args.first() else {
            return true;
        };
        let rest = &args[1..];

        match name.to_ascii_uppercase().as_str() {
            "SUBSCRIBE" | "PSUBSCRIBE" => {
                let pattern = name.eq_ignore_ascii_case("PSUBSCRIBE");
                let Some(client) = clients.get_mut(&id) else {
                    return false;
                };
                for topic in rest {
                    if pattern {
                        client.patterns.insert(topic.clone());
                    } else {
                        client.channels.insert(topic.clone());
                    }
                    client.send(Reply::Array(vec![
                        Reply::from(name.to_ascii_lowercase().as_str()),
                        Reply::from(topic.as_str()),
                        Reply::Integer(client.count()),
                    ]));
                }
            }
            "UNSUBSCRIBE" | "PUNSUBSCRIBE" => {
                let pattern = name.eq_ignore_ascii_case("PUNSUBSCRIBE");
                let kind = name.to_ascii_lowercase();
                let Some(client) = clients.get_mut(&id) else {
                    return false;
                };
                let topics: Vec<String> = match (rest.is_empty(), pattern) {
                    (false, _) => rest.to_vec(),
                    (true, false) => client.channels.iter().cloned().collect(),
                    (true, true) => client.patterns.iter().cloned().collect(),
                };

                if topics.is_empty() {
                    client.send(Reply::Array(vec![
                        Reply::from(kind.as_str()),
                        Reply::Null,
                        Reply::Integer(client.count()),
                    ]));
                }
                for topic in topics {
                    if pattern {
                        client.patterns.remove(&topic);
                    } else {
                        client.channels.remove(&topic);
                    }
                    client.send(Reply::Array(vec![
                        Reply::from(kind.as_str()),
                        Reply::from(topic.as_str()),
                        Reply::Integer(client.count()),
                    ]));
                }
            }
            "PUBLISH" if rest.len() == 2 => {
                let (channel, payload) = (&rest[0], &rest[1]);
                let mut receivers = 0;
                for client in clients.values() {
                    if client.channels.contains(channel) {
                        receivers += 1;
                        client.send(Reply::Array(vec![
                            Reply::from("message"),
                            Reply::from(channel.as_str()),
                            Reply::from(payload.as_str()),
                        ]));
                    }
                    for pattern in &client.patterns {
                        if glob_match::glob_match(pattern, channel) {
                            receivers += 1;
                            client.send(Reply::Array(vec![
                                Reply::from("pmessage"),
                                Reply::from(pattern.as_str()),
                                Reply::from(channel.as_str()),
                                Reply::from(payload.as_str()),
                            ]));
                        }
                    }
                }
                if let Some(client) = clients.get(&id) {
                    client.send(Reply::Integer(receivers));
                }
            }
            "PUBSUB" if rest.first().map(|s| s.to_ascii_uppercase()).as_deref() == Some("NUMSUB") => {
                let mut counts = Vec::new();
                for channel in &rest[1..] {
                    let count = clients
                        .values()
                        .filter(|c| c.channels.contains(channel))
                        .count();
                    counts.push(Reply::from(channel.as_str()));
                    counts.push(Reply::Integer(count as i64));
                }
                if let Some(client) = clients.get(&id) {
                    client.send(Reply::Array(counts));
                }
            }
            "PING" => {
                if let Some(client) = clients.get(&id) {
                    if client.count() > 0 {
                        client.send(Reply::Array(vec![Reply::from("pong"), Reply::from("")]));
                    } else {
                        client.send(Reply::Simple("PONG".to_string()));
                    }
                }
            }
            _ => {
                if let Some(client) = clients.get(&id) {
                    client.send(Reply::Error(format!("ERR unknown command '{}'", name)));
                }
            }
        }

        true
    }
}
