//! Comparison tests against a real server on 127.0.0.1:6379, with the `redis` crate as the
//! reference client. Run them with `cargo test -- --ignored`.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Value};
use serial_test::serial;

use respire::{Command, Connection, Error, Reply, ScanOptions, SetOptions};

const ADDR: &str = "127.0.0.1:6379";

async fn connect() -> (Connection, MultiplexedConnection) {
    let ours = Connection::connect(ADDR).await.unwrap();

    let their_client = redis::Client::open(format!("redis://{}/", ADDR)).unwrap();
    let theirs = their_client
        .get_multiplexed_async_connection()
        .await
        .unwrap();

    (ours, theirs)
}

/// Reshapes a `redis` crate value into the reply it was decoded from.
fn to_reply(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Null,
        Value::Int(i) => Reply::Integer(i),
        Value::Data(data) => Reply::Bulk(data.into()),
        Value::Bulk(items) => Reply::Array(items.into_iter().map(to_reply).collect()),
        Value::Status(status) => Reply::Simple(status),
        Value::Okay => Reply::Simple("OK".to_string()),
    }
}

/// Runs `script` through both clients, each on a freshly flushed database, and compares every
/// reply.
async fn test_compare(script: &[&[&str]]) {
    let (ours, mut theirs) = connect().await;

    // Both clients share the same server, so each run starts from an empty database.
    ours.flush_db().await.unwrap();
    let mut our_replies = Vec::new();
    for args in script {
        let reply = ours.run(args.iter().copied().collect()).await.unwrap();
        our_replies.push(reply);
    }

    let _: () = redis::cmd("FLUSHDB").query_async(&mut theirs).await.unwrap();
    for (args, our_reply) in script.iter().zip(our_replies) {
        let result: redis::RedisResult<Value> = redis::cmd(args[0])
            .arg(&args[1..])
            .query_async(&mut theirs)
            .await;

        match (our_reply, result) {
            (Reply::Error(ours), Err(theirs)) => {
                // The `redis` crate splits the message into a code and a detail.
                let detail = theirs.detail().unwrap_or_default();
                assert!(ours.ends_with(detail), "{:?}: {} vs {}", args, ours, theirs);
            }
            (ours, Ok(value)) => assert_eq!(ours, to_reply(value), "{:?}", args),
            (ours, Err(theirs)) => panic!("{:?}: got {:?}, expected error {}", args, ours, theirs),
        }
    }
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_strings() {
    test_compare(&[
        &["SET", "k1", "1"],
        &["SET", "k2", "Argentina"],
        &["SET", "k3", "héllo wörld"],
        &["GET", "k1"],
        &["GET", "k3"],
        &["GET", "missing"],
        &["APPEND", "k2", "!"],
        &["STRLEN", "k3"],
        &["INCR", "k1"],
        &["INCRBY", "k1", "-10"],
        &["INCRBYFLOAT", "k1", "0.5"],
        &["INCR", "k2"],
        &["MSET", "a", "1", "b", "2"],
        &["MGET", "a", "missing", "b"],
        &["GETSET", "a", "3"],
        &["SET", "k1", "x", "NX"],
        &["SET", "k1", "x", "XX", "PX", "100000"],
    ])
    .await;
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_keys() {
    test_compare(&[
        &["SET", "a", "1"],
        &["EXISTS", "a", "a", "b"],
        &["EXPIRE", "a", "100"],
        &["TTL", "missing"],
        &["PERSIST", "a"],
        &["TTL", "a"],
        &["TYPE", "a"],
        &["DEL", "a", "b"],
        &["TYPE", "a"],
    ])
    .await;
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_collections() {
    test_compare(&[
        &["HSET", "h", "name", "bob"],
        &["HGET", "h", "name"],
        &["HMGET", "h", "name", "age"],
        &["HINCRBY", "h", "age", "42"],
        &["HINCRBYFLOAT", "h", "age", "0.25"],
        &["HLEN", "h"],
        &["HEXISTS", "h", "nope"],
        &["RPUSH", "l", "a", "b", "c"],
        &["LPUSH", "l", "z"],
        &["LRANGE", "l", "0", "-1"],
        &["LINDEX", "l", "10"],
        &["LPOP", "l"],
        &["RPOP", "l"],
        &["LLEN", "l"],
        &["SADD", "s", "x", "y", "x"],
        &["SISMEMBER", "s", "y"],
        &["SCARD", "s"],
        &["SREM", "s", "x", "q"],
        &["ZADD", "z", "1", "one", "2", "two", "3", "three"],
        &["ZRANGE", "z", "0", "-1", "WITHSCORES"],
        &["ZREVRANGE", "z", "0", "1"],
        &["ZRANGEBYSCORE", "z", "(1", "+inf", "WITHSCORES", "LIMIT", "0", "1"],
        &["ZINCRBY", "z", "1.5", "one"],
        &["ZSCORE", "z", "one"],
        &["ZSCORE", "z", "nobody"],
        &["ZRANK", "z", "nobody"],
        &["ZREVRANK", "z", "three"],
        &["ZREM", "z", "one"],
        &["ZCARD", "z"],
        &["HGET", "z", "x"],
    ])
    .await;
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_bits_and_hyperloglog() {
    test_compare(&[
        &["SETBIT", "b", "7", "1"],
        &["GETBIT", "b", "7"],
        &["SET", "c", "foobar"],
        &["BITCOUNT", "c"],
        &["BITCOUNT", "c", "1", "1"],
        &["BITOP", "AND", "d", "b", "c"],
        &["BITFIELD", "f", "OVERFLOW", "FAIL", "INCRBY", "u2", "0", "5", "GET", "u2", "0"],
        &["DECRBY", "n", "4"],
        &["GETRANGE", "c", "0", "2"],
        &["SETRANGE", "c", "3", "baz"],
        &["MSETNX", "c", "1", "e", "2"],
        &["PFADD", "hll", "a", "b", "c"],
        &["PFCOUNT", "hll"],
        &["PFMERGE", "hll2", "hll"],
    ])
    .await;
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_collection_editing() {
    test_compare(&[
        &["RPUSH", "l", "a", "b", "a", "c"],
        &["LINSERT", "l", "BEFORE", "c", "x"],
        &["LREM", "l", "0", "a"],
        &["LSET", "l", "0", "first"],
        &["LTRIM", "l", "0", "1"],
        &["LPUSHX", "nolist", "x"],
        &["BLPOP", "empty", "l", "1"],
        &["HSETNX", "h", "f", "1"],
        &["HMSET", "h", "g", "22", "k", "3"],
        &["HVALS", "h"],
        &["HSTRLEN", "h", "g"],
        &["SADD", "s1", "a", "b", "c"],
        &["SADD", "s2", "c", "d"],
        &["SINTER", "s1", "s2"],
        &["SDIFFSTORE", "s3", "s1", "s2"],
        &["SMOVE", "s1", "s2", "a"],
        &["ZADD", "z", "0", "a", "0", "b", "0", "c"],
        &["ZRANGEBYLEX", "z", "[b", "+"],
        &["ZLEXCOUNT", "z", "-", "+"],
        &["ZCOUNT", "z", "0", "0"],
        &["ZREVRANGEBYSCORE", "z", "+inf", "-inf", "WITHSCORES"],
        &["ZUNIONSTORE", "u", "2", "z", "s2", "WEIGHTS", "2", "1", "AGGREGATE", "MAX"],
        &["ZREMRANGEBYRANK", "u", "0", "0"],
        &["ZREMRANGEBYLEX", "z", "[a", "[a"],
    ])
    .await;
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_typed_wrappers_agree() {
    let (ours, mut theirs) = connect().await;
    ours.flush_db().await.unwrap();

    let options = SetOptions {
        expire: Some(Duration::from_secs(100)),
        ..Default::default()
    };
    assert!(ours.set("greeting", "hello", &[options]).await.unwrap());

    let their_value: Option<String> = theirs.get("greeting").await.unwrap();
    assert_eq!(ours.get("greeting").await.unwrap().into_option(), their_value);

    let their_ttl: i64 = theirs.pttl("greeting").await.unwrap();
    let our_ttl = ours.pttl("greeting").await.unwrap().unwrap();
    assert!(our_ttl.as_millis() as i64 <= 100_000);
    assert!((our_ttl.as_millis() as i64 - their_ttl).abs() < 1_000);

    let _: () = theirs.hset("user", "name", "bob").await.unwrap();
    let _: () = theirs.hset("user", "city", "Córdoba").await.unwrap();
    let their_map: std::collections::HashMap<String, String> =
        theirs.hgetall("user").await.unwrap();
    assert_eq!(ours.hget_all("user").await.unwrap(), their_map);

    assert!(matches!(ours.ttl("missing").await, Err(Error::KeyNotExist)));
    assert!(matches!(ours.zrank("missing", "m").await, Err(Error::KeyNotExist)));
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_scan_sees_every_key() {
    let (ours, mut theirs) = connect().await;
    ours.flush_db().await.unwrap();

    for i in 0..250 {
        let _: () = theirs.set(format!("scan:{}", i), i).await.unwrap();
    }
    let _: () = theirs.set("other", 0).await.unwrap();

    let options = ScanOptions::pattern("scan:*").count(20);
    let mut scan = ours.scan(&[options]).unwrap();
    let mut keys = scan.all().await.unwrap().to_vec();
    keys.sort();
    keys.dedup();

    let mut expected: Vec<String> = (0..250).map(|i| format!("scan:{}", i)).collect();
    expected.sort();
    assert_eq!(keys, expected);
}

#[tokio::test]
#[serial]
#[ignore = "needs a Redis server on 127.0.0.1:6379"]
async fn test_pubsub_with_reference_publisher() {
    let (ours, mut theirs) = connect().await;

    let mut subscription = ours.subscribe(["integration"]).await.unwrap();
    for i in 0..10 {
        let _: i64 = theirs.publish("integration", i).await.unwrap();
    }

    for i in 0..10 {
        let message = subscription.recv().await.unwrap().unwrap();
        assert_eq!(message.payload, bytes::Bytes::from(i.to_string()));
    }

    let err = ours.run(Command::new("GET").arg("k")).await.unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
}
