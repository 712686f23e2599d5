//! Minimal RESP2 client for the handful of commands the synchronizer issues
//!
//! Commands go out as arrays of bulk strings; replies are parsed for the
//! five RESP2 types. This is deliberately not a general client: no
//! pipelining, no pub/sub, no inline commands.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{Connector, ReplicaAddr, ReplicationInfo, Role, StoreLink};
use crate::common::{Error, Result};

/// Dials RESP connections with a connect deadline and a per-command
/// deadline.
#[derive(Debug, Clone)]
pub struct RespConnector {
    connect_timeout: Duration,
    op_timeout: Duration,
}

impl RespConnector {
    pub fn new(connect_timeout: Duration, op_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            op_timeout,
        }
    }
}

impl Connector for RespConnector {
    type Link = RespLink;

    async fn connect(&self, addr: &str, auth: Option<&str>) -> Result<RespLink> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout {
                addr: addr.to_string(),
                what: "connect",
            })?
            .map_err(|e| Error::connect(addr, e.to_string()))?;

        let mut link = RespLink {
            addr: addr.to_string(),
            op_timeout: self.op_timeout,
            stream: BufReader::new(stream),
        };
        if let Some(token) = auth {
            link.command(&["AUTH", token])
                .await
                .map_err(|e| Error::connect(addr, format!("auth rejected: {e}")))?;
        }
        Ok(link)
    }
}

/// One authenticated RESP connection.
pub struct RespLink {
    addr: String,
    op_timeout: Duration,
    stream: BufReader<TcpStream>,
}

impl RespLink {
    /// Send one command and read its reply, under the operation deadline.
    /// Server `-ERR` replies surface as [`Error::Server`].
    async fn command(&mut self, args: &[&str]) -> Result<Reply> {
        let frame = encode_command(args);
        let round_trip = async {
            self.stream.get_mut().write_all(&frame).await?;
            read_reply(&mut self.stream).await
        };
        match timeout(self.op_timeout, round_trip).await {
            Ok(reply) => match reply? {
                Reply::Error(msg) => Err(Error::Server(msg)),
                other => Ok(other),
            },
            Err(_) => Err(Error::Timeout {
                addr: self.addr.clone(),
                what: "command reply",
            }),
        }
    }
}

impl StoreLink for RespLink {
    async fn replication_info(&mut self) -> Result<ReplicationInfo> {
        match self.command(&["INFO", "replication"]).await? {
            Reply::Bulk(Some(payload)) => Ok(parse_replication_info(&payload)),
            other => Err(Error::Protocol(format!(
                "unexpected INFO reply: {other:?}"
            ))),
        }
    }

    async fn config_get(&mut self, directive: &str) -> Result<Option<String>> {
        // The server answers [name, value] when the directive exists and an
        // empty array when it does not.
        match self.command(&["CONFIG", "GET", directive]).await? {
            Reply::Array(Some(items)) => match items.into_iter().nth(1) {
                Some(Reply::Bulk(value)) => Ok(value),
                Some(other) => Err(Error::Protocol(format!(
                    "unexpected CONFIG GET value: {other:?}"
                ))),
                None => Ok(None),
            },
            Reply::Array(None) => Ok(None),
            other => Err(Error::Protocol(format!(
                "unexpected CONFIG GET reply: {other:?}"
            ))),
        }
    }

    async fn config_set(&mut self, directive: &str, value: &str) -> Result<()> {
        match self.command(&["CONFIG", "SET", directive, value]).await? {
            Reply::Simple(ok) if ok == "OK" => Ok(()),
            other => Err(Error::Protocol(format!(
                "unexpected CONFIG SET reply: {other:?}"
            ))),
        }
    }
}

/// A single parsed RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<String>),
    Array(Option<Vec<Reply>>),
}

fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Read one CRLF-terminated header line, without the terminator.
async fn read_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = r.read_line(&mut line).await?;
    if n == 0 {
        return Err(Error::Protocol("connection closed mid-reply".into()));
    }
    if line.ends_with('\n') {
        line.pop();
    }
    if line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

async fn read_reply<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Reply> {
    let mut line = read_line(r).await?;
    if line.is_empty() {
        return Err(Error::Protocol("empty reply line".into()));
    }
    let kind = line.remove(0);
    let rest = line;
    match kind {
        '+' => Ok(Reply::Simple(rest)),
        '-' => Ok(Reply::Error(rest)),
        ':' => rest
            .parse()
            .map(Reply::Integer)
            .map_err(|_| Error::Protocol(format!("bad integer reply: {rest}"))),
        '$' => {
            let len: i64 = rest
                .parse()
                .map_err(|_| Error::Protocol(format!("bad bulk length: {rest}")))?;
            if len < 0 {
                return Ok(Reply::Bulk(None));
            }
            // Payload plus the trailing CRLF.
            let mut data = vec![0u8; len as usize + 2];
            r.read_exact(&mut data).await?;
            data.truncate(len as usize);
            String::from_utf8(data)
                .map(|s| Reply::Bulk(Some(s)))
                .map_err(|_| Error::Protocol("bulk payload is not UTF-8".into()))
        }
        '*' => {
            let len: i64 = rest
                .parse()
                .map_err(|_| Error::Protocol(format!("bad array length: {rest}")))?;
            if len < 0 {
                return Ok(Reply::Array(None));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(Box::pin(read_reply(r)).await?);
            }
            Ok(Reply::Array(Some(items)))
        }
        other => Err(Error::Protocol(format!("unknown reply type '{other}'"))),
    }
}

/// Parse the payload of `INFO replication`.
///
/// The payload is CRLF-separated `key:value` lines under a `# Replication`
/// header. Replicas appear as `slave0:ip=10.0.0.2,port=6380,state=online,...`;
/// the numbered prefix matters because `slave_repl_offset` and friends also
/// start with `slave`.
fn parse_replication_info(payload: &str) -> ReplicationInfo {
    let mut role = Role::Other("unknown".to_string());
    let mut replicas = Vec::new();

    for line in payload.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key == "role" {
            role = Role::from_wire(value);
        } else if is_replica_key(key) {
            if let Some(addr) = parse_replica_fields(value) {
                replicas.push(addr);
            }
        }
    }

    ReplicationInfo { role, replicas }
}

fn is_replica_key(key: &str) -> bool {
    key.strip_prefix("slave")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Pull ip/port out of `ip=10.0.0.2,port=6380,state=online,offset=...`.
fn parse_replica_fields(value: &str) -> Option<ReplicaAddr> {
    let mut ip = None;
    let mut port = None;
    for field in value.split(',') {
        match field.split_once('=') {
            Some(("ip", v)) => ip = Some(v.to_string()),
            Some(("port", v)) => port = v.parse().ok(),
            _ => {}
        }
    }
    Some(ReplicaAddr {
        ip: ip?,
        port: port?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(bytes: &[u8]) -> Reply {
        let mut reader = BufReader::new(bytes);
        read_reply(&mut reader).await.unwrap()
    }

    #[test]
    fn test_encode_command() {
        let frame = encode_command(&["CONFIG", "GET", "save"]);
        assert_eq!(
            frame,
            b"*3\r\n$6\r\nCONFIG\r\n$3\r\nGET\r\n$4\r\nsave\r\n"
        );
    }

    #[tokio::test]
    async fn test_read_simple_and_error() {
        assert_eq!(parse(b"+OK\r\n").await, Reply::Simple("OK".into()));
        assert_eq!(
            parse(b"-ERR unknown command\r\n").await,
            Reply::Error("ERR unknown command".into())
        );
    }

    #[tokio::test]
    async fn test_read_integer() {
        assert_eq!(parse(b":42\r\n").await, Reply::Integer(42));
    }

    #[tokio::test]
    async fn test_read_bulk() {
        assert_eq!(
            parse(b"$10\r\n3600 1 300\r\n").await,
            Reply::Bulk(Some("3600 1 300".into()))
        );
        assert_eq!(parse(b"$0\r\n\r\n").await, Reply::Bulk(Some(String::new())));
        assert_eq!(parse(b"$-1\r\n").await, Reply::Bulk(None));
    }

    #[tokio::test]
    async fn test_read_array() {
        let reply = parse(b"*2\r\n$4\r\nsave\r\n$10\r\n3600 1 300\r\n").await;
        assert_eq!(
            reply,
            Reply::Array(Some(vec![
                Reply::Bulk(Some("save".into())),
                Reply::Bulk(Some("3600 1 300".into())),
            ]))
        );
        assert_eq!(parse(b"*0\r\n").await, Reply::Array(Some(vec![])));
    }

    #[tokio::test]
    async fn test_truncated_reply_is_protocol_error() {
        let mut reader = BufReader::new(&b"$10\r\nshort"[..]);
        assert!(read_reply(&mut reader).await.is_err());
    }

    #[test]
    fn test_parse_replication_info_primary() {
        let payload = "# Replication\r\n\
                       role:master\r\n\
                       connected_slaves:2\r\n\
                       slave0:ip=10.0.0.2,port=6380,state=online,offset=123,lag=0\r\n\
                       slave1:ip=10.0.0.3,port=6381,state=online,offset=123,lag=1\r\n\
                       slave_repl_offset:123\r\n\
                       master_repl_offset:123\r\n";
        let info = parse_replication_info(payload);
        assert_eq!(info.role, Role::Primary);
        assert_eq!(info.replicas.len(), 2);
        assert_eq!(info.replicas[0].to_string(), "10.0.0.2:6380");
        assert_eq!(info.replicas[1].to_string(), "10.0.0.3:6381");
    }

    #[test]
    fn test_parse_replication_info_replica() {
        let payload = "# Replication\r\nrole:slave\r\nmaster_host:10.0.0.1\r\n";
        let info = parse_replication_info(payload);
        assert_eq!(info.role, Role::Replica);
        assert!(info.replicas.is_empty());
    }

    #[test]
    fn test_parse_replication_info_missing_role() {
        let info = parse_replication_info("# Replication\r\nconnected_slaves:0\r\n");
        assert_eq!(info.role, Role::Other("unknown".into()));
    }

    #[test]
    fn test_replica_key_detection() {
        assert!(is_replica_key("slave0"));
        assert!(is_replica_key("slave12"));
        assert!(!is_replica_key("slave_repl_offset"));
        assert!(!is_replica_key("slave"));
        assert!(!is_replica_key("master_host"));
    }

    #[test]
    fn test_replica_fields_without_port_dropped() {
        assert!(parse_replica_fields("ip=10.0.0.2,state=online").is_none());
        assert!(parse_replica_fields("state=online").is_none());
    }
}
