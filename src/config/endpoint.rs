//! Backend address normalization.
//!
//! Addresses are accepted with or without a scheme, so `root:pw@db:3306/demo`
//! and `mysql://root:pw@db:3306/demo` are equivalent. MySQL also accepts the
//! go-sql-driver DSN form `root:pw@tcp(db:3306)/demo`. Cassandra addresses
//! are not URLs: they are `host1,host2[/keyspace]`.

use url::Url;

use crate::config::schema::BackendKind;

/// Port added to cassandra hosts that do not name one.
pub const CASSANDRA_DEFAULT_PORT: u16 = 9042;

/// Reason an address could not be turned into a connection target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("address is empty")]
    Empty,

    #[error("{0}")]
    Url(String),

    #[error("no hosts given")]
    NoHosts,
}

/// URL scheme a bare address is prefixed with.
pub fn default_scheme(kind: BackendKind) -> Option<&'static str> {
    match kind {
        BackendKind::Mysql => Some("mysql"),
        BackendKind::Pgsql => Some("postgres"),
        BackendKind::Redis => Some("redis"),
        BackendKind::Memcache => Some("memcache"),
        BackendKind::Mongodb => Some("mongodb"),
        BackendKind::Rabbitmq => Some("amqp"),
        BackendKind::Cassandra => None,
    }
}

/// Build the connection URL for a URL-addressed backend.
///
/// Cassandra has no URL form and is returned unchanged; use
/// [`CassandraTarget::parse`] for it.
pub fn connection_url(kind: BackendKind, address: &str) -> Result<String, EndpointError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(EndpointError::Empty);
    }

    let Some(scheme) = default_scheme(kind) else {
        return Ok(address.to_string());
    };

    let url = if address.contains("://") {
        address.to_string()
    } else if kind == BackendKind::Mysql {
        let address = mysql_dsn_to_url(address).unwrap_or_else(|| address.to_string());
        format!("{scheme}://{address}")
    } else {
        format!("{scheme}://{address}")
    };

    // Replica-set URIs list several host:port pairs, which `Url` rejects;
    // the mongodb driver parses those itself.
    if kind != BackendKind::Mongodb {
        Url::parse(&url).map_err(|e| EndpointError::Url(e.to_string()))?;
    }

    Ok(url)
}

/// Rewrite a go-sql-driver DSN (`user:pw@tcp(host:port)/db`,
/// `user@unix(/run/mysqld.sock)/db`, `user:pw@/db`) into the authority and
/// path of a `mysql://` URL. Returns `None` for anything else.
fn mysql_dsn_to_url(address: &str) -> Option<String> {
    for protocol in ["tcp(", "unix("] {
        let start = if address.starts_with(protocol) {
            0
        } else if let Some(at) = address.find(&format!("@{protocol}")) {
            at + 1
        } else {
            continue;
        };

        let open = start + protocol.len();
        let close = open + address[open..].find(')')?;
        let (auth, target, rest) = (&address[..start], &address[open..close], &address[close + 1..]);

        return Some(if protocol == "unix(" {
            let separator = if rest.contains('?') { '&' } else { '?' };
            format!("{auth}localhost{rest}{separator}socket={target}")
        } else {
            format!("{auth}{target}{rest}")
        });
    }

    // No protocol at all means the default local server.
    if let Some(at) = address.find("@/") {
        return Some(format!("{}@localhost:3306{}", &address[..at], &address[at + 1..]));
    }
    address
        .starts_with('/')
        .then(|| format!("localhost:3306{address}"))
}

/// Contact points and keyspace for a cassandra cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassandraTarget {
    pub hosts: Vec<String>,
    pub keyspace: Option<String>,
}

impl CassandraTarget {
    /// Parse `host1[:port],host2[:port][/keyspace]`.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EndpointError::Empty);
        }

        let (hosts, keyspace) = match address.split_once('/') {
            Some((hosts, keyspace)) => (hosts, Some(keyspace)),
            None => (address, None),
        };

        let hosts: Vec<String> = hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| {
                if has_port(h) {
                    h.to_string()
                } else {
                    format!("{h}:{CASSANDRA_DEFAULT_PORT}")
                }
            })
            .collect();

        if hosts.is_empty() {
            return Err(EndpointError::NoHosts);
        }

        Ok(Self {
            hosts,
            keyspace: keyspace
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        })
    }
}

fn has_port(host: &str) -> bool {
    // Bracketed IPv6 literal: "[::1]:9042"
    if let Some(rest) = host.strip_prefix('[') {
        return rest.contains("]:");
    }
    host.contains(':')
}
