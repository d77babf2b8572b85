use std::io;

use thiserror::Error;

/// Fatal conditions that abort a trace run.
///
/// A per-hop receive timeout is not an error; it is reported as a
/// "no reply" line and the loop moves on to the next hop.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to open raw ICMP socket (need root privileges): {0}")]
    Socket(#[source] io::Error),

    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no IPv4 address for host {host}")]
    NoIpv4 { host: String },

    #[error("failed to serialize echo request")]
    Packet,

    #[error("failed to set TTL {hop} on socket: {source}")]
    Ttl {
        hop: u8,
        #[source]
        source: io::Error,
    },

    #[error("failed to send probe at hop {hop}: {source}")]
    Send {
        hop: u8,
        #[source]
        source: io::Error,
    },

    #[error("failed to set read deadline at hop {hop}: {source}")]
    Deadline {
        hop: u8,
        #[source]
        source: io::Error,
    },

    #[error("unparseable ICMP response at hop {hop}")]
    Parse { hop: u8 },
}
