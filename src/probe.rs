//! TTL-escalation probe loop.
//!
//! One raw ICMP socket, one prebuilt Echo Request, TTL walked from 1 up to
//! the hop budget. Each hop blocks on the socket until a reply or the
//! configured deadline, classifies the reply, and renders one output line
//! before the next hop is probed.

use std::{
    mem::MaybeUninit,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::{Duration, Instant},
};

use dns_lookup::{lookup_addr, lookup_host};
use pnet::packet::{
    icmp::{
        echo_request::{IcmpCodes, MutableEchoRequestPacket},
        IcmpPacket, IcmpType, IcmpTypes,
    },
    ipv4::Ipv4Packet,
    util, MutablePacket, Packet,
};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{RunConfig, TraceError};

/// Maximum MTU size for received packets
const MAX_MTU: usize = 1500;

/// ICMP echo header length (type, code, checksum, identifier, sequence)
const ECHO_HEADER_LEN: usize = 8;

/// Sequence number carried by every probe. The same serialized packet is
/// retransmitted at each hop; only the IP-level TTL changes between sends.
const PROBE_SEQUENCE: u16 = 1;

/// Filler byte for the echo payload, matching classic tracepath probes.
const PAYLOAD_FILL: u8 = b'0';

/// Classification of what a probed hop yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Nothing usable arrived before the deadline.
    NoReply,
    /// A router along the path answered with ICMP Time Exceeded.
    IntermediateHop,
    /// The destination answered with ICMP Echo Reply.
    FinalReply,
}

/// Terminal result of a whole run, produced exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The destination answered with an Echo Reply at the given hop.
    TargetReached { hop: u8 },
    /// The hop budget ran out before any Echo Reply arrived.
    MaxHopsExceeded,
    /// An interrupt cancelled the run between hops.
    Cancelled,
}

/// One hop's observation. Produced once per loop iteration and rendered
/// immediately; nothing is retained across hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopReport {
    pub hop: u8,
    pub elapsed: Duration,
    pub responder: Option<IpAddr>,
    pub kind: ReplyKind,
}

impl HopReport {
    fn no_reply(hop: u8) -> Self {
        Self {
            hop,
            elapsed: Duration::ZERO,
            responder: None,
            kind: ReplyKind::NoReply,
        }
    }

    fn reply(hop: u8, responder: IpAddr, elapsed: Duration, kind: ReplyKind) -> Self {
        Self {
            hop,
            elapsed,
            responder: Some(responder),
            kind,
        }
    }

    /// Render the per-hop output line. Replies show the responder's
    /// reverse-DNS name when one exists, otherwise the bare address.
    fn render(&self) -> String {
        match self.responder {
            Some(addr) if self.kind != ReplyKind::NoReply => {
                format_reply_line(self.hop, &responder_name(addr), self.elapsed)
            }
            _ => format_no_reply_line(self.hop),
        }
    }
}

/// Sequential hop prober. Owns the raw socket and walks the TTL from 1 to
/// the configured hop budget, printing one line per hop as it goes.
pub struct Tracer {
    config: RunConfig,
    cancel: CancellationToken,
}

impl Tracer {
    pub fn new(config: RunConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Run the trace to completion. Blocking; meant to be driven from
    /// `tokio::task::spawn_blocking` so the controller stays responsive.
    pub fn run(self) -> Result<TraceOutcome, TraceError> {
        let socket = open_icmp_socket().map_err(TraceError::Socket)?;
        let dest = self.resolve_target()?;
        info!("tracing {} ({})", self.config.target, dest);

        let ident = std::process::id() as u16;
        let packet = build_echo_request(self.config.payload_size, ident)
            .ok_or(TraceError::Packet)?;
        let dest_addr: SockAddr = SocketAddr::new(IpAddr::V4(dest), 0).into();
        let mut recv_buf = [MaybeUninit::<u8>::uninit(); MAX_MTU];

        for hop in 1..=self.config.max_hops {
            if self.cancel.is_cancelled() {
                debug!("cancelled before hop {hop}");
                return Ok(TraceOutcome::Cancelled);
            }

            socket
                .set_ttl(hop as u32)
                .map_err(|source| TraceError::Ttl { hop, source })?;

            let start = Instant::now();
            socket
                .send_to(&packet, &dest_addr)
                .map_err(|source| TraceError::Send { hop, source })?;
            socket
                .set_read_timeout(Some(self.config.reply_timeout))
                .map_err(|source| TraceError::Deadline { hop, source })?;

            debug!("sent probe: hop={hop}, ttl={hop}, {} bytes", packet.len());

            // Timeouts and transient read errors are the recoverable path:
            // the hop gets a "no reply" line and the walk continues.
            let (len, peer) = match socket.recv_from(&mut recv_buf) {
                Ok(received) => received,
                Err(_) => {
                    println!("{}", HopReport::no_reply(hop).render());
                    continue;
                }
            };
            let elapsed = start.elapsed();

            // Safety: recv_from initialized the first `len` bytes.
            let bytes: &[u8] =
                unsafe { std::slice::from_raw_parts(recv_buf.as_ptr() as *const u8, len) };

            let icmp_type = parse_reply_type(bytes).ok_or(TraceError::Parse { hop })?;
            let responder = peer
                .as_socket()
                .map(|addr| addr.ip())
                .ok_or(TraceError::Parse { hop })?;

            match classify(icmp_type) {
                Some(kind @ ReplyKind::IntermediateHop) => {
                    println!("{}", HopReport::reply(hop, responder, elapsed, kind).render());
                }
                Some(kind @ ReplyKind::FinalReply) => {
                    println!("{}", HopReport::reply(hop, responder, elapsed, kind).render());
                    info!("reached {} at hop {hop}", self.config.target);
                    return Ok(TraceOutcome::TargetReached { hop });
                }
                _ => {
                    // unrelated ICMP traffic; the hop's slot is spent
                    debug!("ignoring ICMP type {} at hop {hop}", icmp_type.0);
                }
            }
        }

        Ok(TraceOutcome::MaxHopsExceeded)
    }

    /// Forward-resolve the configured target and pick the first candidate
    /// reducible to a 4-byte IPv4 address.
    fn resolve_target(&self) -> Result<Ipv4Addr, TraceError> {
        let host = &self.config.target;
        let addrs = lookup_host(host).map_err(|source| TraceError::Resolve {
            host: host.clone(),
            source,
        })?;

        addrs
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(v6) => v6.to_ipv4(),
            })
            .ok_or_else(|| TraceError::NoIpv4 { host: host.clone() })
    }
}

fn open_icmp_socket() -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
    socket.bind(&SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0).into())?;
    Ok(socket)
}

/// Serialize the one Echo Request reused for every hop: type 8, code 0,
/// identifier from the low 16 bits of the pid, sequence fixed at 1, and a
/// `payload_size` run of filler bytes.
fn build_echo_request(payload_size: usize, ident: u16) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; ECHO_HEADER_LEN + payload_size];
    {
        let mut packet = MutableEchoRequestPacket::new(&mut buf)?;
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCodes::NoCode);
        packet.set_identifier(ident);
        packet.set_sequence_number(PROBE_SEQUENCE);
        for byte in packet.payload_mut() {
            *byte = PAYLOAD_FILL;
        }

        let checksum = util::checksum(packet.packet(), 1);
        packet.set_checksum(checksum);
    }
    Some(buf)
}

/// Pull the ICMP type out of a raw IPv4 datagram. `None` means the buffer
/// does not carry a well-formed IPv4 header plus ICMP header; callers treat
/// that as a fatal parse error.
fn parse_reply_type(buf: &[u8]) -> Option<IcmpType> {
    let ip = Ipv4Packet::new(buf)?;
    let icmp = IcmpPacket::new(ip.payload())?;
    Some(icmp.get_icmp_type())
}

/// Map an inbound ICMP type onto probe semantics. Unrelated types yield
/// `None` and the hop is skipped without output.
fn classify(icmp_type: IcmpType) -> Option<ReplyKind> {
    match icmp_type {
        IcmpTypes::TimeExceeded => Some(ReplyKind::IntermediateHop),
        IcmpTypes::EchoReply => Some(ReplyKind::FinalReply),
        _ => None,
    }
}

/// Reverse lookup for display, falling back to the raw address. Runs
/// synchronously on the probing path, so hop output stays strictly ordered.
fn responder_name(addr: IpAddr) -> String {
    lookup_addr(&addr).unwrap_or_else(|_| addr.to_string())
}

fn format_reply_line(hop: u8, responder: &str, elapsed: Duration) -> String {
    format!("{hop:2}: {responder:<64} {elapsed:?}")
}

fn format_no_reply_line(hop: u8) -> String {
    format!("{hop:2}: no reply")
}
