use log::{debug, error, info, trace};
use parking_lot::RwLock;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet as PnetPacket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::capture::source::PacketSource;
use crate::models::snapshot::TrafficSnapshot;

const MAX_CONSECUTIVE_ERRORS: u32 = 5;
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Capture loop: reads frames from the source until the stop flag is raised,
/// accounting each frame into the shared snapshot and publishing throttled
/// copies on the event channel.
///
/// The engine is the only writer of `shared`; readers clone under the read
/// lock, so every observed snapshot is from a single update instant.
pub async fn run(
    mut source: Box<dyn PacketSource>,
    shared: Arc<RwLock<TrafficSnapshot>>,
    events: broadcast::Sender<TrafficSnapshot>,
    stop: Arc<AtomicBool>,
    event_interval: Duration,
    interface: String,
) {
    info!("Capture loop started on {interface}");

    let mut consecutive_errors = 0u32;
    let mut last_event: Option<Instant> = None;

    while !stop.load(Ordering::SeqCst) {
        match source.next_frame() {
            Ok(Some(frame)) => {
                consecutive_errors = 0;
                if frame.is_empty() {
                    continue;
                }

                let label = classify(&frame);
                trace!("Captured {} byte {label} frame", frame.len());

                let published = {
                    let mut snap = shared.write();
                    snap.record_packet(frame.len(), label);
                    snap.clone()
                };

                if last_event.map_or(true, |t| t.elapsed() >= event_interval) {
                    // Nobody listening is fine; send only fails then.
                    let _ = events.send(published);
                    last_event = Some(Instant::now());
                }
            }
            Ok(None) => {
                // Read timeout; yield so the runtime and the stop flag get a look in.
                tokio::time::sleep(IDLE_BACKOFF).await;
            }
            Err(e) => {
                error!("Capture read error on {interface}: {e}");
                shared.write().record_error();
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!("Too many consecutive capture errors, stopping loop");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    debug!("Capture loop exited for {interface}");
}

/// Coarse protocol label for one link-layer frame.
pub fn classify(frame: &[u8]) -> &'static str {
    let Some(eth) = EthernetPacket::new(frame) else {
        return "Other";
    };

    match eth.get_ethertype() {
        EtherTypes::Arp => "ARP",
        EtherTypes::Ipv4 => match Ipv4Packet::new(eth.payload()) {
            Some(ip) => classify_transport(ip.get_next_level_protocol(), ip.payload()),
            None => "IPv4",
        },
        EtherTypes::Ipv6 => match Ipv6Packet::new(eth.payload()) {
            Some(ip) => classify_transport(ip.get_next_header(), ip.payload()),
            None => "IPv6",
        },
        _ => "Other",
    }
}

fn classify_transport(proto: IpNextHeaderProtocol, payload: &[u8]) -> &'static str {
    match proto {
        IpNextHeaderProtocols::Tcp => match TcpPacket::new(payload) {
            Some(tcp) if is_dns_port(tcp.get_source(), tcp.get_destination()) => "DNS",
            _ => "TCP",
        },
        IpNextHeaderProtocols::Udp => match UdpPacket::new(payload) {
            Some(udp) if is_dns_port(udp.get_source(), udp.get_destination()) => "DNS",
            _ => "UDP",
        },
        IpNextHeaderProtocols::Icmp | IpNextHeaderProtocols::Icmpv6 => "ICMP",
        _ => "Other",
    }
}

fn is_dns_port(source: u16, destination: u16) -> bool {
    source == 53 || destination == 53
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal Ethernet/IPv4/UDP frame: src 10.0.0.1:1234 -> dst 10.0.0.2:5678,
    // 4 payload bytes. Checksums are zero; the classifier never verifies them.
    fn udp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
        let mut frame = vec![
            // Ethernet: dst mac, src mac, ethertype IPv4
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, //
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, //
            0x08, 0x00,
            // IPv4: version/IHL, TOS, total length 32, id, flags, TTL, proto 17, csum
            0x45, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, //
            0x40, 0x11, 0x00, 0x00, //
            10, 0, 0, 1, //
            10, 0, 0, 2, //
        ];
        // UDP header: ports, length 12, checksum
        frame.extend_from_slice(&src_port.to_be_bytes());
        frame.extend_from_slice(&dst_port.to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x0c, 0x00, 0x00]);
        frame.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        frame
    }

    fn arp_frame() -> Vec<u8> {
        let mut frame = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, //
            0x08, 0x06, // ethertype ARP
        ];
        // hw type ethernet, proto IPv4, sizes, opcode request, then addresses
        frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
        frame.extend_from_slice(&[0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 10, 0, 0, 1]);
        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 10, 0, 0, 2]);
        frame
    }

    #[test]
    fn classifies_udp() {
        assert_eq!(classify(&udp_frame(1234, 5678)), "UDP");
    }

    #[test]
    fn classifies_dns_by_port() {
        assert_eq!(classify(&udp_frame(1234, 53)), "DNS");
        assert_eq!(classify(&udp_frame(53, 1234)), "DNS");
    }

    #[test]
    fn classifies_arp() {
        assert_eq!(classify(&arp_frame()), "ARP");
    }

    #[test]
    fn garbage_is_other() {
        assert_eq!(classify(&[0x01, 0x02, 0x03]), "Other");
    }
}
