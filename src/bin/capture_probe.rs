use pcap::{Capture, Device};
use std::env;

/// Standalone smoke test for capture permissions: lists devices, opens one,
/// and reads a few packets. Useful when the service reports device errors.
fn main() {
    println!("netmeter capture probe");

    let interface_name = match env::args().nth(1) {
        Some(name) => name,
        None => {
            println!("No interface specified, listing available devices:");
            let devices = match Device::list() {
                Ok(devices) => devices,
                Err(e) => {
                    eprintln!("Failed to list devices: {e}");
                    std::process::exit(1);
                }
            };
            for (i, device) in devices.iter().enumerate() {
                println!(
                    "  {}: {} - {}",
                    i,
                    device.name,
                    device.desc.as_deref().unwrap_or("no description")
                );
            }
            let Some(first) = devices.first() else {
                eprintln!("No capture devices found");
                std::process::exit(1);
            };
            println!("Using first device by default");
            first.name.clone()
        }
    };

    println!("Probing capture on {interface_name}");

    let inactive = match Capture::from_device(interface_name.as_str()) {
        Ok(capture) => capture.promisc(true).snaplen(65535).timeout(1000),
        Err(e) => {
            eprintln!("Failed to create capture: {e}");
            std::process::exit(1);
        }
    };

    let mut capture = match inactive.open() {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("Failed to open capture: {e}");
            std::process::exit(1);
        }
    };

    println!("Capture open, reading 3 packets...");
    for i in 0..3 {
        match capture.next_packet() {
            Ok(packet) => println!("  packet {}: {} bytes", i + 1, packet.data.len()),
            Err(e) => println!("  packet {}: read error: {e}", i + 1),
        }
    }

    println!("Probe complete");
}
