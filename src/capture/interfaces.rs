use log::{debug, warn};
use std::net::IpAddr;

use crate::models::interface::InterfaceInfo;
use crate::utils::error::{CaptureError, CaptureResult};

/// Enumerate the network interfaces available for capture.
///
/// The result is a snapshot in platform enumeration order; callers re-invoke to
/// refresh. Primary source is pnet_datalink, with pcap's device list as a
/// fallback when the former returns nothing usable.
pub fn list() -> CaptureResult<Vec<InterfaceInfo>> {
    let from_datalink = datalink_interfaces();
    if !from_datalink.is_empty() {
        debug!("Enumerated {} interfaces via datalink", from_datalink.len());
        return Ok(from_datalink);
    }

    warn!("Datalink enumeration returned nothing, falling back to pcap");
    match pcap::Device::list() {
        Ok(devices) if !devices.is_empty() => Ok(devices
            .into_iter()
            .map(|dev| InterfaceInfo::new(dev.name).with_description(dev.desc))
            .collect()),
        Ok(_) => Err(CaptureError::Enumeration(
            "no capture devices found".to_string(),
        )),
        Err(e) => Err(CaptureError::Enumeration(e.to_string())),
    }
}

/// Just the device names, in the same order as `list`.
pub fn names() -> CaptureResult<Vec<String>> {
    Ok(list()?.into_iter().map(|info| info.name).collect())
}

fn datalink_interfaces() -> Vec<InterfaceInfo> {
    pnet_datalink::interfaces()
        .into_iter()
        .map(|iface| {
            let mut info = InterfaceInfo::new(iface.name.clone());

            for ip in &iface.ips {
                if let IpAddr::V4(ipv4) = ip.ip() {
                    info.ipv4_address = Some(ipv4.to_string());
                    break;
                }
            }

            info.description = if iface.description.is_empty() {
                None
            } else {
                Some(iface.description.clone())
            };
            info.mac_address = iface.mac.map(|mac| mac.to_string());
            info.is_loopback = iface.is_loopback();
            info.is_up = iface.is_up();

            info
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_yields_named_interfaces() {
        // Listing needs no privileges; any environment running the tests has
        // at least a loopback device.
        let interfaces = list().expect("enumeration failed");
        assert!(!interfaces.is_empty());
        assert!(interfaces.iter().all(|i| !i.name.is_empty()));
    }

    #[test]
    fn names_match_list_order() {
        let listed = list().expect("enumeration failed");
        let names = names().expect("enumeration failed");
        let expected: Vec<String> = listed.into_iter().map(|i| i.name).collect();
        assert_eq!(names, expected);
    }
}
