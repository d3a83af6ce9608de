use std::collections::BTreeSet;

use crate::core::RawHostRecord;

pub const APPLE_DEVICE: &str = "Apple Device";
pub const SMART_HOME_IOT: &str = "Smart Home (IoT)";
pub const ROUTER_GATEWAY: &str = "Router/Gateway";
pub const WORKSTATION: &str = "Workstation";

const DNS_PORT: u16 = 53;

/// Best-effort device label. OS fingerprint beats MAC vendor, which beats
/// open-port hints; every host gets a label.
pub fn classify_device(host: &RawHostRecord, open_ports: &BTreeSet<u16>) -> String {
    if let Some(name) = host.best_os_name() {
        return name.to_string();
    }

    if let Some(vendor) = host.primary_vendor() {
        let vendor = vendor.to_lowercase();
        if vendor.contains("apple") {
            return APPLE_DEVICE.to_string();
        }
        if vendor.contains("espressif") {
            return SMART_HOME_IOT.to_string();
        }
    }

    if open_ports.contains(&DNS_PORT) {
        return ROUTER_GATEWAY.to_string();
    }

    WORKSTATION.to_string()
}
