//! Router configuration loading: a single text file mixing
//! `iface <name> <mac> <ipv4>` and `route <dest> <mask> <gateway> <egress>`
//! lines, whitespace-separated. No regex needed for this format (see
//! DESIGN.md for the dependency tradeoff).

use std::io::BufRead;

use crate::error::{ConfigError, ConfigResult};

use super::interface::{Interface, InterfaceTable};
use super::ipv4::parse_ipv4;
use super::mac::parse_mac;
use super::route::{Route, RoutingTable};

pub struct RouterConfig {
    pub interfaces: InterfaceTable,
    pub routes: RoutingTable,
}

impl RouterConfig {
    pub fn parse(reader: impl BufRead) -> ConfigResult<Self> {
        let mut interfaces = InterfaceTable::new();
        let mut routes = RoutingTable::new();
        let mut pending_routes = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ConfigError::Io {
                path: "<router config>".to_string(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<_> = line.split_whitespace().collect();
            match fields.first().copied() {
                Some("iface") if fields.len() == 4 => {
                    let mac =
                        parse_mac(fields[2]).ok_or_else(|| ConfigError::InvalidMac(fields[2].to_string()))?;
                    let ipv4 =
                        parse_ipv4(fields[3]).ok_or_else(|| ConfigError::InvalidIpv4(fields[3].to_string()))?;
                    interfaces.insert(fields[1], Interface { mac, ipv4 });
                }
                Some("route") if fields.len() == 5 => {
                    let dest =
                        parse_ipv4(fields[1]).ok_or_else(|| ConfigError::InvalidIpv4(fields[1].to_string()))?;
                    let mask =
                        parse_ipv4(fields[2]).ok_or_else(|| ConfigError::InvalidIpv4(fields[2].to_string()))?;
                    let gateway =
                        parse_ipv4(fields[3]).ok_or_else(|| ConfigError::InvalidIpv4(fields[3].to_string()))?;
                    pending_routes.push((
                        line_no,
                        Route {
                            dest,
                            mask,
                            gateway,
                            egress: fields[4].to_string(),
                        },
                    ));
                }
                _ => {
                    return Err(ConfigError::MalformedLine {
                        line_no,
                        line: line.to_string(),
                    })
                }
            }
        }

        for (line_no, route) in pending_routes {
            if interfaces.get(&route.egress).is_none() {
                let _ = line_no;
                return Err(ConfigError::UnknownInterface(route.egress));
            }
            routes.push(route);
        }

        Ok(Self { interfaces, routes })
    }
}
