//! DNS A-record / alias reservation management against SLS networks.
//!
//! SLS only accepts whole-network writes, so edits are performed on
//! the fetched network structures in place; the caller PUTs back the
//! single network that changed.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use crate::cidr::Ipv4Cidr;
use crate::sls::{IpReservation, SlsNetwork};

/// A proposed reservation, parsed from `/etc/hosts`-style input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub ip: Ipv4Addr,
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
    #[error("record {0:?} must be \"IPAddress Name [Alias...]\"")]
    TooFewFields(String),

    #[error("invalid IPv4 address {0:?}")]
    BadAddress(String),
}

/// Parse a record of the form `"10.92.100.71 api_gateway api-gw ..."`.
pub fn parse_record(input: &str) -> Result<DnsRecord, RecordParseError> {
    let mut fields = input.split_whitespace();
    let ip = fields
        .next()
        .ok_or_else(|| RecordParseError::TooFewFields(input.to_string()))?;
    let name = fields
        .next()
        .ok_or_else(|| RecordParseError::TooFewFields(input.to_string()))?;

    Ok(DnsRecord {
        ip: ip
            .parse()
            .map_err(|_| RecordParseError::BadAddress(ip.to_string()))?,
        name: name.to_string(),
        aliases: fields.map(str::to_string).collect(),
    })
}

/// Flattened `/etc/hosts`-style rendering of an existing reservation.
pub fn reservation_line(reservation: &IpReservation) -> String {
    let mut line = format!("{} {}", reservation.ip_address, reservation.name);
    for alias in &reservation.aliases {
        line.push(' ');
        line.push_str(alias);
    }
    line
}

/// An existing reservation that collides with a proposed record.
#[derive(Debug, Clone)]
pub struct ReservationMatch {
    pub network: String,
    pub subnet: String,
    pub reservation: IpReservation,
}

fn subnet_contains(cidr: &str, ip: Ipv4Addr) -> bool {
    match cidr.parse::<Ipv4Cidr>() {
        Ok(net) => net.contains(ip),
        Err(error) => {
            tracing::warn!(cidr, %error, "Unparseable subnet CIDR in SLS, skipping");
            false
        }
    }
}

/// Find every existing reservation the proposed record collides with.
///
/// Deliberately broad: matches by IP, by name, by any shared alias,
/// and by the proposed name already being someone's alias, across
/// every subnet whose CIDR contains the proposed address. The caller
/// shows all of them and lets the operator decide whether to force.
pub fn find_matches(record: &DnsRecord, networks: &[SlsNetwork]) -> Vec<ReservationMatch> {
    let mut matches = Vec::new();

    for network in networks {
        for subnet in network.subnets() {
            if !subnet_contains(&subnet.cidr, record.ip) {
                continue;
            }
            for reservation in subnet.ip_reservations.as_deref().unwrap_or_default() {
                let same_ip = reservation.ip_address == record.ip.to_string();
                let same_name = reservation.name == record.name;
                let shared_alias = reservation
                    .aliases
                    .iter()
                    .any(|alias| record.aliases.contains(alias));
                let name_is_alias = reservation.aliases.contains(&record.name);

                if same_ip || same_name || shared_alias || name_is_alias {
                    matches.push(ReservationMatch {
                        network: network.name.clone(),
                        subnet: subnet.name.clone(),
                        reservation: reservation.clone(),
                    });
                }
            }
        }
    }

    matches
}

/// What `apply_record` did to the network structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Added,
    Replaced,
    Deleted,
}

/// Insert, replace, or delete the reservation for `record` in place.
///
/// Replacement and deletion match existing reservations **by IP
/// address only**; that is what makes a forced update distinct from
/// the broad collision search above. Returns the index of the network
/// that was modified so the caller can PUT just that one back, or
/// `None` when no subnet contains the address (or a delete found
/// nothing to remove).
pub fn apply_record(
    record: &DnsRecord,
    networks: &mut [SlsNetwork],
    delete: bool,
) -> Option<(usize, ApplyOutcome)> {
    let ip_string = record.ip.to_string();

    for (network_idx, network) in networks.iter_mut().enumerate() {
        let Some(props) = network.extra_properties.as_mut() else {
            continue;
        };
        for subnet in &mut props.subnets {
            if !subnet_contains(&subnet.cidr, record.ip) {
                continue;
            }

            let reservations = subnet.ip_reservations.get_or_insert_with(Vec::new);
            let existing = reservations
                .iter()
                .position(|r| r.ip_address == ip_string);

            match existing {
                Some(idx) if delete => {
                    reservations.remove(idx);
                    return Some((network_idx, ApplyOutcome::Deleted));
                }
                Some(idx) => {
                    reservations[idx] = new_reservation(record);
                    return Some((network_idx, ApplyOutcome::Replaced));
                }
                None if !delete => {
                    reservations.push(new_reservation(record));
                    return Some((network_idx, ApplyOutcome::Added));
                }
                // Deleting, nothing here by this IP: keep looking.
                None => {}
            }
        }
    }

    None
}

fn new_reservation(record: &DnsRecord) -> IpReservation {
    IpReservation {
        name: record.name.clone(),
        ip_address: record.ip.to_string(),
        aliases: record.aliases.clone(),
        rest: Default::default(),
    }
}

/// Dump every reservation, grouped by network and subnet.
pub fn render_reservations(networks: &[SlsNetwork]) -> String {
    let mut out = String::new();

    for network in networks {
        let subnets = network.subnets();
        if subnets.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", network.name);
        for subnet in subnets {
            let _ = writeln!(out, "  {} {}", subnet.name, subnet.cidr);
            for reservation in subnet.ip_reservations.as_deref().unwrap_or_default() {
                let _ = writeln!(out, "      {}", reservation_line(reservation));
            }
        }
    }
    out.push('\n');

    out
}
