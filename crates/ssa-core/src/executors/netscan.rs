//! Network scanning via nmap's greppable output.

use super::ExecError;
use crate::tools::ToolRunner;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SCAN_TIMEOUT: Duration = Duration::from_secs(120);

/// Scan profiles exposed to callers. Raw nmap flags are never accepted
/// from parameters.
const SCAN_PROFILES: &[(&str, &[&str])] = &[
    ("version", &["-sV"]),
    ("fast", &["-F"]),
    ("connect", &["-sT"]),
    ("no-ping", &["-Pn", "-sT"]),
];

const DEFAULT_PROFILE: &str = "version";

/// Targets are hosts, IPs, or CIDR ranges; anything else is rejected
/// before it can reach the command line.
fn validate_target(target: &str) -> Result<(), ExecError> {
    let ok = !target.is_empty()
        && target.len() <= 253
        && !target.starts_with('-')
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | ':'));
    if ok {
        Ok(())
    } else {
        Err(ExecError::InvalidParam(format!("bad scan target: {:?}", target)))
    }
}

fn profile_args(profile: &str) -> Result<&'static [&'static str], ExecError> {
    SCAN_PROFILES
        .iter()
        .find(|(name, _)| *name == profile)
        .map(|(_, args)| *args)
        .ok_or_else(|| {
            ExecError::InvalidParam(format!(
                "unknown scan profile {:?} (expected one of: {})",
                profile,
                SCAN_PROFILES
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Port scan a target.
pub fn scan(runner: &ToolRunner, target: &str, profile: Option<&str>) -> Result<Value, ExecError> {
    validate_target(target)?;
    let profile = profile.unwrap_or(DEFAULT_PROFILE);
    let extra = profile_args(profile)?;

    let mut args: Vec<&str> = vec!["-oG", "-"];
    args.extend_from_slice(extra);
    args.push(target);

    let output = runner.run("nmap", &args, Some(SCAN_TIMEOUT))?;
    if !output.success() {
        return Err(ExecError::from_output("nmap", &output));
    }

    let hosts = parse_greppable(&output.stdout_str());
    debug!(target, profile, hosts = hosts.len(), "nmap scan complete");
    Ok(json!({
        "target": target,
        "profile": profile,
        "hosts": hosts,
        "method": "nmap_scan",
    }))
}

/// Parse `nmap -oG -` output.
///
/// Host lines look like:
/// `Host: 192.168.1.1 (router)\tStatus: Up`
/// `Host: 192.168.1.1 (router)\tPorts: 22/open/tcp//ssh//OpenSSH 8.9/`
fn parse_greppable(text: &str) -> Vec<Value> {
    let mut hosts: Vec<Value> = Vec::new();

    for line in text.lines() {
        if !line.starts_with("Host: ") {
            continue;
        }
        let mut address = "";
        let mut hostname = "";
        let mut status: Option<&str> = None;
        let mut ports: Vec<Value> = Vec::new();

        for field in line.split('\t') {
            if let Some(rest) = field.strip_prefix("Host: ") {
                let mut parts = rest.splitn(2, ' ');
                address = parts.next().unwrap_or("");
                hostname = parts
                    .next()
                    .unwrap_or("")
                    .trim_matches(|c| c == '(' || c == ')');
            } else if let Some(rest) = field.strip_prefix("Status: ") {
                status = Some(rest.trim());
            } else if let Some(rest) = field.strip_prefix("Ports: ") {
                ports = rest.split(", ").filter_map(parse_port_entry).collect();
            }
        }

        if address.is_empty() {
            continue;
        }

        // Up/Ports come on separate lines for the same host; merge them
        if !ports.is_empty() {
            if let Some(existing) = hosts.iter_mut().find(|h| h["address"] == address) {
                existing["ports"] = json!(ports);
                continue;
            }
        }
        if let Some(status) = status {
            hosts.push(json!({
                "address": address,
                "hostname": hostname,
                "status": status.to_ascii_lowercase(),
                "ports": ports,
            }));
        } else if !ports.is_empty() {
            hosts.push(json!({
                "address": address,
                "hostname": hostname,
                "status": "up",
                "ports": ports,
            }));
        }
    }

    hosts
}

/// One entry of a Ports field: `22/open/tcp//ssh//OpenSSH 8.9/`.
fn parse_port_entry(entry: &str) -> Option<Value> {
    let fields: Vec<&str> = entry.trim().split('/').collect();
    let port: u16 = fields.first()?.parse().ok()?;
    let state = *fields.get(1)?;
    Some(json!({
        "port": port,
        "state": state,
        "protocol": fields.get(2).copied().unwrap_or(""),
        "service": fields.get(4).copied().unwrap_or(""),
        "version": fields.get(6).copied().unwrap_or("").trim(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NMAP_SAMPLE: &str = "\
# Nmap 7.94 scan initiated
Host: 192.168.1.1 (router.lan)\tStatus: Up
Host: 192.168.1.1 (router.lan)\tPorts: 22/open/tcp//ssh//OpenSSH 8.9p1/, 80/open/tcp//http//nginx 1.24/\tIgnored State: closed (998)
Host: 192.168.1.50 ()\tStatus: Down
# Nmap done
";

    #[test]
    fn test_parse_greppable_merges_host_lines() {
        let hosts = parse_greppable(NMAP_SAMPLE);
        assert_eq!(hosts.len(), 2);

        assert_eq!(hosts[0]["address"], "192.168.1.1");
        assert_eq!(hosts[0]["hostname"], "router.lan");
        assert_eq!(hosts[0]["status"], "up");
        let ports = hosts[0]["ports"].as_array().unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0]["port"], 22);
        assert_eq!(ports[0]["service"], "ssh");
        assert_eq!(ports[0]["version"], "OpenSSH 8.9p1");
        assert_eq!(ports[1]["service"], "http");

        assert_eq!(hosts[1]["status"], "down");
    }

    #[test]
    fn test_target_validation() {
        assert!(validate_target("192.168.1.0/24").is_ok());
        assert!(validate_target("scanme.nmap.org").is_ok());
        assert!(validate_target("fe80::1").is_ok());
        assert!(validate_target("").is_err());
        assert!(validate_target("-iL /etc/passwd").is_err());
        assert!(validate_target("host; reboot").is_err());
    }

    #[test]
    fn test_profiles_are_closed_set() {
        assert_eq!(profile_args("version").unwrap(), &["-sV"]);
        assert_eq!(profile_args("no-ping").unwrap(), &["-Pn", "-sT"]);
        assert!(profile_args("-sS --script=vuln").is_err());
    }

    #[test]
    fn test_parse_port_entry_malformed() {
        assert!(parse_port_entry("garbage").is_none());
        assert!(parse_port_entry("99999/open/tcp").is_none());
    }
}
