//! Shodan host search and host detail client.

use crate::error::ProxyError;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "shodan";
const SEARCH_URL: &str = "https://api.shodan.io/shodan/host/search";
const HOST_URL: &str = "https://api.shodan.io/shodan/host";

/// Search Shodan for internet-exposed hosts.
pub fn search(
    agent: &ureq::Agent,
    key: &str,
    query: &str,
    limit: u32,
) -> Result<Value, ProxyError> {
    let response = agent
        .get(SEARCH_URL)
        .query("key", key)
        .query("query", query)
        .query("limit", &limit.to_string())
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    let payload = map_search(&body);
    debug!(total = payload["total"].as_u64(), "shodan search complete");
    Ok(payload)
}

/// Detailed information about a single host.
pub fn host(agent: &ureq::Agent, key: &str, ip: &str) -> Result<Value, ProxyError> {
    let url = format!("{}/{}", HOST_URL, ip);
    let response = agent
        .get(&url)
        .query("key", key)
        .call()
        .map_err(|e| ProxyError::from_ureq(SERVICE, e))?;

    let body: Value = response.into_json().map_err(|e| ProxyError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })?;

    Ok(json!({ "host": body, "method": "shodan_proxy" }))
}

/// Map the search response into the fixed host-search payload shape.
pub(crate) fn map_search(body: &Value) -> Value {
    let results: Vec<Value> = body["matches"]
        .as_array()
        .map(|matches| {
            matches
                .iter()
                .map(|m| {
                    json!({
                        "ip": m.get("ip_str").cloned().unwrap_or(Value::Null),
                        "port": m.get("port").cloned().unwrap_or(Value::Null),
                        "org": m.get("org").cloned().unwrap_or(Value::Null),
                        "location": m.get("location").cloned().unwrap_or(Value::Null),
                        "hostnames": m.get("hostnames").cloned().unwrap_or(json!([])),
                        "os": m.get("os").cloned().unwrap_or(Value::Null),
                        "banner": m.get("data").cloned().unwrap_or(Value::Null),
                        "vulns": m.get("vulns").cloned().unwrap_or(json!([])),
                        "source": SERVICE,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "results": results,
        "total": body.get("total").cloned().unwrap_or(json!(0)),
        "method": "shodan_proxy",
    })
}
