/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use std::collections::HashMap;

/// Maps the host a request arrived on to the database name identifying its site
pub trait SiteResolver: Send + Sync {
    fn db_name_for_host(&self, host: &str) -> String;
}

/// Exact host lookup with a fallback database name
#[derive(Clone, Debug, Default)]
pub struct HostTable {
    hosts: HashMap<String, String>,
    default_db_name: String,
}

impl HostTable {
    pub fn new(hosts: HashMap<String, String>, default_db_name: impl Into<String>) -> HostTable {
        HostTable {
            hosts,
            default_db_name: default_db_name.into(),
        }
    }
}

impl SiteResolver for HostTable {
    fn db_name_for_host(&self, host: &str) -> String {
        // Ignore any port and letter case in the Host header
        let host = without_port(host).to_ascii_lowercase();
        match self.hosts.get(&host) {
            Some(db_name) => db_name.clone(),
            None => self.default_db_name.clone(),
        }
    }
}

// "example.org:8080" -> "example.org", "[::1]:8080" -> "[::1]". A bare IPv6
// address such as "::1" has no port to strip.
fn without_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port))
            if !name.contains(':')
                && !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    }
}

#[test]
fn host_table_lookup() {
    let hosts = HashMap::from([
        ("www.mediawiki.org".to_string(), "mediawikiwiki".to_string()),
        ("test.wikipedia.org".to_string(), "testwiki".to_string()),
    ]);
    let table = HostTable::new(hosts, "enwiki");
    assert_eq!(table.db_name_for_host("test.wikipedia.org"), "testwiki");
    assert_eq!(table.db_name_for_host("Test.Wikipedia.org:8080"), "testwiki");
    assert_eq!(table.db_name_for_host("www.mediawiki.org"), "mediawikiwiki");
    assert_eq!(table.db_name_for_host("en.wikipedia.org"), "enwiki");
}

#[test]
fn ipv6_hosts_keep_their_address() {
    let hosts = HashMap::from([
        ("[::1]".to_string(), "testwiki".to_string()),
        ("::1".to_string(), "dewiki".to_string()),
    ]);
    let table = HostTable::new(hosts, "enwiki");
    assert_eq!(without_port("[::1]:8080"), "[::1]");
    assert_eq!(without_port("[::1]"), "[::1]");
    assert_eq!(without_port("::1"), "::1");
    assert_eq!(without_port("example.org:"), "example.org:");
    assert_eq!(table.db_name_for_host("[::1]:8080"), "testwiki");
    assert_eq!(table.db_name_for_host("[::1]"), "testwiki");
    assert_eq!(table.db_name_for_host("::1"), "dewiki");
    assert_eq!(table.db_name_for_host("[fe80::2]:443"), "enwiki");
}
