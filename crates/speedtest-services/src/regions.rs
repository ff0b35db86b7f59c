//! Static server region catalog.
//!
//! Purely descriptive: every entry points at the serving instance itself.
//! Nothing is pinged or health-checked server-side.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub region: String,
    pub flag: String,
    pub endpoint: String,
    pub ping: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRegion {
    pub id: String,
    pub name: String,
    pub servers: Vec<ServerInfo>,
}

struct ServerEntry {
    id: &'static str,
    name: &'static str,
    flag: &'static str,
}

struct RegionEntry {
    id: &'static str,
    name: &'static str,
    servers: &'static [ServerEntry],
}

const AUTO_SERVER: ServerEntry = ServerEntry {
    id: "auto-best",
    name: "Automatic Selection",
    flag: "🌐",
};

const CATALOG: &[RegionEntry] = &[
    RegionEntry {
        id: "auto",
        name: "Auto (Best)",
        servers: &[AUTO_SERVER],
    },
    RegionEntry {
        id: "asia",
        name: "Asia Pacific",
        servers: &[
            ServerEntry {
                id: "asia-singapore",
                name: "Singapore",
                flag: "🇸🇬",
            },
            ServerEntry {
                id: "asia-tokyo",
                name: "Tokyo, Japan",
                flag: "🇯🇵",
            },
            ServerEntry {
                id: "asia-mumbai",
                name: "Mumbai, India",
                flag: "🇮🇳",
            },
            ServerEntry {
                id: "asia-sydney",
                name: "Sydney, Australia",
                flag: "🇦🇺",
            },
        ],
    },
    RegionEntry {
        id: "europe",
        name: "Europe",
        servers: &[
            ServerEntry {
                id: "eu-london",
                name: "London, UK",
                flag: "🇬🇧",
            },
            ServerEntry {
                id: "eu-frankfurt",
                name: "Frankfurt, Germany",
                flag: "🇩🇪",
            },
            ServerEntry {
                id: "eu-amsterdam",
                name: "Amsterdam, Netherlands",
                flag: "🇳🇱",
            },
            ServerEntry {
                id: "eu-paris",
                name: "Paris, France",
                flag: "🇫🇷",
            },
        ],
    },
    RegionEntry {
        id: "north-america",
        name: "North America",
        servers: &[
            ServerEntry {
                id: "us-east",
                name: "New York, USA",
                flag: "🇺🇸",
            },
            ServerEntry {
                id: "us-west",
                name: "Los Angeles, USA",
                flag: "🇺🇸",
            },
            ServerEntry {
                id: "us-central",
                name: "Dallas, USA",
                flag: "🇺🇸",
            },
            ServerEntry {
                id: "ca-toronto",
                name: "Toronto, Canada",
                flag: "🇨🇦",
            },
        ],
    },
    RegionEntry {
        id: "south-america",
        name: "South America",
        servers: &[ServerEntry {
            id: "br-saopaulo",
            name: "São Paulo, Brazil",
            flag: "🇧🇷",
        }],
    },
    RegionEntry {
        id: "middle-east",
        name: "Middle East",
        servers: &[ServerEntry {
            id: "me-dubai",
            name: "Dubai, UAE",
            flag: "🇦🇪",
        }],
    },
];

fn server_info(entry: &ServerEntry, region: &str, endpoint: &str) -> ServerInfo {
    ServerInfo {
        id: entry.id.to_string(),
        name: entry.name.to_string(),
        region: region.to_string(),
        flag: entry.flag.to_string(),
        endpoint: endpoint.to_string(),
        ping: None,
    }
}

/// Full catalog with every endpoint set to `base_url`.
pub fn region_catalog(base_url: &str) -> Vec<ServerRegion> {
    CATALOG
        .iter()
        .map(|r| ServerRegion {
            id: r.id.to_string(),
            name: r.name.to_string(),
            servers: r
                .servers
                .iter()
                .map(|s| server_info(s, r.id, base_url))
                .collect(),
        })
        .collect()
}

/// Look up one server. Unknown ids resolve to the automatic selection entry.
pub fn find_server(server_id: &str, base_url: &str) -> ServerInfo {
    CATALOG
        .iter()
        .flat_map(|r| r.servers.iter().map(move |s| (r.id, s)))
        .find(|(_, s)| s.id == server_id)
        .map(|(region, s)| server_info(s, region, base_url))
        .unwrap_or_else(|| server_info(&AUTO_SERVER, "auto", base_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_expected_shape() {
        let regions = region_catalog("http://localhost:8000");
        let ids: Vec<&str> = regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            ["auto", "asia", "europe", "north-america", "south-america", "middle-east"]
        );
        let servers: usize = regions.iter().map(|r| r.servers.len()).sum();
        assert_eq!(servers, 15);
    }

    #[test]
    fn every_server_points_at_base_url() {
        for region in region_catalog("https://speed.example") {
            for server in region.servers {
                assert_eq!(server.endpoint, "https://speed.example");
                assert_eq!(server.region, region.id);
                assert!(server.ping.is_none());
            }
        }
    }

    #[test]
    fn find_server_by_id() {
        let s = find_server("eu-frankfurt", "http://x");
        assert_eq!(s.name, "Frankfurt, Germany");
        assert_eq!(s.region, "europe");
    }

    #[test]
    fn unknown_server_falls_back_to_auto() {
        let s = find_server("mars-base", "http://x");
        assert_eq!(s.id, "auto-best");
        assert_eq!(s.region, "auto");
        assert_eq!(s.endpoint, "http://x");
    }
}
