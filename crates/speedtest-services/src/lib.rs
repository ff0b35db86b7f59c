//! speedtest-services — collaborators behind the auxiliary endpoints.
//!
//! Nothing here takes part in a measurement; each module is plain
//! request/response logic the HTTP edge calls into.

pub mod card;
pub mod geo;
pub mod regions;
pub mod scoring;
pub mod share_store;

pub use card::{CardError, CardRenderer, RenderedCard, ShareCard, SvgCardRenderer, Theme};
pub use geo::{DisabledGeoLookup, GeoLookup, GeoRecord, IpApiLookup};
pub use regions::{find_server, region_catalog, ServerInfo, ServerRegion};
pub use scoring::{calculate_network_quality, NetworkQuality, NetworkQualityInput, Recommendation};
pub use share_store::{
    fetch_live, new_share_id, MemoryShareStore, ShareLookup, ShareStore, ShareStoreError,
    SharedReport, SqliteShareStore,
};
