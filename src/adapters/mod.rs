//! 外部服務：地理編碼與 DNS 供應商

pub mod google_places;
pub mod namecheap;
pub mod nominatim;
#[cfg(feature = "route53")]
pub mod route53;

pub use google_places::GooglePlaces;
pub use namecheap::NamecheapClient;
pub use nominatim::Nominatim;
#[cfg(feature = "route53")]
pub use route53::Route53Client;
