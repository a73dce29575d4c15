pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{LocalStorage, SiteConfig};
pub use core::engine::{PatchEngine, RunSummary};
pub use core::{Geocoder, Page, Patch, Storage};
pub use utils::error::{Result, SiteError};
