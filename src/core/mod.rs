pub mod dns;
pub mod engine;
pub mod events;
pub mod feed;
pub mod html;
pub mod listing;
pub mod meta;
pub mod navigation;
pub mod ordering;
pub mod site;
pub mod wix;

pub use crate::domain::model::Page;
pub use crate::domain::ports::{Geocoder, Patch, Storage};
pub use crate::utils::error::Result;
