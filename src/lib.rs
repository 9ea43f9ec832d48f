pub mod cache;
pub mod config;
pub mod error;
pub mod humanize;
pub mod model;
pub mod observability;
pub mod service;
pub mod transport;

pub use error::{FetchError, ResponseMeta, SetupError};
pub use model::{Item, ListingEnvelope, Location, Offer, Photo, Rating};
pub use service::DataService;
pub use transport::{HttpTransport, RequestHandle};
