//! Remote logistics backend client: entity catalogs, trips, and parcel
//! submission, plus the process-wide entity-name cache.

pub mod api;
pub mod payloads;
pub mod resolver;

pub use api::{ApiError, EntityKind, EntityRecord, HttpLogisticsClient, LogisticsApi};
pub use payloads::{
    ParcelDraft, ParcelReceipt, PostalAddress, Receiver, RouteIds, Sender, TripDraft,
};
pub use resolver::{EntityCache, EntityResolver};
