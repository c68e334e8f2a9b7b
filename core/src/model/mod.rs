//! # Data Model
//!
//! - **item**: the collection item tree.
//! - **request**: request and websocket payloads.
//! - **collection**: collection and branch aggregates.

pub mod collection;
pub mod item;
pub mod request;

pub use collection::{Branch, BranchRef, Collection};
pub use item::{count_requests, AuditStamp, CollectionItem, ItemSource, ItemType};
pub use request::{
    ApiKeyPlacement, BodyMode, FormData, FormDataFile, HttpMethod, KeyValue, RequestAuth,
    RequestBody, RequestMetaData, SocketBodyMode, WebSocketMetaData,
};
