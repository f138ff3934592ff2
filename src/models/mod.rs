//! Models Module
//!
//! Request and response DTOs for the proxy's HTTP surface.

pub mod requests;
pub mod responses;

pub use requests::{DeleteRequest, FlushRequest, SetRequest};
pub use responses::{
    DeleteResponse, FlushResponse, GetResponse, HealthResponse, NodesResponse, SetResponse,
};
