//! # Residua API
//!
//! The caller-facing surface of Residua: request/response DTOs, the
//! error taxonomy exposed to transport layers, and the runtime object
//! that wires configuration, fact store, oracle and pipeline together.
//!
//! Transport contracts (HTTP routes, CLI flags) live in the apps; this
//! crate only knows "submit an allocation request, get a plan or a
//! structured error".

mod dto;
mod error;
mod runtime;

pub use dto::{AllocationSubmitRequest, AllocationView};
pub use error::{ApiError, ErrorCode};
pub use runtime::AllocationApi;
