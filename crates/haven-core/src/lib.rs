//! Reconciliation core for Haven Availability deployments.
//!
//! Sits between a declarative caller (a configuration-language runtime
//! invoking create/read/update/delete hooks) and the appliance APIs in
//! [`haven_api`]. Each [`resource`] module consumes typed desired state
//! and returns an opaque identity string plus a flat computed
//! [`attributes::Attributes`] set; the [`data`] modules provide the
//! read-only lookups (thumbprints, service certificates, health
//! reports) those flows are built from.
//!
//! Concurrency model: one appliance, one caller, strictly sequential
//! operations -- later steps in a provisioning flow depend on the side
//! effects of earlier ones, and nothing here retries a mutation.

pub mod attributes;
pub mod convert;
pub mod data;
pub mod error;
pub mod inventory;
pub mod resource;

pub use attributes::{AttrValue, Attributes};
pub use error::CoreError;
pub use inventory::{ApplianceRole, ExtraConfigSource};
pub use resource::Reconciled;
