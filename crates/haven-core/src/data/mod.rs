// Read-only data sources
//
// Lookups the reconciliation caller consumes without owning remote
// state: certificate thumbprints, pinned service certificates from the
// inventory, and flattened health reports.

pub mod health;
pub mod service_cert;
pub mod thumbprint;
