// Reconciliation resources
//
// One module per declared resource kind. Each exposes create / read /
// update / delete flows that consume typed desired state and hand back
// the resource identity plus flat computed attributes. The identity
// format is NOT uniform across kinds -- site configuration ids,
// replicator ids, task ids, and confirmation timestamps all occur --
// so callers must treat it as opaque.
//
// No flow attempts rollback: when a multi-step provisioning sequence
// fails midway, already-applied remote state stays as-is and the next
// reconcile pass picks it up.

pub mod cloud_manager;
pub mod manager;
pub mod pair_site;
pub mod password;
pub mod replicator;
pub mod tunnel;

use crate::attributes::Attributes;

/// Result of a create/update flow: the (possibly new) resource identity
/// and the computed attribute set the caller must persist.
#[derive(Debug)]
pub struct Reconciled {
    pub id: String,
    pub attributes: Attributes,
}
