//! Change detection between one side and the base.

use crate::merge::types::EntryInfo;
use crate::repository::ObjectKind;

/// Returns true if `entry` differs from `base` for merge purposes.
///
/// Two trees never count as modified at this level; their children are
/// compared individually by the walk.
pub fn modified(entry: &Option<EntryInfo>, base: &Option<EntryInfo>) -> bool {
    match (entry, base) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(e), Some(b)) => {
            if e.kind == ObjectKind::Tree && b.kind == ObjectKind::Tree {
                return false;
            }
            !(e.kind == b.kind && e.mode == b.mode && e.oid == b.oid)
        }
    }
}
