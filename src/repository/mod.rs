//! Object model: ids, modes, trees and object framing.

mod git_objects;

pub use git_objects::{
    FileMode, ObjectError, ObjectFormat, ObjectId, ObjectKind, Result, StoredObject, Tree,
    TreeEntry, compare_entries, frame_object, parse_commit_tree, parse_framed,
};
