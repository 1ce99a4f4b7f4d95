//! Merging blobs changed on both sides.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::merge::context::MergeContext;
use crate::merge::error::{MergeError, Result};
use crate::merge::resolver::ResolveError;
use crate::merge::text::TextMergeInput;
use crate::merge::types::{BlobMergeShape, MergedEntry, TripleInfo, UnreadableContent};
use crate::repository::ObjectKind;
use crate::walk::{MergeTriple, WalkerEntry, basename};

// =============================================================================
// merge_blobs
// =============================================================================

/// Merge a blob that both sides changed.
///
/// # Algorithm
///
/// 1. With all three sides present, pick the mode: theirs if base and ours
///    agree on it, else ours
/// 2. With all three sides present, return an existing id when one side
///    equals the other or the base
/// 3. Otherwise read the three texts and run the text merger
/// 4. Hand an unclean result to the conflict resolver; empty resolved text
///    deletes the path
/// 5. Write the merged text as a new blob
///
/// # Returns
///
/// The merged entry, or `None` when the resolver chose to delete the path.
pub async fn merge_blobs(
    ctx: &MergeContext,
    path: &str,
    shape: BlobMergeShape,
    triple: &MergeTriple,
    sides: &TripleInfo,
) -> Result<Option<MergedEntry>> {
    let full_path = triple.full_path().unwrap_or(path);
    let name = basename(path);

    // 1-2. Mode rule and trivial shortcuts
    let mut mode = None;
    if let (Some(ours), Some(base), Some(theirs)) = (&sides.ours, &sides.base, &sides.theirs) {
        let merged_mode = if base.mode == ours.mode {
            theirs.mode
        } else {
            ours.mode
        };
        mode = Some(merged_mode);

        let shortcut = if ours.oid == theirs.oid {
            Some(&ours.oid)
        } else if ours.oid == base.oid {
            Some(&theirs.oid)
        } else if theirs.oid == base.oid {
            Some(&ours.oid)
        } else {
            None
        };

        if let Some(oid) = shortcut {
            debug!(path = full_path, %oid, "blob merge resolved without text merge");
            return Ok(Some(MergedEntry {
                mode: merged_mode,
                path: name.to_string(),
                oid: oid.clone(),
                kind: ObjectKind::Blob,
            }));
        }
    }

    let mode = match mode
        .or(sides.ours.as_ref().map(|e| e.mode))
        .or(sides.theirs.as_ref().map(|e| e.mode))
    {
        Some(mode) => mode,
        None => return Err(MergeError::not_supported(full_path, "no side has a file mode")),
    };

    // 3. Text merge
    let (ours_text, base_text, theirs_text) = tokio::try_join!(
        read_text(ctx, full_path, "ours", &triple.ours),
        read_text(ctx, full_path, "base", &triple.base),
        read_text(ctx, full_path, "theirs", &triple.theirs),
    )?;

    let output = ctx.text_merger.merge(&TextMergeInput {
        ours: &ours_text,
        base: &base_text,
        theirs: &theirs_text,
        our_name: &ctx.our_name,
        base_name: &ctx.base_name,
        their_name: &ctx.their_name,
        format: ctx.format,
        marker_size: ctx.marker_size,
    });

    // 4. Conflict resolution
    let content = if output.clean_merge {
        output.merged_text
    } else {
        debug!(path = full_path, ?shape, "text merge conflict");
        let resolved = resolve_conflict(ctx, full_path, &output.merged_text).await?;
        if resolved.is_empty() {
            debug!(path = full_path, "resolver deleted path");
            return Ok(None);
        }
        resolved
    };

    // 5. Write the merged blob
    let oid = ctx
        .repo
        .write_object(ObjectKind::Blob, content.as_bytes(), ctx.dry_run)
        .await?;

    Ok(Some(MergedEntry {
        mode,
        path: name.to_string(),
        oid,
        kind: ObjectKind::Blob,
    }))
}

async fn resolve_conflict(ctx: &MergeContext, path: &str, conflicted: &str) -> Result<String> {
    let Some(resolver) = &ctx.conflict_resolver else {
        return Err(MergeError::not_supported(
            path,
            "conflicting changes and no conflict resolver",
        ));
    };

    match resolver.resolve(conflicted, path).await {
        Ok(text) => Ok(text),
        Err(ResolveError::Aborted) => Err(MergeError::Aborted {
            path: path.to_string(),
        }),
        Err(e @ ResolveError::Failed(_)) => Err(MergeError::not_supported(path, e.to_string())),
    }
}

// =============================================================================
// Reading content
// =============================================================================

/// Read one side's blob as text. An absent side reads as empty text.
async fn read_text(
    ctx: &MergeContext,
    path: &str,
    side: &str,
    entry: &Option<Arc<dyn WalkerEntry>>,
) -> Result<String> {
    let Some(entry) = entry else {
        return Ok(String::new());
    };

    let reason = match entry.content().await {
        Ok(bytes) => {
            if content_inspector::inspect(&bytes).is_binary() {
                "binary content".to_string()
            } else {
                match String::from_utf8(bytes) {
                    Ok(text) => return Ok(text),
                    Err(_) => "content is not valid UTF-8".to_string(),
                }
            }
        }
        Err(e) => e.to_string(),
    };

    match ctx.unreadable_content {
        UnreadableContent::Empty => {
            warn!(path, side, reason = %reason, "unreadable content, merging as empty text");
            Ok(String::new())
        }
        UnreadableContent::Fail => Err(MergeError::not_supported(
            path,
            format!("unreadable {} content: {}", side, reason),
        )),
    }
}
