use clap::ArgMatches;

use entire_core::condense::metadata;
use entire_core::identity;
use entire_core::rewind;

use crate::commands::{open_repo, CommandResult};

/// Dump engine state as one JSON object for bug reports.
pub(crate) fn handle_debug_command(_matches: &ArgMatches) -> CommandResult {
    let (store, sessions) = open_repo()?;

    let head = store.head().ok();
    let worktree_id = identity::worktree_id(&store)?;
    let shadow = head.and_then(|h| {
        store
            .lookup_ref(&identity::shadow_ref_name(h, &worktree_id))
            .ok()
            .flatten()
    });
    let shadow_chain = match (shadow, head) {
        (Some(tip), Some(h)) => store
            .walk(tip, Some(h))?
            .iter()
            .map(|oid| oid.to_string())
            .collect(),
        _ => Vec::new(),
    };
    let points: Vec<_> = rewind::list_rewind_points(&store)
        .unwrap_or_default()
        .into_iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "timestamp": p.timestamp,
                "is_logs_only": p.is_logs_only,
            })
        })
        .collect();

    let state = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workdir": store.workdir()?.display().to_string(),
        "head": head.map(|h| h.to_string()),
        "worktree_id": worktree_id,
        "shadow_tip": shadow.map(|t| t.to_string()),
        "shadow_chain": shadow_chain,
        "metadata_tip": store
            .lookup_ref(identity::METADATA_REF)?
            .map(|t| t.to_string()),
        "checkpoints": metadata::list_checkpoints(&store)?.len(),
        "sessions": sessions.list()?,
        "rewind_points": points,
    });
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
