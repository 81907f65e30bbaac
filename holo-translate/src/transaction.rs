//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::StructuralPolicy;
use crate::context::WriteContext;
use crate::debug::Debug;
use crate::error::{Error, Result};
use crate::path::InstancePath;
use crate::registry::{Registry, WriteHandler, WriterEntry};
use crate::tree::{self, Change, ChangeOp, DataTree, Node};

// Result of a committed transaction.
#[derive(Clone, Debug, Serialize)]
pub struct CommitReport {
    pub date: DateTime<Utc>,
    pub changes: Vec<AppliedChange>,
}

// Outcome of one neutral change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AppliedChange {
    pub op: ChangeOp,
    pub path: InstancePath,
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

// Reason why a change had no backend effect of its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Noop,
    Structural,
    CheckRejected,
    FoldedIntoSubtree,
}

// Change routed to the writer registered for its schema path.
struct RoutedChange<'a> {
    op: ChangeOp,
    path: InstancePath,
    entry: &'a WriterEntry,
    rank: usize,
}

// ===== impl Registry =====

impl Registry {
    // Applies the differences between two neutral snapshots.
    pub async fn commit(
        &self,
        before: &DataTree,
        after: &DataTree,
    ) -> Result<CommitReport> {
        let changes = tree::changes(before, after);
        self.apply(&changes, before, after).await
    }

    // Applies a set of neutral changes in dependency order.
    //
    // All deletes run first, in reverse dependency order, followed by all
    // creates and updates in dependency order. The order in which changes
    // are given is irrelevant. Execution stops at the first error.
    pub async fn apply(
        &self,
        changes: &[Change],
        before: &DataTree,
        after: &DataTree,
    ) -> Result<CommitReport> {
        let ctx = WriteContext::new(before, after);
        let mut report = CommitReport {
            date: Utc::now(),
            changes: vec![],
        };

        let (mut deletes, mut others) = self
            .route(changes, &ctx, &mut report)?
            .into_iter()
            .partition::<Vec<_>, _>(|change| change.op == ChangeOp::Delete);
        deletes.sort_by(|a, b| {
            (Reverse(a.rank), Reverse(&a.path))
                .cmp(&(Reverse(b.rank), Reverse(&b.path)))
        });
        others.sort_by(|a, b| (a.rank, &a.path).cmp(&(b.rank, &b.path)));

        for change in deletes.iter().chain(others.iter()) {
            let outcome = self
                .apply_change(change, &ctx)
                .await
                .map_err(|error| error.with_change(change.op, &change.path))?;
            report.changes.push(AppliedChange {
                op: change.op,
                path: change.path.clone(),
                outcome,
            });
        }

        Ok(report)
    }

    // Resolves the writer of every change. Changes to subtree members are
    // folded into a single change of their owner.
    fn route<'a>(
        &'a self,
        changes: &[Change],
        ctx: &WriteContext<'_>,
        report: &mut CommitReport,
    ) -> Result<Vec<RoutedChange<'a>>> {
        let direct = changes
            .iter()
            .map(|change| &change.path)
            .collect::<HashSet<_>>();
        let mut owners = HashSet::new();
        let mut routed = vec![];

        for change in changes {
            let schema = change.path.wildcard();
            let (op, path, schema) = match self.subtree_writers.get(&schema) {
                Some(owner) => {
                    let owner_path = change.path.truncate(owner.len());
                    report.changes.push(AppliedChange {
                        op: change.op,
                        path: change.path.clone(),
                        outcome: Outcome::Skipped(SkipReason::FoldedIntoSubtree),
                    });
                    Debug::ChangeSkipped(
                        change.op,
                        &change.path,
                        SkipReason::FoldedIntoSubtree,
                    )
                    .log();
                    if direct.contains(&owner_path)
                        || !owners.insert(owner_path.clone())
                    {
                        continue;
                    }
                    let exists_before = ctx.subtree_before(&owner_path).is_some();
                    let exists_after = ctx.subtree_after(&owner_path).is_some();
                    let op = match (exists_before, exists_after) {
                        (true, true) => ChangeOp::Update,
                        (false, _) => ChangeOp::Create,
                        (true, false) => ChangeOp::Delete,
                    };
                    (op, owner_path, owner.clone())
                }
                None => (change.op, change.path.clone(), schema),
            };

            let Some(entry) = self.writers.get(&schema) else {
                return Err(Error::NoHandler(path.clone()).with_change(op, &path));
            };
            let rank = self.rank.get(&schema).copied().unwrap_or_default();
            routed.push(RoutedChange {
                op,
                path,
                entry,
                rank,
            });
        }

        Ok(routed)
    }

    async fn apply_change(
        &self,
        change: &RoutedChange<'_>,
        ctx: &WriteContext<'_>,
    ) -> Result<Outcome> {
        let (op, path) = (change.op, &change.path);
        let writer = match &change.entry.handler {
            WriteHandler::Writer(writer) => writer,
            WriteHandler::Noop => return Ok(skipped(op, path, SkipReason::Noop)),
            WriteHandler::Structural => {
                return match self.config.structural_writes {
                    StructuralPolicy::Ignore => {
                        Ok(skipped(op, path, SkipReason::Structural))
                    }
                    StructuralPolicy::Reject => {
                        Err(Error::StructuralWrite(path.clone()))
                    }
                };
            }
        };
        if !change.entry.check.applicable(path, ctx) {
            return Ok(skipped(op, path, SkipReason::CheckRejected));
        }

        // Subtree owners see their members too.
        let (before, after) = if change.entry.subtree {
            (ctx.subtree_before(path), ctx.subtree_after(path))
        } else {
            (ctx.read_before(path).cloned(), ctx.read_after(path).cloned())
        };
        let before = before.unwrap_or_else(empty);
        let after = after.unwrap_or_else(empty);

        Debug::ChangeApply(op, path).log();
        match op {
            ChangeOp::Create => writer.write(path, &after, ctx).await?,
            ChangeOp::Update => writer.update(path, &before, &after, ctx).await?,
            ChangeOp::Delete => writer.delete(path, &before, ctx).await?,
        }
        Ok(Outcome::Applied)
    }
}

// ===== impl CommitReport =====

impl CommitReport {
    pub fn applied(&self) -> impl Iterator<Item = &AppliedChange> {
        self.changes
            .iter()
            .filter(|change| change.outcome == Outcome::Applied)
    }
}

// ===== impl SkipReason =====

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Noop => write!(f, "no-op registration"),
            SkipReason::Structural => write!(f, "structural node"),
            SkipReason::CheckRejected => write!(f, "check not applicable"),
            SkipReason::FoldedIntoSubtree => {
                write!(f, "handled by subtree owner")
            }
        }
    }
}

// ===== helper functions =====

fn skipped(op: ChangeOp, path: &InstancePath, reason: SkipReason) -> Outcome {
    Debug::ChangeSkipped(op, path, reason).log();
    Outcome::Skipped(reason)
}

fn empty() -> Node {
    Value::Object(Map::new())
}
