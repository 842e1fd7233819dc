//! Reconciliation between the comment store and post summaries.
//!
//! Comment writes are never compensated inline, so the two stores can
//! drift apart after a partial failure or a deleted post. A pass repairs:
//!
//! - a comment whose post exists but lacks its summary: the summary is re-appended
//! - a comment whose post no longer exists: the comment is deleted
//! - a summary with no backing comment: the summary is removed
//! - a comment summarised more than once: collapsed to one summary
//! - a comment marked for deletion: its summary is removed and the delete finished
//!
//! A marked comment is never re-summarised. Every repair re-reads the
//! authoritative record right before writing, and an append is withdrawn if
//! a delete marked the comment meanwhile. Comments younger than `min_age`
//! (and marks younger than `min_age`) are left alone so in-flight creates
//! and deletes are not mistaken for divergence.

use crate::db::{CommentStore, PostStore, StoreError, StoreResult};
use crate::models::{Clock, Comment, CommentSummary, Post};
use chrono::Duration;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Counts of repairs applied in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub comments_checked: usize,
    pub reappended: usize,
    pub collected: usize,
    pub pruned: usize,
    pub duplicates: usize,
    pub deletes_finished: usize,
    pub failures: usize,
}

impl ReconcileReport {
    pub fn repairs(&self) -> usize {
        self.reappended + self.collected + self.pruned + self.duplicates + self.deletes_finished
    }
}

pub struct Reconciler {
    comments: Arc<dyn CommentStore>,
    posts: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
    min_age: Duration,
}

impl Reconciler {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        posts: Arc<dyn PostStore>,
        clock: Arc<dyn Clock>,
        min_age: Duration,
    ) -> Self {
        Self {
            comments,
            posts,
            clock,
            min_age,
        }
    }

    /// Scan both stores once and repair every divergence found.
    ///
    /// Fails only if the initial listing fails; individual repair failures
    /// are logged, counted and skipped.
    pub async fn run_once(&self) -> StoreResult<ReconcileReport> {
        let comments = self.comments.list_all().await?;
        let posts = self.posts.list().await?;

        let mut report = ReconcileReport {
            comments_checked: comments.len(),
            ..Default::default()
        };

        let posts_by_id: HashMap<Uuid, &Post> = posts.iter().map(|p| (p.id, p)).collect();
        let known_comments: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
        let cutoff = self.clock.now() - self.min_age;

        for comment in &comments {
            let outcome = match comment.deleting_at {
                Some(marked_at) if marked_at <= cutoff => self.finish_delete(comment, &mut report).await,
                Some(_) => continue,
                None if comment.created_at > cutoff => continue,
                None => {
                    let occurrences = posts_by_id.get(&comment.post_id).map(|post| {
                        post.comments
                            .iter()
                            .filter(|s| s.comment_id == comment.id)
                            .count()
                    });

                    match occurrences {
                        None => self.collect_orphan(comment, &mut report).await,
                        Some(0) => self.reappend(comment, &mut report).await,
                        Some(1) => Ok(()),
                        Some(_) => self.collapse_duplicates(comment, &mut report).await,
                    }
                }
            };

            if let Err(e) = outcome {
                report.failures += 1;
                tracing::warn!(comment_id = %comment.id, post_id = %comment.post_id, error = %e, "reconcile repair failed");
            }
        }

        for post in &posts {
            let mut seen = HashSet::new();
            for summary in &post.comments {
                if known_comments.contains(&summary.comment_id) || !seen.insert(summary.comment_id) {
                    continue;
                }
                if let Err(e) = self.prune_dangling(post.id, summary.comment_id, &mut report).await {
                    report.failures += 1;
                    tracing::warn!(post_id = %post.id, comment_id = %summary.comment_id, error = %e, "reconcile prune failed");
                }
            }
        }

        Ok(report)
    }

    async fn collect_orphan(&self, comment: &Comment, report: &mut ReconcileReport) -> StoreResult<()> {
        match self.posts.find_by_id(comment.post_id).await {
            Ok(post) => {
                // Post appeared after the listing; treat as a missing summary
                if !post.has_summary(comment.id) {
                    self.reappend(comment, report).await?;
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                match self.comments.delete_by_id(comment.id).await {
                    Ok(()) => {
                        report.collected += 1;
                        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "collected comment of deleted post");
                        Ok(())
                    }
                    Err(e) if e.is_not_found() => Ok(()),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn reappend(&self, comment: &Comment, report: &mut ReconcileReport) -> StoreResult<()> {
        if !self.is_live(comment.id).await? {
            return Ok(());
        }

        let post = self.posts.find_by_id(comment.post_id).await?;
        if post.has_summary(comment.id) {
            return Ok(());
        }

        if self.append_while_live(comment).await? {
            report.reappended += 1;
            tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "re-appended missing summary");
        }
        Ok(())
    }

    async fn collapse_duplicates(&self, comment: &Comment, report: &mut ReconcileReport) -> StoreResult<()> {
        self.posts
            .remove_comment_summary(comment.post_id, comment.id)
            .await?;
        if !self.is_live(comment.id).await? {
            return Ok(());
        }

        if self.append_while_live(comment).await? {
            report.duplicates += 1;
            tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "collapsed duplicate summaries");
        }
        Ok(())
    }

    /// Append the summary, then withdraw it if a delete marked the comment
    /// in the meantime. Returns whether the summary was kept.
    async fn append_while_live(&self, comment: &Comment) -> StoreResult<bool> {
        self.posts
            .append_comment_summary(comment.post_id, &CommentSummary::from(comment))
            .await?;

        if self.is_live(comment.id).await? {
            return Ok(true);
        }

        match self.posts.remove_comment_summary(comment.post_id, comment.id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "delete started during repair; summary withdrawn");
        Ok(false)
    }

    /// The comment exists and no delete has started on it
    async fn is_live(&self, comment_id: Uuid) -> StoreResult<bool> {
        match self.comments.find_by_id(comment_id).await {
            Ok(c) => Ok(!c.is_deleting()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Complete a delete that stopped after marking the comment
    async fn finish_delete(&self, comment: &Comment, report: &mut ReconcileReport) -> StoreResult<()> {
        match self.posts.remove_comment_summary(comment.post_id, comment.id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.comments.delete_by_id(comment.id).await {
            Ok(()) => {
                report.deletes_finished += 1;
                tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "finished interrupted comment delete");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn prune_dangling(&self, post_id: Uuid, comment_id: Uuid, report: &mut ReconcileReport) -> StoreResult<()> {
        match self.comments.find_by_id(comment_id).await {
            // Created after the listing
            Ok(_) => return Ok(()),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.posts.remove_comment_summary(post_id, comment_id).await {
            Ok(true) => {
                report.pruned += 1;
                tracing::info!(%post_id, %comment_id, "pruned dangling summary");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
