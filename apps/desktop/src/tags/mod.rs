//! Tag usage cache.
//!
//! Tracks per-tag use counts and recency under a hard entry cap and
//! serves ranked autocomplete suggestions. Eviction removes the least
//! frequently used entry, breaking ties by least recently used, so a
//! tag used many times long ago outlives a tag used once just now.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use recall_core::types::TagUsage;

use crate::db::{StoreError, TagStore};

type Result<T> = std::result::Result<T, StoreError>;

/// Bounded tag usage cache over a [`TagStore`] persistence port.
#[derive(Debug, Clone)]
pub struct TagUsageCache {
    max_size: usize,
}

impl Default for TagUsageCache {
    fn default() -> Self {
        Self::new(50)
    }
}

impl TagUsageCache {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Record one use of `tag` at `now`. Empty tags are ignored. When a
    /// brand-new tag arrives at capacity, exactly one existing entry is
    /// evicted first.
    pub fn use_tag(&self, store: &impl TagStore, tag: &str, now: DateTime<Utc>) -> Result<()> {
        let Some(tag) = normalize(tag) else {
            return Ok(());
        };

        if let Some(existing) = store.get_tag_usage(&tag)? {
            store.put_tag_usage(&TagUsage {
                tag,
                count: existing.count + 1,
                last_used: now,
            })?;
            return Ok(());
        }

        if store.tag_count()? >= self.max_size {
            self.evict_one(store)?;
        }
        store.put_tag_usage(&TagUsage {
            tag,
            count: 1,
            last_used: now,
        })?;
        Ok(())
    }

    /// Record one use of each tag, sequentially: each new tag gets its
    /// own eviction check.
    pub fn use_tags<I, S>(&self, store: &impl TagStore, tags: I, now: DateTime<Utc>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.use_tag(store, tag.as_ref(), now)?;
        }
        Ok(())
    }

    /// All entries, most used first, ties broken by most recent use.
    pub fn ranked(&self, store: &impl TagStore) -> Result<Vec<TagUsage>> {
        let mut usages = store.all_tag_usages()?;
        usages.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_used.cmp(&a.last_used))
        });
        Ok(usages)
    }

    /// Case-insensitive substring suggestions for `query`, at most
    /// `limit` entries. Exact matches sort ahead of partial matches;
    /// both groups keep the [`ranked`](Self::ranked) order. An empty
    /// query matches everything.
    pub fn filter(&self, store: &impl TagStore, query: &str, limit: usize) -> Result<Vec<TagUsage>> {
        let query = query.trim().to_lowercase();
        let mut matches = self.ranked(store)?;
        if !query.is_empty() {
            matches.retain(|usage| usage.tag.contains(&query));
            // Stable sort keeps the ranked order within each group.
            matches.sort_by_key(|usage| usage.tag != query);
        }
        matches.truncate(limit);
        Ok(matches)
    }

    /// Seed or merge the cache from existing cards' tag sets.
    ///
    /// Counts and latest `updated_at` are aggregated per normalized
    /// tag, then merged entry by entry: the count becomes the max of
    /// stored and computed, the last-used the later of the two.
    /// Re-running with the same input changes nothing. Seeds are
    /// applied in descending computed-usage order so capacity eviction
    /// drops the least used historical tags.
    pub fn initialize_from_cards<'a, I>(&self, store: &impl TagStore, cards: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a [String], DateTime<Utc>)>,
    {
        let mut computed: HashMap<String, (u32, DateTime<Utc>)> = HashMap::new();
        for (tags, updated_at) in cards {
            for tag in tags {
                let Some(tag) = normalize(tag) else {
                    continue;
                };
                let entry = computed.entry(tag).or_insert((0, updated_at));
                entry.0 += 1;
                entry.1 = entry.1.max(updated_at);
            }
        }

        let mut seeds: Vec<(String, (u32, DateTime<Utc>))> = computed.into_iter().collect();
        seeds.sort_by(|a, b| b.1.cmp(&a.1));

        for (tag, (count, last_used)) in seeds {
            let merged = match store.get_tag_usage(&tag)? {
                Some(existing) => TagUsage {
                    tag,
                    count: existing.count.max(count),
                    last_used: existing.last_used.max(last_used),
                },
                None => {
                    if store.tag_count()? >= self.max_size {
                        self.evict_one(store)?;
                    }
                    TagUsage {
                        tag,
                        count,
                        last_used,
                    }
                }
            };
            store.put_tag_usage(&merged)?;
        }
        Ok(())
    }

    fn evict_one(&self, store: &impl TagStore) -> Result<()> {
        let victim = store
            .all_tag_usages()?
            .into_iter()
            .min_by(|a, b| {
                a.count
                    .cmp(&b.count)
                    .then_with(|| a.last_used.cmp(&b.last_used))
            });
        if let Some(victim) = victim {
            tracing::debug!(tag = %victim.tag, count = victim.count, "evicting tag usage entry");
            store.delete_tag_usage(&victim.tag)?;
        }
        Ok(())
    }
}

fn normalize(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}
