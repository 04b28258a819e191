// src/dedup.rs
//! Near-duplicate clustering.
//!
//! `similarity(a, b) = w_tok·jaccard(signature tokens) + w_topic·jaccard(tags)`.
//!
//! Clustering is a single greedy forward pass: each still-unclustered candidate seeds
//! a cluster, and every later unclustered candidate whose similarity **to the seed**
//! is strictly above the threshold joins it. Members are never compared with each
//! other, so clusters are not transitive: two members can both resemble the seed
//! while being unlike one another.
//! The survivor of a cluster is its highest-quality member (earliest on ties), which
//! may be a non-seed member. A final best-first pass over the survivors drops any
//! that exceed the threshold against a better one, so survivors are pairwise at or
//! below the threshold.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::candidate::Candidate;
use crate::config::CurationConfig;
use crate::fingerprint::split_signature;

/// |a ∩ b| / |a ∪ b|, or 0 when either set is empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub seed_link: String,
    pub survivor_link: String,
    pub discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One candidate per cluster, in seed order.
    pub survivors: Vec<Candidate>,
    /// Clusters with at least one discarded member.
    pub clusters: Vec<ClusterReport>,
}

impl DedupOutcome {
    pub fn discarded(&self) -> usize {
        self.clusters.iter().map(|c| c.discarded).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    token_weight: f64,
    topic_weight: f64,
    threshold: f64,
    delimiter: String,
}

impl Deduplicator {
    pub fn new(cfg: &CurationConfig) -> Self {
        Self {
            token_weight: cfg.dedup.token_weight,
            topic_weight: cfg.dedup.topic_weight,
            threshold: cfg.dedup.threshold,
            delimiter: cfg.fingerprint.delimiter.clone(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn similarity(&self, a: &Candidate, b: &Candidate) -> f64 {
        let ta = split_signature(&a.fingerprint, &self.delimiter);
        let tb = split_signature(&b.fingerprint, &self.delimiter);
        self.combine(jaccard(&ta, &tb), jaccard(&a.topic_tags, &b.topic_tags))
    }

    fn combine(&self, token_overlap: f64, topic_overlap: f64) -> f64 {
        self.token_weight * token_overlap + self.topic_weight * topic_overlap
    }

    pub fn dedupe(&self, candidates: Vec<Candidate>) -> DedupOutcome {
        let n = candidates.len();
        let token_sets: Vec<BTreeSet<&str>> = candidates
            .iter()
            .map(|c| split_signature(&c.fingerprint, &self.delimiter))
            .collect();

        // cluster membership as index lists, seed first
        let mut clustered = vec![false; n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for seed in 0..n {
            if clustered[seed] {
                continue;
            }
            clustered[seed] = true;
            let mut members = vec![seed];
            for other in (seed + 1)..n {
                if clustered[other] {
                    continue;
                }
                let sim = self.combine(
                    jaccard(&token_sets[seed], &token_sets[other]),
                    jaccard(&candidates[seed].topic_tags, &candidates[other].topic_tags),
                );
                if sim > self.threshold {
                    clustered[other] = true;
                    members.push(other);
                }
            }
            clusters.push(members);
        }

        let winners: Vec<usize> = clusters
            .iter()
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .fold(members[0], |best, i| {
                        if candidates[i].quality() > candidates[best].quality() {
                            i
                        } else {
                            best
                        }
                    })
            })
            .collect();

        // A winner that is not its seed can still resemble a later seed. Walk the
        // winners best-first and fold any that match an already kept one into it.
        let mut order: Vec<usize> = (0..clusters.len()).collect();
        order.sort_by(|&x, &y| {
            candidates[winners[y]]
                .quality()
                .total_cmp(&candidates[winners[x]].quality())
        });
        let mut discarded: Vec<usize> = clusters.iter().map(|m| m.len() - 1).collect();
        let mut kept: Vec<usize> = Vec::new();
        for k in order {
            let w = winners[k];
            let absorbed_by = kept.iter().copied().find(|&j| {
                let v = winners[j];
                self.combine(
                    jaccard(&token_sets[v], &token_sets[w]),
                    jaccard(&candidates[v].topic_tags, &candidates[w].topic_tags),
                ) > self.threshold
            });
            match absorbed_by {
                Some(j) => {
                    discarded[j] += discarded[k] + 1;
                    discarded[k] = 0;
                }
                None => kept.push(k),
            }
        }
        kept.sort_unstable();

        let mut reports = Vec::new();
        for &k in &kept {
            if discarded[k] > 0 {
                let winner = winners[k];
                let report = ClusterReport {
                    seed_link: candidates[clusters[k][0]].link.clone(),
                    survivor_link: candidates[winner].link.clone(),
                    discarded: discarded[k],
                };
                debug!(
                    target: "curator::dedup",
                    survivor = %candidates[winner].short_id(),
                    discarded = report.discarded,
                    "near-duplicate cluster collapsed"
                );
                reports.push(report);
            }
        }

        let mut slots: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
        let survivors = kept.iter().filter_map(|&k| slots[winners[k]].take()).collect();

        DedupOutcome {
            survivors,
            clusters: reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::candidate;

    fn dedup() -> Deduplicator {
        Deduplicator::new(&CurationConfig::default())
    }

    fn fp(link: &str, quality: f64, sig: &str, tags: &[&str]) -> Candidate {
        let mut c = candidate(link, quality);
        c.fingerprint = sig.to_string();
        c.topic_tags = tags.iter().map(|t| t.to_string()).collect();
        c
    }

    #[test]
    fn jaccard_edges() {
        let empty: BTreeSet<&str> = BTreeSet::new();
        let ab: BTreeSet<&str> = ["a", "b"].into_iter().collect();
        let bc: BTreeSet<&str> = ["b", "c"].into_iter().collect();
        assert_eq!(jaccard(&empty, &ab), 0.0);
        assert_eq!(jaccard(&empty, &empty), 0.0);
        assert_eq!(jaccard(&ab, &ab), 1.0);
        assert!((jaccard(&ab, &bc) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_blends_tokens_and_topics() {
        let d = dedup();
        let a = fp("a", 5.0, "canicule|paris", &["weather_heat"]);
        let b = fp("b", 5.0, "canicule|paris", &["weather_heat"]);
        let c = fp("c", 5.0, "election|vote", &["weather_heat"]);
        assert!((d.similarity(&a, &b) - 1.0).abs() < 1e-12);
        assert!((d.similarity(&a, &c) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn keeps_highest_quality_member() {
        let d = dedup();
        let out = d.dedupe(vec![
            fp("low", 6.0, "alerte|canicule|paris|rouge", &["weather_heat"]),
            fp("high", 8.0, "alerte|canicule|paris|rouge", &["weather_heat"]),
            fp("other", 7.0, "législative|élection", &["politics"]),
        ]);
        let links: Vec<&str> = out.survivors.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://news.example/high", "https://news.example/other"]
        );
        assert_eq!(out.discarded(), 1);
        assert_eq!(out.clusters[0].seed_link, "https://news.example/low");
    }

    #[test]
    fn threshold_is_strict() {
        let mut cfg = CurationConfig::default();
        cfg.dedup.token_weight = 0.5;
        cfg.dedup.topic_weight = 0.5;
        cfg.dedup.threshold = 0.5;
        let d = Deduplicator::new(&cfg);

        // disjoint tokens, same tag: exactly at the threshold, not a duplicate
        let a = fp("a", 5.0, "a|b", &["t"]);
        let b = fp("b", 5.0, "c|d", &["t"]);
        assert_eq!(d.similarity(&a, &b), 0.5);
        assert_eq!(d.dedupe(vec![a.clone(), b]).survivors.len(), 2);

        // one shared token tips it over
        let c = fp("c", 5.0, "a|d", &["t"]);
        assert!(d.similarity(&a, &c) > 0.5);
        assert_eq!(d.dedupe(vec![a, c]).survivors.len(), 1);
    }

    /// Regression: clustering is seed-only and non-transitive.
    /// `b` and `c` both resemble the seed `a` but not each other; all three collapse
    /// into a single cluster. Making clustering transitive would change this.
    #[test]
    fn clustering_is_non_transitive() {
        let d = dedup();
        let a = fp("a", 5.0, "t1|t2|t3|t4|t5|t6", &["x"]);
        let b = fp("b", 4.0, "t1|t2|t3|t4|t5|b1", &["x"]);
        let c = fp("c", 9.0, "t2|t3|t4|t5|t6|c1", &["x"]);
        assert!(d.similarity(&a, &b) > d.threshold());
        assert!(d.similarity(&a, &c) > d.threshold());
        assert!(d.similarity(&b, &c) <= d.threshold());

        let out = d.dedupe(vec![a, b, c]);
        assert_eq!(out.survivors.len(), 1);
        assert_eq!(out.survivors[0].link, "https://news.example/c");
        assert_eq!(out.clusters.len(), 1);
        assert_eq!(out.clusters[0].discarded, 2);
    }

    /// Regression: a later candidate similar only to a non-seed member is not pulled in.
    #[test]
    fn members_do_not_recruit() {
        let d = dedup();
        let a = fp("a", 5.0, "t1|t2|t3|t4|t5|t6", &["x"]);
        let b = fp("b", 4.0, "t1|t2|t3|t4|t5|b1", &["x"]);
        let c = fp("c", 3.0, "t2|t3|t4|t5|b1|c1", &["x"]);
        assert!(d.similarity(&b, &c) > d.threshold());
        assert!(d.similarity(&a, &c) <= d.threshold());

        let out = d.dedupe(vec![a, b, c]);
        let links: Vec<&str> = out.survivors.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://news.example/a", "https://news.example/c"]
        );
    }

    /// Regression: a non-seed winner that resembles a later seed absorbs it.
    #[test]
    fn promoted_winner_absorbs_later_lookalike() {
        let d = dedup();
        let a = fp("a", 5.0, "t1|t2|t3|t4|t5|t6", &["x"]);
        let b = fp("b", 9.0, "t1|t2|t3|t4|t5|b1", &["x"]);
        let c = fp("c", 3.0, "t2|t3|t4|t5|b1|c1", &["x"]);
        assert!(d.similarity(&a, &c) <= d.threshold());
        assert!(d.similarity(&b, &c) > d.threshold());

        let out = d.dedupe(vec![a, b, c]);
        let links: Vec<&str> = out.survivors.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(links, vec!["https://news.example/b"]);
        assert_eq!(out.discarded(), 2);
        assert_eq!(out.clusters.len(), 1);
        assert_eq!(out.clusters[0].seed_link, "https://news.example/a");
        assert_eq!(out.clusters[0].survivor_link, "https://news.example/b");
    }

    #[test]
    fn empty_fingerprints_never_merge_on_tokens_alone() {
        let d = dedup();
        let out = d.dedupe(vec![fp("a", 5.0, "", &[]), fp("b", 5.0, "", &[])]);
        assert_eq!(out.survivors.len(), 2);
        assert_eq!(out.discarded(), 0);
    }

    #[test]
    fn survivors_are_pairwise_below_threshold() {
        // deterministic pseudo-random batch over a small vocabulary
        let d = dedup();
        let vocab = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let topics = ["x", "y", "z"];
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = |n: usize| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % n as u64) as usize
        };
        for round in 0..10 {
            let mut batch = Vec::new();
            for i in 0..60 {
                let mut toks: BTreeSet<&str> = BTreeSet::new();
                for _ in 0..4 {
                    toks.insert(vocab[next(vocab.len())]);
                }
                let sig = toks.into_iter().collect::<Vec<_>>().join("|");
                let tag = topics[next(topics.len())];
                let quality = next(100) as f64 / 10.0;
                batch.push(fp(&format!("n{i}"), quality, &sig, &[tag]));
            }
            let n = batch.len();
            let out = d.dedupe(batch);
            assert_eq!(out.survivors.len() + out.discarded(), n, "round {round}");
            for (i, a) in out.survivors.iter().enumerate() {
                for b in out.survivors.iter().skip(i + 1) {
                    assert!(
                        d.similarity(a, b) <= d.threshold(),
                        "round {round}: {} ~ {}",
                        a.link,
                        b.link
                    );
                }
            }
        }
    }
}
