use std::str::FromStr;

use esg_core::{cosine_similarity, Cluster, EmbeddedArticle, Error, TimeGroup};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterStrategy {
    /// Members are compared against the cluster's seed only. Two members can
    /// share a cluster without being similar to each other.
    #[default]
    SingleSeed,
    /// Connected components of the "similar enough" graph (union-find).
    Transitive,
}

impl FromStr for ClusterStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single-seed" | "seed" => Ok(Self::SingleSeed),
            "transitive" | "union-find" => Ok(Self::Transitive),
            other => Err(Error::Config(format!("Unknown clustering strategy '{}'", other))),
        }
    }
}

/// Cluster every group independently. Cluster ids are a running counter over
/// all groups, in group order.
pub fn cluster_time_groups(groups: Vec<TimeGroup>, threshold: f64, strategy: ClusterStrategy) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut next_id = 0;

    for group in groups {
        let members = group.into_members();
        let partitions = match strategy {
            ClusterStrategy::SingleSeed => single_seed_partition(&members, threshold),
            ClusterStrategy::Transitive => transitive_partition(&members, threshold),
        };

        let mut slots: Vec<Option<EmbeddedArticle>> = members.into_iter().map(Some).collect();
        for indices in partitions {
            let members = indices.into_iter().filter_map(|i| slots[i].take()).collect();
            clusters.push(Cluster { id: next_id, members });
            next_id += 1;
        }
    }

    clusters
}

fn similar(a: &EmbeddedArticle, b: &EmbeddedArticle, threshold: f64) -> bool {
    cosine_similarity(a.embedding(), b.embedding()) >= threshold
}

/// Index partitions in group order: each unprocessed article seeds a cluster
/// and claims every later unprocessed article similar to the seed.
fn single_seed_partition(members: &[EmbeddedArticle], threshold: f64) -> Vec<Vec<usize>> {
    let mut processed = vec![false; members.len()];
    let mut partitions = Vec::new();

    for i in 0..members.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let mut cluster = vec![i];

        for j in (i + 1)..members.len() {
            if !processed[j] && similar(&members[i], &members[j], threshold) {
                processed[j] = true;
                cluster.push(j);
            }
        }
        partitions.push(cluster);
    }

    partitions
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Connected components, ordered by their lowest index, members ascending.
fn transitive_partition(members: &[EmbeddedArticle], threshold: f64) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..members.len()).collect();

    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            if similar(&members[i], &members[j], threshold) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut partitions: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; members.len()];
    for i in 0..members.len() {
        let root = find(&mut parent, i);
        match slot_of_root[root] {
            Some(slot) => partitions[slot].push(i),
            None => {
                slot_of_root[root] = Some(partitions.len());
                partitions.push(vec![i]);
            }
        }
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use esg_core::Article;

    fn embedded(title: &str, embedding: Vec<f32>) -> EmbeddedArticle {
        EmbeddedArticle::new(
            Article {
                title: title.to_string(),
                snippet: String::new(),
                link: format!("https://news.example.com/{}", title),
                original_link: None,
                publish_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            },
            Some(embedding),
        )
    }

    fn group(members: Vec<EmbeddedArticle>) -> TimeGroup {
        let mut iter = members.into_iter();
        let mut group = TimeGroup::new(iter.next().unwrap());
        iter.for_each(|m| group.push(m));
        group
    }

    fn titles(cluster: &Cluster) -> Vec<&str> {
        cluster.members.iter().map(|m| m.article.title.as_str()).collect()
    }

    /// b and c are each ~0.92 similar to a but only ~0.70 to each other.
    fn chain() -> Vec<EmbeddedArticle> {
        vec![
            embedded("a", vec![1.0, 0.0, 0.0]),
            embedded("b", vec![0.92, 0.392, 0.0]),
            embedded("c", vec![0.92, -0.392, 0.0]),
        ]
    }

    #[test]
    fn test_single_seed_joins_members_only_similar_to_seed() {
        let clusters = cluster_time_groups(vec![group(chain())], 0.85, ClusterStrategy::SingleSeed);
        assert_eq!(clusters.len(), 1);
        assert_eq!(titles(&clusters[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_single_seed_is_not_transitive() {
        // c is similar to b (not the seed a), so it seeds its own cluster.
        let members = vec![
            embedded("a", vec![1.0, 0.0]),
            embedded("b", vec![0.9, 0.436]),
            embedded("c", vec![0.6, 0.8]),
        ];
        let single = cluster_time_groups(vec![group(members.clone())], 0.85, ClusterStrategy::SingleSeed);
        assert_eq!(single.iter().map(titles).collect::<Vec<_>>(), vec![vec!["a", "b"], vec!["c"]]);

        let transitive = cluster_time_groups(vec![group(members)], 0.85, ClusterStrategy::Transitive);
        assert_eq!(transitive.iter().map(titles).collect::<Vec<_>>(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_ids_run_across_groups_and_sizes_add_up() {
        let first = group(vec![
            embedded("a", vec![1.0, 0.0]),
            embedded("b", vec![0.0, 1.0]),
        ]);
        let second = group(vec![
            embedded("c", vec![1.0, 1.0]),
            embedded("d", vec![1.0, 0.99]),
            embedded("e", vec![-1.0, 0.0]),
        ]);
        let sizes = [first.len(), second.len()];
        let clusters = cluster_time_groups(vec![first, second], 0.85, ClusterStrategy::SingleSeed);

        assert_eq!(clusters.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(clusters[0].size() + clusters[1].size(), sizes[0]);
        assert_eq!(clusters[2].size() + clusters[3].size(), sizes[1]);
        assert_eq!(titles(&clusters[2]), vec!["c", "d"]);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("transitive".parse::<ClusterStrategy>().unwrap(), ClusterStrategy::Transitive);
        assert_eq!("single-seed".parse::<ClusterStrategy>().unwrap(), ClusterStrategy::SingleSeed);
        assert!("kmeans".parse::<ClusterStrategy>().is_err());
    }
}
