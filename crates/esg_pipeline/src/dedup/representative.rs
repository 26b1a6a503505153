use std::collections::HashSet;

use chrono::Duration;
use esg_core::{Article, Cluster, EmbeddedArticle, RepresentativeArticle};
use tracing::debug;

/// Pick the canonical member of a cluster. When the cluster spans less than
/// a day the longest title wins; otherwise the most recent article wins.
/// Ties go to the earlier member.
pub fn pick_representative(cluster: &Cluster) -> Option<&EmbeddedArticle> {
    let range = cluster.date_range()?;
    let mut best = cluster.members.first()?;

    if range.span() < Duration::days(1) {
        for member in &cluster.members[1..] {
            if member.article.title.chars().count() > best.article.title.chars().count() {
                best = member;
            }
        }
    } else {
        for member in &cluster.members[1..] {
            if member.publish_date() > best.publish_date() {
                best = member;
            }
        }
    }

    Some(best)
}

/// One representative per cluster, in cluster order, followed by the articles
/// that never got an embedding as singletons. A singleton whose exact title
/// was already chosen as a cluster representative is dropped.
pub fn select_representatives(clusters: &[Cluster], unembedded: Vec<Article>) -> Vec<RepresentativeArticle> {
    let mut representatives = Vec::with_capacity(clusters.len() + unembedded.len());
    let mut chosen_titles: HashSet<String> = HashSet::new();

    for cluster in clusters {
        let Some(representative) = pick_representative(cluster) else {
            continue;
        };
        chosen_titles.insert(representative.article.title.clone());
        representatives.push(RepresentativeArticle {
            article: representative.article.clone(),
            duplicate_count: cluster.size(),
            cluster_id: Some(cluster.id),
            cluster_date_range: cluster.date_range(),
        });
    }

    for article in unembedded {
        if chosen_titles.contains(&article.title) {
            debug!("Skipping unembedded article already represented: {}", article.title);
            continue;
        }
        representatives.push(RepresentativeArticle::singleton(article));
    }

    representatives
}
