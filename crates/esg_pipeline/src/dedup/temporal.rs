use chrono::Duration;
use esg_core::{EmbeddedArticle, TimeGroup};

/// Partition embedded articles into date-bounded groups.
///
/// Articles are sorted newest first (stable, so equal dates keep input
/// order). Each group is anchored at its first, most recent member; an
/// article joins the current group when it is no more than `window` older
/// than the anchor, otherwise it anchors a new group. Distance to the last
/// member is irrelevant. Articles without an embedding are skipped.
pub fn group_by_time_window(articles: Vec<EmbeddedArticle>, window: Duration) -> Vec<TimeGroup> {
    let mut sorted: Vec<EmbeddedArticle> = articles.into_iter().filter(|a| a.embedding.is_some()).collect();
    sorted.sort_by(|a, b| b.publish_date().cmp(&a.publish_date()));

    let mut groups: Vec<TimeGroup> = Vec::new();
    let mut current: Option<TimeGroup> = None;

    for article in sorted {
        let joins = current
            .as_ref()
            .is_some_and(|group| group.anchor_date() - article.publish_date() <= window);

        if joins {
            if let Some(group) = current.as_mut() {
                group.push(article);
            }
        } else if let Some(done) = current.replace(TimeGroup::new(article)) {
            groups.push(done);
        }
    }
    groups.extend(current);

    groups
}
