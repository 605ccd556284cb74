use std::collections::BTreeMap;

use iotlab_core::NodeId;
use iotlab_core::range::compact_range;

/// Node numbers grouped by site and architecture.
pub struct NodeGroup<'a> {
    pub site: &'a str,
    pub archi: &'a str,
    pub numbers: Vec<u32>,
}

impl NodeGroup<'_> {
    pub fn range(&self) -> String {
        compact_range(self.numbers.iter().copied())
    }
}

pub fn group_nodes<'a>(nodes: impl IntoIterator<Item = &'a NodeId>) -> Vec<NodeGroup<'a>> {
    let mut groups: BTreeMap<(&str, &str), Vec<u32>> = BTreeMap::new();
    for node in nodes {
        groups
            .entry((node.site(), node.archi()))
            .or_default()
            .push(node.number());
    }
    groups
        .into_iter()
        .map(|((site, archi), numbers)| NodeGroup {
            site,
            archi,
            numbers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotlab_core::DEFAULT_DOMAIN;
    use iotlab_core::node::build_node_ids;

    #[test]
    fn groups_are_sorted_and_compacted() {
        let mut nodes = build_node_ids("lille", "m3", &[7, 1, 2, 3], DEFAULT_DOMAIN);
        nodes.extend(build_node_ids("grenoble", "a8", &[4], DEFAULT_DOMAIN));

        let groups = group_nodes(&nodes);
        let summary: Vec<(&str, &str, String)> = groups
            .iter()
            .map(|group| (group.site, group.archi, group.range()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("grenoble", "a8", "4".to_string()),
                ("lille", "m3", "1-3+7".to_string()),
            ]
        );
    }
}
