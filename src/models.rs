use serde::{Deserialize, Serialize};

/// A word of a topic and the number of tokens assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedWord {
    pub id: usize,
    pub word: String,
    pub count: usize,
}

impl std::fmt::Display for RankedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.word, self.count)
    }
}

/// One entry of a document's topic ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: usize,
    pub probability: f64,
}

/// Root of the topic -> word tree consumed by the bubble visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub name: String,
    pub children: Vec<TopicNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    pub name: String, // Highest-weight word of the topic
    pub children: Vec<WordLeaf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLeaf {
    pub name: String,
    pub size: u64,
}

impl Hierarchy {
    /// Builds the tree from ranked word lists, one per topic, in the given
    /// topic order. A topic without words gets an empty name.
    pub fn from_topics<'a, I>(topics: I) -> Self
    where
        I: IntoIterator<Item = &'a [RankedWord]>,
    {
        let children = topics
            .into_iter()
            .map(|words| TopicNode {
                name: words.first().map(|w| w.word.clone()).unwrap_or_default(),
                children: words
                    .iter()
                    .map(|w| WordLeaf {
                        name: w.word.clone(),
                        size: w.count as u64,
                    })
                    .collect(),
            })
            .collect();

        Hierarchy {
            name: String::new(),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: usize, word: &str, count: usize) -> RankedWord {
        RankedWord {
            id,
            word: word.to_string(),
            count,
        }
    }

    #[test]
    fn test_hierarchy_json_shape() {
        let topic = vec![word(0, "cat", 5), word(1, "dog", 3)];
        let hierarchy = Hierarchy::from_topics([topic.as_slice()]);
        let json = serde_json::to_value(&hierarchy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "",
                "children": [
                    {"name": "cat", "children": [
                        {"name": "cat", "size": 5},
                        {"name": "dog", "size": 3}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn test_empty_topic_node() {
        let empty: &[RankedWord] = &[];
        let hierarchy = Hierarchy::from_topics([empty]);
        assert_eq!(hierarchy.children.len(), 1);
        assert_eq!(hierarchy.children[0].name, "");
        assert!(hierarchy.children[0].children.is_empty());
    }

    #[test]
    fn test_ranked_word_display() {
        assert_eq!(word(4, "jobs", 12).to_string(), "jobs:12");
    }
}
