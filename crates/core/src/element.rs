use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category tag of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementCategory {
    Zone,
    Entity,
    Datastore,
    Process,
    Dataflow,
}

impl ElementCategory {
    pub const ALL: [ElementCategory; 5] = [
        ElementCategory::Zone,
        ElementCategory::Entity,
        ElementCategory::Datastore,
        ElementCategory::Process,
        ElementCategory::Dataflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementCategory::Zone => "zone",
            ElementCategory::Entity => "entity",
            ElementCategory::Datastore => "datastore",
            ElementCategory::Process => "process",
            ElementCategory::Dataflow => "dataflow",
        }
    }

    /// Relation names an element of this category may carry in `attached`,
    /// with the categories each relation may point at.
    pub fn relations(&self) -> &'static [RelationSpec] {
        match self {
            ElementCategory::Zone => ZONE_RELATIONS,
            ElementCategory::Entity | ElementCategory::Datastore => NODE_RELATIONS,
            ElementCategory::Dataflow => DATAFLOW_RELATIONS,
            ElementCategory::Process => PROCESS_RELATIONS,
        }
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationSpec> {
        self.relations().iter().find(|r| r.name == name)
    }
}

impl std::fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ElementCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ElementCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown element category: '{}'", s))
    }
}

const ZONE_RELATIONS: &[RelationSpec] = &[
    RelationSpec::one("parent", &[ElementCategory::Zone]),
    RelationSpec::many("children", &[ElementCategory::Zone]),
    RelationSpec::many("entities", &[ElementCategory::Entity]),
    RelationSpec::many("datastores", &[ElementCategory::Datastore]),
];

const NODE_RELATIONS: &[RelationSpec] = &[
    RelationSpec::one("zone", &[ElementCategory::Zone]),
    RelationSpec::many("dataflows", &[ElementCategory::Dataflow]),
];

const DATAFLOW_RELATIONS: &[RelationSpec] = &[
    RelationSpec::one("process", &[ElementCategory::Process]),
    RelationSpec::one("source", &[ElementCategory::Entity, ElementCategory::Datastore]),
    RelationSpec::one("destination", &[ElementCategory::Entity, ElementCategory::Datastore]),
];

const PROCESS_RELATIONS: &[RelationSpec] =
    &[RelationSpec::one("dataflow", &[ElementCategory::Dataflow])];

/// Shape of one `attached` relation for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub name: &'static str,
    pub targets: &'static [ElementCategory],
    pub many: bool,
}

impl RelationSpec {
    const fn one(name: &'static str, targets: &'static [ElementCategory]) -> Self {
        Self {
            name,
            targets,
            many: false,
        }
    }

    const fn many(name: &'static str, targets: &'static [ElementCategory]) -> Self {
        Self {
            name,
            targets,
            many: true,
        }
    }
}

/// Diagram-level metadata carried by every element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementMetadata {
    pub element: ElementCategory,
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Anything else the diagram tool attached (colours, positions, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Target(s) of an `attached` relation, stored by element id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Relation {
    One(String),
    Many(Vec<String>),
}

impl Relation {
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Relation::One(id) => std::slice::from_ref(id),
            Relation::Many(ids) => ids,
        };
        slice.iter().map(String::as_str)
    }
}

/// A node of the attributed diagram graph.
///
/// Free-form attributes (`ssl`, `trust`, `authentication`, ...) are kept as raw
/// JSON so rule paths like `$.ssl.isSSL` can walk them without a fixed schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: String,
    pub metadata: ElementMetadata,
    #[serde(default)]
    pub attached: BTreeMap<String, Relation>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Element {
    pub fn category(&self) -> ElementCategory {
        self.metadata.element
    }

    pub fn shape(&self) -> &str {
        &self.metadata.shape
    }

    /// Human-readable label, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(&self.id)
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_deserializes_with_free_attributes() {
        let el: Element = serde_json::from_str(
            r#"{
                "id": "df1",
                "metadata": {"element": "dataflow", "shape": "s1", "color": "red"},
                "ssl": {"isSSL": false},
                "attached": {"process": "p1", "source": "e1", "destination": "d1"}
            }"#,
        )
        .unwrap();

        assert_eq!(el.category(), ElementCategory::Dataflow);
        assert_eq!(el.shape(), "s1");
        assert_eq!(el.display_name(), "df1");
        assert_eq!(el.metadata.extra["color"], "red");
        assert_eq!(el.attribute("ssl").unwrap()["isSSL"], false);
        assert_eq!(el.attached["process"], Relation::One("p1".to_string()));
        assert!(el.attribute("attached").is_none());
    }

    #[test]
    fn relation_many_lists_targets() {
        let rel: Relation = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(rel.targets().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn category_relations_table() {
        assert!(ElementCategory::Zone.relation("parent").is_some());
        assert!(ElementCategory::Zone.relation("children").unwrap().many);
        assert!(ElementCategory::Process.relation("zone").is_none());
        assert_eq!(
            ElementCategory::Dataflow.relation("source").unwrap().targets,
            &[ElementCategory::Entity, ElementCategory::Datastore]
        );
    }

    #[test]
    fn category_from_str() {
        assert_eq!("datastore".parse::<ElementCategory>(), Ok(ElementCategory::Datastore));
        assert!("database".parse::<ElementCategory>().is_err());
    }
}
