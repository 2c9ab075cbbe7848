//! Attributed element graph produced by the diagram-processing step.
//!
//! Elements are kept in authoring order (findings follow that order) and
//! indexed by id so `attached` relations can be followed lazily.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementCategory};
use crate::error::{Result, ThreatlensError};

/// On-disk shape of a diagram: `{ "elements": [ ... ] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiagramFile {
    #[serde(default)]
    elements: Vec<Element>,
}

/// Read-only element graph. Shared freely between concurrent rule runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "DiagramFile", into = "DiagramFile")]
pub struct Diagram {
    elements: Vec<Element>,
    index: HashMap<String, usize>,
}

impl TryFrom<DiagramFile> for Diagram {
    type Error = ThreatlensError;

    fn try_from(file: DiagramFile) -> Result<Self> {
        Diagram::new(file.elements)
    }
}

impl From<Diagram> for DiagramFile {
    fn from(diagram: Diagram) -> Self {
        DiagramFile {
            elements: diagram.elements,
        }
    }
}

impl Diagram {
    /// Build a diagram, rejecting duplicate element ids.
    pub fn new(elements: Vec<Element>) -> Result<Self> {
        let mut index = HashMap::with_capacity(elements.len());
        for (pos, element) in elements.iter().enumerate() {
            if index.insert(element.id.clone(), pos).is_some() {
                return Err(ThreatlensError::DuplicateElement(element.id.clone()));
            }
        }
        Ok(Self { elements, index })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let diagram = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), elements = diagram.len(), "loaded diagram");
        Ok(diagram)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(id).map(|&pos| &self.elements[pos])
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn by_category(&self, category: ElementCategory) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(move |e| e.category() == category)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check every `attached` relation: the name must be legal for the
    /// element's category and each target must exist with an allowed category.
    ///
    /// Returns all problems found rather than stopping at the first.
    pub fn check_relations(&self) -> Vec<ThreatlensError> {
        let mut problems = Vec::new();

        for element in &self.elements {
            let category = element.category();
            for (name, relation) in &element.attached {
                let Some(spec) = category.relation(name) else {
                    problems.push(ThreatlensError::InvalidRelation {
                        element: element.id.clone(),
                        category: category.to_string(),
                        relation: name.clone(),
                    });
                    continue;
                };

                for target in relation.targets() {
                    match self.get(target) {
                        None => problems.push(ThreatlensError::UnknownTarget {
                            element: element.id.clone(),
                            relation: name.clone(),
                            target: target.to_string(),
                        }),
                        Some(found) if !spec.targets.contains(&found.category()) => {
                            let expected: Vec<&str> =
                                spec.targets.iter().map(|c| c.as_str()).collect();
                            problems.push(ThreatlensError::RelationCategory {
                                element: element.id.clone(),
                                relation: name.clone(),
                                target: target.to_string(),
                                found: found.category().to_string(),
                                expected: expected.join(" or "),
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        problems
    }
}
