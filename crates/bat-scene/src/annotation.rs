use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionTree;
use crate::error::SceneError;
use crate::object::{SceneObject, UNLABELED_COLOR};
use crate::palette::{InstancePalette, NUM_INSTANCE_COLORS};

/// The name of the class every unlabeled pixel belongs to.
pub const DEFAULT_CLASS_NAME: &str = "Background";

/// A semantic class of the annotation masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationClass {
    /// The unique name of the class.
    pub name: String,
    /// The mask color of the class (RGBA in `[0, 1]`).
    #[serde(default = "black")]
    pub mask_color: [f32; 4],
    /// The collection holding the objects of the class.
    #[serde(default)]
    pub collection: String,
    /// Give every object of the class its own instance color.
    #[serde(default)]
    pub is_instances: bool,
}

fn black() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl AnnotationClass {
    /// Create a class for the objects of `collection`.
    pub fn new(name: impl Into<String>, collection: impl Into<String>, mask_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            mask_color,
            collection: collection.into(),
            is_instances: false,
        }
    }

    /// Mark the class as an instance class.
    pub fn instances(mut self) -> Self {
        self.is_instances = true;
        self
    }

    fn background() -> Self {
        Self::new(DEFAULT_CLASS_NAME, "", black())
    }
}

/// The ordered list of annotation classes.
///
/// The first class is always [`DEFAULT_CLASS_NAME`]; the others get pass index
/// `1, 2, ...` in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRegistry {
    classes: Vec<AnnotationClass>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self {
            classes: vec![AnnotationClass::background()],
        }
    }
}

impl ClassRegistry {
    /// Create a registry holding only the background class.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class at the end of the list.
    ///
    /// # Errors
    ///
    /// If the name is empty or already taken.
    pub fn add_class(&mut self, class: AnnotationClass) -> Result<(), SceneError> {
        if class.name.trim().is_empty() {
            return Err(SceneError::EmptyClassName);
        }
        if self.get(&class.name).is_some() {
            return Err(SceneError::DuplicateClass(class.name));
        }
        self.classes.push(class);
        Ok(())
    }

    /// Remove a class by name.
    ///
    /// # Errors
    ///
    /// If the class does not exist or is the background class.
    pub fn remove_class(&mut self, name: &str) -> Result<AnnotationClass, SceneError> {
        if name == DEFAULT_CLASS_NAME {
            return Err(SceneError::CannotRemoveBackground);
        }
        let idx = self
            .classes
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SceneError::ClassNotFound(name.to_string()))?;
        Ok(self.classes.remove(idx))
    }

    /// Get a class by name.
    pub fn get(&self, name: &str) -> Option<&AnnotationClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// All classes, background first.
    pub fn classes(&self) -> &[AnnotationClass] {
        &self.classes
    }

    /// The classes other than the background with their pass index.
    pub fn labeled_classes(&self) -> impl Iterator<Item = (u32, &AnnotationClass)> {
        self.classes
            .iter()
            .filter(|c| c.name != DEFAULT_CLASS_NAME)
            .enumerate()
            .map(|(i, c)| (i as u32 + 1, c))
    }

    /// The mapping from pass index to class name stored next to annotation renders.
    ///
    /// # Example
    ///
    /// ```
    /// use bat_scene::annotation::{AnnotationClass, ClassRegistry};
    ///
    /// let mut registry = ClassRegistry::new();
    /// registry.add_class(AnnotationClass::new("Car", "Cars", [1.0, 0.0, 0.0, 1.0])).unwrap();
    /// assert_eq!(registry.class_info().to_string(), r#"{"0":"Background","1":"Car"}"#);
    /// ```
    pub fn class_info(&self) -> serde_json::Value {
        let mut info = serde_json::Map::new();
        info.insert("0".to_string(), DEFAULT_CLASS_NAME.into());
        for (pass_index, class) in self.labeled_classes() {
            info.insert(pass_index.to_string(), class.name.clone().into());
        }
        serde_json::Value::Object(info)
    }
}

/// Outcome of assigning mask colors to the objects of a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationReport {
    /// Number of objects that received a class or instance color.
    pub assigned: usize,
    /// Collections referenced by a class that do not exist.
    pub missing_collections: Vec<String>,
    /// Whether the instance palette ran out of colors.
    pub palette_exhausted: bool,
}

impl AnnotationReport {
    /// Whether every object got its color.
    pub fn is_complete(&self) -> bool {
        self.missing_collections.is_empty() && !self.palette_exhausted
    }
}

/// Assign the mask color and pass index of every object from the annotation classes.
///
/// All objects are reset to [`UNLABELED_COLOR`] and pass index 0 first. Each
/// class then colors the objects of its collection and all child collections,
/// either with the class color or, for instance classes, with the next color
/// of the [`InstancePalette`]. Later classes override earlier ones.
///
/// # Arguments
///
/// * `objects` - The objects of the scene, by name.
/// * `collections` - The collection hierarchy of the scene.
/// * `registry` - The annotation classes.
///
/// # Returns
///
/// What could and could not be assigned. Missing collections are skipped and
/// objects left over once the palette runs out stay unlabeled.
pub fn assign_mask_colors(
    objects: &mut BTreeMap<String, SceneObject>,
    collections: &CollectionTree,
    registry: &ClassRegistry,
) -> AnnotationReport {
    for obj in objects.values_mut() {
        obj.color = UNLABELED_COLOR;
        obj.pass_index = 0;
    }

    let mut report = AnnotationReport::default();
    let mut palette = InstancePalette::new();

    for (pass_index, class) in registry.labeled_classes() {
        let members = match collections.all_objects(&class.collection) {
            Ok(members) => members,
            Err(e) => {
                log::warn!("{e} Skipping class '{}'.", class.name);
                report.missing_collections.push(class.collection.clone());
                continue;
            }
        };

        for name in members {
            let Some(obj) = objects.get_mut(name) else {
                log::warn!("Collection {} links unknown object '{name}'.", class.collection);
                continue;
            };

            let color = if class.is_instances {
                match palette.next() {
                    Some(color) => color,
                    None => {
                        if !report.palette_exhausted {
                            log::warn!(
                                "Ran out of instance colors after {NUM_INSTANCE_COLORS} instances, \
                                 remaining instances stay unlabeled."
                            );
                        }
                        report.palette_exhausted = true;
                        continue;
                    }
                }
            } else {
                class.mask_color
            };

            obj.color = color;
            obj.pass_index = pass_index;
            report.assigned += 1;
        }
    }

    report
}
