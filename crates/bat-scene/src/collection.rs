use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// The name of the collection every scene starts with.
pub const ROOT_COLLECTION_NAME: &str = "Scene Collection";

/// A named group of objects and child collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// The unique name of the collection.
    pub name: String,
    /// Names of the objects linked directly to this collection.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Names of the child collections.
    #[serde(default)]
    pub children: Vec<String>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The collections of a scene, rooted at [`ROOT_COLLECTION_NAME`].
///
/// Children are referenced by name. The tree is expected to be acyclic, but
/// every walk keeps a visited set so that a malformed hierarchy terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionTree {
    collections: BTreeMap<String, Collection>,
}

impl Default for CollectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionTree {
    /// Create a tree holding only the empty root collection.
    pub fn new() -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(
            ROOT_COLLECTION_NAME.to_string(),
            Collection::new(ROOT_COLLECTION_NAME),
        );
        Self { collections }
    }

    /// The root collection.
    pub fn root(&self) -> Option<&Collection> {
        self.collections.get(ROOT_COLLECTION_NAME)
    }

    /// Get a collection by name.
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Insert a collection and link it below `parent`.
    ///
    /// A collection with the same name is replaced.
    ///
    /// # Errors
    ///
    /// If `parent` does not exist.
    pub fn insert(&mut self, parent: &str, collection: Collection) -> Result<(), SceneError> {
        let name = collection.name.clone();
        let parent = self
            .collections
            .get_mut(parent)
            .ok_or_else(|| SceneError::CollectionNotFound(parent.to_string()))?;
        if !parent.children.contains(&name) {
            parent.children.push(name.clone());
        }
        self.collections.insert(name, collection);
        Ok(())
    }

    /// Insert a collection without linking it anywhere.
    pub(crate) fn insert_unlinked(&mut self, collection: Collection) {
        self.collections.insert(collection.name.clone(), collection);
    }

    /// Link an object to a collection.
    pub fn link_object(&mut self, collection: &str, object: &str) -> Result<(), SceneError> {
        let collection = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| SceneError::CollectionNotFound(collection.to_string()))?;
        if !collection.objects.iter().any(|o| o == object) {
            collection.objects.push(object.to_string());
        }
        Ok(())
    }

    /// Find the collection that has `target` as a direct child.
    ///
    /// The search starts at the root collection and walks the tree depth first.
    ///
    /// # Returns
    ///
    /// The parent collection, or `None` if `target` is not in the tree.
    pub fn find_parent_collection(&self, target: &str) -> Option<&Collection> {
        let mut stack = vec![ROOT_COLLECTION_NAME];
        let mut visited = HashSet::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            let Some(collection) = self.collections.get(name) else {
                continue;
            };
            if collection.children.iter().any(|c| c == target) {
                return Some(collection);
            }
            // reversed so the first child is searched first
            stack.extend(collection.children.iter().rev().map(String::as_str));
        }

        None
    }

    /// Names of the objects of a collection and all of its descendants.
    ///
    /// Each object appears once, in depth first order.
    ///
    /// # Errors
    ///
    /// If the collection does not exist.
    pub fn all_objects(&self, name: &str) -> Result<Vec<&str>, SceneError> {
        if !self.collections.contains_key(name) {
            return Err(SceneError::CollectionNotFound(name.to_string()));
        }

        let mut objects = Vec::new();
        let mut seen_objects = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![name];

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            let Some(collection) = self.collections.get(name) else {
                continue;
            };
            for obj in collection.objects.iter() {
                if seen_objects.insert(obj.as_str()) {
                    objects.push(obj.as_str());
                }
            }
            stack.extend(collection.children.iter().rev().map(String::as_str));
        }

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Result<CollectionTree, SceneError> {
        let mut tree = CollectionTree::new();
        tree.insert(ROOT_COLLECTION_NAME, Collection::new("Vehicles"))?;
        tree.insert("Vehicles", Collection::new("Cars"))?;
        tree.insert("Vehicles", Collection::new("Bikes"))?;
        tree.insert(ROOT_COLLECTION_NAME, Collection::new("Props"))?;
        tree.link_object("Vehicles", "Truck")?;
        tree.link_object("Cars", "Car.001")?;
        tree.link_object("Cars", "Car.002")?;
        tree.link_object("Bikes", "Bike")?;
        tree.link_object("Props", "Car.001")?;
        Ok(tree)
    }

    #[test]
    fn test_find_parent_collection() -> Result<(), SceneError> {
        let tree = tree()?;
        assert_eq!(
            tree.find_parent_collection("Cars").map(|c| c.name.as_str()),
            Some("Vehicles")
        );
        assert_eq!(
            tree.find_parent_collection("Vehicles").map(|c| c.name.as_str()),
            Some(ROOT_COLLECTION_NAME)
        );
        assert!(tree.find_parent_collection("Boats").is_none());
        assert!(tree.find_parent_collection(ROOT_COLLECTION_NAME).is_none());
        Ok(())
    }

    #[test]
    fn test_all_objects() -> Result<(), SceneError> {
        let tree = tree()?;
        assert_eq!(
            tree.all_objects("Vehicles")?,
            vec!["Truck", "Car.001", "Car.002", "Bike"]
        );
        // objects linked twice are listed once
        assert_eq!(
            tree.all_objects(ROOT_COLLECTION_NAME)?,
            vec!["Truck", "Car.001", "Car.002", "Bike"]
        );
        assert!(matches!(
            tree.all_objects("Boats"),
            Err(SceneError::CollectionNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() -> Result<(), SceneError> {
        let mut tree = tree()?;
        tree.insert("Cars", Collection {
            name: "Vehicles".to_string(),
            objects: vec!["Truck".to_string()],
            children: vec!["Cars".to_string()],
        })?;

        assert!(tree.find_parent_collection("Nope").is_none());
        assert_eq!(tree.all_objects("Vehicles")?, vec!["Truck", "Car.001", "Car.002"]);
        Ok(())
    }

    #[test]
    fn test_insert_missing_parent() {
        let mut tree = CollectionTree::new();
        let res = tree.insert("Missing", Collection::new("Child"));
        assert!(matches!(res, Err(SceneError::CollectionNotFound(name)) if name == "Missing"));
    }
}
