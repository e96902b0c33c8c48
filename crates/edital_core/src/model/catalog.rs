//! Activity catalog domain model.
//!
//! # Responsibility
//! - Define the per-notice catalog of typed activity categories.
//! - Provide in-memory editing keyed by stable ids.
//! - Seed a new catalog from a prior notice ("carry forward defaults").
//!
//! # Invariants
//! - Category and activity ids are unique across one catalog.
//! - Category `name` and `unit` are never blank.
//! - Insertion order is kept for display; it never affects scoring.
//! - Failed edits leave the catalog untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of an activity category.
pub type CategoryId = Uuid;

/// Stable identifier of a scoreable activity.
///
/// Project ledgers reference activities through this id.
pub type ActivityId = Uuid;

/// Catalog editing and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("category name must not be blank")]
    BlankCategoryName,
    #[error("category unit must not be blank")]
    BlankCategoryUnit,
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),
    #[error("category id already present in catalog: {0}")]
    DuplicateCategory(CategoryId),
    #[error("activity id already present in catalog: {0}")]
    DuplicateActivity(ActivityId),
}

/// One scoreable activity with a per-occurrence value and a capped total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: ActivityId,
    pub name: String,
    /// Points earned per reported occurrence.
    pub points: u32,
    /// Maximum total this activity can contribute, whatever the count.
    pub limit: u32,
}

impl ActivityDefinition {
    /// Creates an activity with a generated stable id.
    pub fn new(name: impl Into<String>, points: u32, limit: u32) -> Self {
        Self::with_id(Uuid::new_v4(), name, points, limit)
    }

    /// Creates an activity with a caller-provided id (storage/import paths).
    pub fn with_id(id: ActivityId, name: impl Into<String>, points: u32, limit: u32) -> Self {
        Self {
            id,
            name: name.into(),
            points,
            limit,
        }
    }
}

/// Named grouping of activities measured in one unit (e.g. "Publications").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCategory {
    pub id: CategoryId,
    pub name: String,
    pub unit: String,
    pub activities: Vec<ActivityDefinition>,
}

impl ActivityCategory {
    /// Creates an empty category with a generated stable id.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, unit)
    }

    /// Creates an empty category with a caller-provided id.
    pub fn with_id(id: CategoryId, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            unit: unit.into(),
            activities: Vec::new(),
        }
    }

    /// Builder-style helper used by seeding code and tests.
    pub fn with_activity(mut self, activity: ActivityDefinition) -> Self {
        self.activities.push(activity);
        self
    }

    /// Checks the field-level invariants of this category.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::BlankCategoryName);
        }
        if self.unit.trim().is_empty() {
            return Err(CatalogError::BlankCategoryUnit);
        }
        Ok(())
    }

    fn activity_index(&self, activity_id: ActivityId) -> Option<usize> {
        self.activities
            .iter()
            .position(|activity| activity.id == activity_id)
    }
}

/// Ordered activity catalog owned by one notice.
///
/// Serialized transparently as the list of categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityCatalog {
    categories: Vec<ActivityCategory>,
}

impl ActivityCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from already-identified categories.
    ///
    /// # Errors
    /// - Returns the first invariant violation found by [`Self::validate`].
    pub fn from_categories(categories: Vec<ActivityCategory>) -> Result<Self, CatalogError> {
        let catalog = Self { categories };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Deep-copies a prior catalog for a new notice.
    ///
    /// Names, units, points and limits are preserved; every category and
    /// activity receives a fresh id so the copy shares nothing with `prior`.
    /// Returns an empty catalog when there is no prior notice.
    pub fn seed_from(prior: Option<&ActivityCatalog>) -> Self {
        let Some(prior) = prior else {
            return Self::new();
        };

        let categories = prior
            .categories
            .iter()
            .map(|category| ActivityCategory {
                id: Uuid::new_v4(),
                name: category.name.clone(),
                unit: category.unit.clone(),
                activities: category
                    .activities
                    .iter()
                    .map(|activity| {
                        ActivityDefinition::new(activity.name.clone(), activity.points, activity.limit)
                    })
                    .collect(),
            })
            .collect();

        Self { categories }
    }

    pub fn categories(&self) -> &[ActivityCategory] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns one category by id.
    pub fn category(&self, category_id: CategoryId) -> Option<&ActivityCategory> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    /// Iterates every activity in display order (category order, then
    /// activity order inside the category).
    pub fn activities(&self) -> impl Iterator<Item = &ActivityDefinition> {
        self.categories
            .iter()
            .flat_map(|category| category.activities.iter())
    }

    /// Total number of activities across all categories.
    pub fn activity_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.activities.len())
            .sum()
    }

    /// Finds one activity anywhere in the catalog.
    pub fn find_activity(&self, activity_id: ActivityId) -> Option<&ActivityDefinition> {
        self.activities().find(|activity| activity.id == activity_id)
    }

    /// Appends a category.
    ///
    /// Activities already attached to `category` are kept; their ids must not
    /// collide with existing ones.
    pub fn add_category(&mut self, category: ActivityCategory) -> Result<CategoryId, CatalogError> {
        category.validate()?;
        if self.category(category.id).is_some() {
            return Err(CatalogError::DuplicateCategory(category.id));
        }

        let mut seen = HashSet::new();
        for activity in &category.activities {
            if self.find_activity(activity.id).is_some() || !seen.insert(activity.id) {
                return Err(CatalogError::DuplicateActivity(activity.id));
            }
        }

        let category_id = category.id;
        self.categories.push(category);
        Ok(category_id)
    }

    /// Appends an activity to one category.
    pub fn add_activity(
        &mut self,
        category_id: CategoryId,
        activity: ActivityDefinition,
    ) -> Result<ActivityId, CatalogError> {
        if self.find_activity(activity.id).is_some() {
            return Err(CatalogError::DuplicateActivity(activity.id));
        }

        let category = self.category_mut(category_id)?;
        let activity_id = activity.id;
        category.activities.push(activity);
        Ok(activity_id)
    }

    /// Replaces name, points and limit of one activity in place.
    ///
    /// The stored id is kept; `activity.id` is ignored so ledger references
    /// stay valid across edits.
    pub fn update_activity(
        &mut self,
        category_id: CategoryId,
        activity_id: ActivityId,
        activity: ActivityDefinition,
    ) -> Result<(), CatalogError> {
        let category = self.category_mut(category_id)?;
        let index = category
            .activity_index(activity_id)
            .ok_or(CatalogError::ActivityNotFound(activity_id))?;

        category.activities[index] = ActivityDefinition {
            id: activity_id,
            ..activity
        };
        Ok(())
    }

    /// Removes one activity and returns it.
    pub fn remove_activity(
        &mut self,
        category_id: CategoryId,
        activity_id: ActivityId,
    ) -> Result<ActivityDefinition, CatalogError> {
        let category = self.category_mut(category_id)?;
        let index = category
            .activity_index(activity_id)
            .ok_or(CatalogError::ActivityNotFound(activity_id))?;
        Ok(category.activities.remove(index))
    }

    /// Removes one category (with all its activities) and returns it.
    pub fn remove_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<ActivityCategory, CatalogError> {
        let index = self
            .categories
            .iter()
            .position(|category| category.id == category_id)
            .ok_or(CatalogError::CategoryNotFound(category_id))?;
        Ok(self.categories.remove(index))
    }

    /// Checks all catalog invariants.
    ///
    /// Used on catalogs that did not go through the editing API, such as
    /// deserialized input or rows loaded from storage.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut category_ids = HashSet::new();
        let mut activity_ids = HashSet::new();

        for category in &self.categories {
            category.validate()?;
            if !category_ids.insert(category.id) {
                return Err(CatalogError::DuplicateCategory(category.id));
            }
            for activity in &category.activities {
                if !activity_ids.insert(activity.id) {
                    return Err(CatalogError::DuplicateActivity(activity.id));
                }
            }
        }

        Ok(())
    }

    fn category_mut(&mut self, category_id: CategoryId) -> Result<&mut ActivityCategory, CatalogError> {
        self.categories
            .iter_mut()
            .find(|category| category.id == category_id)
            .ok_or(CatalogError::CategoryNotFound(category_id))
    }
}
