//! Catalog taxonomy index.
//!
//! A derived, read-only three-level lookup (make -> model -> engine) built
//! from the full in-memory dataset, used to drive cascading form
//! selectors. Keys are matched case-insensitively but original casing is
//! preserved for display. The index is opportunistic: it offers whatever
//! the dataset contains and never constrains free-text input, so callers
//! append the user's current selection when it is absent.

use crate::listing::Listing;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct ModelNode {
    display: String,
    engines: Vec<String>,
    engine_keys: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct MakeNode {
    display: String,
    models: Vec<ModelNode>,
    model_keys: HashMap<String, usize>,
}

/// Three-level make -> model -> engine lookup over a listing dataset.
#[derive(Debug, Default)]
pub struct Taxonomy {
    makes: Vec<MakeNode>,
    make_keys: HashMap<String, usize>,
}

impl Taxonomy {
    /// Builds the index from a full dataset.
    ///
    /// Must be fed the complete collection, never a filtered view: the
    /// selectors have to offer every make and model ever seen regardless
    /// of the current filter state.
    pub fn index(listings: &[Listing]) -> Self {
        let mut taxonomy = Self::default();
        for listing in listings {
            taxonomy.observe(listing);
        }
        taxonomy
    }

    fn observe(&mut self, listing: &Listing) {
        let make_key = listing.make.to_lowercase();
        let make_idx = match self.make_keys.get(&make_key) {
            Some(&idx) => idx,
            None => {
                let idx = self.makes.len();
                self.makes.push(MakeNode {
                    display: listing.make.clone(),
                    ..Default::default()
                });
                self.make_keys.insert(make_key, idx);
                idx
            }
        };
        let make = &mut self.makes[make_idx];

        let model_key = listing.model.to_lowercase();
        let model_idx = match make.model_keys.get(&model_key) {
            Some(&idx) => idx,
            None => {
                let idx = make.models.len();
                make.models.push(ModelNode {
                    display: listing.model.clone(),
                    ..Default::default()
                });
                make.model_keys.insert(model_key, idx);
                idx
            }
        };
        let model = &mut make.models[model_idx];

        if let Some(engine) = listing.specs.as_ref().and_then(|s| s.engine.as_deref()) {
            let engine_key = engine.to_lowercase();
            if !model.engine_keys.contains_key(&engine_key) {
                model.engine_keys.insert(engine_key, model.engines.len());
                model.engines.push(engine.to_string());
            }
        }
    }

    /// All observed makes, in first-seen order, original casing.
    pub fn makes(&self) -> Vec<String> {
        self.makes.iter().map(|m| m.display.clone()).collect()
    }

    /// Models observed under a make. Empty when the make is unknown.
    pub fn models_for(&self, make: &str) -> Vec<String> {
        self.make_node(make)
            .map(|m| m.models.iter().map(|n| n.display.clone()).collect())
            .unwrap_or_default()
    }

    /// Engine strings observed under a make/model pair.
    ///
    /// Not an exhaustive enumeration: it only reflects values that exist
    /// in the dataset.
    pub fn engines_for(&self, make: &str, model: &str) -> Vec<String> {
        let Some(make_node) = self.make_node(make) else {
            return Vec::new();
        };
        make_node
            .model_keys
            .get(&model.to_lowercase())
            .map(|&idx| make_node.models[idx].engines.clone())
            .unwrap_or_default()
    }

    fn make_node(&self, make: &str) -> Option<&MakeNode> {
        self.make_keys
            .get(&make.to_lowercase())
            .map(|&idx| &self.makes[idx])
    }
}

/// Appends `current` to `options` when it is not already offered.
///
/// Selectors built from the taxonomy must still offer a manually typed
/// value as an extra option; the index augments free text, it does not
/// constrain it.
pub fn with_current(mut options: Vec<String>, current: Option<&str>) -> Vec<String> {
    if let Some(current) = current {
        let trimmed = current.trim();
        if !trimmed.is_empty()
            && !options.iter().any(|o| o.eq_ignore_ascii_case(trimmed))
        {
            options.push(trimmed.to_string());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Specs;

    fn listing(make: &str, model: &str, engine: Option<&str>) -> Listing {
        Listing {
            id: 1,
            make: make.to_string(),
            model: model.to_string(),
            year: 2020,
            price: 10_000.0,
            currency: "USD".to_string(),
            media: vec![],
            specs: engine.map(|e| Specs {
                engine: Some(e.to_string()),
                ..Default::default()
            }),
            mileage: None,
            owner_id: None,
            rating: None,
            category: None,
        }
    }

    #[test]
    fn lookups_are_case_insensitive_but_preserve_display_casing() {
        let taxonomy = Taxonomy::index(&[
            listing("Honda", "Civic", Some("1.5L Turbo")),
            listing("honda", "CIVIC", Some("2.0L")),
        ]);
        assert_eq!(taxonomy.makes(), vec!["Honda"]);
        assert_eq!(taxonomy.models_for("HONDA"), vec!["Civic"]);
        assert_eq!(
            taxonomy.engines_for("honda", "civic"),
            vec!["1.5L Turbo", "2.0L"]
        );
    }

    #[test]
    fn unknown_make_yields_empty_lists() {
        let taxonomy = Taxonomy::index(&[listing("Honda", "Civic", None)]);
        assert!(taxonomy.models_for("Tesla").is_empty());
        assert!(taxonomy.engines_for("Tesla", "Model 3").is_empty());
    }

    #[test]
    fn engines_are_opportunistic() {
        let taxonomy = Taxonomy::index(&[listing("Honda", "Civic", None)]);
        assert!(taxonomy.engines_for("Honda", "Civic").is_empty());
    }

    #[test]
    fn current_selection_is_appended_when_absent() {
        let options = vec!["Civic".to_string(), "Accord".to_string()];
        let augmented = with_current(options.clone(), Some("Prelude"));
        assert_eq!(augmented.last().map(String::as_str), Some("Prelude"));

        // Already offered (case-insensitively): no duplicate.
        let augmented = with_current(options, Some("civic"));
        assert_eq!(augmented.len(), 2);
    }
}
