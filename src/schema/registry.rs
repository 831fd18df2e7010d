use std::collections::HashMap;

use crate::schema::AuthorityArea;
use crate::{err_at, Result};

/// Holds every configured authority area and assigns the global
/// attribute ids shared across areas (§3: "global_id ... assigned by
/// the schema registry on first sight"). An attribute's `global_id` is
/// keyed on its canonical name, so `network-name` in one area's
/// `network` class and the same-named attribute in another area's
/// class resolve to the same id — required for `INDEX_ALL` and
/// full-scan query dispatch to treat them as the same index (§4.6).
pub struct Registry {
    areas: Vec<AuthorityArea>,
    global_ids: HashMap<String, u32>,
    next_global_id: u32,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            areas: Vec::new(),
            global_ids: HashMap::new(),
            next_global_id: 1,
        }
    }

    pub fn add_area(&mut self, area: AuthorityArea) -> &mut Self {
        self.areas.push(area);
        self
    }

    pub fn areas(&self) -> &[AuthorityArea] {
        &self.areas
    }

    pub fn area(&self, name: &str) -> Option<&AuthorityArea> {
        self.areas.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn area_mut(&mut self, name: &str) -> Option<&mut AuthorityArea> {
        self.areas.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Look up the global id for an attribute name, assigning a fresh
    /// one the first time the name is seen.
    pub fn define_attribute(&mut self, canonical_name: &str) -> u32 {
        let key = canonical_name.to_ascii_lowercase();
        if let Some(id) = self.global_ids.get(&key) {
            return *id;
        }
        let id = self.next_global_id;
        self.next_global_id += 1;
        self.global_ids.insert(key, id);
        id
    }

    /// Walk every area/class/attribute already added and stamp in its
    /// `global_id`, assigning as needed. Call once schema construction
    /// is complete and before serving queries.
    pub fn assign_global_ids(&mut self) {
        // Two passes: first collect (name -> id) without holding a
        // mutable borrow across the nested area/class walk, then apply.
        let mut names = Vec::new();
        for area in &self.areas {
            for class in &area.classes {
                for attr in &class.attributes {
                    names.push(attr.name.clone());
                }
            }
        }
        let mut ids = Vec::with_capacity(names.len());
        for name in &names {
            ids.push(self.define_attribute(name));
        }

        let mut idx = 0;
        for area in &mut self.areas {
            for class in &mut area.classes {
                for attr in &mut class.attributes {
                    attr.global_id = ids[idx];
                    idx += 1;
                }
            }
        }
    }

    pub fn lookup_class(&self, area_name: &str, class_name: &str) -> Result<&crate::schema::Class> {
        let area = match self.area(area_name) {
            Some(a) => a,
            None => return err_at!(UnknownAuthArea, msg: "no such authority area: {}", area_name),
        };
        match area.class(class_name) {
            Some(c) => Ok(c),
            None => err_at!(UnknownClass, msg: "no such class: {}/{}", area_name, class_name),
        }
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
