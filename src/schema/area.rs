use std::path::PathBuf;

use crate::schema::Class;

/// An authority area is either the primary area for its data, or a
/// secondary area mirroring records whose authority lies elsewhere (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaKind {
    Primary,
    Secondary,
}

/// A named authority area: its data directory, the classes it serves,
/// and the guardians allowed to register into it (§3, §5).
#[derive(Clone, Debug)]
pub struct AuthorityArea {
    pub name: String,
    pub kind: AreaKind,
    pub data_dir: PathBuf,
    pub classes: Vec<Class>,
    pub serial: u64,
    pub guardian_ids: Vec<String>,
}

impl AuthorityArea {
    pub fn new(name: &str, kind: AreaKind, data_dir: PathBuf) -> AuthorityArea {
        AuthorityArea {
            name: name.to_string(),
            kind,
            data_dir,
            classes: Vec::new(),
            serial: 0,
            guardian_ids: Vec::new(),
        }
    }

    pub fn add_class(&mut self, class: Class) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn add_guardian(&mut self, guardian_id: &str) -> &mut Self {
        self.guardian_ids.push(guardian_id.to_string());
        self
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_primary(&self) -> bool {
        self.kind == AreaKind::Primary
    }
}

#[cfg(test)]
#[path = "area_test.rs"]
mod area_test;
