use indexmap::IndexMap;
use serde::Deserialize;

use super::hash::{Digest, Fragments};

/// Polymorphism aid: which property selects the variant, and how its values map to schemas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

impl Discriminator {
    pub fn find_mapping_value(&self, key: &str) -> Option<&str> {
        self.mapping.get(key).map(String::as_str)
    }

    pub fn hash(&self) -> Digest {
        let mut f = Fragments::default();
        f.push("propertyName", &self.property_name);
        let mut mapping: Vec<_> = self.mapping.iter().collect();
        mapping.sort();
        for (k, v) in mapping {
            f.push("mapping", format!("{k}:{v}"));
        }
        f.finish()
    }
}
