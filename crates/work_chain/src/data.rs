use std::collections::BTreeMap;

use crate::KEY_IMAGE_URI;

/// Key-value payload handed from one stage to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkData {
    values: BTreeMap<String, String>,
}

impl WorkData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_uri(uri: impl Into<String>) -> Self {
        Self::new().with_string(KEY_IMAGE_URI, uri)
    }

    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn image_uri(&self) -> Option<&str> {
        self.get_string(KEY_IMAGE_URI).filter(|uri| !uri.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
