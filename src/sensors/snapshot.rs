// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Point-in-time view of every sensor's state

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;

/// Sensor name to state label, all taken from one poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorSnapshot(HashMap<String, String>);

impl SensorSnapshot {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of one sensor
    pub fn insert(&mut self, name: &str, state: &str) {
        self.0.insert(name.to_string(), state.to_string());
    }

    /// State label of one sensor
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (name, label) pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Index<&str> for SensorSnapshot {
    type Output = String;

    fn index(&self, name: &str) -> &String {
        &self.0[name]
    }
}

impl FromIterator<(String, String)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
