// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Planner configuration.

/// The enumerated set of switches the planner consults. Each is read once
/// during planning; nothing here is mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Whether `INSERT INTO … VALUES` statements are accepted.
    pub insert_values_enabled: bool,
    /// Conformance switch for the pre-rework key-field rules: a repartition
    /// is emitted for `GROUP BY ROWKEY`, and a projected key column keeps the
    /// key field only when its output name is unchanged.
    pub legacy_key_field_semantics: bool,
    /// Serialize session-window keys in the pre-rework format.
    pub windowed_session_key_legacy: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            insert_values_enabled: true,
            legacy_key_field_semantics: false,
            windowed_session_key_legacy: false,
        }
    }
}

impl PlannerConfig {
    pub fn with_insert_values_enabled(mut self, enabled: bool) -> Self {
        self.insert_values_enabled = enabled;
        self
    }

    pub fn with_legacy_key_field_semantics(mut self, legacy: bool) -> Self {
        self.legacy_key_field_semantics = legacy;
        self
    }

    pub fn with_windowed_session_key_legacy(mut self, legacy: bool) -> Self {
        self.windowed_session_key_legacy = legacy;
        self
    }
}
