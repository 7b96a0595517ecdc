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


//! Object-graph codec: the same contract as [`crate::binary`], but values are
//! kept as [`Value`]s in a tree of [`ObjectContext`]s instead of raw bytes.
//! The tree can be inspected directly and is persisted as JSON.

mod reader;
mod value;
mod writer;

pub use reader::ObjectReader;
pub use value::{
    Color32Data, ColorData, QuaternionData, Value, Vector2Data, Vector2IntData, Vector3Data,
    Vector3IntData, Vector4Data,
};
pub use writer::ObjectWriter;

use crate::types::{ContextType, PropertyKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectContext {
    pub context_type: ContextType,
    pub id: i32,
    pub properties: BTreeMap<i32, Value>,
    pub sub_contexts: BTreeMap<i32, ObjectContext>,
}

impl ObjectContext {
    pub fn new(context_type: ContextType, id: i32) -> ObjectContext {
        ObjectContext {
            context_type,
            id,
            properties: BTreeMap::new(),
            sub_contexts: BTreeMap::new(),
        }
    }

    pub fn get_property<K: Into<PropertyKey>>(&self, key: K) -> Option<&Value> {
        self.properties.get(&key.into().hash())
    }

    pub fn get_sub_context(&self, id: i32) -> Option<&ObjectContext> {
        self.sub_contexts.get(&id)
    }
}

/// Output of one [`ObjectWriter`] pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveTree {
    pub root: ObjectContext,
}

impl Default for SaveTree {
    fn default() -> Self {
        SaveTree {
            root: ObjectContext::new(ContextType::Root, 0),
        }
    }
}

impl SaveTree {
    /// Follows `path` of context ids down from the root.
    pub fn context_at(&self, path: &[i32]) -> Option<&ObjectContext> {
        path.iter()
            .try_fold(&self.root, |context, &id| context.get_sub_context(id))
    }
}
