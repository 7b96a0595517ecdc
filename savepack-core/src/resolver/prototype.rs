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


use crate::codec::{SaveReader, SaveWriter};
use crate::error::Error;
use crate::types::PropertyKey;
use crate::util::hash_key;
use std::collections::HashMap;

struct Entry<P> {
    name: String,
    prototype: P,
}

/// Id to prototype table for objects that are re-created on load, such as
/// spawned prefabs. Ids are key hashes of the registered names.
pub struct PrototypeRegistry<P> {
    entries: HashMap<i32, Entry<P>>,
}

impl<P> Default for PrototypeRegistry<P> {
    fn default() -> Self {
        PrototypeRegistry {
            entries: HashMap::new(),
        }
    }
}

impl<P> PrototypeRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, prototype: P) -> Result<i32, Error> {
        let id = hash_key(name);
        if let Some(existing) = self.entries.get(&id) {
            return Err(Error::not_allowed(format!(
                "prototype '{}' collides with registered '{}'",
                name, existing.name
            )));
        }
        self.entries.insert(
            id,
            Entry {
                name: name.to_owned(),
                prototype,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: i32) -> Option<&P> {
        self.entries.get(&id).map(|entry| &entry.prototype)
    }

    pub fn name_of(&self, id: i32) -> Option<&str> {
        self.entries.get(&id).map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: PartialEq> PrototypeRegistry<P> {
    pub fn id_of(&self, prototype: &P) -> Option<i32> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.prototype == *prototype)
            .map(|(&id, _)| id)
    }
}

impl<P: Clone> PrototypeRegistry<P> {
    pub fn instantiate(&self, id: i32) -> Option<P> {
        self.get(id).cloned()
    }
}

/// Stores which prototype an object was created from, as an `i32` property.
pub fn write_prototype_reference<W, P, K>(
    writer: &mut W,
    key: K,
    registry: &PrototypeRegistry<P>,
    prototype: &P,
) -> Result<(), Error>
where
    W: SaveWriter,
    P: PartialEq,
    K: Into<PropertyKey>,
{
    let id = registry.id_of(prototype).ok_or_else(|| {
        log::error!("Cannot reference an unregistered prototype");
        Error::invalid_ref("prototype is not registered")
    })?;
    writer.write_value(key, &id)
}

pub fn read_prototype_reference<'r, R, P, K>(
    reader: &R,
    key: K,
    registry: &'r PrototypeRegistry<P>,
) -> Option<&'r P>
where
    R: SaveReader,
    K: Into<PropertyKey>,
{
    let id: i32 = reader.try_read_value(key)?;
    let prototype = registry.get(id);
    if prototype.is_none() {
        log::warn!("Saved prototype id {:#010x} is not registered", id);
    }
    prototype
}
