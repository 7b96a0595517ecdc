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


use super::{ObjectContext, SaveTree, Value};
use crate::codec::{PassState, SaveReader};
use crate::error::Error;
use crate::not_allowed;
use crate::resolver::FormatterRegistry;
use crate::serializer::PropertyValue;
use crate::types::{ContextType, PropertyKey, PropertyType};
use std::io::Read;
use std::sync::Arc;

/// Reads back a [`SaveTree`] with the same tolerant lookups as
/// [`crate::binary::BinaryReader`].
pub struct ObjectReader {
    formatters: Arc<FormatterRegistry>,
    tree: Option<SaveTree>,
    state: PassState,
    path: Vec<i32>,
}

impl ObjectReader {
    pub fn new(formatters: Arc<FormatterRegistry>) -> ObjectReader {
        ObjectReader {
            formatters,
            tree: None,
            state: PassState::Idle,
            path: Vec::new(),
        }
    }

    pub fn with_tree(formatters: Arc<FormatterRegistry>, tree: SaveTree) -> ObjectReader {
        let mut reader = ObjectReader::new(formatters);
        reader.tree = Some(tree);
        reader
    }

    /// Parses a tree written by [`super::ObjectWriter::write_to_stream`].
    pub fn from_stream<R: Read>(
        formatters: Arc<FormatterRegistry>,
        stream: &mut R,
    ) -> Result<ObjectReader, Error> {
        let tree: SaveTree = serde_json::from_reader(stream).map_err(|e| {
            log::error!("Failed to read save tree: {}", e);
            Error::from(e)
        })?;
        Ok(ObjectReader::with_tree(formatters, tree))
    }

    pub fn load(&mut self, tree: SaveTree) -> Result<(), Error> {
        if self.is_deserializing() {
            not_allowed!("cannot load while deserializing");
        }
        self.tree = Some(tree);
        Ok(())
    }

    pub fn is_deserializing(&self) -> bool {
        self.state == PassState::InProgress
    }

    pub fn begin_deserialization(&mut self) -> Result<(), Error> {
        if self.is_deserializing() {
            not_allowed!("deserialization already in progress");
        }
        if self.tree.is_none() {
            not_allowed!("no save tree loaded");
        }
        self.path.clear();
        self.state = PassState::InProgress;
        Ok(())
    }

    pub fn end_deserialization(&mut self) {
        if !self.path.is_empty() {
            log::warn!(
                "end_deserialization with {} context(s) still pushed",
                self.path.len()
            );
        }
        self.path.clear();
        self.tree = None;
        self.state = PassState::Idle;
    }

    fn current(&self) -> Option<&ObjectContext> {
        if !self.is_deserializing() {
            return None;
        }
        self.tree.as_ref()?.context_at(&self.path)
    }

    fn property(&self, key: PropertyKey) -> Option<&Value> {
        self.current()?.properties.get(&key.hash())
    }

    pub fn push_context(&mut self, context_type: ContextType, id: i32) -> bool {
        let found = self
            .current()
            .and_then(|context| context.sub_contexts.get(&id))
            .map_or(false, |child| child.context_type == context_type);
        if found {
            self.path.push(id);
        }
        found
    }

    pub fn pop_context(&mut self, context_type: ContextType) -> bool {
        if self.path.is_empty() {
            log::error!("pop_context({:?}) called at the root context", context_type);
            return false;
        }
        if let Some(context) = self.current() {
            if context.context_type != context_type {
                log::warn!(
                    "Context type mismatch on pop: expected {:?}, found {:?} (id {})",
                    context_type,
                    context.context_type,
                    context.id
                );
            }
        }
        self.path.pop();
        true
    }

    pub fn has_property<K: Into<PropertyKey>>(&self, key: K) -> bool {
        self.property(key.into()).is_some()
    }

    pub fn current_context(&self) -> Option<(ContextType, i32)> {
        self.current().map(|c| (c.context_type, c.id))
    }

    pub fn sub_context_ids(&self, context_type: ContextType) -> Vec<i32> {
        self.current()
            .map(|c| {
                c.sub_contexts
                    .values()
                    .filter(|child| child.context_type == context_type)
                    .map(|child| child.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn property_count(&self) -> usize {
        self.current().map_or(0, |c| c.properties.len())
    }

    pub fn try_read_value<K: Into<PropertyKey>, T: PropertyValue>(&self, key: K) -> Option<T> {
        T::from_value(self.property(key.into())?)
    }

    pub fn try_read_values<K: Into<PropertyKey>, T: PropertyValue>(
        &self,
        key: K,
    ) -> Option<Vec<T>> {
        match self.property(key.into())? {
            Value::Array {
                element_type,
                items,
            } if *element_type == T::PROPERTY_TYPE => {
                items.iter().map(T::from_value).collect()
            }
            _ => None,
        }
    }

    pub fn try_read_serializable<K: Into<PropertyKey>, T: 'static>(&self, key: K) -> Option<T> {
        let key = key.into();
        match self.property(key)? {
            Value::Serializable { formatter_id, blob } => {
                self.decode_blob(key, *formatter_id, blob)
            }
            _ => None,
        }
    }

    pub fn try_read_serializables<K: Into<PropertyKey>, T: 'static>(
        &self,
        key: K,
    ) -> Option<Vec<T>> {
        let key = key.into();
        match self.property(key)? {
            Value::SerializableArray {
                formatter_id,
                blobs,
            } if self.formatters.formatter_id::<T>() == Some(*formatter_id) => blobs
                .iter()
                .map(|blob| self.decode_blob(key, *formatter_id, blob))
                .collect(),
            _ => None,
        }
    }

    fn decode_blob<T: 'static>(&self, key: PropertyKey, formatter_id: i32, blob: &[u8]) -> Option<T> {
        match self.formatters.read::<T>(formatter_id, blob) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Serializable {:?} not readable: {}", key, e);
                None
            }
        }
    }

    /// Wire type of `key` in the current context and whether it is an array.
    pub fn property_type<K: Into<PropertyKey>>(&self, key: K) -> Option<(PropertyType, bool)> {
        self.property(key.into())
            .map(|value| (value.property_type(), value.is_array()))
    }
}

impl SaveReader for ObjectReader {
    fn push_context(&mut self, context_type: ContextType, id: i32) -> bool {
        ObjectReader::push_context(self, context_type, id)
    }

    fn pop_context(&mut self, context_type: ContextType) -> bool {
        ObjectReader::pop_context(self, context_type)
    }

    fn try_read_value<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        ObjectReader::try_read_value(self, key)
    }

    fn try_read_values<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        ObjectReader::try_read_values(self, key)
    }

    fn try_read_serializable<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        ObjectReader::try_read_serializable(self, key)
    }

    fn try_read_serializables<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        ObjectReader::try_read_serializables(self, key)
    }
}
