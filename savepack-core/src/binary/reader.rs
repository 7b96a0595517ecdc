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


use super::index::{ContextIndex, PropertyRecord, ROOT};
use crate::buffer::Reader;
use crate::codec::{PassState, SaveReader};
use crate::config::Config;
use crate::error::Error;
use crate::not_allowed;
use crate::resolver::FormatterRegistry;
use crate::serializer::{read_values_from, PropertyValue};
use crate::types::{ContextType, PropertyKey, PropertyType, STREAM_HEADER_LEN};
use std::io::{ErrorKind, Read};
use std::sync::Arc;

/// Loads a blob written by [`super::BinaryWriter`] and answers keyed lookups.
///
/// [`begin_deserialization`](Self::begin_deserialization) scans the blob once
/// and builds the context tree; lookups afterwards are hash-map hits scoped to
/// the current context. Lookups never fail: anything missing, mistyped or
/// damaged reads as `None`.
pub struct BinaryReader {
    config: Config,
    formatters: Arc<FormatterRegistry>,
    data: Vec<u8>,
    loaded: bool,
    index: ContextIndex,
    current: usize,
    state: PassState,
}

impl Default for BinaryReader {
    fn default() -> Self {
        BinaryReader::new(Config::default(), Arc::new(FormatterRegistry::new()))
    }
}

impl BinaryReader {
    pub fn new(config: Config, formatters: Arc<FormatterRegistry>) -> BinaryReader {
        BinaryReader {
            config,
            formatters,
            data: Vec::new(),
            loaded: false,
            index: ContextIndex::empty(),
            current: ROOT,
            state: PassState::Idle,
        }
    }

    pub fn is_deserializing(&self) -> bool {
        self.state == PassState::InProgress
    }

    /// Reads `[i32 total_len]` and then exactly that many bytes.
    ///
    /// A negative or oversized length, or a stream that ends early, is
    /// logged and returned as an error; the reader is left empty.
    pub fn read_from_stream<R: Read>(&mut self, stream: &mut R) -> Result<(), Error> {
        if self.is_deserializing() {
            not_allowed!("cannot load while deserializing");
        }
        self.data.clear();
        self.loaded = false;

        let mut header = [0u8; STREAM_HEADER_LEN];
        stream.read_exact(&mut header).map_err(|e| {
            log::error!("Failed to read save data length: {}", e);
            Error::from(e)
        })?;
        let total_len = i32::from_le_bytes(header);
        if total_len < 0 || total_len as usize > self.config.get_max_stream_len() {
            log::error!(
                "Save data length {} outside 0..={}",
                total_len,
                self.config.get_max_stream_len()
            );
            return Err(Error::invalid_data(format!("bad stream length {}", total_len)));
        }
        let expected = total_len as usize;
        let mut data = vec![0u8; expected];
        let mut filled = 0;
        while filled < expected {
            match stream.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("Failed to read save data: {}", e);
                    return Err(Error::from(e));
                }
            }
        }
        if filled < expected {
            log::error!("Save data truncated: expected {} bytes, read {}", expected, filled);
            return Err(Error::invalid_data(format!(
                "expected {} bytes, read {}",
                expected, filled
            )));
        }
        self.data = data;
        self.loaded = true;
        Ok(())
    }

    /// Builds the context index. Damage in the data is logged and skipped;
    /// the only errors are calling this twice or with nothing loaded.
    pub fn begin_deserialization(&mut self) -> Result<(), Error> {
        if self.is_deserializing() {
            not_allowed!("deserialization already in progress");
        }
        if !self.loaded {
            not_allowed!("no save data loaded");
        }
        self.index = ContextIndex::build(&self.data);
        self.current = ROOT;
        self.state = PassState::InProgress;
        Ok(())
    }

    /// Drops the data and index so the reader can load the next save.
    pub fn end_deserialization(&mut self) {
        if self.is_deserializing() && self.current != ROOT {
            log::warn!("end_deserialization called with contexts still pushed");
        }
        self.data = Vec::new();
        self.loaded = false;
        self.index = ContextIndex::empty();
        self.current = ROOT;
        self.state = PassState::Idle;
    }

    /// Structural problems found while indexing.
    pub fn fault_count(&self) -> usize {
        self.index.fault_count()
    }

    pub fn push_context(&mut self, context_type: ContextType, id: i32) -> bool {
        if !self.is_deserializing() {
            log::warn!("push_context called outside a deserialization pass");
            return false;
        }
        match self.index.node(self.current).sub_contexts.get(&id) {
            Some(&child) if self.index.node(child).context_type == context_type => {
                self.current = child;
                true
            }
            _ => false,
        }
    }

    pub fn pop_context(&mut self, context_type: ContextType) -> bool {
        let node = self.index.node(self.current);
        let parent = match node.parent {
            Some(parent) if self.is_deserializing() => parent,
            _ => {
                log::error!("pop_context({:?}) called at the root context", context_type);
                return false;
            }
        };
        if node.context_type != context_type {
            log::warn!(
                "Context type mismatch on pop: expected {:?}, found {:?} (id {})",
                context_type,
                node.context_type,
                node.id
            );
        }
        self.current = parent;
        true
    }

    fn property(&self, key: PropertyKey) -> Option<&PropertyRecord> {
        if !self.is_deserializing() {
            return None;
        }
        self.index.node(self.current).properties.get(&key.hash())
    }

    fn payload(&self, record: &PropertyRecord) -> Reader {
        Reader::new(&self.data[record.payload.clone()])
    }

    pub fn has_property<K: Into<PropertyKey>>(&self, key: K) -> bool {
        self.property(key.into()).is_some()
    }

    /// Wire type of `key` in the current context and whether it is an array.
    pub fn property_type<K: Into<PropertyKey>>(&self, key: K) -> Option<(PropertyType, bool)> {
        self.property(key.into())
            .map(|record| (record.property_type, record.flags.is_array()))
    }

    pub fn current_context(&self) -> Option<(ContextType, i32)> {
        if !self.is_deserializing() {
            return None;
        }
        let node = self.index.node(self.current);
        Some((node.context_type, node.id))
    }

    /// Ids of the current context's children of one type, ascending.
    pub fn sub_context_ids(&self, context_type: ContextType) -> Vec<i32> {
        if !self.is_deserializing() {
            return Vec::new();
        }
        let mut ids: Vec<i32> = self
            .index
            .node(self.current)
            .sub_contexts
            .iter()
            .filter(|&(_, &child)| self.index.node(child).context_type == context_type)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn property_count(&self) -> usize {
        if !self.is_deserializing() {
            return 0;
        }
        self.index.node(self.current).properties.len()
    }

    pub fn try_read_value<K: Into<PropertyKey>, T: PropertyValue>(&self, key: K) -> Option<T> {
        let key = key.into();
        let record = self.property(key)?;
        if record.property_type != T::PROPERTY_TYPE || record.flags.is_array() {
            return None;
        }
        match T::read_from(&mut self.payload(record)) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Property {:?} is damaged: {}", key, e);
                None
            }
        }
    }

    pub fn try_read_values<K: Into<PropertyKey>, T: PropertyValue>(
        &self,
        key: K,
    ) -> Option<Vec<T>> {
        let key = key.into();
        let record = self.property(key)?;
        if record.property_type != T::PROPERTY_TYPE || !record.flags.is_array() {
            return None;
        }
        if record.flags.is_null_or_empty() {
            return Some(Vec::new());
        }
        match read_values_from(&mut self.payload(record)) {
            Ok(values) => Some(values),
            Err(e) => {
                log::warn!("Array property {:?} is damaged: {}", key, e);
                None
            }
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

    pub fn try_read_serializable<K: Into<PropertyKey>, T: 'static>(&self, key: K) -> Option<T> {
        let key = key.into();
        let record = self.property(key)?;
        if record.property_type != PropertyType::Serializable || record.flags.is_array() {
            return None;
        }
        let mut payload = self.payload(record);
        let formatter_id = payload.read_i32().ok()?;
        self.decode_blob(key, formatter_id, payload.slice_after_cursor())
    }

    pub fn try_read_serializables<K: Into<PropertyKey>, T: 'static>(
        &self,
        key: K,
    ) -> Option<Vec<T>> {
        let key = key.into();
        let record = self.property(key)?;
        if record.property_type != PropertyType::Serializable || !record.flags.is_array() {
            return None;
        }
        let mut payload = self.payload(record);
        let formatter_id = payload.read_i32().ok()?;
        if self.formatters.formatter_id::<T>() != Some(formatter_id) {
            return None;
        }
        if record.flags.is_null_or_empty() {
            return Some(Vec::new());
        }
        let count = payload.read_i32().ok()?;
        if count < 0 || count as usize != record.children.len() {
            log::warn!(
                "Serializable list {:?} declares {} element(s) but has {}",
                key,
                count,
                record.children.len()
            );
            return None;
        }
        record
            .children
            .iter()
            .map(|child| {
                if child.property_type != PropertyType::Serializable {
                    return None;
                }
                self.decode_blob(key, formatter_id, &self.data[child.payload.clone()])
            })
            .collect()
    }
}

impl SaveReader for BinaryReader {
    fn push_context(&mut self, context_type: ContextType, id: i32) -> bool {
        BinaryReader::push_context(self, context_type, id)
    }

    fn pop_context(&mut self, context_type: ContextType) -> bool {
        BinaryReader::pop_context(self, context_type)
    }

    fn try_read_value<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        BinaryReader::try_read_value(self, key)
    }

    fn try_read_values<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        BinaryReader::try_read_values(self, key)
    }

    fn try_read_serializable<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        BinaryReader::try_read_serializable(self, key)
    }

    fn try_read_serializables<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        BinaryReader::try_read_serializables(self, key)
    }
}
