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


use crate::buffer::{ChunkedBuffer, Writer};
use crate::codec::{PassState, SaveWriter};
use crate::config::Config;
use crate::error::Error;
use crate::not_allowed;
use crate::resolver::FormatterRegistry;
use crate::serializer::{values_encoded_len, write_values_to, PropertyValue};
use crate::types::{
    ContextType, PropertyFlags, PropertyKey, PropertyType, KEY_LEN, RECORD_HEADER_LEN,
};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

/// The `[i32 total_len]` stream header for `total_len` bytes of chunks.
fn stream_len_prefix(total_len: usize) -> Result<i32, Error> {
    i32::try_from(total_len).map_err(|_| {
        Error::encode_error(format!(
            "save data of {} bytes exceeds the format limit",
            total_len
        ))
    })
}

struct Frame {
    context_type: ContextType,
    id: i32,
    keys: HashSet<i32>,
    child_ids: HashSet<i32>,
}

impl Frame {
    fn new(context_type: ContextType, id: i32) -> Frame {
        Frame {
            context_type,
            id,
            keys: HashSet::new(),
            child_ids: HashSet::new(),
        }
    }
}

/// Appends typed records to a chain of fixed-size chunks.
///
/// A pass runs from [`begin_serialization`](Self::begin_serialization) to
/// [`end_serialization`](Self::end_serialization); afterwards the blob can be
/// flushed with [`write_to_stream`](Self::write_to_stream) any number of
/// times until the next pass begins.
///
/// # Errors
///
/// Mistakes in the calling code are hard errors: writing outside a pass, a
/// duplicate key or sibling context id, popping the root, and ending with
/// contexts still open. A rejected write leaves the blob untouched.
///
/// # Examples
///
/// ```rust
/// use savepack_core::binary::{BinaryReader, BinaryWriter};
/// use savepack_core::types::ContextType;
/// use glam::Vec3;
///
/// let mut writer = BinaryWriter::default();
/// writer.begin_serialization().unwrap();
/// writer.push_context(ContextType::Object, 42).unwrap();
/// writer.write_value("health", &75i32).unwrap();
/// writer.write_value("position", &Vec3::new(1.0, 2.0, 3.0)).unwrap();
/// writer.pop_context(ContextType::Object).unwrap();
/// writer.end_serialization().unwrap();
/// let bytes = writer.to_bytes().unwrap();
///
/// let mut reader = BinaryReader::default();
/// reader.read_from_stream(&mut bytes.as_slice()).unwrap();
/// reader.begin_deserialization().unwrap();
/// assert!(reader.push_context(ContextType::Object, 42));
/// assert_eq!(reader.try_read_value::<_, i32>("health"), Some(75));
/// assert_eq!(reader.try_read_value::<_, i32>("mana"), None);
/// ```
pub struct BinaryWriter {
    formatters: Arc<FormatterRegistry>,
    state: PassState,
    buffer: ChunkedBuffer,
    stack: Vec<Frame>,
    scratch: Writer,
    record_count: usize,
}

impl Default for BinaryWriter {
    fn default() -> Self {
        BinaryWriter::new(Config::default(), Arc::new(FormatterRegistry::new()))
    }
}

impl BinaryWriter {
    /// Creates a writer.
    ///
    /// # Arguments
    ///
    /// * `config` - Chunk size and pooling behaviour.
    /// * `formatters` - Registry used by [`write_serializable`](Self::write_serializable).
    pub fn new(config: Config, formatters: Arc<FormatterRegistry>) -> BinaryWriter {
        BinaryWriter {
            formatters,
            state: PassState::Idle,
            buffer: ChunkedBuffer::new(config.get_buffer_size(), config.is_pool_buffers()),
            stack: Vec::new(),
            scratch: Writer::default(),
            record_count: 0,
        }
    }

    pub fn is_serializing(&self) -> bool {
        self.state == PassState::InProgress
    }

    pub fn is_complete(&self) -> bool {
        self.state == PassState::Complete
    }

    /// Records written in the current or last pass, markers included.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn chunk_count(&self) -> usize {
        self.buffer.chunk_count()
    }

    /// Starts a pass, recycling the chunks of the previous one.
    pub fn begin_serialization(&mut self) -> Result<(), Error> {
        if self.is_serializing() {
            log::error!("begin_serialization called while a pass is already collecting");
            return Err(Error::not_allowed("serialization already in progress"));
        }
        self.buffer.reset();
        self.stack.clear();
        self.stack.push(Frame::new(ContextType::Root, 0));
        self.record_count = 0;
        self.state = PassState::InProgress;
        log::debug!("Binary serialization started");
        Ok(())
    }

    fn frame(&mut self) -> Result<&mut Frame, Error> {
        if !self.is_serializing() {
            log::error!("Write attempted outside a serialization pass");
            return Err(Error::not_allowed("no serialization in progress"));
        }
        self.stack
            .last_mut()
            .ok_or_else(|| Error::unknown("binary writer lost its root context"))
    }

    /// Fails if `key` is already taken in the current context. The key is
    /// only marked as taken once its record is written.
    fn check_key(&mut self, key: PropertyKey) -> Result<i32, Error> {
        let frame = self.frame()?;
        if frame.keys.contains(&key.hash()) {
            log::error!(
                "Duplicate key {:?} in context {:?} {}; keeping the first value",
                key,
                frame.context_type,
                frame.id
            );
            return Err(Error::duplicate_key(key.hash(), frame.id));
        }
        Ok(key.hash())
    }

    /// Frames one record and lets `payload` fill it in.
    fn put_record<F>(
        &mut self,
        property_type: PropertyType,
        flags: PropertyFlags,
        key: Option<i32>,
        payload_len: usize,
        payload: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut Writer),
    {
        let record_len =
            RECORD_HEADER_LEN + key.map_or(0, |_| KEY_LEN) + payload_len;
        if record_len > i32::MAX as usize {
            return Err(Error::encode_error(format!(
                "record of {} bytes exceeds the format limit",
                record_len
            )));
        }
        let writer = self.buffer.reserve_record(record_len)?;
        let start = writer.len();
        writer.write_i32(record_len as i32);
        writer.write_u8(property_type.into());
        writer.write_u8(flags.bits());
        if let Some(key) = key {
            writer.write_i32(key);
        }
        payload(writer);
        let written = writer.len() - start;
        if written != record_len {
            writer.truncate(start);
            return Err(Error::encode_error(format!(
                "{:?} record framed as {} bytes but wrote {}",
                property_type, record_len, written
            )));
        }
        self.record_count += 1;
        if let (Some(key), Some(frame)) = (key, self.stack.last_mut()) {
            frame.keys.insert(key);
        }
        Ok(())
    }

    /// Opens a sub-context of the current context.
    ///
    /// # Arguments
    ///
    /// * `context_type` - Checked against the matching [`pop_context`](Self::pop_context).
    /// * `id` - Must be unique among the current context's children.
    pub fn push_context(&mut self, context_type: ContextType, id: i32) -> Result<(), Error> {
        let parent = self.frame()?;
        if parent.child_ids.contains(&id) {
            log::error!(
                "Duplicate context id {} under {:?} {}",
                id,
                parent.context_type,
                parent.id
            );
            return Err(Error::duplicate_context(id, parent.id));
        }
        self.put_record(
            PropertyType::PushContext,
            PropertyFlags::UNNAMED,
            None,
            5,
            |w| {
                w.write_u8(context_type.into());
                w.write_i32(id);
            },
        )?;
        if let Some(parent) = self.stack.last_mut() {
            parent.child_ids.insert(id);
        }
        self.stack.push(Frame::new(context_type, id));
        Ok(())
    }

    /// Closes the current context. A type mismatch is logged, not rejected.
    pub fn pop_context(&mut self, context_type: ContextType) -> Result<(), Error> {
        self.frame()?;
        if self.stack.len() < 2 {
            log::error!("pop_context({:?}) called at the root context", context_type);
            return Err(Error::not_allowed("cannot pop the root context"));
        }
        if let Some(frame) = self.stack.last() {
            if frame.context_type != context_type {
                log::warn!(
                    "Context type mismatch on pop: expected {:?}, found {:?} (id {})",
                    context_type,
                    frame.context_type,
                    frame.id
                );
            }
        }
        self.close_frame()
    }

    fn close_frame(&mut self) -> Result<(), Error> {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Ok(()),
        };
        self.put_record(
            PropertyType::PopContext,
            PropertyFlags::UNNAMED,
            None,
            1,
            |w| w.write_u8(frame.context_type.into()),
        )
    }

    pub fn write_value<K: Into<PropertyKey>, T: PropertyValue>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<(), Error> {
        let key = self.check_key(key.into())?;
        self.put_record(
            T::PROPERTY_TYPE,
            PropertyFlags::NONE,
            Some(key),
            value.encoded_len(),
            |w| value.write_to(w),
        )
    }

    /// Writes a homogeneous array. An empty slice is stored without payload.
    pub fn write_values<K: Into<PropertyKey>, T: PropertyValue>(
        &mut self,
        key: K,
        values: &[T],
    ) -> Result<(), Error> {
        let key = self.check_key(key.into())?;
        if values.is_empty() {
            return self.put_record(
                T::PROPERTY_TYPE,
                PropertyFlags::IS_ARRAY | PropertyFlags::NULL_OR_EMPTY,
                Some(key),
                0,
                |_| {},
            );
        }
        self.put_record(
            T::PROPERTY_TYPE,
            PropertyFlags::IS_ARRAY,
            Some(key),
            values_encoded_len(values),
            |w| write_values_to(values, w),
        )
    }

    /// Writes `value` as an opaque blob produced by its registered formatter.
    pub fn write_serializable<K: Into<PropertyKey>, T: 'static>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<(), Error> {
        self.frame()?;
        self.scratch.reset();
        let formatter_id = self.formatters.write(value, &mut self.scratch).map_err(|e| {
            log::warn!("Cannot format {}: {}", std::any::type_name::<T>(), e);
            e
        })?;
        let key = self.check_key(key.into())?;
        let blob = std::mem::take(&mut self.scratch);
        let result = self.put_record(
            PropertyType::Serializable,
            PropertyFlags::NONE,
            Some(key),
            4 + blob.len(),
            |w| {
                w.write_i32(formatter_id);
                w.write_bytes(blob.as_slice());
            },
        );
        self.scratch = blob;
        result
    }

    /// Writes a list of blobs: one named header record, then one unnamed
    /// child record per element.
    pub fn write_serializables<K: Into<PropertyKey>, T: 'static>(
        &mut self,
        key: K,
        values: &[T],
    ) -> Result<(), Error> {
        self.frame()?;
        let formatter_id = self.formatters.formatter_id::<T>().ok_or_else(|| {
            log::warn!("No formatter registered for {}", std::any::type_name::<T>());
            Error::enhance_type_error::<T>(Error::type_error("no formatter registered"))
        })?;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.reset();
        let mut ends = Vec::with_capacity(values.len());
        for value in values {
            if let Err(e) = self.formatters.write(value, &mut scratch) {
                self.scratch = scratch;
                return Err(e);
            }
            ends.push(scratch.len());
        }
        let result = self.put_serializables(key.into(), formatter_id, scratch.as_slice(), &ends);
        self.scratch = scratch;
        result
    }

    fn put_serializables(
        &mut self,
        key: PropertyKey,
        formatter_id: i32,
        blobs: &[u8],
        ends: &[usize],
    ) -> Result<(), Error> {
        let key = self.check_key(key)?;
        if ends.is_empty() {
            return self.put_record(
                PropertyType::Serializable,
                PropertyFlags::IS_ARRAY | PropertyFlags::NULL_OR_EMPTY,
                Some(key),
                4,
                |w| w.write_i32(formatter_id),
            );
        }
        self.put_record(
            PropertyType::Serializable,
            PropertyFlags::IS_ARRAY,
            Some(key),
            8,
            |w| {
                w.write_i32(formatter_id);
                w.write_i32(ends.len() as i32);
            },
        )?;
        let mut start = 0;
        for &end in ends {
            let blob = &blobs[start..end];
            self.put_record(
                PropertyType::Serializable,
                PropertyFlags::UNNAMED,
                None,
                blob.len(),
                |w| {
                    w.write_bytes(blob);
                },
            )?;
            start = end;
        }
        Ok(())
    }

    /// Completes the pass and stamps the final chunk.
    ///
    /// Contexts still open are closed with pop markers so the blob stays
    /// readable, and the pass completes, but the imbalance is returned as
    /// [`Error::UnbalancedContext`].
    pub fn end_serialization(&mut self) -> Result<(), Error> {
        if !self.is_serializing() {
            log::error!("end_serialization called before begin_serialization");
            return Err(Error::not_allowed("no serialization in progress"));
        }
        let open = self.stack.len().saturating_sub(1);
        while self.stack.len() > 1 {
            self.close_frame()?;
        }
        self.stack.clear();
        self.buffer.finish()?;
        self.state = PassState::Complete;
        log::debug!(
            "Binary serialization finished: {} record(s), {} chunk(s), {} bytes",
            self.record_count,
            self.buffer.chunk_count(),
            self.buffer.total_len()
        );
        if open > 0 {
            log::error!("{} context(s) were not popped before end_serialization", open);
            return Err(Error::unbalanced_context(open));
        }
        Ok(())
    }

    fn flush_to<W: Write>(&self, stream: &mut W, total_len: i32) -> std::io::Result<()> {
        stream.write_all(&total_len.to_le_bytes())?;
        self.buffer.write_to(stream)?;
        stream.flush()
    }

    /// Writes `[i32 total_len]` followed by every chunk.
    ///
    /// I/O failures are logged and returned; nothing panics.
    pub fn write_to_stream<W: Write>(&self, stream: &mut W) -> Result<(), Error> {
        if !self.is_complete() {
            not_allowed!("no completed serialization pass to write");
        }
        let total_len = stream_len_prefix(self.buffer.total_len()).map_err(|e| {
            log::error!("Cannot write save data: {}", e);
            e
        })?;
        self.flush_to(stream, total_len).map_err(|e| {
            log::error!("Failed to write save data: {}", e);
            Error::from(e)
        })
    }

    /// The stream form of the last pass as one byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.buffer.total_len() + 4);
        self.write_to_stream(&mut out)?;
        Ok(out)
    }

    /// Drops the last pass's output, keeping pooled chunks.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.stack.clear();
        self.record_count = 0;
        self.state = PassState::Idle;
    }
}

impl SaveWriter for BinaryWriter {
    fn push_context(&mut self, context_type: ContextType, id: i32) -> Result<(), Error> {
        BinaryWriter::push_context(self, context_type, id)
    }

    fn pop_context(&mut self, context_type: ContextType) -> Result<(), Error> {
        BinaryWriter::pop_context(self, context_type)
    }

    fn write_value<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        BinaryWriter::write_value(self, key, value)
    }

    fn write_values<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        BinaryWriter::write_values(self, key, values)
    }

    fn write_serializable<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        BinaryWriter::write_serializable(self, key, value)
    }

    fn write_serializables<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        BinaryWriter::write_serializables(self, key, values)
    }
}
