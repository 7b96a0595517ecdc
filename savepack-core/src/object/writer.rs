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
use crate::buffer::Writer;
use crate::codec::{PassState, SaveWriter};
use crate::error::Error;
use crate::resolver::FormatterRegistry;
use crate::serializer::PropertyValue;
use crate::types::{ContextType, PropertyKey, PropertyType};
use std::io::Write;
use std::sync::Arc;

pub struct ObjectWriter {
    formatters: Arc<FormatterRegistry>,
    state: PassState,
    // stack[0] is the root; finished children are folded into their parent on pop.
    stack: Vec<ObjectContext>,
    tree: Option<SaveTree>,
    scratch: Writer,
}

impl ObjectWriter {
    pub fn new(formatters: Arc<FormatterRegistry>) -> ObjectWriter {
        ObjectWriter {
            formatters,
            state: PassState::Idle,
            stack: Vec::new(),
            tree: None,
            scratch: Writer::default(),
        }
    }

    pub fn is_serializing(&self) -> bool {
        self.state == PassState::InProgress
    }

    pub fn begin_serialization(&mut self) -> Result<(), Error> {
        if self.is_serializing() {
            log::error!("begin_serialization called while a pass is already collecting");
            return Err(Error::not_allowed("serialization already in progress"));
        }
        self.stack.clear();
        self.stack.push(ObjectContext::new(ContextType::Root, 0));
        self.tree = None;
        self.state = PassState::InProgress;
        Ok(())
    }

    fn current(&mut self) -> Result<&mut ObjectContext, Error> {
        if !self.is_serializing() {
            return Err(Error::not_allowed("write outside a serialization pass"));
        }
        self.stack
            .last_mut()
            .ok_or_else(|| Error::unknown("object writer lost its root context"))
    }

    fn insert(&mut self, key: PropertyKey, value: Value) -> Result<(), Error> {
        let context = self.current()?;
        if !value.is_finite() {
            log::error!(
                "Property {:?} in context {:?} {} holds a NaN or infinite float",
                key,
                context.context_type,
                context.id
            );
            return Err(Error::encode_error(format!(
                "{:?} property {:?} is not finite",
                value.property_type(),
                key
            )));
        }
        if context.properties.contains_key(&key.hash()) {
            log::error!(
                "Duplicate key {:?} in context {:?} {}; keeping the first value",
                key,
                context.context_type,
                context.id
            );
            return Err(Error::duplicate_key(key.hash(), context.id));
        }
        context.properties.insert(key.hash(), value);
        Ok(())
    }

    pub fn push_context(&mut self, context_type: ContextType, id: i32) -> Result<(), Error> {
        let parent = self.current()?;
        if parent.sub_contexts.contains_key(&id) {
            log::error!("Duplicate context id {} under {:?} {}", id, parent.context_type, parent.id);
            return Err(Error::duplicate_context(id, parent.id));
        }
        self.stack.push(ObjectContext::new(context_type, id));
        Ok(())
    }

    pub fn pop_context(&mut self, context_type: ContextType) -> Result<(), Error> {
        self.current()?;
        if self.stack.len() < 2 {
            log::error!("pop_context({:?}) called at the root context", context_type);
            return Err(Error::not_allowed("cannot pop the root context"));
        }
        self.fold_top(Some(context_type));
        Ok(())
    }

    fn fold_top(&mut self, expected: Option<ContextType>) {
        if let Some(context) = self.stack.pop() {
            if let Some(expected) = expected {
                if context.context_type != expected {
                    log::warn!(
                        "Context type mismatch on pop: expected {:?}, found {:?} (id {})",
                        expected,
                        context.context_type,
                        context.id
                    );
                }
            }
            if let Some(parent) = self.stack.last_mut() {
                parent.sub_contexts.insert(context.id, context);
            }
        }
    }

    pub fn write_value<K: Into<PropertyKey>, T: PropertyValue>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<(), Error> {
        self.insert(key.into(), value.to_value())
    }

    pub fn write_values<K: Into<PropertyKey>, T: PropertyValue>(
        &mut self,
        key: K,
        values: &[T],
    ) -> Result<(), Error> {
        let value = Value::Array {
            element_type: T::PROPERTY_TYPE,
            items: values.iter().map(PropertyValue::to_value).collect(),
        };
        self.insert(key.into(), value)
    }

    pub fn write_serializable<K: Into<PropertyKey>, T: 'static>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<(), Error> {
        self.current()?;
        self.scratch.reset();
        let formatter_id = self.formatters.write(value, &mut self.scratch)?;
        let blob = self.scratch.dump();
        self.insert(key.into(), Value::Serializable { formatter_id, blob })
    }

    pub fn write_serializables<K: Into<PropertyKey>, T: 'static>(
        &mut self,
        key: K,
        values: &[T],
    ) -> Result<(), Error> {
        self.current()?;
        let formatter_id = self.formatters.formatter_id::<T>().ok_or_else(|| {
            log::warn!("No formatter registered for {}", std::any::type_name::<T>());
            Error::enhance_type_error::<T>(Error::type_error("no formatter registered"))
        })?;
        let mut blobs = Vec::with_capacity(values.len());
        for value in values {
            self.scratch.reset();
            self.formatters.write(value, &mut self.scratch)?;
            blobs.push(self.scratch.dump());
        }
        self.insert(key.into(), Value::SerializableArray { formatter_id, blobs })
    }

    /// Completes the pass. Open contexts are closed and reported as
    /// [`Error::UnbalancedContext`], but the tree is still produced.
    pub fn end_serialization(&mut self) -> Result<(), Error> {
        if !self.is_serializing() {
            log::error!("end_serialization called before begin_serialization");
            return Err(Error::not_allowed("no serialization in progress"));
        }
        let open = self.stack.len().saturating_sub(1);
        while self.stack.len() > 1 {
            self.fold_top(None);
        }
        let root = self
            .stack
            .pop()
            .unwrap_or_else(|| ObjectContext::new(ContextType::Root, 0));
        self.tree = Some(SaveTree { root });
        self.state = PassState::Complete;
        if open > 0 {
            log::error!("{} context(s) were not popped before end_serialization", open);
            return Err(Error::unbalanced_context(open));
        }
        Ok(())
    }

    pub fn tree(&self) -> Option<&SaveTree> {
        self.tree.as_ref()
    }

    pub fn take_tree(&mut self) -> Option<SaveTree> {
        self.state = PassState::Idle;
        self.tree.take()
    }

    pub fn write_to_stream<W: Write>(&self, stream: &mut W) -> Result<(), Error> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| Error::not_allowed("no completed serialization pass to write"))?;
        serde_json::to_writer(&mut *stream, tree)
            .map_err(Error::from)
            .and_then(|_| stream.flush().map_err(Error::from))
            .map_err(|e| {
                log::error!("Failed to write save tree: {}", e);
                e
            })
    }
}

impl SaveWriter for ObjectWriter {
    fn push_context(&mut self, context_type: ContextType, id: i32) -> Result<(), Error> {
        ObjectWriter::push_context(self, context_type, id)
    }

    fn pop_context(&mut self, context_type: ContextType) -> Result<(), Error> {
        ObjectWriter::pop_context(self, context_type)
    }

    fn write_value<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        ObjectWriter::write_value(self, key, value)
    }

    fn write_values<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        ObjectWriter::write_values(self, key, values)
    }

    fn write_serializable<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        ObjectWriter::write_serializable(self, key, value)
    }

    fn write_serializables<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static,
    {
        ObjectWriter::write_serializables(self, key, values)
    }
}
