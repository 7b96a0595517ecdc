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


//! Contract shared by the binary codec and the object-graph codec.
//!
//! Game objects implement [`Persistent`] against these traits and never see
//! which backend is in use.

use crate::error::Error;
use crate::serializer::PropertyValue;
use crate::types::{ContextType, PropertyKey};

/// Lifecycle of a writer or reader instance. Passes are not reentrant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    /// Between `begin_*` and `end_*`.
    InProgress,
    /// Writer only: the pass ended and the output can be flushed.
    Complete,
}

pub trait SaveWriter {
    fn push_context(&mut self, context_type: ContextType, id: i32) -> Result<(), Error>;

    fn pop_context(&mut self, context_type: ContextType) -> Result<(), Error>;

    fn write_value<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue;

    fn write_values<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: PropertyValue;

    /// Writes an opaque blob produced by the formatter registered for `T`.
    fn write_serializable<K, T>(&mut self, key: K, value: &T) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static;

    fn write_serializables<K, T>(&mut self, key: K, values: &[T]) -> Result<(), Error>
    where
        K: Into<PropertyKey>,
        T: 'static;
}

/// Read side of the contract. Nothing here fails: a missing key, or one
/// stored with a different type or array-ness, reads as `None`.
pub trait SaveReader {
    /// Enters the sub-context `id` of the current context. Returns `false`
    /// when it does not exist, which is how objects added after a save was
    /// made are skipped.
    fn push_context(&mut self, context_type: ContextType, id: i32) -> bool;

    fn pop_context(&mut self, context_type: ContextType) -> bool;

    fn try_read_value<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: PropertyValue;

    fn try_read_values<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: PropertyValue;

    fn try_read_serializable<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<PropertyKey>,
        T: 'static;

    fn try_read_serializables<K, T>(&self, key: K) -> Option<Vec<T>>
    where
        K: Into<PropertyKey>,
        T: 'static;

    fn read_value_or<K, T>(&self, key: K, default: T) -> T
    where
        K: Into<PropertyKey>,
        T: PropertyValue,
    {
        self.try_read_value(key).unwrap_or(default)
    }
}

/// An object that stores its state as keyed properties of one context.
pub trait Persistent {
    fn write_properties<W: SaveWriter>(&self, writer: &mut W) -> Result<(), Error>;

    fn read_properties<R: SaveReader>(&mut self, reader: &mut R);
}

/// Writes `value` inside its own context. The context is popped even if
/// `write_properties` fails so the stack stays balanced.
pub fn write_persistent<W, P>(
    writer: &mut W,
    context_type: ContextType,
    id: i32,
    value: &P,
) -> Result<(), Error>
where
    W: SaveWriter,
    P: Persistent + ?Sized,
{
    writer.push_context(context_type, id)?;
    let result = value.write_properties(writer);
    writer.pop_context(context_type)?;
    result
}

/// Restores `value` from its context; `false` if the context was never saved.
pub fn read_persistent<R, P>(reader: &mut R, context_type: ContextType, id: i32, value: &mut P) -> bool
where
    R: SaveReader,
    P: Persistent + ?Sized,
{
    if !reader.push_context(context_type, id) {
        return false;
    }
    value.read_properties(reader);
    reader.pop_context(context_type);
    true
}
