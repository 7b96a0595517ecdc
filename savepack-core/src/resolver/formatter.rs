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


//! Formatters for opaque nested blobs.
//!
//! The registry is an ordinary value owned by the application and handed to
//! writers and readers behind an `Arc`; there is no process-wide table.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::util::hash_key;
use std::any::{Any, TypeId};
use std::collections::HashMap;

type WriteFn<T> = fn(&T, &mut Writer) -> Result<(), Error>;
type ReadFn<T> = fn(&mut Reader) -> Result<T, Error>;

/// A type that knows how to turn itself into a blob and back.
pub trait Serializable: Sized + 'static {
    fn write_blob(&self, writer: &mut Writer) -> Result<(), Error>;

    fn read_blob(reader: &mut Reader) -> Result<Self, Error>;
}

struct Harness<T> {
    write_fn: WriteFn<T>,
    read_fn: ReadFn<T>,
}

pub struct FormatterInfo {
    formatter_id: i32,
    name: String,
    harness: Box<dyn Any + Send + Sync>,
}

impl FormatterInfo {
    pub fn get_formatter_id(&self) -> i32 {
        self.formatter_id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}

/// Maps Rust types to named blob formatters.
///
/// The formatter id written to disk is the key hash of the registered name,
/// so renaming a Rust type does not invalidate old saves as long as the name
/// stays the same.
///
/// ```rust
/// use savepack_core::buffer::{Reader, Writer};
/// use savepack_core::error::Error;
/// use savepack_core::resolver::FormatterRegistry;
///
/// #[derive(Debug, PartialEq)]
/// struct Ammo(u16);
///
/// fn write_ammo(v: &Ammo, w: &mut Writer) -> Result<(), Error> {
///     w.write_u16(v.0);
///     Ok(())
/// }
///
/// fn read_ammo(r: &mut Reader) -> Result<Ammo, Error> {
///     Ok(Ammo(r.read_u16()?))
/// }
///
/// let mut registry = FormatterRegistry::new();
/// let id = registry.register_with::<Ammo>("ammo", write_ammo, read_ammo).unwrap();
/// let mut writer = Writer::default();
/// assert_eq!(registry.write(&Ammo(30), &mut writer).unwrap(), id);
/// assert_eq!(registry.read::<Ammo>(id, writer.as_slice()).unwrap(), Ammo(30));
/// ```
#[derive(Default)]
pub struct FormatterRegistry {
    by_type: HashMap<TypeId, FormatterInfo>,
    by_id: HashMap<i32, TypeId>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Serializable>(&mut self, name: &str) -> Result<i32, Error> {
        self.register_with::<T>(name, T::write_blob, T::read_blob)
    }

    /// Registers plain functions, for types that cannot implement [`Serializable`].
    pub fn register_with<T: 'static>(
        &mut self,
        name: &str,
        write_fn: WriteFn<T>,
        read_fn: ReadFn<T>,
    ) -> Result<i32, Error> {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.by_type.get(&type_id) {
            return Err(Error::enhance_type_error::<T>(Error::type_error(format!(
                "type already registered as formatter '{}'",
                existing.name
            ))));
        }
        let formatter_id = hash_key(name);
        if let Some(other) = self.by_id.get(&formatter_id) {
            let other_name = self
                .by_type
                .get(other)
                .map(|info| info.name.as_str())
                .unwrap_or_default();
            return Err(Error::type_error(format!(
                "formatter name '{}' collides with '{}'",
                name, other_name
            )));
        }
        self.by_type.insert(
            type_id,
            FormatterInfo {
                formatter_id,
                name: name.to_owned(),
                harness: Box::new(Harness { write_fn, read_fn }),
            },
        );
        self.by_id.insert(formatter_id, type_id);
        Ok(formatter_id)
    }

    pub fn get_info<T: 'static>(&self) -> Option<&FormatterInfo> {
        self.by_type.get(&TypeId::of::<T>())
    }

    pub fn formatter_id<T: 'static>(&self) -> Option<i32> {
        self.get_info::<T>().map(FormatterInfo::get_formatter_id)
    }

    pub fn name_of(&self, formatter_id: i32) -> Option<&str> {
        self.by_id
            .get(&formatter_id)
            .and_then(|type_id| self.by_type.get(type_id))
            .map(FormatterInfo::get_name)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    fn harness<T: 'static>(&self) -> Result<(&FormatterInfo, &Harness<T>), Error> {
        let info = self.get_info::<T>().ok_or_else(|| {
            Error::enhance_type_error::<T>(Error::type_error("no formatter registered"))
        })?;
        let harness = info
            .harness
            .downcast_ref::<Harness<T>>()
            .ok_or_else(|| Error::enhance_type_error::<T>(Error::type_error("formatter type mismatch")))?;
        Ok((info, harness))
    }

    /// Appends the blob for `value` and returns its formatter id.
    pub fn write<T: 'static>(&self, value: &T, writer: &mut Writer) -> Result<i32, Error> {
        let (info, harness) = self.harness::<T>()?;
        (harness.write_fn)(value, writer)?;
        Ok(info.formatter_id)
    }

    /// Decodes a blob written under `formatter_id` as a `T`.
    pub fn read<T: 'static>(&self, formatter_id: i32, blob: &[u8]) -> Result<T, Error> {
        let (info, harness) = self.harness::<T>()?;
        if info.formatter_id != formatter_id {
            return Err(Error::enhance_type_error::<T>(Error::type_error(format!(
                "blob was written by formatter {:#010x}, expected '{}'",
                formatter_id, info.name
            ))));
        }
        (harness.read_fn)(&mut Reader::new(blob))
    }
}
