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


//! Per-type payload encodings.
//!
//! Every property type implements [`PropertyValue`], which knows its wire
//! type, its exact encoded size (so the writer can frame a record before
//! writing it), its little-endian byte layout, and its conversion to the
//! intermediate [`Value`] used by the object codec.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::object::Value;
use crate::types::PropertyType;

mod datetime;
mod guid;
pub mod math;
mod number;
mod string;

pub use math::{Color, Color32};

pub trait PropertyValue: Sized + 'static {
    const PROPERTY_TYPE: PropertyType;

    /// Smallest possible encoding; bounds array counts read from disk.
    const MIN_ENCODED_LEN: usize = 1;

    /// Exact number of bytes `write_to` appends.
    fn encoded_len(&self) -> usize;

    fn write_to(&self, writer: &mut Writer);

    fn read_from(reader: &mut Reader) -> Result<Self, Error>;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

/// Payload size of a non-empty array: `[i32 count][elements]`.
pub fn values_encoded_len<T: PropertyValue>(values: &[T]) -> usize {
    4 + values.iter().map(PropertyValue::encoded_len).sum::<usize>()
}

pub fn write_values_to<T: PropertyValue>(values: &[T], writer: &mut Writer) {
    writer.write_i32(values.len() as i32);
    for value in values {
        value.write_to(writer);
    }
}

pub fn read_values_from<T: PropertyValue>(reader: &mut Reader) -> Result<Vec<T>, Error> {
    let count = reader.read_len(T::MIN_ENCODED_LEN)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(T::read_from(reader)?);
    }
    Ok(values)
}
