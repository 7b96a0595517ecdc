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


use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::object::Value;
use crate::serializer::PropertyValue;
use crate::types::PropertyType;

// Strings travel as UTF-16 code units so that surrogate pairs survive
// unchanged; the count prefix is in units, not bytes.
impl PropertyValue for String {
    const PROPERTY_TYPE: PropertyType = PropertyType::String;
    const MIN_ENCODED_LEN: usize = 4;

    #[inline]
    fn encoded_len(&self) -> usize {
        4 + self.encode_utf16().count() * 2
    }

    #[inline]
    fn write_to(&self, writer: &mut Writer) {
        let units: Vec<u16> = self.encode_utf16().collect();
        writer.write_utf16(&units);
    }

    #[inline]
    fn read_from(reader: &mut Reader) -> Result<Self, Error> {
        let units = reader.read_utf16()?;
        String::from_utf16(&units)
            .map_err(|e| Error::invalid_data(format!("invalid UTF-16 string: {}", e)))
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}
