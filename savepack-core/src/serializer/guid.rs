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
use uuid::Uuid;

impl PropertyValue for Uuid {
    const PROPERTY_TYPE: PropertyType = PropertyType::Guid;
    const MIN_ENCODED_LEN: usize = 16;

    fn encoded_len(&self) -> usize {
        16
    }

    fn write_to(&self, writer: &mut Writer) {
        writer.write_bytes(self.as_bytes());
    }

    fn read_from(reader: &mut Reader) -> Result<Self, Error> {
        let bytes = reader.read_bytes(16)?;
        Uuid::from_slice(bytes).map_err(|e| Error::invalid_data(e.to_string()))
    }

    fn to_value(&self) -> Value {
        Value::Guid(*self.as_bytes())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Guid(bytes) => Some(Uuid::from_bytes(*bytes)),
            _ => None,
        }
    }
}
