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
use chrono::{DateTime, NaiveDateTime};
use std::mem;

// seconds since the Unix epoch, then the sub-second nanos (>= 1e9 inside a leap second)
const ENCODED_LEN: usize = mem::size_of::<i64>() + mem::size_of::<u32>();

fn split(dt: &NaiveDateTime) -> (i64, u32) {
    let utc = dt.and_utc();
    (utc.timestamp(), utc.timestamp_subsec_nanos())
}

fn join(secs: i64, nanos: u32) -> Result<NaiveDateTime, Error> {
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            Error::invalid_data(format!("timestamp out of range: {}s {}ns", secs, nanos))
        })
}

impl PropertyValue for NaiveDateTime {
    const PROPERTY_TYPE: PropertyType = PropertyType::DateTime;
    const MIN_ENCODED_LEN: usize = ENCODED_LEN;

    fn encoded_len(&self) -> usize {
        ENCODED_LEN
    }

    fn write_to(&self, writer: &mut Writer) {
        let (secs, nanos) = split(self);
        writer.write_i64(secs);
        writer.write_u32(nanos);
    }

    fn read_from(reader: &mut Reader) -> Result<Self, Error> {
        let secs = reader.read_i64()?;
        let nanos = reader.read_u32()?;
        join(secs, nanos)
    }

    fn to_value(&self) -> Value {
        let (secs, nanos) = split(self);
        Value::DateTime { secs, nanos }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime { secs, nanos } => join(*secs, *nanos).ok(),
            _ => None,
        }
    }
}
