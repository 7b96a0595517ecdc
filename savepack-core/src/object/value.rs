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


use crate::types::PropertyType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2Data {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector2IntData {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector3IntData {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuaternionData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorData {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color32Data {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A property as stored by the object-graph codec.
///
/// JSON has no NaN or infinities, so [`ObjectWriter`](super::ObjectWriter)
/// rejects any value for which [`is_finite`](Self::is_finite) is false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    SByte(i8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
    Vector2(Vector2Data),
    Vector3(Vector3Data),
    Vector4(Vector4Data),
    Vector2Int(Vector2IntData),
    Vector3Int(Vector3IntData),
    Quaternion(QuaternionData),
    Color(ColorData),
    Color32(Color32Data),
    Guid([u8; 16]),
    /// Seconds since the Unix epoch and the sub-second nanoseconds.
    DateTime { secs: i64, nanos: u32 },
    Array {
        element_type: PropertyType,
        items: Vec<Value>,
    },
    Serializable {
        formatter_id: i32,
        blob: Vec<u8>,
    },
    SerializableArray {
        formatter_id: i32,
        blobs: Vec<Vec<u8>>,
    },
}

impl Value {
    /// The wire type this value would be written with. Arrays report their
    /// element type.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Value::Bool(_) => PropertyType::Bool,
            Value::Byte(_) => PropertyType::Byte,
            Value::SByte(_) => PropertyType::SByte,
            Value::Short(_) => PropertyType::Short,
            Value::UShort(_) => PropertyType::UShort,
            Value::Int(_) => PropertyType::Int,
            Value::UInt(_) => PropertyType::UInt,
            Value::Long(_) => PropertyType::Long,
            Value::ULong(_) => PropertyType::ULong,
            Value::Float(_) => PropertyType::Float,
            Value::Double(_) => PropertyType::Double,
            Value::String(_) => PropertyType::String,
            Value::Vector2(_) => PropertyType::Vector2,
            Value::Vector3(_) => PropertyType::Vector3,
            Value::Vector4(_) => PropertyType::Vector4,
            Value::Vector2Int(_) => PropertyType::Vector2Int,
            Value::Vector3Int(_) => PropertyType::Vector3Int,
            Value::Quaternion(_) => PropertyType::Quaternion,
            Value::Color(_) => PropertyType::Color,
            Value::Color32(_) => PropertyType::Color32,
            Value::Guid(_) => PropertyType::Guid,
            Value::DateTime { .. } => PropertyType::DateTime,
            Value::Array { element_type, .. } => *element_type,
            Value::Serializable { .. } | Value::SerializableArray { .. } => {
                PropertyType::Serializable
            }
        }
    }

    /// False when any float component, array items included, is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(v) => v.is_finite(),
            Value::Double(v) => v.is_finite(),
            Value::Vector2(v) => v.x.is_finite() && v.y.is_finite(),
            Value::Vector3(v) => [v.x, v.y, v.z].iter().all(|c| c.is_finite()),
            Value::Vector4(v) => [v.x, v.y, v.z, v.w].iter().all(|c| c.is_finite()),
            Value::Quaternion(v) => [v.x, v.y, v.z, v.w].iter().all(|c| c.is_finite()),
            Value::Color(v) => [v.r, v.g, v.b, v.a].iter().all(|c| c.is_finite()),
            Value::Array { items, .. } => items.iter().all(Value::is_finite),
            _ => true,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array { .. } | Value::SerializableArray { .. })
    }
}
