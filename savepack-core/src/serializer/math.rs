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


//! Vector, quaternion and colour properties.
//!
//! Float vectors and quaternions come from `glam`; colours are defined here
//! because the save format distinguishes a float RGBA colour from a packed
//! 8-bit one.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::object::{
    ColorData, Color32Data, QuaternionData, Value, Vector2Data, Vector2IntData, Vector3Data,
    Vector3IntData, Vector4Data,
};
use crate::serializer::PropertyValue;
use crate::types::PropertyType;
use glam::{IVec2, IVec3, Quat, Vec2, Vec3, Vec4};

/// Linear RGBA colour with float channels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }
}

/// RGBA colour packed into four bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color32 {
        Color32 { r, g, b, a }
    }
}

macro_rules! impl_vector_value {
    ($ty:ty, $variant:ident, $data:ident, $scalar:ty, $write:ident, $read:ident,
     [$($field:ident),+], $ctor:expr) => {
        impl PropertyValue for $ty {
            const PROPERTY_TYPE: PropertyType = PropertyType::$variant;
            const MIN_ENCODED_LEN: usize = [$(stringify!($field)),+].len() * std::mem::size_of::<$scalar>();

            #[inline(always)]
            fn encoded_len(&self) -> usize {
                Self::MIN_ENCODED_LEN
            }

            #[inline(always)]
            fn write_to(&self, writer: &mut Writer) {
                $(writer.$write(self.$field);)+
            }

            #[inline(always)]
            fn read_from(reader: &mut Reader) -> Result<Self, Error> {
                $(let $field = reader.$read()?;)+
                Ok($ctor($($field),+))
            }

            fn to_value(&self) -> Value {
                Value::$variant($data { $($field: self.$field),+ })
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(d) => Some($ctor($(d.$field),+)),
                    _ => None,
                }
            }
        }
    };
}

impl_vector_value!(Vec2, Vector2, Vector2Data, f32, write_f32, read_f32, [x, y], Vec2::new);
impl_vector_value!(Vec3, Vector3, Vector3Data, f32, write_f32, read_f32, [x, y, z], Vec3::new);
impl_vector_value!(Vec4, Vector4, Vector4Data, f32, write_f32, read_f32, [x, y, z, w], Vec4::new);
impl_vector_value!(IVec2, Vector2Int, Vector2IntData, i32, write_i32, read_i32, [x, y], IVec2::new);
impl_vector_value!(IVec3, Vector3Int, Vector3IntData, i32, write_i32, read_i32, [x, y, z], IVec3::new);
impl_vector_value!(Quat, Quaternion, QuaternionData, f32, write_f32, read_f32, [x, y, z, w], Quat::from_xyzw);
impl_vector_value!(Color, Color, ColorData, f32, write_f32, read_f32, [r, g, b, a], Color::new);
impl_vector_value!(Color32, Color32, Color32Data, u8, write_u8, read_u8, [r, g, b, a], Color32::new);
