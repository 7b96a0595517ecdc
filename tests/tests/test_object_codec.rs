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


use chrono::{NaiveDate, NaiveDateTime};
use glam::{Quat, Vec3};
use savepack_core::binary::{BinaryReader, BinaryWriter};
use savepack_core::codec::{read_persistent, write_persistent, Persistent, SaveReader, SaveWriter};
use savepack_core::error::Error;
use savepack_core::object::{ObjectReader, ObjectWriter, Value, Vector3Data};
use savepack_core::resolver::FormatterRegistry;
use savepack_core::serializer::Color32;
use savepack_core::types::{ContextType, PropertyType};
use std::sync::Arc;
use tests::init_logger;

#[derive(Debug, Default, PartialEq)]
struct Turret {
    yaw: Quat,
    muzzle: Vec3,
    tint: Color32,
    targets: Vec<i64>,
    armed: bool,
}

impl Persistent for Turret {
    fn write_properties<W: SaveWriter>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_value("yaw", &self.yaw)?;
        writer.write_value("muzzle", &self.muzzle)?;
        writer.write_value("tint", &self.tint)?;
        writer.write_values("targets", &self.targets)?;
        writer.write_value("armed", &self.armed)
    }

    fn read_properties<R: SaveReader>(&mut self, reader: &mut R) {
        self.yaw = reader.read_value_or("yaw", Quat::IDENTITY);
        self.muzzle = reader.read_value_or("muzzle", Vec3::ZERO);
        self.tint = reader.read_value_or("tint", Color32::default());
        self.targets = reader.try_read_values("targets").unwrap_or_default();
        self.armed = reader.read_value_or("armed", false);
    }
}

fn sample() -> Turret {
    Turret {
        yaw: Quat::from_xyzw(0.0, 0.5, 0.0, 0.5),
        muzzle: Vec3::new(0.0, 1.5, -0.25),
        tint: Color32::new(255, 0, 0, 128),
        targets: vec![3, 1 << 40],
        armed: true,
    }
}

fn save<W: SaveWriter>(writer: &mut W, turret: &Turret) -> Result<(), Error> {
    writer.push_context(ContextType::Scene, 1)?;
    write_persistent(writer, ContextType::Object, 8, turret)?;
    writer.pop_context(ContextType::Scene)
}

fn restore<R: SaveReader>(reader: &mut R) -> Option<Turret> {
    let mut turret = Turret::default();
    if !reader.push_context(ContextType::Scene, 1) {
        return None;
    }
    let found = read_persistent(reader, ContextType::Object, 8, &mut turret);
    reader.pop_context(ContextType::Scene);
    found.then_some(turret)
}

#[test]
fn test_both_codecs_share_the_contract() {
    init_logger();
    let formatters = Arc::new(FormatterRegistry::new());
    let turret = sample();

    let mut binary = BinaryWriter::default();
    binary.begin_serialization().unwrap();
    save(&mut binary, &turret).unwrap();
    binary.end_serialization().unwrap();
    let mut binary_reader = BinaryReader::default();
    binary_reader
        .read_from_stream(&mut binary.to_bytes().unwrap().as_slice())
        .unwrap();
    binary_reader.begin_deserialization().unwrap();

    let mut object = ObjectWriter::new(formatters.clone());
    object.begin_serialization().unwrap();
    save(&mut object, &turret).unwrap();
    object.end_serialization().unwrap();
    let mut object_reader = ObjectReader::with_tree(formatters, object.take_tree().unwrap());
    object_reader.begin_deserialization().unwrap();

    assert_eq!(restore(&mut binary_reader), Some(sample()));
    assert_eq!(restore(&mut object_reader), Some(sample()));
}

#[test]
fn test_tree_is_inspectable() {
    init_logger();
    let mut writer = ObjectWriter::new(Arc::new(FormatterRegistry::new()));
    writer.begin_serialization().unwrap();
    save(&mut writer, &sample()).unwrap();
    writer.end_serialization().unwrap();

    let tree = writer.tree().unwrap();
    let turret = tree.context_at(&[1, 8]).unwrap();
    assert_eq!(turret.context_type, ContextType::Object);
    assert_eq!(
        turret.get_property("muzzle"),
        Some(&Value::Vector3(Vector3Data {
            x: 0.0,
            y: 1.5,
            z: -0.25
        }))
    );
    let targets = turret.get_property("targets").unwrap();
    assert!(targets.is_array());
    assert_eq!(targets.property_type(), PropertyType::Long);
    assert!(tree.context_at(&[1, 9]).is_none());
}

#[test]
fn test_tree_persists_as_json() {
    init_logger();
    let formatters = Arc::new(FormatterRegistry::new());
    let mut writer = ObjectWriter::new(formatters.clone());
    writer.begin_serialization().unwrap();
    save(&mut writer, &sample()).unwrap();
    writer.write_value("title", &String::from("checkpoint \u{2603}")).unwrap();
    writer.end_serialization().unwrap();

    let mut json = Vec::new();
    writer.write_to_stream(&mut json).unwrap();
    let mut reader = ObjectReader::from_stream(formatters, &mut json.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(
        reader.try_read_value::<_, String>("title"),
        Some(String::from("checkpoint \u{2603}"))
    );
    assert_eq!(restore(&mut reader), Some(sample()));
    reader.end_deserialization();
    assert!(reader.begin_deserialization().is_err());
}

#[test]
fn test_non_finite_floats_are_rejected_at_write_time() {
    init_logger();
    let formatters = Arc::new(FormatterRegistry::new());
    let mut writer = ObjectWriter::new(formatters.clone());
    writer.begin_serialization().unwrap();
    writer.write_value("hp", &75i32).unwrap();
    assert!(matches!(
        writer.write_value("spread", &f32::NAN),
        Err(Error::EncodeError(_))
    ));
    assert!(matches!(
        writer.write_value("drift", &Vec3::new(0.0, f32::INFINITY, 0.0)),
        Err(Error::EncodeError(_))
    ));
    assert!(matches!(
        writer.write_values("samples", &[1.0f64, f64::NEG_INFINITY]),
        Err(Error::EncodeError(_))
    ));
    // a rejected value leaves the key free
    writer.write_value("spread", &0.5f32).unwrap();
    writer.end_serialization().unwrap();

    let mut json = Vec::new();
    writer.write_to_stream(&mut json).unwrap();
    let mut reader = ObjectReader::from_stream(formatters, &mut json.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.try_read_value::<_, i32>("hp"), Some(75));
    assert_eq!(reader.try_read_value::<_, f32>("spread"), Some(0.5));
    assert!(!reader.has_property("drift"));
    assert!(!reader.has_property("samples"));
}

#[test]
fn test_timestamps_keep_nanoseconds_through_json() {
    init_logger();
    let stamp = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_nano_opt(12, 0, 0, 123_456_789)
        .unwrap();
    let formatters = Arc::new(FormatterRegistry::new());
    let mut writer = ObjectWriter::new(formatters.clone());
    writer.begin_serialization().unwrap();
    writer.write_value("saved_at", &stamp).unwrap();
    writer.end_serialization().unwrap();

    let mut json = Vec::new();
    writer.write_to_stream(&mut json).unwrap();
    let mut reader = ObjectReader::from_stream(formatters, &mut json.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(
        reader.try_read_value::<_, NaiveDateTime>("saved_at"),
        Some(stamp)
    );
}

#[test]
fn test_object_reader_is_tolerant() {
    init_logger();
    let mut writer = ObjectWriter::new(Arc::new(FormatterRegistry::new()));
    writer.begin_serialization().unwrap();
    writer.write_value("level", &3u16).unwrap();
    writer.push_context(ContextType::Object, 1).unwrap();
    writer.pop_context(ContextType::Object).unwrap();
    writer.end_serialization().unwrap();

    let mut reader =
        ObjectReader::with_tree(Arc::new(FormatterRegistry::new()), writer.take_tree().unwrap());
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.try_read_value::<_, u32>("level"), None);
    assert_eq!(reader.try_read_values::<_, u16>("level"), None);
    assert_eq!(reader.read_value_or("missing", 5u16), 5);
    assert!(!reader.push_context(ContextType::Component, 1));
    assert!(!reader.pop_context(ContextType::Root));
    assert!(reader.push_context(ContextType::Object, 1));
    assert_eq!(reader.current_context(), Some((ContextType::Object, 1)));
    assert_eq!(reader.sub_context_ids(ContextType::Object), Vec::<i32>::new());
}

#[test]
fn test_malformed_json_is_an_error() {
    init_logger();
    let bytes = b"{\"root\": 12}";
    assert!(matches!(
        ObjectReader::from_stream(Arc::new(FormatterRegistry::new()), &mut &bytes[..]),
        Err(Error::Json(_))
    ));
}
