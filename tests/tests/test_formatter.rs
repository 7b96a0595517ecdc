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


use savepack_core::binary::{BinaryReader, BinaryWriter};
use savepack_core::buffer::{Reader, Writer};
use savepack_core::config::Config;
use savepack_core::error::Error;
use savepack_core::object::{ObjectReader, ObjectWriter};
use savepack_core::resolver::{FormatterRegistry, Serializable};
use savepack_core::types::ContextType;
use std::sync::Arc;
use tests::init_logger;

#[derive(Debug, Clone, PartialEq)]
struct Quest {
    title: String,
    stage: u8,
}

impl Serializable for Quest {
    fn write_blob(&self, writer: &mut Writer) -> Result<(), Error> {
        let units: Vec<u16> = self.title.encode_utf16().collect();
        writer.write_utf16(&units);
        writer.write_u8(self.stage);
        Ok(())
    }

    fn read_blob(reader: &mut Reader) -> Result<Self, Error> {
        let units = reader.read_utf16()?;
        let title = String::from_utf16(&units).map_err(|_| Error::invalid_data("bad title"))?;
        Ok(Quest {
            title,
            stage: reader.read_u8()?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Waypoint(i32);

fn registry() -> Arc<FormatterRegistry> {
    let mut registry = FormatterRegistry::new();
    registry.register::<Quest>("quest").unwrap();
    registry
        .register_with::<Waypoint>(
            "waypoint",
            |w, out| {
                out.write_i32(w.0);
                Ok(())
            },
            |r| Ok(Waypoint(r.read_i32()?)),
        )
        .unwrap();
    Arc::new(registry)
}

fn quests() -> Vec<Quest> {
    vec![
        Quest {
            title: "Find the key".into(),
            stage: 2,
        },
        Quest {
            title: "x".repeat(120),
            stage: 0,
        },
        Quest {
            title: String::new(),
            stage: 9,
        },
    ]
}

#[test]
fn test_serializables_in_binary_codec() {
    init_logger();
    let formatters = registry();
    let mut writer = BinaryWriter::new(Config::default().buffer_size(96), formatters.clone());
    writer.begin_serialization().unwrap();
    writer.push_context(ContextType::Data, 1).unwrap();
    writer.write_serializable("active", &quests()[0]).unwrap();
    writer.write_serializables("log", &quests()).unwrap();
    writer.write_serializables::<_, Quest>("none", &[]).unwrap();
    writer.write_serializable("home", &Waypoint(-3)).unwrap();
    writer.write_value("after", &1i32).unwrap();
    writer.pop_context(ContextType::Data).unwrap();
    writer.end_serialization().unwrap();

    let mut reader = BinaryReader::new(Config::default(), formatters);
    reader
        .read_from_stream(&mut writer.to_bytes().unwrap().as_slice())
        .unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.fault_count(), 0);
    assert!(reader.push_context(ContextType::Data, 1));
    assert_eq!(
        reader.try_read_serializable::<_, Quest>("active"),
        Some(quests()[0].clone())
    );
    assert_eq!(reader.try_read_serializables::<_, Quest>("log"), Some(quests()));
    assert_eq!(
        reader.try_read_serializables::<_, Quest>("none"),
        Some(Vec::new())
    );
    assert_eq!(
        reader.try_read_serializable::<_, Waypoint>("home"),
        Some(Waypoint(-3))
    );
    assert_eq!(reader.try_read_value::<_, i32>("after"), Some(1));
}

#[test]
fn test_formatter_mismatch_reads_as_absent() {
    init_logger();
    let formatters = registry();
    let mut writer = BinaryWriter::new(Config::default(), formatters.clone());
    writer.begin_serialization().unwrap();
    writer.write_serializable("home", &Waypoint(4)).unwrap();
    writer.write_serializables("log", &quests()).unwrap();
    writer.end_serialization().unwrap();
    let bytes = writer.to_bytes().unwrap();

    let mut reader = BinaryReader::new(Config::default(), formatters);
    reader.read_from_stream(&mut bytes.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.try_read_serializable::<_, Quest>("home"), None);
    assert_eq!(reader.try_read_serializables::<_, Waypoint>("log"), None);
    assert_eq!(reader.try_read_serializable::<_, Quest>("log"), None);
    assert_eq!(reader.try_read_value::<_, i32>("home"), None);

    // a reader without the formatters cannot decode the blobs
    let mut bare = BinaryReader::default();
    bare.read_from_stream(&mut bytes.as_slice()).unwrap();
    bare.begin_deserialization().unwrap();
    assert!(bare.has_property("home"));
    assert_eq!(bare.try_read_serializable::<_, Waypoint>("home"), None);
}

#[test]
fn test_unregistered_type_is_rejected_by_writers() {
    init_logger();
    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    assert!(matches!(
        writer.write_serializable("home", &Waypoint(1)),
        Err(Error::TypeError(_))
    ));
    assert!(writer.write_serializables("homes", &[Waypoint(1)]).is_err());
    // the key was not consumed
    writer.write_value("home", &1u8).unwrap();
    writer.end_serialization().unwrap();

    let mut object = ObjectWriter::new(Arc::new(FormatterRegistry::new()));
    object.begin_serialization().unwrap();
    assert!(object.write_serializable("home", &Waypoint(1)).is_err());
}

#[test]
fn test_serializables_in_object_codec() {
    init_logger();
    let formatters = registry();
    let mut writer = ObjectWriter::new(formatters.clone());
    writer.begin_serialization().unwrap();
    writer.write_serializable("home", &Waypoint(12)).unwrap();
    writer.write_serializables("log", &quests()).unwrap();
    writer.end_serialization().unwrap();

    let mut json = Vec::new();
    writer.write_to_stream(&mut json).unwrap();
    let mut reader = ObjectReader::from_stream(formatters, &mut json.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(
        reader.try_read_serializable::<_, Waypoint>("home"),
        Some(Waypoint(12))
    );
    assert_eq!(reader.try_read_serializables::<_, Quest>("log"), Some(quests()));
    assert_eq!(reader.try_read_serializable::<_, Quest>("home"), None);
}

#[derive(Debug, PartialEq)]
struct Beacon;

#[test]
fn test_empty_list_keeps_its_formatter() {
    init_logger();
    let formatters = registry();
    let none: Vec<Quest> = Vec::new();

    let mut binary = BinaryWriter::new(Config::default(), formatters.clone());
    binary.begin_serialization().unwrap();
    binary.write_serializables("log", &none).unwrap();
    binary.end_serialization().unwrap();
    let bytes = binary.to_bytes().unwrap();
    let mut reader = BinaryReader::new(Config::default(), formatters.clone());
    reader.read_from_stream(&mut bytes.as_slice()).unwrap();
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.try_read_serializables::<_, Quest>("log"), Some(Vec::new()));
    assert_eq!(reader.try_read_serializables::<_, Waypoint>("log"), None);
    assert_eq!(reader.try_read_serializables::<_, Beacon>("log"), None);

    let mut object = ObjectWriter::new(formatters.clone());
    object.begin_serialization().unwrap();
    object.write_serializables("log", &none).unwrap();
    object.end_serialization().unwrap();
    let mut reader = ObjectReader::with_tree(formatters, object.take_tree().unwrap());
    reader.begin_deserialization().unwrap();
    assert_eq!(reader.try_read_serializables::<_, Quest>("log"), Some(Vec::new()));
    assert_eq!(reader.try_read_serializables::<_, Waypoint>("log"), None);
    assert_eq!(reader.try_read_serializables::<_, Beacon>("log"), None);
}
