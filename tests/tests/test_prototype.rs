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
use savepack_core::error::Error;
use savepack_core::object::{ObjectReader, ObjectWriter};
use savepack_core::resolver::{
    read_prototype_reference, write_prototype_reference, FormatterRegistry, PrototypeRegistry,
};
use savepack_core::types::ContextType;
use std::sync::Arc;
use tests::init_logger;

#[derive(Clone, Debug, PartialEq)]
struct Prefab {
    mesh: &'static str,
    health: i32,
}

fn prefabs() -> PrototypeRegistry<Prefab> {
    let mut registry = PrototypeRegistry::new();
    registry
        .register(
            "enemies/grunt",
            Prefab {
                mesh: "grunt.mesh",
                health: 50,
            },
        )
        .unwrap();
    registry
        .register(
            "enemies/brute",
            Prefab {
                mesh: "brute.mesh",
                health: 300,
            },
        )
        .unwrap();
    registry
}

#[test]
fn test_spawned_objects_are_recreated_from_prototypes() {
    init_logger();
    let registry = prefabs();
    let brute_id = savepack_core::util::hash_key("enemies/brute");
    let brute = registry.instantiate(brute_id).unwrap();
    assert_eq!(registry.name_of(brute_id), Some("enemies/brute"));

    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    for (id, prefab) in [(100, &brute), (101, &brute)] {
        writer.push_context(ContextType::Object, id).unwrap();
        write_prototype_reference(&mut writer, "prefab", &registry, prefab).unwrap();
        writer.pop_context(ContextType::Object).unwrap();
    }
    let unknown = Prefab {
        mesh: "boss.mesh",
        health: 9000,
    };
    assert!(matches!(
        write_prototype_reference(&mut writer, "prefab", &registry, &unknown),
        Err(Error::InvalidRef(_))
    ));
    writer.end_serialization().unwrap();

    let mut reader = BinaryReader::default();
    reader
        .read_from_stream(&mut writer.to_bytes().unwrap().as_slice())
        .unwrap();
    reader.begin_deserialization().unwrap();
    let mut spawned = Vec::new();
    for id in reader.sub_context_ids(ContextType::Object) {
        assert!(reader.push_context(ContextType::Object, id));
        if let Some(prefab) = read_prototype_reference(&reader, "prefab", &registry) {
            spawned.push((id, prefab.clone()));
        }
        reader.pop_context(ContextType::Object);
    }
    assert_eq!(spawned, vec![(100, brute.clone()), (101, brute)]);
    assert!(read_prototype_reference(&reader, "prefab", &registry).is_none());
}

#[test]
fn test_unknown_prototype_id_reads_as_absent() {
    init_logger();
    let formatters = Arc::new(FormatterRegistry::new());
    let registry = prefabs();
    let grunt = Prefab {
        mesh: "grunt.mesh",
        health: 50,
    };
    assert!(registry.id_of(&grunt).is_some());

    let mut writer = ObjectWriter::new(formatters.clone());
    writer.begin_serialization().unwrap();
    write_prototype_reference(&mut writer, "prefab", &registry, &grunt).unwrap();
    writer.end_serialization().unwrap();
    let tree = writer.take_tree().unwrap();

    let mut reader = ObjectReader::with_tree(formatters, tree);
    reader.begin_deserialization().unwrap();
    let empty: PrototypeRegistry<Prefab> = PrototypeRegistry::new();
    assert!(read_prototype_reference(&reader, "prefab", &empty).is_none());
    assert_eq!(read_prototype_reference(&reader, "prefab", &registry), Some(&grunt));
}
