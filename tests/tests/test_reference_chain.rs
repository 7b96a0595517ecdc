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
use savepack_core::resolver::{
    build_component_chain, build_object_chain, component_discriminator, resolve_object_chain,
    scene_path_hash, ReferenceResolver, SAME_SCENE,
};
use savepack_core::types::ContextType;
use tests::{init_logger, sample_world, World};

fn node(world: &World, name: &str) -> tests::NodeId {
    world.find(name).unwrap()
}

fn reload(writer: &BinaryWriter) -> BinaryReader {
    let mut reader = BinaryReader::default();
    reader
        .read_from_stream(&mut writer.to_bytes().unwrap().as_slice())
        .unwrap();
    reader.begin_deserialization().unwrap();
    reader
}

#[test]
fn test_three_level_reference_round_trip() {
    init_logger();
    let world = sample_world();
    let root = node(&world, "root");
    let grandchild = node(&world, "grandchild");
    let resolver = ReferenceResolver::new();

    assert_eq!(
        build_object_chain(&world, &root, &grandchild).unwrap(),
        vec![SAME_SCENE, 10]
    );
    assert_eq!(
        build_object_chain(&world, &grandchild, &root).unwrap(),
        vec![SAME_SCENE, 10, 20, 30]
    );

    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    writer.push_context(ContextType::Object, 30).unwrap();
    resolver
        .write_object_reference(&mut writer, "target", &world, Some(&root), &grandchild)
        .unwrap();
    resolver
        .write_object_reference(&mut writer, "self", &world, Some(&grandchild), &grandchild)
        .unwrap();
    resolver
        .write_object_reference(&mut writer, "nothing", &world, None, &grandchild)
        .unwrap();
    writer.pop_context(ContextType::Object).unwrap();
    writer.end_serialization().unwrap();

    // resolve against a freshly built hierarchy with the same keys
    let rebuilt = sample_world();
    let holder = node(&rebuilt, "grandchild");
    let mut reader = reload(&writer);
    let mut resolver = ReferenceResolver::new();
    assert!(reader.push_context(ContextType::Object, 30));
    let target = resolver.read_object_reference(&reader, "target", &rebuilt, &holder);
    assert_eq!(target.map(|n| rebuilt.name(n).to_string()), Some("root".into()));
    assert_eq!(
        resolver.read_object_reference(&reader, "self", &rebuilt, &holder),
        Some(holder)
    );
    assert!(!reader.has_property("nothing"));
    assert_eq!(
        resolver.read_object_reference(&reader, "nothing", &rebuilt, &holder),
        None
    );
    assert_eq!(resolver.unresolved_count(), 0);
}

#[test]
fn test_excluded_target_fails_to_write() {
    init_logger();
    let mut world = sample_world();
    let root = node(&world, "root");
    let child = node(&world, "child");
    let grandchild = node(&world, "grandchild");
    world.exclude(child);

    assert!(matches!(
        build_object_chain(&world, &grandchild, &root),
        Err(Error::InvalidRef(_))
    ));

    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    let resolver = ReferenceResolver::new();
    assert!(resolver
        .write_object_reference(&mut writer, "target", &world, Some(&grandchild), &root)
        .is_err());
    writer.end_serialization().unwrap();

    let reader = reload(&writer);
    assert!(!reader.has_property("target"));
}

#[test]
fn test_cross_scene_reference_uses_scene_hash() {
    init_logger();
    let world = sample_world();
    let grandchild = node(&world, "grandchild");
    let other_root = node(&world, "other_root");
    let lever = node(&world, "lever");

    let same_scene = build_object_chain(&world, &other_root, &grandchild).unwrap();
    assert_eq!(same_scene, vec![SAME_SCENE, 11]);
    let cross_scene = build_object_chain(&world, &lever, &grandchild).unwrap();
    assert_eq!(cross_scene, vec![scene_path_hash("Scenes/Level2"), 10, 5]);

    assert_eq!(
        resolve_object_chain(&world, &same_scene, &grandchild),
        Some(other_root)
    );
    assert_eq!(
        resolve_object_chain(&world, &cross_scene, &grandchild),
        Some(lever)
    );
    // the scene slot decides where root key 10 is looked up
    assert_eq!(
        resolve_object_chain(&world, &[SAME_SCENE, 10], &grandchild),
        Some(node(&world, "root"))
    );
    assert_eq!(
        resolve_object_chain(&world, &[scene_path_hash("Scenes/Level2"), 10], &grandchild),
        Some(node(&world, "gate"))
    );
}

#[test]
fn test_component_references() {
    init_logger();
    let mut world = sample_world();
    let root = node(&world, "root");
    let grandchild = node(&world, "grandchild");
    let second_light = tests::ComponentRef {
        owner: grandchild,
        type_name: "Light",
        ordinal: 1,
    };
    let door = world.add_component(root, "Door");

    assert_eq!(
        build_component_chain(&world, &second_light, &root).unwrap(),
        vec![SAME_SCENE, 10, 20, 30, component_discriminator("Light", 1)]
    );
    assert_eq!(
        build_component_chain(&world, &door, &root).unwrap(),
        vec![component_discriminator("Door", 0)]
    );

    let resolver = ReferenceResolver::new();
    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    resolver
        .write_component_reference(&mut writer, "light", &world, Some(&second_light), &root)
        .unwrap();
    resolver
        .write_component_reference(&mut writer, "door", &world, Some(&door), &root)
        .unwrap();
    writer.end_serialization().unwrap();

    let reader = reload(&writer);
    let mut resolver = ReferenceResolver::new();
    assert_eq!(
        resolver.read_component_reference(&reader, "light", &world, &root),
        Some(second_light)
    );
    assert_eq!(
        resolver.read_component_reference(&reader, "door", &world, &root),
        Some(door)
    );
    // read from another holder, the single-element chain looks on that holder
    assert_eq!(
        resolver.read_component_reference(&reader, "door", &world, &grandchild),
        Some(tests::ComponentRef {
            owner: grandchild,
            type_name: "Door",
            ordinal: 0,
        })
    );
}

#[test]
fn test_broken_chain_resolves_to_none_and_logs_once() {
    init_logger();
    let world = sample_world();
    let root = node(&world, "root");
    let lever = node(&world, "lever");

    let resolver = ReferenceResolver::new();
    let mut writer = BinaryWriter::default();
    writer.begin_serialization().unwrap();
    resolver
        .write_object_reference(&mut writer, "lever", &world, Some(&lever), &root)
        .unwrap();
    writer.end_serialization().unwrap();

    // the second scene no longer contains the lever
    let mut changed = World::new();
    let level1 = changed.add_scene("Scenes/Level1");
    let level2 = changed.add_scene("Scenes/Level2");
    let new_root = changed.add_root(level1, "root", 10);
    changed.add_root(level2, "gate", 10);

    let reader = reload(&writer);
    let mut resolver = ReferenceResolver::new();
    for _ in 0..3 {
        assert_eq!(
            resolver.read_object_reference(&reader, "lever", &changed, &new_root),
            None
        );
    }
    assert_eq!(resolver.unresolved_count(), 1);
    assert_eq!(reader.try_read_values::<_, i32>("lever").map(|c| c.len()), Some(3));
}
