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


//! References between objects, stored as chains of integer keys.
//!
//! A chain is `[scene, root_key, child_key, ..., leaf_key]`, optionally
//! followed by a component discriminator. The scene slot is
//! [`SAME_SCENE`] when the target lives in the same scene as the object
//! holding the reference, otherwise the target scene's id. The empty chain
//! means the holder itself.

use crate::codec::{SaveReader, SaveWriter};
use crate::error::Error;
use crate::types::PropertyKey;
use crate::util::hash_key;
use std::collections::HashSet;
use std::fmt::Debug;

/// Scene slot of a chain whose target shares the holder's scene.
pub const SAME_SCENE: i32 = 0;

/// The host's object hierarchy as seen by the resolver.
pub trait SceneGraph {
    type Object: Clone + PartialEq + Debug;
    type Scene: Clone + PartialEq + Debug;

    fn scene_of(&self, object: &Self::Object) -> Self::Scene;

    /// Stable id of a scene. Must not be [`SAME_SCENE`]; see [`scene_path_hash`].
    fn scene_id(&self, scene: &Self::Scene) -> i32;

    fn find_scene(&self, scene_id: i32) -> Option<Self::Scene>;

    fn parent(&self, object: &Self::Object) -> Option<Self::Object>;

    /// Key of `object` among its siblings, stable across save and load.
    fn serialization_key(&self, object: &Self::Object) -> i32;

    fn root_by_key(&self, scene: &Self::Scene, key: i32) -> Option<Self::Object>;

    fn child_by_key(&self, parent: &Self::Object, key: i32) -> Option<Self::Object>;

    /// Whether `object` is part of the saved tree.
    fn will_be_serialized(&self, object: &Self::Object) -> bool;
}

/// Components attached to scene objects.
///
/// The key returned by [`component_key`](Self::component_key) must be
/// stable across save and load. When it is derived from
/// [`component_discriminator`], components of one type on an object may only
/// be appended between sessions, never reordered or removed, or references
/// silently resolve to the wrong sibling. Hosts that can assign a persistent
/// id at creation time should return that instead.
pub trait ComponentGraph: SceneGraph {
    type Component: Clone + PartialEq + Debug;

    fn owner(&self, component: &Self::Component) -> Self::Object;

    fn component_key(&self, component: &Self::Component) -> i32;

    fn component_by_key(&self, object: &Self::Object, key: i32) -> Option<Self::Component>;
}

/// Scene id derived from a scene's asset path, never [`SAME_SCENE`].
pub fn scene_path_hash(path: &str) -> i32 {
    match hash_key(path) {
        SAME_SCENE => 1,
        hash => hash,
    }
}

/// Key of the `ordinal`-th component of `type_name` on its object.
///
/// ```rust
/// use savepack_core::resolver::component_discriminator;
///
/// assert_ne!(component_discriminator("Light", 0), component_discriminator("Light", 1));
/// ```
pub fn component_discriminator(type_name: &str, ordinal: usize) -> i32 {
    hash_key(&format!("{}{:03}", type_name, ordinal))
}

pub fn build_object_chain<G: SceneGraph>(
    graph: &G,
    target: &G::Object,
    path_from: &G::Object,
) -> Result<Vec<i32>, Error> {
    if target == path_from {
        return Ok(Vec::new());
    }
    let mut chain = Vec::new();
    let mut cursor = Some(target.clone());
    while let Some(object) = cursor {
        if !graph.will_be_serialized(&object) {
            return Err(Error::invalid_ref(format!(
                "{:?} on the path to {:?} is not serialized",
                object, target
            )));
        }
        chain.push(graph.serialization_key(&object));
        cursor = graph.parent(&object);
    }
    let scene = graph.scene_of(target);
    if scene == graph.scene_of(path_from) {
        chain.push(SAME_SCENE);
    } else {
        chain.push(graph.scene_id(&scene));
    }
    chain.reverse();
    Ok(chain)
}

pub fn resolve_object_chain<G: SceneGraph>(
    graph: &G,
    chain: &[i32],
    path_from: &G::Object,
) -> Option<G::Object> {
    let (&scene_key, keys) = match chain.split_first() {
        Some(split) => split,
        None => return Some(path_from.clone()),
    };
    let (&root_key, keys) = keys.split_first()?;
    let scene = if scene_key == SAME_SCENE {
        graph.scene_of(path_from)
    } else {
        graph.find_scene(scene_key)?
    };
    keys.iter().try_fold(graph.root_by_key(&scene, root_key)?, |object, &key| {
        graph.child_by_key(&object, key)
    })
}

/// Chain to `target`; just the component key when it sits on `path_from`.
pub fn build_component_chain<G: ComponentGraph>(
    graph: &G,
    target: &G::Component,
    path_from: &G::Object,
) -> Result<Vec<i32>, Error> {
    let owner = graph.owner(target);
    let mut chain = build_object_chain(graph, &owner, path_from)?;
    chain.push(graph.component_key(target));
    Ok(chain)
}

pub fn resolve_component_chain<G: ComponentGraph>(
    graph: &G,
    chain: &[i32],
    path_from: &G::Object,
) -> Option<G::Component> {
    let (&component_key, object_chain) = chain.split_last()?;
    let owner = resolve_object_chain(graph, object_chain, path_from)?;
    graph.component_by_key(&owner, component_key)
}

/// Writes and reads references as integer-array properties.
///
/// Chains that fail to resolve are logged once each per resolver.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    reported: HashSet<Vec<i32>>,
}

impl ReferenceResolver {
    pub fn new() -> ReferenceResolver {
        ReferenceResolver::default()
    }

    /// Stores a reference to `target`. `None` writes nothing, so the key
    /// reads back as absent. An unserialized target is logged and rejected
    /// without writing anything.
    pub fn write_object_reference<W, G, K>(
        &self,
        writer: &mut W,
        key: K,
        graph: &G,
        target: Option<&G::Object>,
        path_from: &G::Object,
    ) -> Result<(), Error>
    where
        W: SaveWriter,
        G: SceneGraph,
        K: Into<PropertyKey>,
    {
        let target = match target {
            Some(target) => target,
            None => return Ok(()),
        };
        let chain = build_object_chain(graph, target, path_from).map_err(|e| {
            log::error!("Cannot write reference from {:?}: {}", path_from, e);
            e
        })?;
        writer.write_values(key, &chain)
    }

    pub fn read_object_reference<R, G, K>(
        &mut self,
        reader: &R,
        key: K,
        graph: &G,
        path_from: &G::Object,
    ) -> Option<G::Object>
    where
        R: SaveReader,
        G: SceneGraph,
        K: Into<PropertyKey>,
    {
        let chain: Vec<i32> = reader.try_read_values(key)?;
        let resolved = resolve_object_chain(graph, &chain, path_from);
        if resolved.is_none() {
            self.report(chain);
        }
        resolved
    }

    pub fn write_component_reference<W, G, K>(
        &self,
        writer: &mut W,
        key: K,
        graph: &G,
        target: Option<&G::Component>,
        path_from: &G::Object,
    ) -> Result<(), Error>
    where
        W: SaveWriter,
        G: ComponentGraph,
        K: Into<PropertyKey>,
    {
        let target = match target {
            Some(target) => target,
            None => return Ok(()),
        };
        let chain = build_component_chain(graph, target, path_from).map_err(|e| {
            log::error!("Cannot write reference from {:?}: {}", path_from, e);
            e
        })?;
        writer.write_values(key, &chain)
    }

    pub fn read_component_reference<R, G, K>(
        &mut self,
        reader: &R,
        key: K,
        graph: &G,
        path_from: &G::Object,
    ) -> Option<G::Component>
    where
        R: SaveReader,
        G: ComponentGraph,
        K: Into<PropertyKey>,
    {
        let chain: Vec<i32> = reader.try_read_values(key)?;
        let resolved = resolve_component_chain(graph, &chain, path_from);
        if resolved.is_none() {
            self.report(chain);
        }
        resolved
    }

    fn report(&mut self, chain: Vec<i32>) {
        if !self.reported.contains(&chain) {
            log::warn!("Reference chain {:?} did not resolve", chain);
            self.reported.insert(chain);
        }
    }

    /// Distinct unresolved chains seen so far.
    pub fn unresolved_count(&self) -> usize {
        self.reported.len()
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }
}
