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


//! Registries and resolvers supplied by the host application.

mod formatter;
mod prototype;
mod reference;

pub use formatter::{FormatterInfo, FormatterRegistry, Serializable};
pub use prototype::{read_prototype_reference, write_prototype_reference, PrototypeRegistry};
pub use reference::{
    build_component_chain, build_object_chain, component_discriminator, resolve_component_chain,
    resolve_object_chain, scene_path_hash, ComponentGraph, ReferenceResolver, SceneGraph,
    SAME_SCENE,
};
