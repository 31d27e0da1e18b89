use std::collections::hash_map::Entry;
use tracing::debug;

use project::Branch;
use crate::vm::{code, BuildError};

pub mod vm;
pub mod prims;

/// Validate a decoded project and assemble the immutable resources a `vm::Vm` runs.
///
/// Every opcode must be either registered in `registry` or name a tree in the project, and
/// every branch and entry point must refer to something that exists. After this succeeds,
/// the interpreter never sees a dangling reference in the asset set.
pub fn build(project: project::Project, registry: &vm::Registry) ->
    Result<vm::Resources, BuildError>
{
    let project::Project { trees, objects, scripts, globals, .. } = project;
    let mut resources = vm::Resources::default();
    resources.globals = globals as usize;

    for tree in trees {
        if !code::is_call(tree.id) {
            return Err(BuildError::TreeId(tree.id));
        }
        if tree.nodes.is_empty() {
            return Err(BuildError::EmptyTree(tree.id));
        }
        match resources.trees.entry(tree.id) {
            Entry::Occupied(_) => return Err(BuildError::DuplicateTree(tree.id)),
            Entry::Vacant(entry) => { entry.insert(tree); }
        }
    }

    for (&id, tree) in resources.trees.iter() {
        for (index, node) in tree.nodes.iter().enumerate() {
            let (opcode, index) = (node.opcode, index as u16);
            if code::is_call(opcode) {
                if !resources.trees.contains_key(&opcode) {
                    return Err(BuildError::UnknownCall { tree: id, node: index, opcode });
                }
            } else if !registry.contains(opcode) {
                return Err(BuildError::Unregistered { tree: id, node: index, opcode });
            }

            for branch in node.successors() {
                if let Branch::Node(target) = branch {
                    if target as usize >= tree.nodes.len() {
                        return Err(BuildError::Branch { tree: id, node: index });
                    }
                }
            }
        }
    }

    for (index, object) in objects.iter().enumerate() {
        for (name, &tree) in object.entry_points.iter() {
            if !resources.trees.contains_key(&tree) {
                let name = name.clone();
                return Err(BuildError::EntryPoint { object: index, name, tree });
            }
        }
    }
    resources.objects = objects;

    for script in scripts {
        match resources.scripts.entry(script.id) {
            Entry::Occupied(_) => return Err(BuildError::DuplicateScript(script.id)),
            Entry::Vacant(entry) => { entry.insert(script); }
        }
    }

    debug!(
        trees = resources.trees.len(),
        objects = resources.objects.len(),
        scripts = resources.scripts.len(),
        "built resources"
    );
    Ok(resources)
}
