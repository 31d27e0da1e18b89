use crate::Project;

/// Read a project from its JSON representation.
pub fn read_json(read: &[u8]) -> serde_json::Result<Project> {
    serde_json::from_slice(read)
}

#[cfg(test)]
mod tests {
    use crate::{Branch, read_json, entry_point};

    #[test]
    fn project() -> serde_json::Result<()> {
        let project = read_json(br#"{
            "globals": 4,
            "trees": [{
                "id": 256,
                "name": "counter",
                "args": 1,
                "nodes": [
                    { "opcode": 2, "true_branch": { "Node": 1 }, "false_branch": "Error" },
                    { "opcode": 0, "true_branch": "True", "false_branch": "False" }
                ]
            }],
            "objects": [{ "name": "lamp", "fields": 3, "entry_points": { "init": 256 } }],
            "instances": [0, 0]
        }"#)?;

        assert_eq!(project.globals, 4);
        assert_eq!(project.instances, [0, 0]);

        let tree = &project.trees[0];
        assert_eq!(tree.id, 0x100);
        assert_eq!(tree.name, "counter");
        assert_eq!((tree.args, tree.locals), (1, 0));
        assert_eq!(tree.nodes[0].true_branch, Branch::Node(1));
        assert_eq!(tree.nodes[0].false_branch, Branch::Error);
        assert_eq!(tree.nodes[1].operand, [0; 16]);

        let object = &project.objects[0];
        assert_eq!(object.fields, 3);
        assert_eq!(object.entry_point(entry_point::INIT), Some(0x100));
        assert_eq!(object.entry_point(entry_point::MAIN), None);

        Ok(())
    }

    #[test]
    fn invalid() {
        assert!(read_json(br#"{ "trees": [{ "nodes": [{ "opcode": 0 }] }] }"#).is_err());
    }
}
