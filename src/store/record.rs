//! Node record - the unit of on-disk storage

use crate::smt::{Node, NodeKind};
use crate::{Error, Result};

/// A serialized node with its kind tag
#[derive(Clone, Debug)]
pub struct NodeRecord {
    /// Kind of the encoded node
    pub kind: NodeKind,
    /// bincode-encoded node (uncompressed)
    pub data: Vec<u8>,
}

impl NodeRecord {
    /// Encode a node. Empty nodes are implicit and never stored.
    pub fn encode(node: &Node) -> Result<Self> {
        if node.is_empty() {
            return Err(Error::NodeStore("the empty node is never stored".into()));
        }
        Ok(NodeRecord {
            kind: node.kind(),
            data: bincode::serialize(node)?,
        })
    }

    /// Decode the node, checking it against the kind tag
    pub fn decode(&self) -> Result<Node> {
        let node: Node = bincode::deserialize(&self.data)?;
        if node.kind() != self.kind {
            return Err(Error::Corruption(format!(
                "record tagged {:?} holds a {:?} node",
                self.kind,
                node.kind()
            )));
        }
        Ok(node)
    }

    /// Compress the record for storage
    pub fn compress(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        // Kind byte prefix
        output.push(self.kind.as_byte());
        let compressed = zstd::encode_all(self.data.as_slice(), 3)?;
        output.extend(compressed);
        Ok(output)
    }

    /// Decompress a record from storage
    pub fn decompress(data: &[u8]) -> Result<Self> {
        let (&tag, body) = data
            .split_first()
            .ok_or_else(|| Error::Corruption("Empty record data".into()))?;

        let kind = NodeKind::from_byte(tag)
            .filter(|kind| *kind != NodeKind::Empty)
            .ok_or_else(|| Error::Corruption(format!("Invalid node kind: {}", tag)))?;

        let decompressed = zstd::decode_all(body)?;

        Ok(NodeRecord {
            kind,
            data: decompressed,
        })
    }

    /// Get the size of the uncompressed data
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hash, Value};

    #[test]
    fn test_record_roundtrip() {
        let node = Node::middle(Hash::from_bytes([7; 32]), Hash::ZERO);
        let record = NodeRecord::encode(&node).unwrap();
        let compressed = record.compress().unwrap();
        let restored = NodeRecord::decompress(&compressed).unwrap();

        assert_eq!(restored.kind, NodeKind::Middle);
        assert_eq!(restored.decode().unwrap(), node);
    }

    #[test]
    fn test_empty_node_not_encodable() {
        assert!(NodeRecord::encode(&Node::Empty).is_err());
    }

    #[test]
    fn test_kind_tag_mismatch_is_corruption() {
        let node = Node::leaf(4, Value::from(3u64));
        let mut record = NodeRecord::encode(&node).unwrap();
        record.kind = NodeKind::Middle;
        assert!(matches!(record.decode(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(NodeRecord::decompress(&[]).is_err());
        assert!(NodeRecord::decompress(&[0, 1, 2]).is_err());
        assert!(NodeRecord::decompress(&[9, 1, 2]).is_err());
    }
}
