use std::collections::VecDeque;
use std::io;

use encoding_rs::Encoding;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::QualName;

use crate::error::{RetrofitError, RetrofitResult};

use super::dom::{Document, NodeId, NodeKind};

/// 可序列化的节点句柄
pub struct SerializableNode<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(document: &'a Document, id: NodeId) -> Self {
        SerializableNode { document, id }
    }
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let document = self.document;
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(SerializeOp::Open(self.id)),
            TraversalScope::ChildrenOnly(_) => ops.extend(
                document
                    .children(self.id)
                    .iter()
                    .map(|c| SerializeOp::Open(*c)),
            ),
        }

        while let Some(op) = ops.pop_front() {
            match op {
                SerializeOp::Open(id) => match document.kind(id) {
                    NodeKind::Element { name, attrs } => {
                        serializer.start_elem(
                            name.clone(),
                            attrs.iter().map(|a| (&a.name, a.value.as_str())),
                        )?;

                        ops.reserve(1 + document.children(id).len());
                        ops.push_front(SerializeOp::Close(name.clone()));

                        for child in document.children(id).iter().rev() {
                            ops.push_front(SerializeOp::Open(*child));
                        }
                    }
                    NodeKind::Doctype { name } => serializer.write_doctype(name)?,
                    NodeKind::Text(text) => serializer.write_text(text)?,
                    NodeKind::Comment(text) => serializer.write_comment(text)?,
                    NodeKind::ProcessingInstruction { target, contents } => {
                        serializer.write_processing_instruction(target, contents)?
                    }
                    NodeKind::Document => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "cannot serialize a nested document node",
                        ))
                    }
                },
                SerializeOp::Close(name) => serializer.end_elem(name)?,
            }
        }

        Ok(())
    }
}

/// 序列化文档
///
/// 输出按文档原有编码重新编码；编码未知或为空时保持 UTF-8。
pub fn serialize_document(document: &Document, document_encoding: &str) -> RetrofitResult<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable = SerializableNode::new(document, document.root());
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .map_err(|e| RetrofitError::from(e).with_context("Stage", "serialize"))?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            if encoding != encoding_rs::UTF_8 {
                let s: &str = &String::from_utf8_lossy(&buf);
                let (data, _, _) = encoding.encode(s);
                buf = data.to_vec();
            }
        }
    }

    Ok(buf)
}
