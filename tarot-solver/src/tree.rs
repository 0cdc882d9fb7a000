//! Search-tree dump. Every accepted node is appended as one record; a
//! reader rebuilds the tree later for offline inspection, tolerating
//! records that arrive before their parent.
//!
//! A record is `[id][parent id][move][board]`. The fixed-width fields all
//! come first: the board is the only self-delimiting field, so placing it
//! last keeps a flat concatenated stream parseable even though the move
//! conceptually annotates the board.

use tarot_common::action::Action;
use tarot_common::board::Board;
use tarot_common::error::GameError;

use anyhow::{Context, Result, bail};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::codec;
use crate::solution::Solution;

/// Concurrent writers defer to each other record by record, so this cap
/// bounds how far a child can outrun its parent in the stream.
const MAX_DEFERRED: usize = 4096;

/// Serializes one node: its id, its parent id (zero for the root), the
/// move that produced it (zeroed for the root) and the board bytes.
pub fn encode_record(node: &Solution) -> Vec<u8> {
    let board_bytes = codec::encode_board(&node.board);
    let mut bytes = Vec::with_capacity(32 + codec::MOVE_LEN + board_bytes.len());
    bytes.extend_from_slice(&node.id.to_le_bytes());
    let parent_id = node.parent().map_or(0, |parent| parent.id);
    bytes.extend_from_slice(&parent_id.to_le_bytes());
    match node.action() {
        Some(action) => bytes.extend_from_slice(&codec::encode_move(&action)),
        None => bytes.extend_from_slice(&[0; codec::MOVE_LEN]),
    }
    bytes.extend_from_slice(&board_bytes);
    bytes
}

/// Appends node records to a file. Shared across workers; the lock keeps
/// records from interleaving.
pub struct TreeWriter {
    inner: Mutex<BufWriter<File>>,
}

impl TreeWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create dump file {}", path.display()))?;
        Ok(Self {
            inner: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn record(&self, node: &Solution) -> Result<()> {
        let bytes = encode_record(node);
        let mut writer = self.inner.lock().expect("dump writer poisoned");
        writer.write_all(&bytes)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().expect("dump writer poisoned").flush()?;
        Ok(())
    }
}

pub struct TreeNode {
    pub id: u128,
    pub parent: Option<u128>,
    pub action: Option<Action>,
    pub board: Board,
    pub children: Vec<u128>,
}

pub struct SolutionTree {
    nodes: HashMap<u128, TreeNode, ahash::RandomState>,
    root: u128,
}

impl SolutionTree {
    pub fn root(&self) -> &TreeNode {
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: u128) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct RawRecord {
    id: u128,
    parent: u128,
    action: Option<Action>,
    board: Board,
}

fn parse_record(bytes: &[u8], cursor: &mut usize) -> Result<RawRecord> {
    let need = |len: usize, cursor: usize| -> Result<()> {
        if cursor + len > bytes.len() {
            bail!(GameError::InvalidEncoding("truncated tree record".into()));
        }
        Ok(())
    };
    need(16, *cursor)?;
    let id = u128::from_le_bytes(bytes[*cursor..*cursor + 16].try_into().unwrap());
    *cursor += 16;
    need(16, *cursor)?;
    let parent = u128::from_le_bytes(bytes[*cursor..*cursor + 16].try_into().unwrap());
    *cursor += 16;
    need(codec::MOVE_LEN, *cursor)?;
    let move_bytes: [u8; codec::MOVE_LEN] =
        bytes[*cursor..*cursor + codec::MOVE_LEN].try_into().unwrap();
    *cursor += codec::MOVE_LEN;
    let action = if move_bytes == [0; codec::MOVE_LEN] {
        None
    } else {
        Some(codec::decode_move(&move_bytes)?)
    };
    let (board, consumed) = codec::decode_board(&bytes[*cursor..])?;
    *cursor += consumed;
    Ok(RawRecord {
        id,
        parent,
        action,
        board,
    })
}

/// Rebuilds a tree from a dump. Records whose parent has not appeared yet
/// are deferred and linked once it does.
pub fn read_tree<R: Read>(mut reader: R) -> Result<SolutionTree> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context("failed to read tree dump")?;

    let mut nodes: HashMap<u128, TreeNode, ahash::RandomState> = HashMap::default();
    let mut root: Option<u128> = None;
    let mut deferred: Vec<RawRecord> = Vec::new();
    let mut cursor = 0usize;

    // Returns the record back when its parent is still missing.
    fn attach(
        record: RawRecord,
        nodes: &mut HashMap<u128, TreeNode, ahash::RandomState>,
        root: &mut Option<u128>,
    ) -> Result<Option<RawRecord>> {
        if record.parent == 0 {
            if root.is_some() {
                bail!(GameError::InvalidEncoding("tree dump has two roots".into()));
            }
            *root = Some(record.id);
        } else if let Some(parent) = nodes.get_mut(&record.parent) {
            parent.children.push(record.id);
        } else {
            return Ok(Some(record));
        }
        nodes.insert(
            record.id,
            TreeNode {
                id: record.id,
                parent: (record.parent != 0).then_some(record.parent),
                action: record.action,
                board: record.board,
                children: Vec::new(),
            },
        );
        Ok(None)
    }

    while cursor < bytes.len() {
        let record = parse_record(&bytes, &mut cursor)?;
        if let Some(record) = attach(record, &mut nodes, &mut root)? {
            deferred.push(record);
        }
        // Retry deferred records until a pass attaches nothing.
        let mut progressed = true;
        while progressed {
            progressed = false;
            let mut index = 0;
            while index < deferred.len() {
                if deferred[index].parent == 0 || nodes.contains_key(&deferred[index].parent) {
                    let record = deferred.swap_remove(index);
                    attach(record, &mut nodes, &mut root)?;
                    progressed = true;
                } else {
                    index += 1;
                }
            }
        }
        if deferred.len() > MAX_DEFERRED {
            bail!(GameError::InvalidEncoding(
                "too many tree records precede their parent".into(),
            ));
        }
    }

    if !deferred.is_empty() {
        bail!(GameError::InvalidEncoding(
            "tree dump references a parent that never appears".into(),
        ));
    }
    let root = root.ok_or_else(|| GameError::InvalidEncoding("tree dump has no root".into()))?;
    Ok(SolutionTree { nodes, root })
}
