//! Single-file node store with content-addressed storage
//!
//! File format:
//! ```text
//! [HEADER: 64 bytes]
//!   - magic: 8 bytes ("ZKFIBSMT")
//!   - version: 4 bytes (u32 LE)
//!   - levels: 4 bytes (u32 LE)
//!   - node_count: 8 bytes (u64 LE)
//!   - index_offset: 8 bytes (u64 LE)
//!   - roots_offset: 8 bytes (u64 LE)
//!   - roots_count: 8 bytes (u64 LE)
//!   - reserved: 16 bytes
//!
//! [BODY: variable, append-only]
//!   - node records, interleaved with the trailers of earlier syncs
//!
//! [TRAILER: written by each sync at the end of the file]
//!   - INDEX: sorted array of (hash, offset, size) entries
//!   - ROOTS: every committed root, oldest first
//! ```
//!
//! Nothing already on disk is overwritten except the header counts. A sync
//! appends a fresh trailer, makes it durable, and only then points the
//! header at it. Records put afterwards land after that trailer, so a
//! crash before the next sync reopens at the last synced state. Earlier
//! trailers stay behind as dead space.

use super::record::NodeRecord;
use super::NodeStore;
use crate::model::Hash;
use crate::smt::Node;
use crate::{Error, Result, MAGIC, VERSION};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const HEADER_SIZE: u64 = 64;

/// 32 (hash) + 8 (offset) + 4 (size)
const INDEX_ENTRY_SIZE: usize = 44;

/// Index entry for a node record
#[derive(Clone, Debug)]
struct IndexEntry {
    offset: u64,
    size: u32,
}

/// In-memory index for fast lookups
struct Index {
    entries: HashMap<Hash, IndexEntry>,
}

impl Index {
    fn new() -> Self {
        Index {
            entries: HashMap::new(),
        }
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn read_hash(file: &mut File) -> Result<Hash> {
    let mut bytes = [0u8; 32];
    file.read_exact(&mut bytes)?;
    Ok(Hash::from_bytes(bytes))
}

/// A content-addressed node store backed by a single file
///
/// Besides nodes, the file keeps the log of committed roots so a tree can be
/// reopened at its latest root and every historical root stays addressable.
pub struct FileStore {
    /// Path to the store file
    path: PathBuf,
    /// Level count of the tree this store backs
    levels: usize,
    /// The file handle
    file: RwLock<File>,
    /// In-memory index
    index: RwLock<Index>,
    /// Committed roots, oldest first
    roots: RwLock<Vec<Hash>>,
    /// Current append position, always the end of the file
    write_offset: RwLock<u64>,
    /// Set when nodes or roots changed since the last sync
    dirty: AtomicBool,
}

impl FileStore {
    /// Create a new store file for a tree of `levels` levels
    pub fn create(path: impl AsRef<Path>, levels: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let levels_field = u32::try_from(levels)
            .map_err(|_| Error::Config(format!("level count {} does not fit the header", levels)))?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..8].copy_from_slice(MAGIC);
        header[8..12].copy_from_slice(&VERSION.to_le_bytes());
        header[12..16].copy_from_slice(&levels_field.to_le_bytes());
        // node_count, index_offset, roots: 0 until the first sync
        file.write_all(&header)?;
        file.sync_all()?;

        debug!(path = %path.display(), levels, "created node store");

        Ok(FileStore {
            path,
            levels,
            file: RwLock::new(file),
            index: RwLock::new(Index::new()),
            roots: RwLock::new(Vec::new()),
            write_offset: RwLock::new(HEADER_SIZE),
            dirty: AtomicBool::new(false),
        })
    }

    /// Open an existing store file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header).map_err(|e| {
            Error::InvalidFile(format!("{}: unreadable header: {}", path.display(), e))
        })?;

        if &header[0..8] != MAGIC {
            return Err(Error::InvalidFile("Invalid magic bytes".into()));
        }

        let version = read_u32(&header, 8);
        if version != VERSION {
            return Err(Error::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        let levels = read_u32(&header, 12) as usize;
        let node_count = read_u64(&header, 16);
        let index_offset = read_u64(&header, 24);
        let roots_offset = read_u64(&header, 32);
        let roots_count = read_u64(&header, 40);

        // Load index if it exists
        let mut index = Index::new();
        if index_offset > 0 && node_count > 0 {
            file.seek(SeekFrom::Start(index_offset))?;
            for _ in 0..node_count {
                let mut entry_buf = [0u8; INDEX_ENTRY_SIZE];
                file.read_exact(&mut entry_buf)?;

                let mut hash_bytes = [0u8; 32];
                hash_bytes.copy_from_slice(&entry_buf[0..32]);
                let hash = Hash::from_bytes(hash_bytes);

                let offset = read_u64(&entry_buf, 32);
                let size = read_u32(&entry_buf, 40);

                index.entries.insert(hash, IndexEntry { offset, size });
            }
        }

        // Load the root log
        let mut roots = Vec::new();
        if roots_offset > 0 && roots_count > 0 {
            file.seek(SeekFrom::Start(roots_offset))?;
            for _ in 0..roots_count {
                roots.push(read_hash(&mut file)?);
            }
        }

        // Append past the last trailer, and past any records a crash left
        // behind it
        let write_offset = file.seek(SeekFrom::End(0))?;

        debug!(
            path = %path.display(),
            levels,
            nodes = index.entries.len(),
            roots = roots.len(),
            "opened node store"
        );

        Ok(FileStore {
            path,
            levels,
            file: RwLock::new(file),
            index: RwLock::new(index),
            roots: RwLock::new(roots),
            write_offset: RwLock::new(write_offset),
            dirty: AtomicBool::new(false),
        })
    }

    /// Open an existing store, or create one for a tree of `levels` levels
    pub fn open_or_create(path: impl AsRef<Path>, levels: usize) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path, levels)
        }
    }

    /// Level count recorded when the store was created
    pub fn levels(&self) -> usize {
        self.levels
    }

    // === Root Log ===

    /// Record a newly committed root
    pub fn push_root(&self, root: Hash) {
        self.roots.write().push(root);
        self.dirty.store(true, Ordering::Release);
    }

    /// The most recently committed root, or [`Hash::ZERO`] for a fresh store
    pub fn latest_root(&self) -> Hash {
        self.roots.read().last().copied().unwrap_or(Hash::ZERO)
    }

    /// All committed roots, oldest first
    pub fn roots(&self) -> Vec<Hash> {
        self.roots.read().clone()
    }

    /// Get the number of nodes in the store
    pub fn node_count(&self) -> usize {
        let index = self.index.read();
        index.entries.len()
    }

    /// Append the index and root log, then point the header at them.
    ///
    /// A no-op when nothing changed since the last sync.
    pub fn sync(&self) -> Result<()> {
        let index = self.index.read();
        let roots = self.roots.read();
        if !self.dirty.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut write_offset = self.write_offset.write();
        let mut file = self.file.write();

        let index_offset = *write_offset;
        let index_size = (index.entries.len() * INDEX_ENTRY_SIZE) as u64;
        let roots_offset = index_offset + index_size;
        let trailer_end = roots_offset + (roots.len() * 32) as u64;

        // Sort by hash for determinism
        let mut entries: Vec<_> = index.entries.iter().collect();
        entries.sort_by_key(|(h, _)| h.as_bytes());

        let mut trailer = Vec::with_capacity((trailer_end - index_offset) as usize);
        for (hash, entry) in entries {
            trailer.extend_from_slice(hash.as_bytes());
            trailer.extend_from_slice(&entry.offset.to_le_bytes());
            trailer.extend_from_slice(&entry.size.to_le_bytes());
        }
        for root in roots.iter() {
            trailer.extend_from_slice(root.as_bytes());
        }

        file.seek(SeekFrom::Start(index_offset))?;
        file.write_all(&trailer)?;
        file.sync_data()?;

        // The trailer is durable; only now move the header onto it
        let mut counts = [0u8; 32];
        counts[0..8].copy_from_slice(&(index.entries.len() as u64).to_le_bytes());
        counts[8..16].copy_from_slice(&index_offset.to_le_bytes());
        counts[16..24].copy_from_slice(&roots_offset.to_le_bytes());
        counts[24..32].copy_from_slice(&(roots.len() as u64).to_le_bytes());
        file.seek(SeekFrom::Start(16))?;
        file.write_all(&counts)?;
        file.sync_all()?;

        *write_offset = trailer_end;
        self.dirty.store(false, Ordering::Release);
        debug!(
            nodes = index.entries.len(),
            roots = roots.len(),
            trailer = index_offset,
            "synced node store"
        );
        Ok(())
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NodeStore for FileStore {
    fn get(&self, hash: &Hash) -> Result<Option<Node>> {
        let entry = {
            let index = self.index.read();
            index.entries.get(hash).cloned()
        };

        let Some(entry) = entry else {
            return Ok(None);
        };

        let mut data = vec![0u8; entry.size as usize];
        {
            let mut file = self.file.write();
            file.seek(SeekFrom::Start(entry.offset))?;
            file.read_exact(&mut data)?;
        }

        NodeRecord::decompress(&data)?.decode().map(Some)
    }

    fn put(&self, hash: Hash, node: &Node) -> Result<()> {
        // Check if already exists
        {
            let index = self.index.read();
            if index.entries.contains_key(&hash) {
                return Ok(());
            }
        }

        let compressed = NodeRecord::encode(node)?.compress()?;
        let size = u32::try_from(compressed.len())
            .map_err(|_| Error::NodeStore(format!("record for {} too large", hash.short())))?;

        let offset = {
            let mut write_offset = self.write_offset.write();
            let offset = *write_offset;

            let mut file = self.file.write();
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&compressed)?;

            *write_offset = offset + size as u64;
            offset
        };

        // Update index
        {
            let mut index = self.index.write();
            index.entries.insert(hash, IndexEntry { offset, size });
        }
        self.dirty.store(true, Ordering::Release);

        Ok(())
    }

    fn has(&self, hash: &Hash) -> Result<bool> {
        let index = self.index.read();
        Ok(index.entries.contains_key(hash))
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort sync on drop
        if let Err(e) = self.sync() {
            warn!(path = %self.path.display(), error = %e, "failed to sync node store on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake3Hasher;
    use crate::model::Value;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");

        // Create
        {
            let store = FileStore::create(&path, 6).unwrap();
            assert_eq!(store.node_count(), 0);
        }

        // Reopen
        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.node_count(), 0);
            assert_eq!(store.levels(), 6);
            assert_eq!(store.latest_root(), Hash::ZERO);
        }
    }

    #[test]
    fn test_node_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");
        let store = FileStore::create(&path, 6).unwrap();

        let node = Node::leaf(5, Value::from(5u64));
        let hash = node.hash::<Blake3Hasher>();
        store.put(hash, &node).unwrap();

        assert!(store.has(&hash).unwrap());
        assert_eq!(store.get(&hash).unwrap(), Some(node));
        assert_eq!(store.get(&Hash::from_bytes([1; 32])).unwrap(), None);
    }

    #[test]
    fn test_deduplication() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");
        let store = FileStore::create(&path, 6).unwrap();

        let node = Node::middle(Hash::from_bytes([3; 32]), Hash::ZERO);
        let hash = node.hash::<Blake3Hasher>();
        store.put(hash, &node).unwrap();
        store.put(hash, &node).unwrap();

        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");

        let leaf = Node::leaf(8, Value::from(21u64));
        let hash = leaf.hash::<Blake3Hasher>();
        {
            let store = FileStore::create(&path, 6).unwrap();
            store.put(hash, &leaf).unwrap();
            store.push_root(hash);
            store.sync().unwrap();
        }

        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.get(&hash).unwrap(), Some(leaf.clone()));
            assert_eq!(store.latest_root(), hash);

            // Appending after reopen must not clobber existing records
            let other = Node::leaf(9, Value::from(34u64));
            let other_hash = other.hash::<Blake3Hasher>();
            store.put(other_hash, &other).unwrap();
            store.push_root(other_hash);
        }

        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.node_count(), 2);
            assert_eq!(store.get(&hash).unwrap(), Some(leaf));
            assert_eq!(store.roots().len(), 2);
        }
    }

    #[test]
    fn test_unsynced_writes_keep_last_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");

        let committed = Node::leaf(2, Value::from(1u64));
        let committed_hash = committed.hash::<Blake3Hasher>();
        {
            let store = FileStore::create(&path, 6).unwrap();
            store.put(committed_hash, &committed).unwrap();
            store.push_root(committed_hash);
            store.sync().unwrap();

            // Written after the sync, then lost without one
            for key in 3..40u64 {
                let node = Node::leaf(key, Value::from(key));
                store.put(node.hash::<Blake3Hasher>(), &node).unwrap();
            }
            std::mem::forget(store);
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get(&committed_hash).unwrap(), Some(committed.clone()));
        assert_eq!(store.latest_root(), committed_hash);

        // Later appends go past the abandoned records
        let next = Node::leaf(50, Value::from(50u64));
        let next_hash = next.hash::<Blake3Hasher>();
        store.put(next_hash, &next).unwrap();
        store.sync().unwrap();
        drop(store);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.get(&committed_hash).unwrap(), Some(committed));
        assert_eq!(store.get(&next_hash).unwrap(), Some(next));
    }

    #[test]
    fn test_clean_sync_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");
        let store = FileStore::create(&path, 6).unwrap();

        let node = Node::leaf(1, Value::from(1u64));
        let hash = node.hash::<Blake3Hasher>();
        store.put(hash, &node).unwrap();
        store.push_root(hash);
        store.sync().unwrap();
        let len = std::fs::metadata(&path).unwrap().len();

        store.sync().unwrap();
        store.put(hash, &node).unwrap();
        store.sync().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foreign.bin");
        std::fs::write(&path, [0u8; 64]).unwrap();
        assert!(matches!(FileStore::open(&path), Err(Error::InvalidFile(_))));

        let short = dir.path().join("short.bin");
        std::fs::write(&short, b"ZKFI").unwrap();
        assert!(matches!(FileStore::open(&short), Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_rejects_other_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.smt");
        drop(FileStore::create(&path, 6).unwrap());

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[8..12].copy_from_slice(&(VERSION + 1).to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(Error::VersionMismatch { .. })
        ));
    }
}
