//! End-to-end accumulator scenarios against the public API

use std::sync::Arc;
use tempfile::tempdir;
use zkonacci::{
    Accumulator, Address, Blake3Hasher, CircuitInputs, FileStore, Hash, MemoryStore, NodeHasher,
    Proof, Seeds, SparseMerkleTree, Value,
};

const LEVELS: usize = 6;

fn v(n: u64) -> Value {
    Value::from(n)
}

fn memory_tree() -> SparseMerkleTree<MemoryStore> {
    SparseMerkleTree::new(LEVELS, Arc::new(MemoryStore::new())).unwrap()
}

/// One append done by hand: prove n-1 and n-2, then insert and prove n
fn append(
    tree: &mut SparseMerkleTree<MemoryStore>,
    n: u64,
    value: Value,
) -> (Hash, Proof, Proof, Proof) {
    let root = tree.root();
    let min_one = tree.generate_proof(n - 1).unwrap();
    let min_two = tree.generate_proof(n - 2).unwrap();
    let insertion = tree.insert_and_prove(n, value).unwrap();
    (root, min_one, min_two, insertion)
}

#[test]
fn test_first_three_appends() {
    let mut tree = memory_tree();
    tree.insert(0, v(0)).unwrap();
    tree.insert(1, v(1)).unwrap();

    // Key 2: proof against the root holding only the seeds
    let (root, min_one, min_two, insertion) = append(&mut tree, 2, v(1));
    assert!(!insertion.existence);
    assert_eq!(insertion.compute_root::<Blake3Hasher>(), root);
    insertion
        .verify_transition::<Blake3Hasher>(&root, &tree.root(), v(1), LEVELS)
        .unwrap();
    min_one
        .verify_existence::<Blake3Hasher>(&root, &v(1))
        .unwrap();
    min_two
        .verify_existence::<Blake3Hasher>(&root, &v(0))
        .unwrap();

    let proof = tree.generate_proof(2).unwrap();
    assert!(proof.existence);
    assert_eq!(proof.old_value, v(1));

    // Keys 3 and 4 each check their predecessors against the root just
    // before their own insertion
    for (n, value, f1, f2) in [(3, 2, 1, 1), (4, 3, 2, 1)] {
        let (root, min_one, min_two, insertion) = append(&mut tree, n, v(value));
        min_one
            .verify_existence::<Blake3Hasher>(&root, &v(f1))
            .unwrap();
        min_two
            .verify_existence::<Blake3Hasher>(&root, &v(f2))
            .unwrap();
        insertion
            .verify_transition::<Blake3Hasher>(&root, &tree.root(), v(value), LEVELS)
            .unwrap();

        let inputs = CircuitInputs::new(
            LEVELS,
            Address::ZERO,
            root,
            &insertion,
            v(value),
            &min_one,
            &min_two,
        )
        .unwrap();
        inputs
            .verify::<Blake3Hasher>(&tree.root(), LEVELS)
            .unwrap();
    }

    assert_eq!(tree.get(4).unwrap(), Some(v(3)));
}

#[test]
fn test_empty_slot_insertion_sets_is_old0() {
    let mut tree = memory_tree();
    tree.insert(0, v(0)).unwrap();
    tree.insert(4, v(4)).unwrap();

    // 0 = ..000 and 4 = ..100 split at depth 2; key 2 = ..010 finds the empty
    // slot beside their middle node
    let proof = tree.generate_proof(2).unwrap();
    assert!(proof.is_old0);
    assert_eq!(proof.old_key, 0);
    assert_eq!(proof.depth(), 2);
    assert_eq!(proof.siblings[0], Hash::ZERO);
    assert_eq!(proof.compute_root::<Blake3Hasher>(), tree.root());

    let old_root = tree.root();
    let insertion = tree.insert_and_prove(2, v(2)).unwrap();
    assert_eq!(insertion, proof);
    insertion
        .verify_transition::<Blake3Hasher>(&old_root, &tree.root(), v(2), LEVELS)
        .unwrap();
}

#[test]
fn test_accumulator_matches_manual_appends() {
    let mut acc = Accumulator::genesis(memory_tree(), Seeds::default()).unwrap();
    let mut tree = memory_tree();
    tree.insert(0, v(0)).unwrap();
    tree.insert(1, v(1)).unwrap();

    for (n, value) in [(2, 1), (3, 2), (4, 3), (5, 5), (6, 8)] {
        let step = acc.step(Address::ZERO).unwrap();
        let (root, _, _, insertion) = append(&mut tree, n, v(value));
        assert_eq!(step.old_root(), root);
        assert_eq!(step.insertion, insertion);
        assert_eq!(step.new_root, tree.root());
    }
}

#[test]
fn test_roots_are_deterministic() {
    let run = || {
        let mut acc = Accumulator::genesis(memory_tree(), Seeds::default()).unwrap();
        (0..10)
            .map(|_| acc.step(Address::ZERO).unwrap().new_root)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_historical_proofs_survive_growth() {
    let mut acc = Accumulator::genesis(memory_tree(), Seeds::default()).unwrap();
    let steps: Vec<_> = (0..8).map(|_| acc.step(Address::ZERO).unwrap()).collect();

    for step in &steps {
        let snapshot = acc.tree().snapshot_at(step.old_root()).unwrap();
        let n = step.n();
        let proof = snapshot.generate_proof(n).unwrap();
        assert!(!proof.existence);
        proof.verify::<Blake3Hasher>(&step.old_root()).unwrap();

        step.inputs
            .verify::<Blake3Hasher>(&step.new_root, LEVELS)
            .unwrap();
    }
}

#[test]
fn test_hashes_follow_leaf_and_middle_rules() {
    let mut tree = memory_tree();
    tree.insert(0, v(0)).unwrap();
    assert_eq!(tree.root(), Blake3Hasher::hash_leaf(0, &v(0)));

    tree.insert(1, v(1)).unwrap();
    assert_eq!(
        tree.root(),
        Blake3Hasher::hash_middle(
            &Blake3Hasher::hash_leaf(0, &v(0)),
            &Blake3Hasher::hash_leaf(1, &v(1))
        )
    );
}

#[test]
fn test_file_store_resume() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seq.smt");

    let root = {
        let store = Arc::new(FileStore::create(&path, LEVELS).unwrap());
        let tree = SparseMerkleTree::new(LEVELS, Arc::clone(&store)).unwrap();
        let mut acc = Accumulator::genesis(tree, Seeds::default()).unwrap();
        for _ in 0..6 {
            let step = acc.step(Address::ZERO).unwrap();
            store.push_root(step.new_root);
        }
        store.sync().unwrap();
        acc.root()
    };

    let store = Arc::new(FileStore::open(&path).unwrap());
    assert_eq!(store.latest_root(), root);
    assert_eq!(store.roots().len(), 6);

    let tree: SparseMerkleTree<FileStore> =
        SparseMerkleTree::from_root(store.levels(), store, root).unwrap();
    let mut acc = Accumulator::resume(tree, Seeds::default()).unwrap();
    assert_eq!(acc.next_index(), 8);

    let step = acc.step(Address::ZERO).unwrap();
    assert_eq!(step.inputs.f_n, v(21));
    assert_eq!(step.old_root(), root);
}

#[test]
fn test_file_store_survives_unsynced_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seq.smt");

    let synced = {
        let store = Arc::new(FileStore::create(&path, LEVELS).unwrap());
        let tree = SparseMerkleTree::new(LEVELS, Arc::clone(&store)).unwrap();
        let mut acc = Accumulator::genesis(tree, Seeds::default()).unwrap();
        acc.catch_up(8).unwrap();
        store.push_root(acc.root());
        store.sync().unwrap();
        let synced = acc.root();

        // Appended but never synced, as after a crash
        acc.step(Address::ZERO).unwrap();
        acc.step(Address::ZERO).unwrap();
        std::mem::forget(acc);
        std::mem::forget(store);
        synced
    };

    let store = Arc::new(FileStore::open(&path).unwrap());
    assert_eq!(store.latest_root(), synced);

    let tree: SparseMerkleTree<FileStore> =
        SparseMerkleTree::from_root(store.levels(), Arc::clone(&store), synced).unwrap();
    for key in 0..8 {
        let proof = tree.generate_proof(key).unwrap();
        assert!(proof.existence);
        proof.verify::<Blake3Hasher>(&synced).unwrap();
    }

    let mut acc = Accumulator::resume(tree, Seeds::default()).unwrap();
    assert_eq!(acc.next_index(), 8);
    let step = acc.step(Address::ZERO).unwrap();
    assert_eq!(step.inputs.f_n, v(21));
    store.push_root(step.new_root);
    store.sync().unwrap();
    drop(acc);
    drop(store);

    let store = Arc::new(FileStore::open(&path).unwrap());
    let tree: SparseMerkleTree<FileStore> =
        SparseMerkleTree::from_root(store.levels(), Arc::clone(&store), store.latest_root())
            .unwrap();
    assert_eq!(tree.get(8).unwrap(), Some(v(21)));
    assert_eq!(tree.get(7).unwrap(), Some(v(13)));
}
