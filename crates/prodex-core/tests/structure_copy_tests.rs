#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::cell::RefCell;
use std::collections::BTreeSet;

use common::{date, linked_component, store_with_components};
use prodex_core::model::ProductComponent;
use prodex_core::notify::RecordingListener;
use prodex_core::settings::GenerationValidFrom;
use prodex_core::{
    ChangeBroadcaster, CopyRequest, DeepCopyEngine, ModelSettings, ModelStore, PersistenceTarget,
    ProductStructure, PxError, PxErrorKind,
};

fn settings() -> ModelSettings {
    ModelSettings::default().with_working_date(date(2024, 6, 1))
}

/// A -> B, C; B -> D; C -> D
fn diamond() -> ModelStore {
    store_with_components(vec![
        linked_component("A", &["B", "C"]),
        linked_component("B", &["D"]),
        linked_component("C", &["D"]),
        linked_component("D", &[]),
    ])
}

/// Target that keeps written components staged and can be told to fail
#[derive(Default)]
struct StagingTarget {
    committed: RefCell<Vec<String>>,
    dirty: bool,
    fail_write: bool,
}

impl PersistenceTarget for StagingTarget {
    fn exists(&self, handle: &str) -> Result<bool, PxError> {
        Ok(self.committed.borrow().iter().any(|h| h == handle))
    }

    fn is_dirty(&self, _handle: &str) -> Result<bool, PxError> {
        Ok(self.dirty)
    }

    fn write_batch(&mut self, components: Vec<ProductComponent>) -> Result<(), PxError> {
        if self.fail_write {
            return Err(PxError::new(PxErrorKind::Persistence).with_message("disk full"));
        }
        self.committed
            .borrow_mut()
            .extend(components.into_iter().map(|c| c.name));
        Ok(())
    }
}

#[test]
fn test_structure_follows_effective_links() {
    let store = diamond();
    let structure = ProductStructure::build(&store, "A", date(2024, 6, 1)).unwrap();
    assert_eq!(structure.len(), 5);
    assert_eq!(structure.nodes_for_component("D").len(), 2);
    assert_eq!(structure.working_date(), date(2024, 6, 1));
}

#[test]
fn test_structure_cycle_reports_path() {
    let store = store_with_components(vec![
        linked_component("A", &["B"]),
        linked_component("B", &["C"]),
        linked_component("C", &["B"]),
    ]);
    let err = ProductStructure::build(&store, "A", date(2024, 6, 1)).unwrap_err();
    assert_eq!(err.code(), "ERR_STRUCTURE_CYCLE");
    let path: Vec<&str> = err.path().unwrap().iter().map(String::as_str).collect();
    assert_eq!(path, vec!["A", "B", "C", "B"]);
}

#[test]
fn test_generated_handles_copy_each_component_once() {
    let mut store = diamond();
    let structure = ProductStructure::build(&store, "A", date(2024, 6, 1)).unwrap();
    let request = CopyRequest::whole_structure(&structure, "-v2", &store).unwrap();
    let source = store.clone();

    let broadcaster = ChangeBroadcaster::new();
    let recorder = RecordingListener::new();
    broadcaster.subscribe(Box::new(recorder.clone()));

    let outcome = DeepCopyEngine::new(&settings())
        .copy(&source, &mut store, &structure, &request, &broadcaster)
        .unwrap();

    assert_eq!(outcome.len(), 4);
    for handle in outcome.handles() {
        assert!(store.exists(handle).unwrap());
        assert!(!store.is_dirty(handle).unwrap());
    }

    let a = store.get_component("A-v2").unwrap();
    let targets: Vec<&str> = a.generations[0].links.iter().map(|l| l.target.as_str()).collect();
    assert_eq!(targets, vec!["B-v2", "C-v2"]);
    assert_eq!(
        store.get_component("C-v2").unwrap().generations[0].links[0].target,
        "D-v2"
    );

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].modified.len(), 4);
}

#[test]
fn test_copy_with_distinct_handle_per_node() {
    let mut store = diamond();
    let structure = ProductStructure::build(&store, "A", date(2024, 6, 1)).unwrap();
    let mut request = CopyRequest::default();
    for (id, node) in structure.iter() {
        request.to_copy.insert(id);
        request
            .handles
            .insert(id, format!("{}-n{}", node.component, id.index()));
    }
    let source = store.clone();

    let broadcaster = ChangeBroadcaster::new();
    let recorder = RecordingListener::new();
    broadcaster.subscribe(Box::new(recorder.clone()));

    let outcome = DeepCopyEngine::new(&settings())
        .copy(&source, &mut store, &structure, &request, &broadcaster)
        .unwrap();

    assert_eq!(outcome.len(), 5);
    for (id, node) in structure.iter() {
        let handle = outcome.handle_of(id).unwrap();
        assert!(store.exists(handle).unwrap());

        let copy = store.get_component(handle).unwrap();
        let targets: Vec<&str> = copy.generations[0]
            .links
            .iter()
            .map(|l| l.target.as_str())
            .collect();
        let expected: Vec<&str> = node
            .children
            .iter()
            .map(|child| outcome.handle_of(*child).unwrap())
            .collect();
        assert_eq!(targets, expected);
    }

    let ds = structure.nodes_for_component("D");
    assert_ne!(outcome.handle_of(ds[0]), outcome.handle_of(ds[1]));

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].modified.len(), 5);
}

#[test]
fn test_copy_keeps_source_valid_from_when_configured() {
    let mut store = diamond();
    let structure = ProductStructure::build(&store, "D", date(2024, 6, 1)).unwrap();
    let request = CopyRequest::whole_structure(&structure, "-v2", &store).unwrap();
    let source = store.clone();

    let mut settings = settings();
    settings.copy.generation_valid_from = GenerationValidFrom::Source;
    DeepCopyEngine::new(&settings)
        .copy(&source, &mut store, &structure, &request, &ChangeBroadcaster::new())
        .unwrap();

    let copy = store.get_component("D-v2").unwrap();
    assert_eq!(copy.generations.len(), 1);
    assert_eq!(copy.generations[0].valid_from, date(2024, 1, 1));
}

#[test]
fn test_failed_write_propagates_and_broadcasts_nothing() {
    let store = diamond();
    let structure = ProductStructure::build(&store, "A", date(2024, 6, 1)).unwrap();
    let mut target = StagingTarget {
        fail_write: true,
        ..StagingTarget::default()
    };
    let request = CopyRequest::whole_structure(&structure, "-v2", &target).unwrap();

    let broadcaster = ChangeBroadcaster::new();
    let recorder = RecordingListener::new();
    broadcaster.subscribe(Box::new(recorder.clone()));

    let err = DeepCopyEngine::new(&settings())
        .copy(&store, &mut target, &structure, &request, &broadcaster)
        .unwrap_err();
    assert_eq!(err.kind(), PxErrorKind::Persistence);
    assert_eq!(err.message(), "disk full");
    assert!(recorder.events().is_empty());
    assert!(!broadcaster.is_suspended());
}

#[test]
fn test_dirty_handles_after_write_are_an_atomicity_breach() {
    let store = diamond();
    let structure = ProductStructure::build(&store, "B", date(2024, 6, 1)).unwrap();
    let mut target = StagingTarget {
        dirty: true,
        ..StagingTarget::default()
    };
    let to_copy: BTreeSet<_> = structure.iter().map(|(id, _)| id).collect();
    let request =
        CopyRequest::with_generated_handles(&structure, to_copy, BTreeSet::new(), "-v2", &target)
            .unwrap();

    let err = DeepCopyEngine::new(&settings())
        .copy(&store, &mut target, &structure, &request, &ChangeBroadcaster::new())
        .unwrap_err();
    assert_eq!(err.kind(), PxErrorKind::AtomicityBreach);
}
