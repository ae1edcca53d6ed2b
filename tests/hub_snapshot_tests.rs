//! Saving hub contents to disk and restoring them in a later session.

#[cfg(test)]
mod tests {
    use mathlab::app::data_hub::{
        Category, DataHub, EntryId, EventKind, ExportMetadata, HubError, HubSnapshot, Payload,
    };
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn populated_hub() -> (DataHub, Vec<EntryId>) {
        let hub = DataHub::new();
        let ids = vec![
            hub.export(
                "matrices",
                Category::Matrices,
                Payload::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
                Some(ExportMetadata::named("Matrix A").with_field("det", -2.0)),
            )
            .unwrap(),
            hub.export("vectors", Category::Vectors, Payload::Vector(vec![1.0, 0.0]), None)
                .unwrap(),
            hub.export("vectors", Category::Vectors, Payload::Vector(vec![0.0, 1.0]), None)
                .unwrap(),
        ];
        (hub, ids)
    }

    #[test]
    fn test_save_and_load_keeps_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hub_snapshot.json");
        let (hub, ids) = populated_hub();
        hub.save_to_path(&path).unwrap();

        let restored = DataHub::new();
        assert_eq!(restored.load_from_path(&path).unwrap(), 3);
        assert_eq!(restored.counts(), hub.counts());
        assert_eq!(restored.list_all(), hub.list_all());

        let entry = restored
            .get_entry(Category::Matrices, &ids[0])
            .unwrap()
            .unwrap();
        assert_eq!(entry.name(), "Matrix A");
        assert_eq!(entry.metadata.extra["det"], -2.0);

        let vectors: Vec<EntryId> = restored
            .list(Category::Vectors)
            .unwrap()
            .into_iter()
            .map(|summary| summary.id)
            .collect();
        assert_eq!(vectors, ids[1..].to_vec());
    }

    #[test]
    fn test_restore_emits_no_events() {
        let (hub, _) = populated_hub();
        let restored = DataHub::new();
        let (_subscription, receiver) = restored
            .events()
            .subscribe_channel(EventKind::EntryCreated);

        restored.restore(hub.snapshot());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_loading_twice_skips_known_ids() {
        let (hub, _) = populated_hub();
        let snapshot = hub.snapshot();

        let restored = DataHub::new();
        assert_eq!(restored.restore(snapshot.clone()), 3);
        assert_eq!(restored.restore(snapshot), 0);
        assert_eq!(restored.counts().total, 3);
    }

    #[test]
    fn test_exports_after_restore_get_fresh_ids_and_sort_last() {
        let (hub, ids) = populated_hub();
        let restored = DataHub::new();
        restored.restore(hub.snapshot());

        let fresh = restored
            .export("vectors", Category::Vectors, Payload::Vector(vec![1.0, 1.0]), None)
            .unwrap();
        assert!(!ids.contains(&fresh));
        assert_eq!(restored.list_all()[0].id, fresh);
    }

    #[test]
    fn test_removed_entries_are_not_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hub.json");
        let (hub, ids) = populated_hub();
        hub.remove(Category::Vectors, &ids[1]).unwrap();
        hub.save_to_path(&path).unwrap();

        let snapshot = HubSnapshot::read_from_path(&path).unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert!(snapshot.entries.iter().all(|entry| entry.id != ids[1]));
    }

    #[test]
    fn test_mismatched_entries_are_skipped() {
        let (hub, _) = populated_hub();
        let mut snapshot = hub.snapshot();
        snapshot.entries[0].category = Category::Scalars;

        let restored = DataHub::new();
        assert_eq!(restored.restore(snapshot), 2);
        assert_eq!(restored.counts().get(Category::Scalars), 0);
    }

    #[test]
    fn test_non_finite_exports_never_reach_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hub.json");
        let (hub, _) = populated_hub();

        assert_eq!(
            hub.export("statistics", Category::Scalars, Payload::Scalar(f64::NAN), None),
            Err(HubError::NonFiniteValue(Category::Scalars))
        );
        assert_eq!(
            hub.export(
                "statistics",
                Category::Arrays,
                Payload::Array(vec![1.0, f64::INFINITY]),
                None
            ),
            Err(HubError::NonFiniteValue(Category::Arrays))
        );
        hub.save_to_path(&path).unwrap();

        let restored = DataHub::new();
        assert_eq!(restored.load_from_path(&path).unwrap(), 3);
    }

    #[test]
    fn test_one_bad_entry_does_not_lose_the_rest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hub.json");
        let (hub, ids) = populated_hub();
        hub.save_to_path(&path).unwrap();

        // A scalar written as null by an older build
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["entries"][1]["payload"]["data"] = serde_json::Value::Null;
        std::fs::write(&path, value.to_string()).unwrap();

        let restored = DataHub::new();
        assert_eq!(restored.load_from_path(&path).unwrap(), 2);
        assert!(restored.get_entry(Category::Matrices, &ids[0]).unwrap().is_some());
        assert!(restored.get_entry(Category::Vectors, &ids[1]).unwrap().is_none());
        assert!(restored.get_entry(Category::Vectors, &ids[2]).unwrap().is_some());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        let hub = DataHub::new();
        assert!(hub.load_from_path(&dir.path().join("absent.json")).is_err());

        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{\"version\": 1, \"entries\": [").unwrap();
        let err = hub.load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid snapshot"));
        assert_eq!(hub.counts().total, 0);
    }
}
