use sorter_classifier::{
    classify, Classifier, Kernel, Model, ModelArtifact, ModelError, StandardScaler,
};

fn three_object_model() -> ModelArtifact {
    ModelArtifact::new(
        StandardScaler {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
        },
        Classifier::Svc {
            kernel: Kernel::Rbf { gamma: 2.0 },
            support_vectors: vec![
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.0, 1.0],
                vec![-1.0, -1.0],
            ],
            n_support: vec![2, 1, 1],
            dual_coef: vec![vec![0.5, 0.5, -1.0, -1.0], vec![0.5, 0.5, 1.0, -1.0]],
            intercept: vec![0.0, 0.0, 0.0],
        },
        vec![
            "biscuits".to_string(),
            "soap".to_string(),
            "soap2".to_string(),
        ],
    )
    .unwrap()
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let model = three_object_model();
    model.save(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    assert_eq!(loaded, model);
    assert_eq!(loaded.feature_len(), 2);
}

#[test]
fn test_svc_labels() {
    let model = three_object_model();
    assert_eq!(classify(&[1.0, 0.0], &model).unwrap(), "biscuits");
    assert_eq!(classify(&[0.0, 1.0], &model).unwrap(), "soap");
    assert_eq!(classify(&[-1.0, -1.0], &model).unwrap(), "soap2");
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ModelArtifact::load(dir.path().join("absent.json")),
        Err(ModelError::Io(_))
    ));
}

#[test]
fn test_model_is_shareable_as_trait_object() {
    let model: std::sync::Arc<dyn Model> = std::sync::Arc::new(three_object_model());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = model.clone();
            std::thread::spawn(move || classify(&[0.0, 1.0], model.as_ref()).unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), "soap");
    }
}
