// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Building a router from a YAML manifest on disk.

mod common;

use common::register_mock;
use glassy_router::capability::Capability;
use glassy_router::router_config::RouterConfig;
use glassy_router::selection::SelectionTier;
use glassy_router::task::TaskType;
use glassy_router::ProviderRouter;

const MANIFEST: &str = r#"
apiVersion: glassy.dev/v1
kind: RouterConfig
metadata:
  name: integration
spec:
  providers:
    - type: local
      api_key: local-key
      capabilities:
        TEXT: true
    - type: zai
      api_key: zai-key
  task_mapping:
    text-generation: [zai, local]
  selection:
    order: activation
    generic_fallback: [zai]
    last_resort: local
"#;

#[test]
fn test_router_from_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glassy-router.yaml");
    std::fs::write(&path, MANIFEST).unwrap();

    let config = RouterConfig::load_or_default(Some(path)).unwrap();
    config.validate().unwrap();

    let router = ProviderRouter::from_config(&config);
    register_mock(&router, "local", &[]);
    register_mock(&router, "zai", &[Capability::Text]);
    assert_eq!(router.initialize(), 2);

    // Activation order puts "local" first; its configured TEXT override
    // qualifies it even though the adapter declares nothing.
    let selection = router
        .select_provider_for_task(TaskType::TextGeneration)
        .unwrap();
    assert_eq!(selection.provider_type, "local");
    assert_eq!(selection.tier, SelectionTier::TaskSpecific);

    assert_eq!(
        router.get_task_mapping()[&TaskType::TextGeneration],
        vec!["zai", "local"]
    );
    assert_eq!(router.get_task_mapping()[&TaskType::Embeddings], vec!["gemini", "local"]);
}
