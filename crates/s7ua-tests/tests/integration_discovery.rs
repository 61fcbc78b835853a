// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Structure Discovery Integration Tests
//!
//! - `test_discover_*`: Discovery of single shells through a live session
//! - `test_structure_*`: Full PLC structure through the client facade

use std::sync::Arc;

use s7ua::{
    ClientConfig, DiscoveryConfig, GlobalDataBlock, InstanceDataBlock, Node, S7Client, S7DataType,
    StructureDiscoverer, StructureElement, UdtRegistry,
};

use s7ua_tests::common::{
    init_test_logging, ConfigFixtures, MockSession, MockSessionFactory, PlcFixtures,
};

fn discoverer() -> StructureDiscoverer {
    StructureDiscoverer::new(DiscoveryConfig::default(), Arc::new(UdtRegistry::new()))
}

async fn connected_client() -> (S7Client, Arc<MockSessionFactory>) {
    let factory = MockSessionFactory::new(PlcFixtures::standard());
    let client = S7Client::new(ConfigFixtures::client(2), factory.clone()).unwrap();
    client.connect().await.unwrap();
    (client, factory)
}

// =============================================================================
// Single shells
// =============================================================================

#[tokio::test]
async fn test_discover_global_data_block_skips_icon() {
    init_test_logging();
    let session = MockSession::new(PlcFixtures::standard());
    let shell: Node = GlobalDataBlock::shell("ns=3;s=DataBlocksGlobal.Db", "Db").into();

    let Node::GlobalDataBlock(db) = discoverer().discover(&session, &shell).await else {
        panic!("expected global data block");
    };

    let names: Vec<_> = db.variables.iter().map(|v| v.display_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Setpoint", "Running", "Stamp", "Name", "TestStruct", "Motor"]
    );
    assert_eq!(db.variables[2].s7_type, S7DataType::DateAndTime);
    assert_eq!(db.variables[3].s7_type, S7DataType::ArrayOfChar);
    assert_eq!(db.variables[3].array_length, 4);
    assert_eq!(db.variables[0].array_length, 0);
}

#[tokio::test]
async fn test_discover_registers_udt_placeholder_and_members() {
    let session = MockSession::new(PlcFixtures::standard());
    let d = discoverer();
    let shell: Node = GlobalDataBlock::shell("ns=3;s=DataBlocksGlobal.Db", "Db").into();

    let Node::GlobalDataBlock(db) = d.discover(&session, &shell).await else {
        panic!("expected global data block");
    };

    let motor = db.variables.iter().find(|v| v.display_name == "Motor").unwrap();
    assert_eq!(motor.s7_type, S7DataType::Udt);
    assert_eq!(motor.udt_type_name.as_deref(), Some("DT_Motor"));
    assert_eq!(motor.struct_members.len(), 2);

    let definition = d.registry().get_definition("DT_Motor").unwrap();
    assert_eq!(definition.data_type_node_id.as_deref(), Some("ns=3;s=DT_Motor"));
    let members: Vec<_> = definition.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(members, vec!["Speed", "Enabled"]);
    assert_eq!(definition.members[1].offset, 2);

    let test_struct = db.variables.iter().find(|v| v.display_name == "TestStruct").unwrap();
    assert_eq!(test_struct.s7_type, S7DataType::Struct);
    assert!(test_struct.udt_type_name.is_none());
    assert!(!d.registry().contains_definition("TestStruct"));
}

#[tokio::test]
async fn test_discover_instance_data_block_sections() {
    let session = MockSession::new(PlcFixtures::standard());
    let shell: Node = InstanceDataBlock::shell("ns=3;s=DataBlocksInstance.Fb1_DB", "Fb1_DB").into();

    let Node::InstanceDataBlock(fb) = discoverer().discover(&session, &shell).await else {
        panic!("expected instance data block");
    };

    assert_eq!(fb.inputs.as_ref().unwrap().variables[0].display_name, "Start");
    assert!(fb.outputs.is_none());
    assert!(fb.in_outs.is_none());

    let stat = fb.static_.as_ref().unwrap();
    assert_eq!(stat.variables.len(), 1);
    assert_eq!(stat.variables[0].s7_type, S7DataType::DInt);
    assert_eq!(stat.nested_instances.len(), 1);

    let timer = &stat.nested_instances[0];
    assert_eq!(timer.display_name, "Timer1");
    let elapsed = &timer.static_.as_ref().unwrap().variables[0];
    assert_eq!(elapsed.display_name, "Elapsed");
    assert_eq!(elapsed.s7_type, S7DataType::Time);
}

#[tokio::test]
async fn test_discover_instance_data_block_skips_icon_objects() {
    let session = MockSession::new(PlcFixtures::standard());
    let shell: Node = InstanceDataBlock::shell("ns=3;s=DataBlocksInstance.Fb1_DB", "Fb1_DB").into();

    let Node::InstanceDataBlock(fb) = discoverer().discover(&session, &shell).await else {
        panic!("expected instance data block");
    };

    let sections: Vec<_> = fb.sections().map(|s| s.display_name.as_str()).collect();
    assert_eq!(sections, vec!["Inputs", "Static"]);

    let stat = fb.static_.as_ref().unwrap();
    let nested: Vec<_> = stat.nested_instances.iter().map(|n| n.display_name.as_str()).collect();
    assert_eq!(nested, vec!["Timer1"]);
    assert!(stat.variables.iter().all(|v| v.display_name != "Icon"));
}

#[tokio::test]
async fn test_discover_area_overrides_protocol_type() {
    let session = MockSession::new(PlcFixtures::standard());
    let d = discoverer();

    let counters: Node = StructureElement::shell("ns=3;s=Counters", "Counters").into();
    let timers: Node = StructureElement::shell("ns=3;s=Timers", "Timers").into();

    let Node::StructureElement(counters) = d.discover(&session, &counters).await else {
        panic!("expected structure element");
    };
    let Node::StructureElement(timers) = d.discover(&session, &timers).await else {
        panic!("expected structure element");
    };

    assert_eq!(counters.variables[0].s7_type, S7DataType::Counter);
    assert_eq!(timers.variables[0].s7_type, S7DataType::S5Time);
}

#[tokio::test]
async fn test_discover_disconnected_session_returns_shell() {
    let session = MockSession::new(PlcFixtures::standard());
    session.disconnect();
    let shell: Node = GlobalDataBlock::shell("ns=3;s=DataBlocksGlobal.Db", "Db").into();

    assert_eq!(discoverer().discover(&session, &shell).await, shell);
}

#[tokio::test]
async fn test_discover_malformed_node_id_returns_shell() {
    let session = MockSession::new(PlcFixtures::standard());
    let shell: Node = GlobalDataBlock::shell("not a node id", "Db").into();

    assert_eq!(discoverer().discover(&session, &shell).await, shell);
}

// =============================================================================
// Full structure
// =============================================================================

#[tokio::test]
async fn test_structure_discovers_every_root() {
    init_test_logging();
    let (client, _factory) = connected_client().await;

    let structure = client.discover_structure().await.unwrap();

    assert_eq!(structure.roots().len(), 7);
    assert_eq!(structure.global_data_blocks().count(), 1);
    assert_eq!(structure.instance_data_blocks().count(), 1);
    let areas: Vec<_> = structure.areas().map(|a| a.display_name.as_str()).collect();
    assert_eq!(areas, vec!["Memory", "Inputs", "Outputs", "Timers", "Counters"]);
    assert_eq!(structure.variable_count(), 16);
}

#[tokio::test]
async fn test_structure_path_index() {
    let (client, _factory) = connected_client().await;

    let structure = client.discover_structure().await.unwrap();

    let index = structure.variables_by_path();
    assert!(index.contains_key("Db.TestStruct.TestStructInt"));
    assert!(index.contains_key("Db.Motor.Speed"));
    assert!(index.contains_key("Fb1_DB.Inputs.Start"));
    assert!(index.contains_key("Fb1_DB.Static.Timer1.Static.Elapsed"));
    assert!(index.contains_key("Counters.C1"));
    assert!(!index.keys().any(|path| path.ends_with("Icon")));

    assert_eq!(
        structure.find_variable("Timers.T1").unwrap().s7_type,
        S7DataType::S5Time
    );
    assert!(client.registry().contains_definition("DT_Motor"));
}

#[tokio::test]
async fn test_structure_returns_sessions_to_pool() {
    let (client, _factory) = connected_client().await;

    client.discover_structure().await.unwrap();

    assert_eq!(client.pool().available(), 2);
    assert_eq!(client.pool().available_permits(), 2);
    client.dispose().await;
}

#[tokio::test]
async fn test_structure_honours_configured_discovery_settings() {
    let config: ClientConfig = serde_json::from_value(serde_json::json!({
        "connection": { "endpoint": ConfigFixtures::ENDPOINT },
        "pool": { "size": 1 },
        "discovery": { "max_depth": 0, "excluded_names": ["Icon", "Running"] }
    }))
    .unwrap();
    let factory = MockSessionFactory::new(PlcFixtures::standard());
    let client = S7Client::new(config, factory).unwrap();
    client.connect().await.unwrap();

    let structure = client.discover_structure().await.unwrap();

    assert!(structure.find_variable("Db.Running").is_none());
    let test_struct = structure.find_variable("Db.TestStruct").unwrap();
    assert_eq!(test_struct.s7_type, S7DataType::Unknown);
    assert!(test_struct.struct_members.is_empty());
}
