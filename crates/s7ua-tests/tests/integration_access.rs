// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Data Access Integration Tests
//!
//! - `test_read_*`: Batched reads of discovered trees
//! - `test_write_*`: Leaf, struct and custom UDT writes

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};

use s7ua::{
    ConversionError, CustomValue, GlobalDataBlock, MemberView, Node, NotFoundError, Quality,
    S7Client, S7Error, S7Value, StatusCode, TypedUdtConverter, UaValue, Variable, VariableStatus,
};

use s7ua_tests::common::{
    init_test_logging, ConfigFixtures, DataTypes, MockAddressSpace, MockSessionFactory,
    PlcFixtures,
};

// =============================================================================
// Helpers
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Motor {
    speed: i16,
    enabled: bool,
}

struct MotorConverter;

impl TypedUdtConverter for MotorConverter {
    type Value = Motor;

    fn udt_type_name(&self) -> &str {
        "DT_Motor"
    }

    fn from_members(&self, members: &MemberView<'_>) -> Result<Motor, ConversionError> {
        Ok(Motor {
            speed: members.get("Speed")?,
            enabled: members.get("Enabled")?,
        })
    }

    fn to_members(&self, value: &Motor) -> Result<Vec<(String, S7Value)>, ConversionError> {
        Ok(vec![
            ("Speed".to_string(), S7Value::I16(value.speed)),
            ("Enabled".to_string(), S7Value::Bool(value.enabled)),
        ])
    }
}

/// Rejects motors above a speed limit.
struct LimitedMotorConverter;

impl TypedUdtConverter for LimitedMotorConverter {
    type Value = Motor;

    fn udt_type_name(&self) -> &str {
        "DT_Motor"
    }

    fn from_members(&self, members: &MemberView<'_>) -> Result<Motor, ConversionError> {
        let speed: i16 = members.get("Speed")?;
        if speed > 1000 {
            return Err(ConversionError::invalid_value("DT_Motor", "speed above limit"));
        }
        Ok(Motor {
            speed,
            enabled: members.get("Enabled")?,
        })
    }

    fn to_members(&self, value: &Motor) -> Result<Vec<(String, S7Value)>, ConversionError> {
        MotorConverter.to_members(value)
    }
}

struct Harness {
    client: S7Client,
    space: Arc<MockAddressSpace>,
    db: Node,
}

impl Harness {
    async fn new() -> Self {
        Self::with_space(PlcFixtures::standard()).await
    }

    async fn with_space(space: Arc<MockAddressSpace>) -> Self {
        let factory = MockSessionFactory::new(space);
        let space = Arc::clone(factory.space());
        let client = S7Client::new(ConfigFixtures::client(2), factory).unwrap();
        client.connect().await.unwrap();

        let shell: Node = GlobalDataBlock::shell("ns=3;s=DataBlocksGlobal.Db", "Db").into();
        let db = client.discover(&shell).await.unwrap();
        Self { client, space, db }
    }

    fn variable(&self, name: &str) -> &Variable {
        let Node::GlobalDataBlock(db) = &self.db else {
            panic!("expected global data block");
        };
        db.variables.iter().find(|v| v.display_name == name).unwrap()
    }

    async fn read_db(&self) -> GlobalDataBlock {
        match self.client.read(&self.db, "Root").await.unwrap() {
            Node::GlobalDataBlock(db) => db,
            other => panic!("expected global data block, got {}", other.kind_name()),
        }
    }
}

fn find<'a>(variables: &'a [Variable], name: &str) -> &'a Variable {
    variables.iter().find(|v| v.display_name == name).unwrap()
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_read_assigns_full_paths_and_values() {
    init_test_logging();
    let h = Harness::new().await;

    let db = h.read_db().await;

    let test_struct = find(&db.variables, "TestStruct");
    assert_eq!(test_struct.full_path.as_deref(), Some("Root.Db.TestStruct"));
    assert_eq!(test_struct.status.quality(), Some(Quality::Good));

    let member = find(&test_struct.struct_members, "TestStructInt");
    assert_eq!(member.full_path.as_deref(), Some("Root.Db.TestStruct.TestStructInt"));
    assert_eq!(member.value, Some(S7Value::I16(12341)));
    assert_eq!(member.raw_value, Some(UaValue::Int16(12341)));

    let flag = find(&test_struct.struct_members, "TestStructBool");
    assert_eq!(flag.value, Some(S7Value::Bool(true)));

    let stamp = find(&test_struct.struct_members, "TestDateAndTime");
    let expected = NaiveDate::from_ymd_opt(1990, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(stamp.value, Some(S7Value::DateTime(expected)));
    assert_eq!(
        stamp.full_path.as_deref(),
        Some("Root.Db.TestStruct.TestDateAndTime")
    );
}

#[tokio::test]
async fn test_read_converts_s7_specific_types() {
    let h = Harness::new().await;

    let db = h.read_db().await;

    let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_milli_opt(13, 45, 30, 123)
        .unwrap();
    assert_eq!(find(&db.variables, "Stamp").value, Some(S7Value::DateTime(expected)));

    let name = find(&db.variables, "Name").value.clone().unwrap();
    assert_eq!(
        name,
        S7Value::Array("PUMP".chars().map(S7Value::Char).collect())
    );
}

#[tokio::test]
async fn test_read_leaves_input_tree_untouched() {
    let h = Harness::new().await;

    h.read_db().await;

    assert!(h.variable("Setpoint").value.is_none());
    assert!(h.variable("Setpoint").status.is_waiting());
}

#[tokio::test]
async fn test_read_struct_status_is_worst_member() {
    let h = Harness::new().await;
    h.space.set_read_status(
        "DataBlocksGlobal.Db.TestStruct.TestStructBool",
        StatusCode::BAD_TYPE_MISMATCH,
    );

    let db = h.read_db().await;

    let test_struct = find(&db.variables, "TestStruct");
    assert_eq!(test_struct.status.quality(), Some(Quality::Bad));
    let flag = find(&test_struct.struct_members, "TestStructBool");
    assert!(flag.value.is_none());
    assert_eq!(flag.status, VariableStatus::Read(StatusCode::BAD_TYPE_MISMATCH));
}

#[tokio::test]
async fn test_read_applies_custom_udt_converter() {
    let h = Harness::new().await;
    h.client.register_udt_converter(MotorConverter);

    let db = h.read_db().await;

    let motor = find(&db.variables, "Motor");
    let custom = motor.value.as_ref().and_then(S7Value::as_custom).unwrap();
    assert_eq!(
        custom.downcast_ref::<Motor>(),
        Some(&Motor {
            speed: 1200,
            enabled: true
        })
    );
}

#[tokio::test]
async fn test_read_skips_custom_converter_on_bad_member() {
    let h = Harness::new().await;
    h.client.register_udt_converter(MotorConverter);
    h.space
        .set_read_status("DataBlocksGlobal.Db.Motor.Speed", StatusCode::BAD);

    let db = h.read_db().await;

    let motor = find(&db.variables, "Motor");
    assert!(motor.value.is_none());
    assert_eq!(motor.status.quality(), Some(Quality::Bad));
}

#[tokio::test]
async fn test_read_conversion_failure_degrades_single_leaf() {
    init_test_logging();
    let space = PlcFixtures::standard();
    space.add_scalar(
        "DataBlocksGlobal.Db",
        "BadStamp",
        DataTypes::date_and_time(),
        UaValue::ByteString(vec![0x24, 0x03]),
    );
    let h = Harness::with_space(space).await;

    let db = h.read_db().await;

    let bad = find(&db.variables, "BadStamp");
    assert!(bad.value.is_none());
    assert_eq!(bad.raw_value, Some(UaValue::ByteString(vec![0x24, 0x03])));
    assert_eq!(bad.status, VariableStatus::Read(StatusCode::BAD_TYPE_MISMATCH));

    assert_eq!(find(&db.variables, "Setpoint").value, Some(S7Value::I16(100)));
    assert_eq!(find(&db.variables, "Running").value, Some(S7Value::Bool(true)));
    let test_struct = find(&db.variables, "TestStruct");
    assert_eq!(test_struct.status.quality(), Some(Quality::Good));

    let structure = h.client.discover_structure().await.unwrap();
    let values = h.client.read_structure(&structure).await.unwrap();
    assert_eq!(
        values.find_variable("Db.BadStamp").unwrap().status.quality(),
        Some(Quality::Bad)
    );
    assert_eq!(
        values.find_variable("Counters.C1").unwrap().value,
        Some(S7Value::U16(7))
    );
}

#[tokio::test]
async fn test_read_custom_converter_failure_marks_udt_bad() {
    let h = Harness::new().await;
    h.client.register_udt_converter(LimitedMotorConverter);

    let db = h.read_db().await;

    let motor = find(&db.variables, "Motor");
    assert!(motor.value.is_none());
    assert_eq!(motor.status, VariableStatus::Read(StatusCode::BAD_TYPE_MISMATCH));
    assert_eq!(
        find(&motor.struct_members, "Speed").value,
        Some(S7Value::I16(1200))
    );
    assert_eq!(find(&db.variables, "Setpoint").value, Some(S7Value::I16(100)));
}

#[tokio::test]
async fn test_read_transport_failure_is_error() {
    let h = Harness::new().await;
    h.space.set_fail_reads(true);

    let result = h.client.read(&h.db, "").await;

    assert!(matches!(result, Err(S7Error::Connection(_))));
    assert_eq!(h.client.pool().available(), 2);
}

#[tokio::test]
async fn test_read_structure_reads_every_root() {
    let h = Harness::new().await;

    let structure = h.client.discover_structure().await.unwrap();
    let values = h.client.read_structure(&structure).await.unwrap();

    assert_eq!(
        values.find_variable("Counters.C1").unwrap().value,
        Some(S7Value::U16(7))
    );
    assert_eq!(
        values.find_variable("Timers.T1").unwrap().value,
        Some(S7Value::Duration(TimeDelta::seconds(123)))
    );
    assert_eq!(
        values
            .find_variable("Fb1_DB.Static.Timer1.Static.Elapsed")
            .unwrap()
            .value,
        Some(S7Value::Duration(TimeDelta::milliseconds(1500)))
    );
}

// =============================================================================
// Write
// =============================================================================

#[tokio::test]
async fn test_write_leaf_value() {
    init_test_logging();
    let h = Harness::new().await;

    let ok = h
        .client
        .write(h.variable("Setpoint"), S7Value::I16(999))
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Setpoint"),
        Some(UaValue::Int16(999))
    );
}

#[tokio::test]
async fn test_write_bad_status_returns_false() {
    let h = Harness::new().await;
    h.space.set_write_status(Some(StatusCode::BAD_TYPE_MISMATCH));

    let ok = h
        .client
        .write(h.variable("Setpoint"), S7Value::I16(999))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Setpoint"),
        Some(UaValue::Int16(100))
    );
}

#[tokio::test]
async fn test_write_out_of_range_is_conversion_error() {
    let h = Harness::new().await;

    let result = h
        .client
        .write(h.variable("Setpoint"), S7Value::I32(70_000))
        .await;

    assert!(matches!(result, Err(S7Error::Conversion(_))));
    assert!(h.space.writes().is_empty());
}

#[tokio::test]
async fn test_write_struct_sends_one_batch() {
    let h = Harness::new().await;
    let value = S7Value::Struct(vec![
        ("TestStructInt".to_string(), S7Value::I16(9)),
        ("TestStructBool".to_string(), S7Value::Bool(false)),
    ]);

    let ok = h.client.write(h.variable("TestStruct"), value).await.unwrap();

    assert!(ok);
    let writes = h.space.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].len(), 2);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.TestStruct.TestStructInt"),
        Some(UaValue::Int16(9))
    );
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.TestStruct.TestStructBool"),
        Some(UaValue::Boolean(false))
    );
}

#[tokio::test]
async fn test_write_custom_udt_value() {
    let h = Harness::new().await;
    h.client.register_udt_converter(MotorConverter);
    let value = S7Value::Custom(CustomValue::new(
        "DT_Motor",
        Motor {
            speed: 1500,
            enabled: false,
        },
    ));

    let ok = h.client.write(h.variable("Motor"), value).await.unwrap();

    assert!(ok);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Motor.Speed"),
        Some(UaValue::Int16(1500))
    );
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Motor.Enabled"),
        Some(UaValue::Boolean(false))
    );
}

#[tokio::test]
async fn test_write_member_struct_to_udt_with_converter() {
    let h = Harness::new().await;
    h.client.register_udt_converter(MotorConverter);
    let value = S7Value::Struct(vec![("Speed".to_string(), S7Value::I16(77))]);

    let ok = h.client.write(h.variable("Motor"), value).await.unwrap();

    assert!(ok);
    let writes = h.space.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].len(), 1);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Motor.Speed"),
        Some(UaValue::Int16(77))
    );
}

#[tokio::test]
async fn test_write_struct_without_udt_definition_fails() {
    let h = Harness::new().await;
    h.client.registry().remove_definition("DT_Motor");
    let value = S7Value::Struct(vec![("Speed".to_string(), S7Value::I16(77))]);

    let result = h.client.write(h.variable("Motor"), value).await;

    assert!(matches!(
        result,
        Err(S7Error::NotFound(NotFoundError::UdtDefinition { .. }))
    ));
    assert!(h.space.writes().is_empty());
}

#[tokio::test]
async fn test_write_transport_failure_returns_false() {
    let h = Harness::new().await;
    h.space.set_fail_writes(true);

    let ok = h
        .client
        .write(h.variable("Setpoint"), S7Value::I16(5))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Setpoint"),
        Some(UaValue::Int16(100))
    );
    assert_eq!(h.client.pool().available(), 2);
}

#[tokio::test]
async fn test_write_custom_without_converter_fails() {
    let h = Harness::new().await;
    let value = S7Value::Custom(CustomValue::new(
        "DT_Motor",
        Motor {
            speed: 1,
            enabled: true,
        },
    ));

    let result = h.client.write(h.variable("Motor"), value).await;

    assert!(matches!(
        result,
        Err(S7Error::NotFound(NotFoundError::UdtConverter { .. }))
    ));
}

#[tokio::test]
async fn test_write_without_node_id_fails() {
    let h = Harness::new().await;
    let mut variable = h.variable("Setpoint").clone();
    variable.node_id = None;

    let result = h.client.write(&variable, S7Value::I16(1)).await;

    assert!(matches!(
        result,
        Err(S7Error::NotFound(NotFoundError::NodeId { .. }))
    ));
}

#[tokio::test]
async fn test_write_malformed_node_id_returns_false() {
    let h = Harness::new().await;
    let mut variable = h.variable("Setpoint").clone();
    variable.node_id = Some("garbage".to_string());

    let ok = h.client.write(&variable, S7Value::I16(1)).await.unwrap();

    assert!(!ok);
    assert!(h.space.writes().is_empty());
}

#[tokio::test]
async fn test_write_by_path() {
    let h = Harness::new().await;
    let structure = h.client.discover_structure().await.unwrap();

    let ok = h
        .client
        .write_by_path(&structure, "Db.Motor.Speed", S7Value::I16(42))
        .await
        .unwrap();
    assert!(ok);
    assert_eq!(
        h.space.value("DataBlocksGlobal.Db.Motor.Speed"),
        Some(UaValue::Int16(42))
    );

    let missing = h
        .client
        .write_by_path(&structure, "Db.Nope", S7Value::I16(1))
        .await;
    assert!(matches!(
        missing,
        Err(S7Error::NotFound(NotFoundError::Path { .. }))
    ));
}
