// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built address spaces and configurations.
//!
//! [`PlcFixtures::standard`] builds this layout:
//!
//! ```text
//! DataBlocksGlobal
//! └── Db
//!     ├── Setpoint     INT            100
//!     ├── Running      BOOL           true
//!     ├── Stamp        DATE_AND_TIME  2024-03-15 13:45:30.123
//!     ├── Name         ARRAY OF CHAR  "PUMP"
//!     ├── TestStruct   STRUCT
//!     │   ├── TestStructBool   BOOL           true
//!     │   ├── TestStructInt    INT            12341
//!     │   └── TestDateAndTime  DATE_AND_TIME  1990-01-01 00:00:00
//!     ├── Motor        UDT DT_Motor
//!     │   ├── Speed    INT   1200
//!     │   └── Enabled  BOOL  true
//!     └── Icon         (excluded)
//! DataBlocksInstance
//! └── Fb1_DB
//!     ├── Icon         (object, excluded)
//!     ├── Inputs
//!     │   └── Start    BOOL  false
//!     └── Static
//!         ├── Icon     (object, excluded)
//!         ├── Count    DINT  42
//!         └── Timer1   (nested instance)
//!             └── Static
//!                 └── Elapsed  TIME  1500 ms
//! Counters
//! └── C1               UINT -> COUNTER  7
//! Timers
//! └── T1               UINT -> S5TIME   0x2123
//! ```

use std::sync::Arc;

use s7ua::{ClientConfig, ConnectionConfig, NodeId, UaValue};

use super::mocks::{MockAddressSpace, MOCK_NAMESPACE};

/// Raw DATE_AND_TIME bytes for 2024-03-15 13:45:30.123 (a Friday).
pub const STAMP_BYTES: [u8; 8] = [0x24, 0x03, 0x15, 0x13, 0x45, 0x30, 0x12, 0x36];

/// Raw DATE_AND_TIME bytes for 1990-01-01 00:00:00.000 (a Monday).
pub const EPOCH_1990_BYTES: [u8; 8] = [0x90, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x02];

/// Built-in and vendor data type ids.
pub struct DataTypes;

impl DataTypes {
    /// BOOL.
    pub fn bool() -> NodeId {
        NodeId::numeric(0, 1)
    }

    /// INT.
    pub fn int() -> NodeId {
        NodeId::numeric(0, 4)
    }

    /// UINT.
    pub fn uint() -> NodeId {
        NodeId::numeric(0, 5)
    }

    /// DINT.
    pub fn dint() -> NodeId {
        NodeId::numeric(0, 6)
    }

    /// REAL.
    pub fn real() -> NodeId {
        NodeId::numeric(0, 10)
    }

    /// Anonymous STRUCT.
    pub fn structure() -> NodeId {
        NodeId::numeric(0, 22)
    }

    /// CHAR.
    pub fn char() -> NodeId {
        NodeId::numeric(MOCK_NAMESPACE, 3001)
    }

    /// TIME.
    pub fn time() -> NodeId {
        NodeId::numeric(MOCK_NAMESPACE, 3011)
    }

    /// DATE_AND_TIME.
    pub fn date_and_time() -> NodeId {
        NodeId::string(MOCK_NAMESPACE, "DT_DATE_AND_TIME")
    }

    /// A user-defined type.
    pub fn udt(name: &str) -> NodeId {
        NodeId::string(MOCK_NAMESPACE, name)
    }
}

/// Address space fixtures.
pub struct PlcFixtures;

impl PlcFixtures {
    /// The standard PLC layout shown in the module docs.
    pub fn standard() -> Arc<MockAddressSpace> {
        let space = MockAddressSpace::new();

        let db = space.add_object("DataBlocksGlobal", "Db");
        space.add_scalar(&db, "Setpoint", DataTypes::int(), UaValue::Int16(100));
        space.add_scalar(&db, "Running", DataTypes::bool(), UaValue::Boolean(true));
        space.add_scalar(
            &db,
            "Stamp",
            DataTypes::date_and_time(),
            UaValue::ByteString(STAMP_BYTES.to_vec()),
        );
        space.add_variable(
            &db,
            "Name",
            DataTypes::char(),
            1,
            UaValue::ByteString(b"PUMP".to_vec()),
        );

        let test_struct = space.add_struct(&db, "TestStruct", DataTypes::structure());
        space.add_scalar(&test_struct, "TestStructBool", DataTypes::bool(), UaValue::Boolean(true));
        space.add_scalar(&test_struct, "TestStructInt", DataTypes::int(), UaValue::Int16(12341));
        space.add_scalar(
            &test_struct,
            "TestDateAndTime",
            DataTypes::date_and_time(),
            UaValue::ByteString(EPOCH_1990_BYTES.to_vec()),
        );

        let motor = space.add_struct(&db, "Motor", DataTypes::udt("DT_Motor"));
        space.add_scalar(&motor, "Speed", DataTypes::int(), UaValue::Int16(1200));
        space.add_scalar(&motor, "Enabled", DataTypes::bool(), UaValue::Boolean(true));

        space.add_scalar(&db, "Icon", DataTypes::int(), UaValue::Int16(0));

        let fb = space.add_object("DataBlocksInstance", "Fb1_DB");
        space.add_object(&fb, "Icon");
        let inputs = space.add_object(&fb, "Inputs");
        space.add_scalar(&inputs, "Start", DataTypes::bool(), UaValue::Boolean(false));
        let stat = space.add_object(&fb, "Static");
        space.add_object(&stat, "Icon");
        space.add_scalar(&stat, "Count", DataTypes::dint(), UaValue::Int32(42));
        let timer = space.add_object(&stat, "Timer1");
        let timer_static = space.add_object(&timer, "Static");
        space.add_scalar(&timer_static, "Elapsed", DataTypes::time(), UaValue::Int32(1500));

        space.add_scalar("Counters", "C1", DataTypes::uint(), UaValue::UInt16(7));
        space.add_scalar("Timers", "T1", DataTypes::uint(), UaValue::UInt16(0x2123));

        space
    }
}

/// Configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Endpoint used by every test.
    pub const ENDPOINT: &'static str = "opc.tcp://127.0.0.1:4840";

    /// A client configuration with the given pool size.
    pub fn client(pool_size: usize) -> ClientConfig {
        ClientConfig::new(ConnectionConfig::new(Self::ENDPOINT)).with_pool_size(pool_size)
    }
}
