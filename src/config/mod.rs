//! Configuration for the location gateway

mod gateway;

pub use gateway::{
    DistrictAliasRuleConfig, GatewayConfig, InvalidAliasPolicy, RefreshConfig, StartupMode,
    StoreConfig, StoreKind,
};
