//! 订单引擎
//!
//! - `engine`: 创建 / 状态流转 / 取消 / 支付状态 / 统计
//! - `money`: Decimal 金额计算
//! - `number`: 每日订单号
//! - `policy`: 状态流转策略
//! - `traits`: 引擎依赖的存储、菜单与时钟抽象

pub mod engine;
pub mod money;
pub mod number;
pub mod policy;
pub mod stats;
pub mod traits;


pub use engine::OrderEngine;
pub use policy::StatusPolicy;
pub use traits::{
    CatalogLookup, Clock, FixedClock, OrderError, OrderFilter, OrderQuery, OrderResult,
    OrderSortField, OrderStore, StatusTotals, SystemClock,
};
