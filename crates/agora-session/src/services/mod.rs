//! Background services: outbound action dispatch and inbound frame streaming.

pub mod dispatch;
pub mod stream;
