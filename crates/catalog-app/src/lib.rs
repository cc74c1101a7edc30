// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dates;
pub mod edit;
pub mod forms;
pub mod gateway;
pub mod ids;
pub mod list;
pub mod message;
pub mod model;
pub mod navigation;
pub mod query;
pub mod session;

pub use edit::*;
pub use forms::*;
pub use gateway::*;
pub use ids::*;
pub use list::*;
pub use message::*;
pub use model::*;
pub use navigation::*;
pub use query::*;
pub use session::*;
